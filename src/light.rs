//! Scene lighting.

use crate::colors;
use crate::math::vec3::Vec3;

/// A directional light that illuminates the scene uniformly from a direction.
///
/// Every world a portal leads to is lit by the same light, so shading stays
/// continuous across portal seams.
#[derive(Debug, Clone, Copy)]
pub struct DirectionalLight {
    /// The normalized direction the light is pointing (not where it comes from).
    pub direction: Vec3,
    pub ambient_intensity: f32,
    /// Multiplier for the diffuse lighting contribution (default: 1.0)
    pub diffuse_strength: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self::new(Vec3::new(0.4, -1.0, 0.6))
    }
}

impl DirectionalLight {
    /// Create a new directional light pointing in the given direction.
    /// The direction will be normalized automatically.
    pub fn new(direction: Vec3) -> Self {
        DirectionalLight {
            direction: direction.normalize(),
            ambient_intensity: 0.35,
            diffuse_strength: 0.65,
        }
    }

    /// Diffuse term in `[0, 1]`.
    ///
    /// Faces are lit from either side because portal geometry and tunnel walls
    /// are seen from both.
    pub fn intensity(&self, normal: Vec3) -> f32 {
        (-self.direction).dot(normal.normalize()).abs()
    }

    /// Flat-shaded color of a face with the given normal.
    pub fn shade(&self, base: u32, normal: Vec3) -> u32 {
        let light = self.ambient_intensity + self.diffuse_strength * self.intensity(normal);
        colors::modulate(base, light.min(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_direct_illumination() {
        let light = DirectionalLight::new(Vec3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(light.intensity(Vec3::FORWARD), 1.0);
    }

    #[test]
    fn back_faces_are_lit_too() {
        let light = DirectionalLight::new(Vec3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(light.intensity(-Vec3::FORWARD), 1.0);
    }

    #[test]
    fn grazing_faces_get_ambient_only() {
        let light = DirectionalLight::new(Vec3::new(0.0, -1.0, 0.0));
        let base = colors::rgb(200, 200, 200);
        assert_eq!(light.shade(base, Vec3::RIGHT), colors::modulate(base, 0.35));
    }

    #[test]
    fn test_angled_illumination() {
        let light = DirectionalLight::new(Vec3::new(0.0, -1.0, 0.0));
        let normal = Vec3::new(0.0, 1.0, 1.0).normalize();
        assert_relative_eq!(light.intensity(normal), 0.707, epsilon = 0.01);
    }
}
