//! Transform component for scene objects and portals.
//!
//! Provides a [`Transform`] struct with a fluent API for managing position,
//! rotation (Euler angles), and scale, plus the world and inverse-world
//! matrices every portal computation is built on.

use log::warn;

use crate::math::{mat4::Mat4, vec3::Vec3};

/// Scales below this are treated as collapsed when inverting.
const MIN_SCALE: f32 = 1e-6;

/// A 3D transform with position, rotation (Euler angles), and scale.
///
/// Provides a fluent API where mutating methods return `&mut Self` for chaining:
///
/// ```ignore
/// transform
///     .set_position_xyz(5.0, 2.0, 0.0)
///     .rotate_y(0.1)
///     .set_scale_uniform(2.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    position: Vec3,
    rotation: Vec3, // Euler angles in radians: x=pitch, y=yaw, z=roll
    scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform with default values (position=0, rotation=0, scale=1).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a transform from all three components at once.
    pub fn from_parts(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    // ============ Position ============

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) -> &mut Self {
        self.position = position;
        self
    }

    pub fn set_position_xyz(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.position = Vec3::new(x, y, z);
        self
    }

    /// Translate by a delta vector.
    pub fn translate(&mut self, delta: Vec3) -> &mut Self {
        self.position += delta;
        self
    }

    // ============ Rotation ============

    /// Get the rotation (Euler angles in radians).
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Vec3) -> &mut Self {
        self.rotation = rotation;
        self
    }

    /// Rotate around the Y axis (yaw).
    pub fn rotate_y(&mut self, angle: f32) -> &mut Self {
        self.rotation.y += angle;
        self
    }

    pub fn set_yaw(&mut self, yaw: f32) -> &mut Self {
        self.rotation.y = yaw;
        self
    }

    // ============ Scale ============

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vec3) -> &mut Self {
        self.scale = scale;
        self
    }

    /// Set uniform scale (same value for x, y, z).
    pub fn set_scale_uniform(&mut self, s: f32) -> &mut Self {
        self.scale = Vec3::splat(s);
        self
    }

    // ============ Matrix Generation ============

    fn rotation_matrix(&self) -> Mat4 {
        Mat4::rotation_x(self.rotation.x)
            * Mat4::rotation_y(self.rotation.y)
            * Mat4::rotation_z(self.rotation.z)
    }

    /// Generate the local-to-world matrix.
    ///
    /// Order: Translation * RotationX * RotationY * RotationZ * Scale
    /// (Scale applied first, then rotations, then translation)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::translation(self.position.x, self.position.y, self.position.z)
            * self.rotation_matrix()
            * Mat4::scaling(self.scale.x, self.scale.y, self.scale.z)
    }

    /// World-to-local matrix, or `None` when a scale component has collapsed.
    ///
    /// Built analytically from the inverted factors in reverse order, which
    /// stays exact where a general 4x4 inverse would lose precision.
    pub fn try_inverse_matrix(&self) -> Option<Mat4> {
        let s = self.scale;
        if s.x.abs() < MIN_SCALE || s.y.abs() < MIN_SCALE || s.z.abs() < MIN_SCALE {
            return None;
        }
        let p = self.position;
        Some(
            Mat4::scaling(1.0 / s.x, 1.0 / s.y, 1.0 / s.z)
                * self.rotation_matrix().transpose()
                * Mat4::translation(-p.x, -p.y, -p.z),
        )
    }

    /// World-to-local matrix with an identity fallback for degenerate scale.
    pub fn inverse_matrix(&self) -> Mat4 {
        self.try_inverse_matrix().unwrap_or_else(|| {
            warn!("degenerate transform scale {:?}; using identity inverse", self.scale);
            Mat4::identity()
        })
    }

    /// Unit vector the local +Z axis points along in world space.
    pub fn forward(&self) -> Vec3 {
        self.rotation_matrix().mul_direction(Vec3::FORWARD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_default() {
        let t = Transform::default();
        assert_eq!(t.position(), Vec3::ZERO);
        assert_eq!(t.rotation(), Vec3::ZERO);
        assert_eq!(t.scale(), Vec3::ONE);
    }

    #[test]
    fn test_fluent_api() {
        let mut t = Transform::new();
        t.set_position_xyz(1.0, 2.0, 3.0)
            .rotate_y(0.5)
            .set_scale_uniform(2.0);

        assert_eq!(t.position(), Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(t.rotation().y, 0.5);
        assert_eq!(t.scale(), Vec3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn test_to_matrix_identity() {
        assert_eq!(Transform::default().to_matrix(), Mat4::identity());
    }

    #[test]
    fn inverse_matrix_undoes_to_matrix() {
        let t = Transform::from_parts(
            Vec3::new(3.0, -1.0, 2.0),
            Vec3::new(0.2, 1.1, -0.4),
            Vec3::new(0.5, 2.0, 1.5),
        );
        assert_abs_diff_eq!(
            t.to_matrix() * t.inverse_matrix(),
            Mat4::identity(),
            epsilon = 1e-5
        );
    }

    #[test]
    fn zero_scale_has_no_inverse() {
        let mut t = Transform::new();
        t.set_scale(Vec3::new(1.0, 0.0, 1.0));
        assert!(t.try_inverse_matrix().is_none());
        assert_eq!(t.inverse_matrix(), Mat4::identity());
    }

    #[test]
    fn forward_follows_yaw() {
        let mut t = Transform::new();
        t.set_yaw(std::f32::consts::PI);
        assert_abs_diff_eq!(t.forward(), Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
    }
}
