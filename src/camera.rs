//! Render camera.
//!
//! # Coordinate System
//!
//! Uses a **left-handed** coordinate system:
//! - X: positive right
//! - Y: positive up
//! - Z: positive forward (into screen)
//!
//! A [`Camera`] is a plain value: a world-to-view matrix plus a projection
//! matrix. Portal recursion copies the camera, replaces the near plane with
//! the portal plane and composes the view with a warp, so nothing here holds
//! references into the scene.

use crate::math::{mat4::Mat4, vec3::Vec3, vec4::Vec4};
use crate::projection::Projection;

/// Below this `|plane . far_corner|` the oblique matrix would blow up.
const OBLIQUE_EPSILON: f32 = 1e-5;
/// Plane normals this close to perpendicular with the view axis are left alone.
const PARALLEL_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// World-to-view transform.
    pub world_view: Mat4,
    projection: Mat4,
    params: Projection,
}

impl Camera {
    pub fn new(params: Projection, world_view: Mat4) -> Self {
        Self {
            world_view,
            projection: params.matrix(),
            params,
        }
    }

    /// Resets the projection to the standard frustum with a new aspect and depth range.
    pub fn set_size(&mut self, aspect_ratio: f32, near: f32, far: f32) {
        self.params.set_aspect_ratio(aspect_ratio);
        self.params.set_depth_range(near, far);
        self.projection = self.params.matrix();
    }

    pub fn params(&self) -> &Projection {
        &self.params
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Combined world-to-clip matrix.
    pub fn matrix(&self) -> Mat4 {
        self.projection * self.world_view
    }

    /// View-to-world transform; identity if the view is degenerate.
    pub fn view_to_world(&self) -> Mat4 {
        self.world_view.inverse_or_identity()
    }

    /// World-space eye position.
    pub fn position(&self) -> Vec3 {
        self.view_to_world().origin()
    }

    /// Replaces the near plane with the world-space plane through `point`.
    ///
    /// `normal` points into the half-space that stays visible. The far plane
    /// is tilted so the frustum still encloses the original far corner
    /// (Lengyel's oblique near-plane clipping).
    ///
    /// Returns `false` and keeps the current projection when the eye is not
    /// strictly behind the plane, the plane is nearly parallel to the view
    /// axis, or the projection cannot be inverted.
    pub fn clip_to_plane(&mut self, point: Vec3, normal: Vec3) -> bool {
        let Some(view_to_world) = self.world_view.inverse() else {
            return false;
        };
        let world_plane = Vec4::plane(point, normal);
        let plane = view_to_world.transpose() * world_plane;

        let length = plane.xyz().magnitude();
        if length <= f32::EPSILON {
            return false;
        }
        let plane = plane * (1.0 / length);

        // The eye is the view-space origin, so `plane.w` is its signed distance.
        if plane.w >= -f32::EPSILON || plane.z.abs() < PARALLEL_EPSILON {
            return false;
        }

        let Some(inverse_projection) = self.projection.inverse() else {
            return false;
        };
        let corner = inverse_projection
            * Vec4::new(plane.x.signum(), plane.y.signum(), 1.0, 1.0);
        let denom = plane.dot(corner);
        if denom < OBLIQUE_EPSILON {
            return false;
        }

        let scaled = plane * (2.0 / denom);
        let w_row = self.projection.row(3);
        self.projection.set_row(2, scaled - w_row);
        true
    }

    /// World-space direction through normalized device coordinates `(x, y)`.
    ///
    /// Only the X and Y rows of the projection are used, so this is unaffected
    /// by oblique clipping.
    pub fn ray_direction(&self, ndc_x: f32, ndc_y: f32) -> Vec3 {
        let view_dir = Vec3::new(
            ndc_x / self.projection.get(0, 0),
            ndc_y / self.projection.get(1, 1),
            1.0,
        );
        self.view_to_world().mul_direction(view_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use std::f32::consts::FRAC_PI_2;

    fn camera() -> Camera {
        Camera::new(Projection::new(FRAC_PI_2, 1.5, 0.1, 100.0), Mat4::identity())
    }

    #[test]
    fn clipping_to_default_near_plane_keeps_projection() {
        let mut cam = camera();
        let before = cam.projection();
        assert!(cam.clip_to_plane(Vec3::new(0.0, 0.0, 0.1), Vec3::FORWARD));
        assert_abs_diff_eq!(cam.projection(), before, epsilon = 1e-4);
    }

    #[test]
    fn oblique_plane_becomes_near_plane() {
        let mut cam = camera();
        let point = Vec3::new(0.0, 0.0, 5.0);
        let normal = Vec3::new(0.3, 0.0, 1.0).normalize();
        assert!(cam.clip_to_plane(point, normal));

        let m = cam.matrix();
        let on_plane = m * Vec4::point(point + Vec3::UP);
        assert_abs_diff_eq!(on_plane.z + on_plane.w, 0.0, epsilon = 1e-4);

        let beyond = m * Vec4::point(point + normal);
        assert!(beyond.z + beyond.w > 0.0);
        let before = m * Vec4::point(point - normal);
        assert!(before.z + before.w < 0.0);
    }

    #[test]
    fn eye_in_front_of_plane_falls_back() {
        let mut cam = camera();
        let before = cam.projection();
        // Visible side contains the eye: oblique clipping would be meaningless.
        assert!(!cam.clip_to_plane(Vec3::new(0.0, 0.0, 5.0), -Vec3::FORWARD));
        assert_eq!(cam.projection(), before);
    }

    #[test]
    fn plane_parallel_to_view_axis_falls_back() {
        let mut cam = camera();
        let before = cam.projection();
        assert!(!cam.clip_to_plane(Vec3::new(1.0, 0.0, 0.0), Vec3::RIGHT));
        assert_eq!(cam.projection(), before);
    }

    #[test]
    fn plane_is_transformed_into_view_space() {
        let mut cam = camera();
        // Eye at z = -10 looking down +Z.
        cam.world_view = Mat4::translation(0.0, 0.0, 10.0);
        assert_relative_eq!(cam.position(), Vec3::new(0.0, 0.0, -10.0));
        assert!(cam.clip_to_plane(Vec3::ZERO, Vec3::FORWARD));

        let m = cam.matrix();
        let on_plane = m * Vec4::point(Vec3::new(0.5, 0.5, 0.0));
        assert_abs_diff_eq!(on_plane.z + on_plane.w, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn centre_ray_points_forward() {
        let cam = camera();
        assert_relative_eq!(cam.ray_direction(0.0, 0.0), Vec3::FORWARD);
    }
}
