//! Quad colliders tested against unit spheres.
//!
//! Bodies carry spheres; static geometry carries quads. A collision test maps
//! the quad into the sphere's unit space, where the sphere is centered at the
//! origin with radius one, and pushes the sphere out along the shortest path.

use crate::math::{mat4::Mat4, vec3::Vec3};

/// Collision sphere attached to a body, in the body's local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Maps body-local space to the sphere's unit space.
    pub fn local_to_unit(&self) -> Mat4 {
        let inv_r = 1.0 / self.radius;
        Mat4::scaling(inv_r, inv_r, inv_r)
            * Mat4::translation(-self.center.x, -self.center.y, -self.center.z)
    }
}

/// A planar parallelogram: `center + s * half_x + t * half_y` for `s, t` in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub center: Vec3,
    pub half_x: Vec3,
    pub half_y: Vec3,
}

impl Collider {
    /// Fits a collider to four corners given in winding order.
    ///
    /// Exact for rectangles. For trapezoids the result spans the averaged
    /// edges, which is what tapered tunnel walls need.
    pub fn from_quad(corners: [Vec3; 4]) -> Self {
        let [c0, c1, c2, c3] = corners;
        let center = (c0 + c1 + c2 + c3) * 0.25;
        let half_x = ((c1 - c0) + (c2 - c3)) * 0.25;
        let raw_y = ((c3 - c0) + (c2 - c1)) * 0.25;
        let len_sq = half_x.magnitude_squared();
        let half_y = if len_sq > f32::EPSILON {
            raw_y - half_x * (raw_y.dot(half_x) / len_sq)
        } else {
            raw_y
        };
        Self {
            center,
            half_x,
            half_y,
        }
    }

    /// Tests the unit sphere at the origin of the space `local_to_unit` maps into.
    ///
    /// Returns the push, in unit space, that moves the sphere clear of the quad.
    pub fn collide(&self, local_to_unit: &Mat4) -> Option<Vec3> {
        let center = local_to_unit.mul_point(self.center);
        let ax = local_to_unit.mul_direction(self.half_x);
        let ay = local_to_unit.mul_direction(self.half_y);

        let xx = ax.dot(ax);
        let xy = ax.dot(ay);
        let yy = ay.dot(ay);
        let det = xx * yy - xy * xy;
        if det.abs() <= f32::EPSILON {
            return None;
        }

        let to_origin = -center;
        let bx = ax.dot(to_origin);
        let by = ay.dot(to_origin);
        let s = ((yy * bx - xy * by) / det).clamp(-1.0, 1.0);
        let t = ((xx * by - xy * bx) / det).clamp(-1.0, 1.0);
        let closest = center + ax * s + ay * t;

        let delta = -closest;
        let dist_sq = delta.magnitude_squared();
        if dist_sq >= 1.0 {
            return None;
        }
        if dist_sq <= f32::EPSILON {
            // Sphere center on the quad: push out along the quad normal.
            return Some(ax.cross(ay).normalize());
        }
        Some(delta.normalize() - delta)
    }
}
