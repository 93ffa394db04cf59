//! Clip-space clipping against the homogeneous clip cube.
//!
//! Clipping occurs after projection (in homogeneous clip space), before the
//! perspective divide. The clip volume is defined by:
//!
//! ```text
//! -w <= x <= w
//! -w <= y <= w
//! -w <= z <= w   (for [-1, 1] depth range, OpenGL-style)
//! ```
//!
//! The near plane is whatever the projection's third row says it is. When a
//! camera has been given an oblique near plane, `z >= -w` is exactly that
//! plane, so clipping against the portal costs nothing extra here.

use crate::math::vec4::Vec4;

/// The 6 planes of the canonical clip-space cube.
///
/// The signed distance is positive when inside the clip volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipPlane {
    /// x >= -w
    Left,
    /// x <= w
    Right,
    /// y >= -w
    Bottom,
    /// y <= w
    Top,
    /// z >= -w
    Near,
    /// z <= w
    Far,
}

impl ClipPlane {
    pub const ALL: [ClipPlane; 6] = [
        ClipPlane::Near,
        ClipPlane::Left,
        ClipPlane::Right,
        ClipPlane::Bottom,
        ClipPlane::Top,
        ClipPlane::Far,
    ];

    /// Returns the signed distance from a clip-space point to this plane.
    /// Positive = inside the clip volume, Negative = outside.
    pub fn signed_distance(&self, p: Vec4) -> f32 {
        match self {
            Self::Left => p.w + p.x,
            Self::Right => p.w - p.x,
            Self::Bottom => p.w + p.y,
            Self::Top => p.w - p.y,
            Self::Near => p.w + p.z,
            Self::Far => p.w - p.z,
        }
    }
}

/// A convex polygon in clip space.
///
/// Used as an intermediate representation during clipping. After clipping
/// against all planes, this is triangulated back into triangles for
/// rasterization.
#[derive(Clone, Debug, Default)]
pub struct ClipPolygon {
    pub vertices: Vec<Vec4>,
}

impl ClipPolygon {
    pub fn from_triangle(v0: Vec4, v1: Vec4, v2: Vec4) -> Self {
        Self {
            vertices: vec![v0, v1, v2],
        }
    }

    /// Returns true if the polygon has been completely clipped away.
    pub fn is_empty(&self) -> bool {
        self.vertices.len() < 3
    }

    /// Clip this polygon against a single plane using the Sutherland-Hodgman algorithm.
    pub fn clip_against_plane(&self, plane: ClipPlane) -> Self {
        if self.is_empty() {
            return Self::default();
        }

        let mut output = Vec::with_capacity(self.vertices.len() + 1);
        for (i, &current) in self.vertices.iter().enumerate() {
            let next = self.vertices[(i + 1) % self.vertices.len()];
            let d1 = plane.signed_distance(current);
            let d2 = plane.signed_distance(next);

            if d1 >= 0.0 {
                output.push(current);
                if d2 < 0.0 {
                    output.push(current.lerp(next, d1 / (d1 - d2)));
                }
            } else if d2 >= 0.0 {
                output.push(current.lerp(next, d1 / (d1 - d2)));
            }
        }

        Self { vertices: output }
    }

    /// Fan triangulation; valid because clipping keeps the polygon convex.
    pub fn triangulate(&self) -> impl Iterator<Item = [Vec4; 3]> + '_ {
        (1..self.vertices.len().saturating_sub(1))
            .map(move |i| [self.vertices[0], self.vertices[i], self.vertices[i + 1]])
    }
}

/// Clips a polygon against all 6 planes of the clip cube.
///
/// Returns the clipped polygon, which may be empty if the original
/// polygon was entirely outside the clip volume.
pub fn clip_polygon(polygon: ClipPolygon) -> ClipPolygon {
    let mut result = polygon;
    for plane in ClipPlane::ALL {
        if result.is_empty() {
            break;
        }
        result = result.clip_against_plane(plane);
    }
    result
}
