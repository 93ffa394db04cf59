//! Edge function-based triangle rasterization.
//!
//! This module implements triangle rasterization using the edge function algorithm,
//! which is the foundation of modern GPU rasterization. The algorithm tests each
//! pixel against three edge equations to determine triangle coverage.
//!
//! # Edge Function
//!
//! For an edge from point A to point B, the edge function at point P is:
//!
//! ```text
//! E(P) = (P.x - A.x) * (B.y - A.y) - (P.y - A.y) * (B.x - A.x)
//! ```
//!
//! The edge function values are proportional to barycentric coordinates:
//!
//! ```text
//! lambda_i = E_i(P) / (E_0 + E_1 + E_2)
//! ```
//!
//! Both windings are accepted; culling, when wanted, happens before this stage.
//!
//! # Depth
//!
//! Vertices carry 1/w in `z`, which is affine in screen space, so depth is a
//! plain barycentric blend. In [`DepthMode::Probe`] nothing is written and the
//! return value counts the samples that would have passed: the software
//! counterpart of a GPU occlusion query.
//!
//! # References
//!
//! - Juan Pineda, "A Parallel Algorithm for Polygon Rasterization" (1988)

use super::framebuffer::FrameBuffer;
use super::shader::PixelShader;
use crate::math::vec2::Vec2;
use crate::math::vec3::Vec3;

/// A triangle ready for rasterization: pixel `x`, `y` and `z = 1/w`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub points: [Vec3; 3],
}

impl Triangle {
    pub fn new(points: [Vec3; 3]) -> Self {
        Self { points }
    }

    /// Twice the signed screen area; positive for clockwise on screen (y down).
    pub fn signed_area(&self) -> f32 {
        let [a, b, c] = self.points;
        edge_function(a, b, c)
    }
}

/// What a covered, depth-passing pixel does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthMode {
    /// Shade, then write color and depth.
    Write,
    /// Count only; color and depth stay untouched.
    Probe,
}

#[inline]
fn edge_function(a: Vec3, b: Vec3, p: Vec3) -> f32 {
    let ab = Vec2::new(b.x - a.x, b.y - a.y);
    let ap = Vec2::new(p.x - a.x, p.y - a.y);
    ab.perp_dot(ap) * -1.0
}

/// Fills `triangle` into `buffer` and returns how many samples passed the depth test.
pub fn fill_triangle<S: PixelShader>(
    triangle: &Triangle,
    buffer: &mut FrameBuffer,
    shader: &S,
    mode: DepthMode,
) -> u32 {
    let [v0, v1, v2] = triangle.points;

    // Bounding box, clipped to the buffer.
    let min_x = (v0.x.min(v1.x).min(v2.x).floor() as i32).max(0);
    let max_x = (v0.x.max(v1.x).max(v2.x).ceil() as i32).min(buffer.width() as i32 - 1);
    let min_y = (v0.y.min(v1.y).min(v2.y).floor() as i32).max(0);
    let max_y = (v0.y.max(v1.y).max(v2.y).ceil() as i32).min(buffer.height() as i32 - 1);

    let area = edge_function(v0, v1, v2);
    if area.abs() < f32::EPSILON {
        return 0; // Degenerate triangle
    }
    let inv_area = 1.0 / area;

    let mut passed = 0;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            // Sample at pixel center
            let p = Vec3::new(x as f32 + 0.5, y as f32 + 0.5, 0.0);

            let w0 = edge_function(v1, v2, p);
            let w1 = edge_function(v2, v0, p);
            let w2 = edge_function(v0, v1, p);

            let inside = if area > 0.0 {
                w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0
            } else {
                w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0
            };
            if !inside {
                continue;
            }

            let lambda = [w0 * inv_area, w1 * inv_area, w2 * inv_area];
            let depth = lambda[0] * v0.z + lambda[1] * v1.z + lambda[2] * v2.z;

            match mode {
                DepthMode::Write => {
                    if buffer.depth_test(x, y, depth) {
                        let color = shader.shade(lambda, x, y);
                        buffer.set_pixel_with_depth(x, y, depth, color);
                        passed += 1;
                    }
                }
                DepthMode::Probe => {
                    if buffer.depth_test(x, y, depth) {
                        passed += 1;
                    }
                }
            }
        }
    }
    passed
}
