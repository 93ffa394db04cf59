//! Geometry pipeline: object space to pixels.
//!
//! ```text
//! model -> world -> clip (camera.matrix()) -> clip polygon -> NDC -> screen -> rasterize
//! ```
//!
//! Screen vertices carry `1/w` as their depth so the rasterizer can blend it
//! linearly. Face normals come from world-space positions and feed the flat
//! lighting.

use super::framebuffer::FrameBuffer;
use super::rasterizer::{fill_triangle, DepthMode, Triangle};
use super::shader::{FlatShader, ScreenSampleShader};
use super::target::RenderTarget;
use crate::clipper::{clip_polygon, ClipPolygon};
use crate::light::DirectionalLight;
use crate::math::{mat4::Mat4, vec3::Vec3, vec4::Vec4};

/// How a triangle's pixels get their color.
#[derive(Clone, Copy)]
pub enum Fill<'a> {
    /// Base color lit per face.
    Lit {
        color: u32,
        light: &'a DirectionalLight,
    },
    /// One color, no lighting.
    Flat(u32),
    /// Screen-space lookup into an offscreen target.
    Screen(&'a RenderTarget),
}

/// One draw call's fixed state.
pub struct DrawCall<'a> {
    /// World-to-clip matrix.
    pub view_projection: Mat4,
    /// Object-to-world matrix.
    pub model: Mat4,
    pub fill: Fill<'a>,
    pub mode: DepthMode,
    /// Drop triangles that are counter-clockwise on screen.
    pub cull_backfaces: bool,
}

/// Maps a clip-space point to pixel coordinates with `z = 1/w`.
#[inline]
fn to_screen(clip: Vec4, width: f32, height: f32) -> Option<Vec3> {
    if clip.w <= f32::EPSILON {
        return None;
    }
    let inv_w = 1.0 / clip.w;
    Some(Vec3::new(
        (clip.x * inv_w + 1.0) * 0.5 * width,
        (1.0 - clip.y * inv_w) * 0.5 * height,
        inv_w,
    ))
}

/// Draws `triangles` (object-local positions) and returns the number of samples
/// that passed the depth test.
pub fn draw_triangles<I>(buffer: &mut FrameBuffer, call: &DrawCall, triangles: I) -> u32
where
    I: IntoIterator<Item = [Vec3; 3]>,
{
    let clip_from_model = call.view_projection * call.model;
    let (width, height) = (buffer.width() as f32, buffer.height() as f32);
    let mut passed = 0;

    for [a, b, c] in triangles {
        let color = match call.fill {
            Fill::Lit { color, light } => {
                let wa = call.model.mul_point(a);
                let normal = (call.model.mul_point(b) - wa).cross(call.model.mul_point(c) - wa);
                light.shade(color, normal)
            }
            Fill::Flat(color) => color,
            Fill::Screen(_) => 0,
        };

        let polygon = clip_polygon(ClipPolygon::from_triangle(
            clip_from_model * Vec4::point(a),
            clip_from_model * Vec4::point(b),
            clip_from_model * Vec4::point(c),
        ));

        for [p0, p1, p2] in polygon.triangulate() {
            let (Some(s0), Some(s1), Some(s2)) = (
                to_screen(p0, width, height),
                to_screen(p1, width, height),
                to_screen(p2, width, height),
            ) else {
                continue;
            };
            let triangle = Triangle::new([s0, s1, s2]);
            if call.cull_backfaces && triangle.signed_area() < 0.0 {
                continue;
            }

            passed += match call.fill {
                Fill::Screen(source) => {
                    let shader = ScreenSampleShader::new(source, buffer.width(), buffer.height());
                    fill_triangle(&triangle, buffer, &shader, call.mode)
                }
                _ => fill_triangle(&triangle, buffer, &FlatShader::new(color), call.mode),
            };
        }
    }
    passed
}
