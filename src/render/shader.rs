//! Pixel shaders for triangle rasterization.
//!
//! This module provides a trait-based abstraction for per-pixel shading computations,
//! similar to how GPUs separate the fixed-function rasterizer from programmable
//! fragment/pixel shaders.
//!
//! # Architecture
//!
//! The rasterizer handles:
//! - Bounding box computation
//! - Edge function evaluation
//! - Inside/outside and depth testing
//!
//! The shader handles:
//! - Final color computation, from barycentrics or the pixel position

use super::target::RenderTarget;

/// Trait for per-pixel shading computations.
///
/// The rasterizer calls `shade()` for each visible pixel, passing the
/// barycentric weights `[λ₀, λ₁, λ₂]` and the integer pixel coordinates.
pub trait PixelShader {
    fn shade(&self, lambda: [f32; 3], x: i32, y: i32) -> u32;
}

/// Flat shader - returns a constant color for all pixels.
///
/// Used for lit scene geometry (color computed per face) and for the
/// placeholder drawn where portal recursion stops.
pub struct FlatShader {
    color: u32,
}

impl FlatShader {
    pub fn new(color: u32) -> Self {
        Self { color }
    }
}

impl PixelShader for FlatShader {
    #[inline]
    fn shade(&self, _lambda: [f32; 3], _x: i32, _y: i32) -> u32 {
        self.color
    }
}

/// Screen-space texture lookup into an offscreen portal target.
///
/// The target was rendered with the same projection as the surface being
/// drawn, so the pixel's normalized screen position is also its texel
/// position. That is what makes a portal look like a window instead of a
/// picture.
pub struct ScreenSampleShader<'a> {
    source: &'a RenderTarget,
    inv_width: f32,
    inv_height: f32,
}

impl<'a> ScreenSampleShader<'a> {
    /// `width` and `height` are the dimensions of the target being drawn into.
    pub fn new(source: &'a RenderTarget, width: u32, height: u32) -> Self {
        Self {
            source,
            inv_width: 1.0 / width.max(1) as f32,
            inv_height: 1.0 / height.max(1) as f32,
        }
    }
}

impl PixelShader for ScreenSampleShader<'_> {
    #[inline]
    fn shade(&self, _lambda: [f32; 3], x: i32, y: i32) -> u32 {
        let u = (x as f32 + 0.5) * self.inv_width;
        let v = (y as f32 + 0.5) * self.inv_height;
        self.source.sample(u, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_sample_scales_between_resolutions() {
        let mut source = RenderTarget::new(2, 2);
        source.as_framebuffer().set_pixel(1, 0, 0xFFAB_CDEF);
        let shader = ScreenSampleShader::new(&source, 100, 50);
        assert_eq!(shader.shade([1.0, 0.0, 0.0], 99, 0), 0xFFAB_CDEF);
        assert_ne!(shader.shade([1.0, 0.0, 0.0], 0, 49), 0xFFAB_CDEF);
    }
}
