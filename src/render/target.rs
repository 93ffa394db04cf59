//! Owned render targets.
//!
//! A [`RenderTarget`] owns a color and a depth buffer. The screen is one;
//! every portal gets one per recursion level to render its far side into.

use std::path::Path;

use image::{ImageBuffer, Rgba};

use super::framebuffer::FrameBuffer;
use crate::colors;

#[derive(Debug, Clone)]
pub struct RenderTarget {
    color_buffer: Vec<u32>,
    depth_buffer: Vec<f32>,
    width: u32,
    height: u32,
}

impl RenderTarget {
    pub fn new(width: u32, height: u32) -> Self {
        let size = (width * height) as usize;
        Self {
            color_buffer: vec![colors::BACKGROUND; size],
            depth_buffer: vec![0.0; size], // 0.0 = infinitely far (1/w where w -> infinity)
            width,
            height,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let size = (width * height) as usize;
        self.color_buffer = vec![colors::BACKGROUND; size];
        self.depth_buffer = vec![0.0; size];
        self.width = width;
        self.height = height;
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn clear(&mut self, color: u32) {
        self.color_buffer.fill(color);
    }

    /// Clear the depth buffer to prepare for a new frame.
    /// Sets all depths to 0.0 (infinitely far, since we store 1/w).
    #[inline]
    pub fn clear_depth(&mut self) {
        self.depth_buffer.fill(0.0);
    }

    pub fn color_buffer(&self) -> &[u32] {
        &self.color_buffer
    }

    /// Nearest-texel lookup at normalized coordinates in `[0, 1]`.
    #[inline]
    pub fn sample(&self, u: f32, v: f32) -> u32 {
        let x = ((u * self.width as f32) as i64).clamp(0, self.width as i64 - 1) as usize;
        let y = ((v * self.height as f32) as i64).clamp(0, self.height as i64 - 1) as usize;
        self.color_buffer[y * self.width as usize + x]
    }

    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: u32 has no padding and any byte pattern is a valid u8; the
        // slice covers exactly the buffer's bytes and borrows `self`.
        unsafe {
            std::slice::from_raw_parts(
                self.color_buffer.as_ptr() as *const u8,
                self.color_buffer.len() * 4,
            )
        }
    }

    /// Get a mutable FrameBuffer view into the color and depth buffers.
    pub fn as_framebuffer(&mut self) -> FrameBuffer<'_> {
        FrameBuffer::new(
            &mut self.color_buffer,
            &mut self.depth_buffer,
            self.width,
            self.height,
        )
    }

    /// Writes the color buffer as a PNG (or any format `image` infers from the extension).
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), image::ImageError> {
        let pixels: Vec<u8> = self
            .color_buffer
            .iter()
            .flat_map(|&c| {
                let [a, r, g, b] = c.to_be_bytes();
                [r, g, b, a]
            })
            .collect();
        let img: ImageBuffer<Rgba<u8>, _> =
            ImageBuffer::from_raw(self.width, self.height, pixels).ok_or_else(|| {
                image::ImageError::Parameter(image::error::ParameterError::from_kind(
                    image::error::ParameterErrorKind::DimensionMismatch,
                ))
            })?;
        img.save(path)
    }
}
