//! Frame buffer abstraction for 2D pixel access.
//!
//! Provides a safe view into color and depth buffers with bounds-checked access.
//! The depth buffer enables proper hidden surface removal via z-buffer algorithm.

/// A view into color and depth buffers.
///
/// Wraps 1D slices with width/height metadata to enable safe 2D pixel access.
/// This is a borrowed view, not an owning type - it's meant to be created
/// temporarily when you need to pass buffers + dimensions together.
///
/// # Depth Buffer
///
/// The depth buffer stores 1/w values (reciprocal of clip-space W) for each pixel.
/// Using 1/w instead of z because it can be linearly interpolated in screen space.
/// Larger values are closer to the camera (since w increases with distance in
/// left-handed coordinates, 1/w decreases).
pub struct FrameBuffer<'a> {
    color_buffer: &'a mut [u32],
    depth_buffer: &'a mut [f32],
    width: u32,
    height: u32,
}

impl<'a> FrameBuffer<'a> {
    /// Create a new FrameBuffer view from buffer slices and dimensions.
    pub fn new(
        color_buffer: &'a mut [u32],
        depth_buffer: &'a mut [f32],
        width: u32,
        height: u32,
    ) -> Self {
        debug_assert_eq!(
            color_buffer.len(),
            (width * height) as usize,
            "Color buffer size doesn't match dimensions"
        );
        debug_assert_eq!(
            depth_buffer.len(),
            (width * height) as usize,
            "Depth buffer size doesn't match dimensions"
        );
        Self {
            color_buffer,
            depth_buffer,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            Some((y as u32 * self.width + x as u32) as usize)
        } else {
            None
        }
    }

    /// Depth test without writing anything.
    ///
    /// Returns true if `depth` (1/w, larger = closer) would be visible at (x, y).
    #[inline]
    pub fn depth_test(&self, x: i32, y: i32, depth: f32) -> bool {
        self.index(x, y)
            .is_some_and(|idx| depth > self.depth_buffer[idx])
    }

    /// Set a pixel at (x, y) with depth testing.
    ///
    /// The pixel is only written if the depth value is greater than the existing
    /// depth at that location (closer to camera, since we store 1/w).
    /// Silently ignores out-of-bounds coordinates.
    #[inline]
    pub fn set_pixel_with_depth(&mut self, x: i32, y: i32, depth: f32, color: u32) -> bool {
        if let Some(idx) = self.index(x, y) {
            if depth > self.depth_buffer[idx] {
                self.depth_buffer[idx] = depth;
                self.color_buffer[idx] = color;
                return true;
            }
        }
        false
    }

    /// Set a pixel without depth testing (for backgrounds and overlays).
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if let Some(idx) = self.index(x, y) {
            self.color_buffer[idx] = color;
        }
    }

    /// Get the color at (x, y), or None if out of bounds.
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|idx| self.color_buffer[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closer_fragments_win() {
        let mut color = vec![0u32; 4];
        let mut depth = vec![0.0f32; 4];
        let mut fb = FrameBuffer::new(&mut color, &mut depth, 2, 2);
        assert!(fb.set_pixel_with_depth(1, 1, 0.5, 0xFF00_00FF));
        assert!(!fb.set_pixel_with_depth(1, 1, 0.25, 0xFFFF_0000));
        assert!(fb.depth_test(1, 1, 0.75));
        assert_eq!(fb.get_pixel(1, 1), Some(0xFF00_00FF));
        assert_eq!(fb.get_pixel(2, 0), None);
    }
}
