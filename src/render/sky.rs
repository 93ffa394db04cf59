//! Background gradient.

use super::target::RenderTarget;
use crate::camera::Camera;
use crate::colors;
use crate::math::vec3::Vec3;

/// Vertical gradient keyed on the elevation of each pixel's view ray.
#[derive(Debug, Clone, Copy)]
pub struct Sky {
    pub zenith: u32,
    pub horizon: u32,
    pub nadir: u32,
}

impl Default for Sky {
    fn default() -> Self {
        Self {
            zenith: colors::SKY_ZENITH,
            horizon: colors::SKY_HORIZON,
            nadir: colors::BACKGROUND,
        }
    }
}

impl Sky {
    /// Color for a world-space view direction.
    pub fn color(&self, direction: Vec3) -> u32 {
        let elevation = direction.normalize().y;
        let (towards, t) = if elevation >= 0.0 {
            (self.zenith, elevation)
        } else {
            (self.nadir, -elevation)
        };
        let (r, g, b) = colors::lerp_color(
            colors::unpack_color(self.horizon),
            colors::unpack_color(towards),
            t.sqrt(),
        );
        colors::pack_color(r, g, b, 1.0)
    }

    /// Overwrites every pixel of `target`'s color buffer; depth is left alone.
    pub fn draw(&self, camera: &Camera, target: &mut RenderTarget) {
        let (width, height) = (target.width(), target.height());
        let view_to_world = camera.view_to_world();
        let projection = camera.projection();
        let (sx, sy) = (projection.get(0, 0), projection.get(1, 1));

        let mut buffer = target.as_framebuffer();
        for y in 0..height {
            let ndc_y = 1.0 - 2.0 * (y as f32 + 0.5) / height as f32;
            for x in 0..width {
                let ndc_x = 2.0 * (x as f32 + 0.5) / width as f32 - 1.0;
                let dir = view_to_world.mul_direction(Vec3::new(ndc_x / sx, ndc_y / sy, 1.0));
                buffer.set_pixel(x as i32, y as i32, self.color(dir));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::mat4::Mat4;
    use crate::projection::Projection;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn gradient_endpoints() {
        let sky = Sky::default();
        assert_eq!(sky.color(Vec3::UP), colors::SKY_ZENITH);
        assert_eq!(sky.color(Vec3::FORWARD), colors::SKY_HORIZON);
        assert_eq!(sky.color(-Vec3::UP), colors::BACKGROUND);
    }

    #[test]
    fn top_rows_are_closer_to_zenith() {
        let camera = Camera::new(Projection::new(FRAC_PI_2, 1.0, 0.1, 100.0), Mat4::identity());
        let mut target = RenderTarget::new(4, 8);
        Sky::default().draw(&camera, &mut target);
        let top = colors::unpack_color(target.color_buffer()[0]);
        let (_, _, zenith_b) = colors::unpack_color(colors::SKY_ZENITH);
        let bottom = colors::unpack_color(target.color_buffer()[4 * 7]);
        assert!((top.2 - zenith_b).abs() < (bottom.2 - zenith_b).abs());
    }
}
