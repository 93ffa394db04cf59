//! Packed ARGB color helpers and the palette used by the demo scenes.

pub const BACKGROUND: u32 = 0xFF10_1018;
/// Drawn where recursion stops and a portal cannot show its far side.
pub const PORTAL_PLACEHOLDER: u32 = 0xFFFF_66CC;
pub const SKY_ZENITH: u32 = 0xFF3A_6EA5;
pub const SKY_HORIZON: u32 = 0xFFC8_DCF0;
pub const GROUND: u32 = 0xFF6A_8C4A;
pub const TUNNEL: u32 = 0xFFB8_A58A;
pub const PILLAR: u32 = 0xFF8A_8A96;
pub const BALL: u32 = 0xFFD0_4A3A;
pub const PROP: u32 = 0xFFA0_A0A0;

/// Packs normalized RGBA components into a `0xAARRGGBB` value.
#[inline]
pub fn pack_color(r: f32, g: f32, b: f32, a: f32) -> u32 {
    let to_byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
    (to_byte(a) << 24) | (to_byte(r) << 16) | (to_byte(g) << 8) | to_byte(b)
}

/// Unpacks the RGB channels of a `0xAARRGGBB` value into `[0, 1]`.
#[inline]
pub fn unpack_color(color: u32) -> (f32, f32, f32) {
    let channel = |shift: u32| ((color >> shift) & 0xFF) as f32 / 255.0;
    (channel(16), channel(8), channel(0))
}

#[inline]
pub fn lerp_color(a: (f32, f32, f32), b: (f32, f32, f32), t: f32) -> (f32, f32, f32) {
    (
        a.0 + (b.0 - a.0) * t,
        a.1 + (b.1 - a.1) * t,
        a.2 + (b.2 - a.2) * t,
    )
}

/// Scales the RGB channels of `color` by `intensity`.
#[inline]
pub fn modulate(color: u32, intensity: f32) -> u32 {
    let (r, g, b) = unpack_color(color);
    pack_color(r * intensity, g * intensity, b * intensity, 1.0)
}

/// Builds an opaque color from 8-bit channels.
pub const fn rgb(r: u8, g: u8, b: u8) -> u32 {
    0xFF00_0000 | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}
