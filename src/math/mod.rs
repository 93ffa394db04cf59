//! Minimal linear algebra for the portal pipeline.
//!
//! Left-handed coordinates: +X right, +Y up, +Z forward. Matrices act on
//! column vectors, so `a * b * v` applies `b` first.

pub mod mat4;
pub mod vec2;
pub mod vec3;
pub mod vec4;

pub use mat4::Mat4;
pub use vec2::Vec2;
pub use vec3::Vec3;
pub use vec4::Vec4;
