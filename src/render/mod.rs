//! CPU rendering: buffers, rasterization and recursive portal views.

mod framebuffer;
mod pipeline;
mod portal_renderer;
mod query;
mod rasterizer;
mod shader;
mod sky;
mod target;

pub use framebuffer::FrameBuffer;
pub use pipeline::{draw_triangles, DrawCall, Fill};
pub use portal_renderer::{PortalRenderer, PortalTargets, RenderStats};
pub use query::SampleQueries;
pub use rasterizer::{fill_triangle, DepthMode, Triangle};
pub use shader::{FlatShader, PixelShader, ScreenSampleShader};
pub use sky::Sky;
pub use target::RenderTarget;
