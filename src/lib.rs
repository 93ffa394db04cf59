//! Software-rendered non-Euclidean portal scenes.
//!
//! Portals are bounded planes with two faces. Each connected face carries a
//! [`Warp`] that maps space near it onto space near its partner, so walking
//! through a tunnel can land you somewhere else, at another size, or on a
//! different slope. The crate covers the whole loop: portal connectivity,
//! oblique near-plane clipping, recursive rendering through portals with
//! visibility-query pruning, and teleportation of physical bodies. All
//! rendering is done on the CPU; SDL2 is used only to show the result.
//!
//! # Quick Start
//!
//! ```ignore
//! use tunnelvision::prelude::*;
//!
//! let mut engine = Engine::new(EngineConfig::default(), 800, 600)?;
//! engine.load_level_file("levels/level1.json")?;
//! engine.advance(1.0 / 60.0, &PlayerInput::default());
//! engine.render();
//! engine.save_screenshot("frame.png")?;
//! ```

// Public API - exposed to library consumers
pub mod camera;
pub mod collider;
pub mod colors;
pub mod config;
pub mod engine;
pub mod level;
pub mod light;
pub mod math;
pub mod mesh;
pub mod physics;
pub mod player;
pub mod portal;
pub mod projection;
pub mod render;
pub mod scene;
pub mod teleport;
pub mod transform;
#[cfg(feature = "window")]
pub mod window;

// Internal modules - used within the crate only
pub(crate) mod clipper;

// Re-export commonly needed types at crate root for convenience
pub use camera::Camera;
pub use config::{ConfigError, EngineConfig};
pub use engine::Engine;
pub use level::{LevelDescription, LevelError, LevelManager};
pub use mesh::{LoadError, Mesh};
pub use player::{Player, PlayerInput};
pub use portal::{FaceId, Portal, PortalError, PortalId, PortalSet, ResolveReport, Side, Warp};
pub use projection::Projection;
pub use render::{PortalRenderer, RenderStats, RenderTarget};
pub use transform::Transform;

/// Prelude module for convenient imports.
///
/// # Example
/// ```ignore
/// use tunnelvision::prelude::*;
/// ```
pub mod prelude {
    // Camera
    pub use crate::camera::Camera;

    // Engine
    pub use crate::config::EngineConfig;
    pub use crate::engine::Engine;
    pub use crate::level::{LevelDescription, LevelManager};
    pub use crate::player::PlayerInput;

    // Portals
    pub use crate::portal::{resolve_connections, FaceId, PortalId, PortalSet, Side, Warp};
    pub use crate::teleport::{cross_portals, try_cross};

    // Projection
    pub use crate::projection::Projection;

    // Transform
    pub use crate::transform::Transform;

    // Math
    pub use crate::math::mat4::Mat4;
    pub use crate::math::vec2::Vec2;
    pub use crate::math::vec3::Vec3;
    pub use crate::math::vec4::Vec4;

    // Rendering
    pub use crate::render::{PortalRenderer, PortalTargets, RenderStats, RenderTarget};

    // Window & Input
    #[cfg(feature = "window")]
    pub use crate::window::{FrameLimiter, InputState, Window, WindowEvent};
}
