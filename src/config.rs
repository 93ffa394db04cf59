//! Engine configuration.
//!
//! Every knob has a default, so a configuration file only needs to list what
//! it changes. Files are JSON and parsed with `serde_json`.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Rendering parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Lower bound of the adaptive near plane.
    pub near_min: f32,
    /// Upper bound of the adaptive near plane.
    pub near_max: f32,
    pub far: f32,
    /// Edge length of every square offscreen portal target.
    pub portal_target_size: u32,
    /// Depth budget of the top-level render, including the screen pass.
    pub max_recursion: u32,
    /// Prune portal faces whose sample count comes back zero.
    pub occlusion_queries: bool,
    pub backface_culling: bool,
    /// Largest push toward the camera applied to a portal clip plane.
    pub max_clip_bias: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 90.0,
            near_min: 1e-3,
            near_max: 1e-1,
            far: 100.0,
            portal_target_size: 256,
            max_recursion: 4,
            occlusion_queries: true,
            backface_culling: false,
            max_clip_bias: 0.1,
        }
    }
}

/// Fixed-timestep simulation parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Seconds per physics step.
    pub dt: f32,
    /// Cap on steps per frame so a slow frame cannot spiral.
    pub max_steps: u32,
    pub gravity: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            dt: 0.002,
            max_steps: 30,
            gravity: -9.8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub height: f32,
    pub radius: f32,
    pub walk_speed: f32,
    pub walk_accel: f32,
    pub mouse_sensitivity: f32,
    /// Fraction of ground-parallel speed lost per step while touching something.
    pub friction: f32,
    pub bob_speed: f32,
    pub bob_amount: f32,
    pub bob_damp: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            height: 1.5,
            radius: 0.2,
            walk_speed: 2.9,
            walk_accel: 50.0,
            mouse_sensitivity: 0.005,
            friction: 0.03,
            bob_speed: 15.0,
            bob_amount: 0.01,
            bob_damp: 0.1,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub render: RenderConfig,
    pub physics: PhysicsConfig,
    pub player: PlayerConfig,
    /// Upper bound on portals a level may create.
    pub max_portals: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            render: RenderConfig::default(),
            physics: PhysicsConfig::default(),
            player: PlayerConfig::default(),
            max_portals: 16,
        }
    }
}

impl EngineConfig {
    /// Parses a JSON document and validates it.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Rejects values the renderer or physics cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.render;
        if r.max_recursion == 0 {
            return Err(ConfigError::Invalid("render.max_recursion must be >= 1".into()));
        }
        if !(r.near_min > 0.0 && r.near_min <= r.near_max && r.near_max < r.far) {
            return Err(ConfigError::Invalid(format!(
                "near/far bounds must satisfy 0 < near_min <= near_max < far (got {}, {}, {})",
                r.near_min, r.near_max, r.far
            )));
        }
        if !(r.fov_degrees > 0.0 && r.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "render.fov_degrees out of range: {}",
                r.fov_degrees
            )));
        }
        if r.portal_target_size == 0 {
            return Err(ConfigError::Invalid("render.portal_target_size must be > 0".into()));
        }
        if self.physics.dt <= 0.0 || self.physics.max_steps == 0 {
            return Err(ConfigError::Invalid(
                "physics.dt and physics.max_steps must be positive".into(),
            ));
        }
        Ok(())
    }
}
