//! The frame loop.
//!
//! The [`Engine`] owns the loaded scene, the player and every render target.
//! A frame is a fixed number of physics steps followed by one top-level
//! render:
//!
//! ```text
//! advance: step*  (objects -> player -> collisions -> teleportation)
//! render:  adaptive near plane -> recursive portal render -> screen
//! ```

use std::path::Path;

use log::{debug, info};

use crate::camera::Camera;
use crate::config::{ConfigError, EngineConfig};
use crate::level::{build_level, LevelDescription, LevelError};
use crate::math::mat4::Mat4;
use crate::player::{Player, PlayerInput};
use crate::portal::{resolve_connections, ResolveReport};
use crate::projection::Projection;
use crate::render::{PortalRenderer, PortalTargets, RenderStats, RenderTarget};
use crate::scene::{Scene, SceneObject};
use crate::teleport::cross_portals;

pub struct Engine {
    config: EngineConfig,
    scene: Scene,
    player: Player,
    camera: Camera,
    renderer: PortalRenderer,
    targets: PortalTargets,
    screen: RenderTarget,
    level_name: Option<String>,
    /// Simulated time not yet consumed by a step, in seconds.
    pending_time: f32,
    steps: u64,
}

impl Engine {
    pub fn new(config: EngineConfig, width: u32, height: u32) -> Result<Self, ConfigError> {
        config.validate()?;
        let screen = RenderTarget::new(width.max(1), height.max(1));
        let r = &config.render;
        let camera = Camera::new(
            Projection::from_degrees(r.fov_degrees, screen.aspect_ratio(), r.near_max, r.far),
            Mat4::identity(),
        );

        Ok(Self {
            scene: Scene::default(),
            player: Player::new(config.player.clone(), config.physics.gravity),
            camera,
            renderer: PortalRenderer::new(&config.render),
            targets: PortalTargets::default(),
            screen,
            level_name: None,
            pending_time: 0.0,
            steps: 0,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds the level, resolves its portal links and puts the player at the start.
    ///
    /// Nothing is replaced if building fails.
    pub fn load_level(&mut self, desc: &LevelDescription) -> Result<ResolveReport, LevelError> {
        let mut level = build_level(desc, &self.config)?;
        let report = resolve_connections(&mut level.portals, level.pending.drain(..));

        self.targets = PortalTargets::new(
            self.config.render.max_recursion,
            level.portals.len(),
            self.config.render.portal_target_size,
        );
        self.scene = Scene::new(level.objects, level.portals);
        self.player.reset(level.player_start);
        self.pending_time = 0.0;
        self.level_name = Some(level.name);

        info!(
            "loaded level '{}' with {} portal(s) and {} offscreen target level(s)",
            desc.name,
            self.scene.portals.len(),
            self.targets.level_count()
        );
        Ok(report)
    }

    /// Loads a level file.
    pub fn load_level_file(&mut self, path: impl AsRef<Path>) -> Result<ResolveReport, LevelError> {
        let desc = LevelDescription::from_file(path)?;
        self.load_level(&desc)
    }

    pub fn level_name(&self) -> Option<&str> {
        self.level_name.as_deref()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Physics steps run since creation.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.screen.resize(width.max(1), height.max(1));
    }

    /// One fixed physics step.
    pub fn step(&mut self, input: &PlayerInput) {
        let dt = self.config.physics.dt;

        for object in &mut self.scene.objects {
            object.update(dt);
        }
        self.player.update(input, dt);

        self.collide_objects();
        for object in &self.scene.objects {
            if let Some(mesh) = &object.mesh {
                self.player.collide_with(&object.local_to_world(), mesh.colliders());
            }
        }

        let bump = 2.0 * self.config.render.near_min;
        for object in &mut self.scene.objects {
            if let Some(body) = object.physical_mut() {
                cross_portals(body, &self.scene.portals, bump);
            }
        }
        if let Some(face) = cross_portals(&mut self.player.body, &self.scene.portals, bump) {
            debug!("player crossed {face}");
        }
        self.steps += 1;
    }

    /// Physical objects against every other object's colliders.
    fn collide_objects(&mut self) {
        let objects = &mut self.scene.objects;
        for i in 0..objects.len() {
            if objects[i].physical().is_none() {
                continue;
            }
            for j in 0..objects.len() {
                if i == j {
                    continue;
                }
                let (mover, other) = mover_and_other(objects, i, j);
                let Some(mesh) = &other.mesh else {
                    continue;
                };
                if let Some(body) = mover.physical_mut() {
                    body.collide_with(&other.local_to_world(), mesh.colliders(), |b, push| {
                        b.on_collide(push)
                    });
                }
            }
        }
    }

    /// Runs as many fixed steps as `elapsed` seconds cover, at most `max_steps`.
    ///
    /// Mouse motion is applied on the first step only. Time that could not be
    /// simulated within the cap is dropped. Returns the number of steps run.
    pub fn advance(&mut self, elapsed: f32, input: &PlayerInput) -> u32 {
        let dt = self.config.physics.dt;
        self.pending_time += elapsed.max(0.0);

        let mut input = *input;
        let mut taken = 0;
        while self.pending_time >= dt && taken < self.config.physics.max_steps {
            self.step(&input);
            input.mouse_dx = 0.0;
            input.mouse_dy = 0.0;
            self.pending_time -= dt;
            taken += 1;
        }
        if taken == self.config.physics.max_steps {
            self.pending_time = self.pending_time.min(dt);
        }
        taken
    }

    /// Distance from the player's eye to the closest portal quad.
    pub fn nearest_portal_distance(&self) -> f32 {
        self.scene.portals.nearest_distance(self.player.position())
    }

    /// Renders the current view into the screen target.
    pub fn render(&mut self) -> RenderStats {
        let r = &self.config.render;
        let nearest = self.nearest_portal_distance();
        let near = (nearest * 0.5).clamp(r.near_min, r.near_max);

        self.camera.world_view = self.player.world_to_cam();
        self.camera.set_size(self.screen.aspect_ratio(), near, r.far);
        self.renderer.set_clip_bias((nearest * 0.5).min(r.max_clip_bias));

        self.renderer.reset_stats();
        self.renderer.render(
            &self.scene,
            &self.camera,
            &mut self.screen,
            None,
            r.max_recursion,
            self.targets.levels_mut(),
        );
        self.renderer.stats()
    }

    /// Counters from the last [`Engine::render`].
    pub fn stats(&self) -> RenderStats {
        self.renderer.stats()
    }

    pub fn set_occlusion_queries(&mut self, enabled: bool) {
        self.renderer.set_queries_supported(enabled);
    }

    pub fn screen(&self) -> &RenderTarget {
        &self.screen
    }

    /// The screen as ARGB8888 bytes, ready for a streaming texture.
    pub fn frame_buffer(&self) -> &[u8] {
        self.screen.as_bytes()
    }

    pub fn save_screenshot(&self, path: impl AsRef<Path>) -> Result<(), image::ImageError> {
        let path = path.as_ref();
        self.screen.save_png(path)?;
        info!("saved screenshot to {}", path.display());
        Ok(())
    }
}

/// `objects[i]` mutably and `objects[j]` shared, for `i != j`.
fn mover_and_other(objects: &mut [SceneObject], i: usize, j: usize) -> (&mut SceneObject, &SceneObject) {
    if i < j {
        let (left, right) = objects.split_at_mut(j);
        (&mut left[i], &right[0])
    } else {
        let (left, right) = objects.split_at_mut(i);
        (&mut right[0], &left[j])
    }
}
