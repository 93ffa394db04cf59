//! Depth-bounded recursive rendering through portals.
//!
//! A render call draws the sky and every object, then, while depth remains,
//! each portal face the camera can see. Seeing through a face means
//! rendering the scene again from a warped camera into that portal's
//! offscreen target for the next level down, then drawing the face's quad
//! with that image mapped in screen space.
//!
//! Cost grows with (visible portals)^(depth), so before recursing every
//! candidate face is depth-probed and faces with no visible samples are
//! skipped at that level.
//!
//! The recursion budget is an explicit argument and the per-level targets are
//! handed down as the tail of a slice, so nothing needs restoring on return
//! and a level can never index past the targets it was given.

use log::trace;

use super::framebuffer::FrameBuffer;
use super::pipeline::{draw_triangles, DrawCall, Fill};
use super::query::SampleQueries;
use super::rasterizer::DepthMode;
use super::target::RenderTarget;
use crate::camera::Camera;
use crate::colors;
use crate::config::RenderConfig;
use crate::mesh::Mesh;
use crate::portal::{Portal, PortalId, Side};
use crate::scene::Scene;

/// Offscreen targets, `levels[depth][portal]`.
///
/// There are `max_recursion - 1` levels: the outermost render writes to the
/// screen and the innermost level only ever shows placeholders.
#[derive(Debug, Clone, Default)]
pub struct PortalTargets {
    levels: Vec<Vec<RenderTarget>>,
    size: u32,
}

impl PortalTargets {
    pub fn new(max_recursion: u32, portal_count: usize, size: u32) -> Self {
        let levels = (1..max_recursion.max(1))
            .map(|_| (0..portal_count).map(|_| RenderTarget::new(size, size)).collect())
            .collect();
        Self { levels, size }
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn portal_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn levels_mut(&mut self) -> &mut [Vec<RenderTarget>] {
        &mut self.levels
    }
}

/// Per-frame counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Every scene pass, including the outermost one.
    pub render_calls: u32,
    /// Scene passes issued through a portal.
    pub nested_renders: u32,
    pub queries_issued: u32,
    /// Faces skipped because their probe found no visible samples.
    pub faces_culled: u32,
    /// Faces drawn flat because recursion ran out.
    pub placeholders: u32,
    /// Deepest offscreen level written, 1-based; 0 means none.
    pub deepest_level: usize,
}

pub struct PortalRenderer {
    queries_supported: bool,
    cull_backfaces: bool,
    /// Extra distance the clip plane is pulled toward the viewer.
    clip_bias: f32,
    quad: Mesh,
    stats: RenderStats,
}

impl PortalRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            queries_supported: config.occlusion_queries,
            cull_backfaces: config.backface_culling,
            clip_bias: 0.0,
            quad: Mesh::portal_quad(),
            stats: RenderStats::default(),
        }
    }

    /// Whether faces are probed before recursing.
    pub fn queries_supported(&self) -> bool {
        self.queries_supported
    }

    pub fn set_queries_supported(&mut self, supported: bool) {
        self.queries_supported = supported;
    }

    pub fn set_clip_bias(&mut self, bias: f32) {
        self.clip_bias = bias.max(0.0);
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = RenderStats::default();
    }

    /// Renders `scene` as seen by `camera` into `target`.
    ///
    /// `skip` is the portal the camera is looking out of, which must not be
    /// drawn. With `remaining_depth == 0` no portal is drawn at all; at 1
    /// visible faces get the placeholder color. `chain` supplies one target
    /// per portal for each level below this one.
    pub fn render(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        target: &mut RenderTarget,
        skip: Option<PortalId>,
        remaining_depth: u32,
        chain: &mut [Vec<RenderTarget>],
    ) {
        self.render_level(scene, camera, target, skip, remaining_depth, chain, 0);
    }

    #[allow(clippy::too_many_arguments)]
    fn render_level(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        target: &mut RenderTarget,
        skip: Option<PortalId>,
        remaining_depth: u32,
        chain: &mut [Vec<RenderTarget>],
        level: usize,
    ) {
        self.stats.render_calls += 1;

        target.clear_depth();
        scene.sky.draw(camera, target);
        self.draw_objects(scene, camera, &mut target.as_framebuffer());

        if remaining_depth == 0 {
            return;
        }
        let next_depth = remaining_depth - 1;

        let candidates = move || scene.portals.iter().filter(move |p| Some(p.id()) != skip);

        let mut queries = SampleQueries::new(scene.portals.len());
        let probing = self.queries_supported && next_depth > 0;
        if probing {
            let mut buffer = target.as_framebuffer();
            for portal in candidates() {
                queries.begin(portal.id().index());
                let samples = self.draw_quad(camera, portal, &mut buffer, Fill::Flat(0), DepthMode::Probe);
                queries.record(samples);
                queries.end();
                self.stats.queries_issued += 1;
            }
        }

        for portal in candidates() {
            if probing && queries.sample_count(portal.id().index()) == Some(0) {
                self.stats.faces_culled += 1;
                continue;
            }
            self.draw_portal(scene, camera, target, portal, next_depth, chain, level);
        }
    }

    fn draw_objects(&self, scene: &Scene, camera: &Camera, buffer: &mut FrameBuffer) {
        let view_projection = camera.matrix();
        for object in &scene.objects {
            let Some(mesh) = &object.mesh else {
                continue;
            };
            let call = DrawCall {
                view_projection,
                model: object.local_to_world(),
                fill: Fill::Lit {
                    color: object.color,
                    light: &scene.light,
                },
                mode: DepthMode::Write,
                cull_backfaces: self.cull_backfaces,
            };
            draw_triangles(buffer, &call, mesh.triangles());
        }
    }

    fn draw_quad(
        &self,
        camera: &Camera,
        portal: &Portal,
        buffer: &mut FrameBuffer,
        fill: Fill,
        mode: DepthMode,
    ) -> u32 {
        let call = DrawCall {
            view_projection: camera.matrix(),
            model: portal.local_to_world(),
            fill,
            mode,
            cull_backfaces: false,
        };
        draw_triangles(buffer, &call, self.quad.triangles())
    }

    /// Draws one portal face, recursing into its far side when depth allows.
    #[allow(clippy::too_many_arguments)]
    fn draw_portal(
        &mut self,
        scene: &Scene,
        camera: &Camera,
        target: &mut RenderTarget,
        portal: &Portal,
        next_depth: u32,
        chain: &mut [Vec<RenderTarget>],
        level: usize,
    ) {
        let slot = portal.id().index();
        let Some((targets, rest)) = chain.split_first_mut() else {
            self.draw_placeholder(camera, portal, target);
            return;
        };
        let Some(portal_target) = targets.get_mut(slot) else {
            self.draw_placeholder(camera, portal, target);
            return;
        };
        if next_depth == 0 {
            self.draw_placeholder(camera, portal, target);
            return;
        }

        let side = portal.side_of(camera.position());
        let warp = portal.warp(side);
        let keep = match side {
            Side::Front => -portal.normal(),
            Side::Back => portal.normal(),
        };

        let mut portal_camera = *camera;
        portal_camera.clip_to_plane(portal.position() - keep * self.clip_bias, keep);
        portal_camera.world_view = portal_camera.world_view * warp.delta_inv;

        // An unconnected face warps by identity and sees straight through itself.
        let skip = warp.to_face().map_or(portal.id(), |face| face.portal);
        trace!(
            "level {} rendering through {} (skip {})",
            level + 1,
            warp.from_face(),
            skip
        );

        self.stats.nested_renders += 1;
        self.stats.deepest_level = self.stats.deepest_level.max(level + 1);
        self.render_level(
            scene,
            &portal_camera,
            portal_target,
            Some(skip),
            next_depth,
            rest,
            level + 1,
        );

        self.draw_quad(
            camera,
            portal,
            &mut target.as_framebuffer(),
            Fill::Screen(portal_target),
            DepthMode::Write,
        );
    }

    fn draw_placeholder(&mut self, camera: &Camera, portal: &Portal, target: &mut RenderTarget) {
        self.stats.placeholders += 1;
        self.draw_quad(
            camera,
            portal,
            &mut target.as_framebuffer(),
            Fill::Flat(colors::PORTAL_PLACEHOLDER),
            DepthMode::Write,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{mat4::Mat4, vec3::Vec3};
    use crate::portal::PortalSet;
    use crate::projection::Projection;
    use crate::transform::Transform;
    use std::f32::consts::FRAC_PI_2;

    fn camera() -> Camera {
        Camera::new(Projection::new(FRAC_PI_2, 1.0, 0.01, 100.0), Mat4::identity())
    }

    /// Two connected portals; `a` fills the middle of the default camera's view.
    fn scene() -> Scene {
        let mut portals = PortalSet::with_limit(4);
        let mut ta = Transform::new();
        ta.set_position(Vec3::new(0.0, 0.0, 3.0));
        let mut tb = Transform::new();
        tb.set_position(Vec3::new(20.0, 0.0, 3.0));
        let a = portals.add(ta, None).unwrap();
        let b = portals.add(tb, None).unwrap();
        portals.connect(a, b).unwrap();
        Scene::new(Vec::new(), portals)
    }

    fn config(queries: bool) -> RenderConfig {
        RenderConfig {
            occlusion_queries: queries,
            ..RenderConfig::default()
        }
    }

    #[test]
    fn depth_zero_never_recurses() {
        let scene = scene();
        let mut renderer = PortalRenderer::new(&config(true));
        let mut target = RenderTarget::new(16, 16);
        renderer.render(&scene, &camera(), &mut target, None, 0, &mut []);

        let stats = renderer.stats();
        assert_eq!(stats.render_calls, 1);
        assert_eq!(stats.nested_renders, 0);
        assert_eq!(stats.placeholders, 0);
        assert_eq!(stats.queries_issued, 0);
    }

    #[test]
    fn depth_one_draws_placeholders() {
        let scene = scene();
        let mut renderer = PortalRenderer::new(&config(true));
        let mut target = RenderTarget::new(16, 16);
        let mut targets = PortalTargets::new(1, scene.portals.len(), 8);
        renderer.render(&scene, &camera(), &mut target, None, 1, targets.levels_mut());

        assert_eq!(renderer.stats().nested_renders, 0);
        assert!(renderer.stats().placeholders >= 1);
        assert_eq!(target.sample(0.5, 0.5), colors::PORTAL_PLACEHOLDER);
    }

    #[test]
    fn recursion_stays_within_target_levels() {
        let scene = scene();
        let max_recursion = 4;
        let mut renderer = PortalRenderer::new(&config(false));
        let mut target = RenderTarget::new(16, 16);
        let mut targets = PortalTargets::new(max_recursion, scene.portals.len(), 8);
        assert_eq!(targets.level_count(), 3);

        renderer.render(
            &scene,
            &camera(),
            &mut target,
            None,
            max_recursion,
            targets.levels_mut(),
        );
        let stats = renderer.stats();
        assert!(stats.nested_renders >= 1);
        assert!(stats.deepest_level <= targets.level_count());
        assert_eq!(stats.queries_issued, 0);
    }

    #[test]
    fn short_chain_falls_back_to_placeholder() {
        let scene = scene();
        let mut renderer = PortalRenderer::new(&config(false));
        let mut target = RenderTarget::new(16, 16);
        renderer.render(&scene, &camera(), &mut target, None, 5, &mut []);
        assert_eq!(renderer.stats().nested_renders, 0);
        assert!(renderer.stats().placeholders >= 1);
    }

    #[test]
    fn hidden_portals_are_culled_by_queries() {
        let mut scene = scene();
        // A wall between the camera and portal `a`.
        scene.objects.push(crate::scene::SceneObject::new(
            "wall",
            crate::scene::ObjectKind::Pillar,
            crate::scene::Body::Static(Transform::new()),
            Some(Mesh::cuboid(
                "wall",
                Vec3::new(-50.0, -50.0, 1.0),
                Vec3::new(50.0, 50.0, 1.5),
            )),
            colors::PILLAR,
        ));
        let mut renderer = PortalRenderer::new(&config(true));
        let mut target = RenderTarget::new(16, 16);
        let mut targets = PortalTargets::new(3, scene.portals.len(), 8);
        renderer.render(&scene, &camera(), &mut target, None, 3, targets.levels_mut());

        let stats = renderer.stats();
        assert_eq!(stats.queries_issued, 2);
        assert_eq!(stats.faces_culled, 2);
        assert_eq!(stats.nested_renders, 0);
    }

    #[test]
    fn portal_targets_shape() {
        let targets = PortalTargets::new(4, 3, 32);
        assert_eq!(targets.level_count(), 3);
        assert_eq!(targets.portal_count(), 3);
        assert_eq!(targets.size(), 32);
        assert_eq!(PortalTargets::new(0, 3, 32).level_count(), 0);
    }
}
