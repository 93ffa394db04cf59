//! First-person player: a physical body with a head.
//!
//! Look angles live on the player, not the body, so only yaw turns the body
//! when it passes through a rotated portal.

use std::f32::consts::FRAC_PI_2;

use crate::collider::{Collider, Sphere};
use crate::config::PlayerConfig;
use crate::math::{mat4::Mat4, vec3::Vec3};
use crate::physics::PhysicalBody;
use crate::transform::Transform;

/// Pushes steeper than this (normalized `y`) count as standing on ground.
const GROUND_NORMAL_Y: f32 = 0.7;

/// One frame of player intent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    pub forward: f32,
    pub right: f32,
    pub mouse_dx: f32,
    pub mouse_dy: f32,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub body: PhysicalBody,
    /// Pitch of the head, clamped to straight up or down.
    cam_rx: f32,
    /// Yaw of the head relative to the body.
    cam_ry: f32,
    bob_phi: f32,
    bob_mag: f32,
    on_ground: bool,
    config: PlayerConfig,
}

impl Player {
    pub fn new(config: PlayerConfig, gravity: f32) -> Self {
        let mut body = PhysicalBody::new(Transform::new());
        body.gravity = Vec3::new(0.0, gravity, 0.0);
        body.friction = config.friction;
        body.hit_spheres = vec![
            Sphere::new(Vec3::ZERO, config.radius),
            Sphere::new(Vec3::new(0.0, config.radius - config.height, 0.0), config.radius),
        ];
        Self {
            body,
            cam_rx: 0.0,
            cam_ry: 0.0,
            bob_phi: 0.0,
            bob_mag: 0.0,
            on_ground: true,
            config,
        }
    }

    /// Puts the eye at `position`, facing +Z, at unit physical scale.
    pub fn reset(&mut self, position: Vec3) {
        self.body.place(position);
        self.body.transform.set_yaw(0.0);
        self.body.velocity = Vec3::ZERO;
        self.body.p_scale = 1.0;
        self.cam_rx = 0.0;
        self.cam_ry = 0.0;
        self.bob_mag = 0.0;
    }

    pub fn position(&self) -> Vec3 {
        self.body.position()
    }

    pub fn on_ground(&self) -> bool {
        self.on_ground
    }

    pub fn pitch(&self) -> f32 {
        self.cam_rx
    }

    pub fn look(&mut self, mouse_dx: f32, mouse_dy: f32) {
        let s = self.config.mouse_sensitivity;
        self.cam_ry -= mouse_dx * s;
        self.cam_rx = (self.cam_rx - mouse_dy * s).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    /// Accelerates along the ground plane, capping horizontal speed.
    pub fn walk(&mut self, forward: f32, right: f32, dt: f32) {
        let heading = self.body.local_to_world() * Mat4::rotation_y(self.cam_ry);
        let wish = heading.mul_direction(Vec3::new(right, 0.0, forward));
        let wish = Vec3::new(wish.x, 0.0, wish.z);

        self.body.velocity += wish * (self.config.walk_accel * dt);

        let max_speed = self.config.walk_speed * self.body.p_scale;
        let horizontal = Vec3::new(self.body.velocity.x, 0.0, self.body.velocity.z);
        let speed = horizontal.magnitude();
        if speed > max_speed {
            let clipped = horizontal * (max_speed / speed);
            self.body.velocity.x = clipped.x;
            self.body.velocity.z = clipped.z;
        }
    }

    /// Advances one physics step.
    pub fn update(&mut self, input: &PlayerInput, dt: f32) {
        self.bob_mag *= 1.0 - self.config.bob_damp;
        if self.on_ground {
            let horizontal = Vec3::new(self.body.velocity.x, 0.0, self.body.velocity.z);
            let stride = horizontal.magnitude() / (self.config.walk_speed * self.body.p_scale);
            self.bob_mag = self.bob_mag.max(stride.min(1.0));
            self.bob_phi += self.config.bob_speed * dt;
        }

        self.body.update(dt);
        self.look(input.mouse_dx, input.mouse_dy);
        self.walk(input.forward, input.right, dt);
        self.on_ground = false;
    }

    /// Collides the hit spheres with an object's colliders.
    pub fn collide_with(&mut self, object_to_world: &Mat4, colliders: &[Collider]) -> bool {
        let on_ground = &mut self.on_ground;
        self.body
            .collide_with(object_to_world, colliders, |body, mut push| {
                if push.normalize().y > GROUND_NORMAL_Y {
                    push.x = 0.0;
                    push.z = 0.0;
                    *on_ground = true;
                }
                body.on_collide(push);
            })
    }

    /// Vertical head-bob offset in body-local units.
    fn bob_offset(&self) -> f32 {
        self.bob_phi.sin() * self.bob_mag * self.config.bob_amount
    }

    /// World-to-camera matrix for the eye.
    pub fn world_to_cam(&self) -> Mat4 {
        Mat4::rotation_x(-self.cam_rx)
            * Mat4::rotation_y(-self.cam_ry)
            * Mat4::translation(0.0, -self.bob_offset(), 0.0)
            * self.body.world_to_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn player() -> Player {
        Player::new(PlayerConfig::default(), -9.8)
    }

    #[test]
    fn look_clamps_pitch() {
        let mut p = player();
        p.look(0.0, -1.0e6);
        assert_relative_eq!(p.pitch(), FRAC_PI_2);
        p.look(0.0, 1.0e6);
        assert_relative_eq!(p.pitch(), -FRAC_PI_2);
    }

    #[test]
    fn walking_is_capped_by_physical_scale() {
        let mut p = player();
        p.body.p_scale = 0.5;
        for _ in 0..1000 {
            p.walk(1.0, 0.0, 0.01);
        }
        let v = p.body.velocity;
        assert_relative_eq!(Vec3::new(v.x, 0.0, v.z).magnitude(), 2.9 * 0.5, epsilon = 1e-4);
        assert!(v.z > 0.0);
    }

    #[test]
    fn standing_on_ground_sets_flag_without_sliding() {
        let mut p = player();
        p.reset(Vec3::new(0.0, 1.45, 0.0));
        let ground = Mesh::ground(false);
        // Lower sphere center is at 1.45 - 1.3 = 0.15 above ground.
        assert!(p.collide_with(&Mat4::identity(), ground.colliders()));
        assert!(p.on_ground());
        assert_abs_diff_eq!(p.position().x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.position().y, 1.5, epsilon = 1e-4);
    }

    #[test]
    fn camera_sits_at_body_origin() {
        let mut p = player();
        p.reset(Vec3::new(2.0, 1.5, -3.0));
        let eye = p.world_to_cam().inverse_or_identity().origin();
        assert_abs_diff_eq!(eye, Vec3::new(2.0, 1.5, -3.0), epsilon = 1e-5);
    }
}
