//! Rigid bodies that move, collide, and can be carried through portals.

use crate::collider::{Collider, Sphere};
use crate::math::{mat4::Mat4, vec3::Vec3};
use crate::portal::FaceId;
use crate::transform::Transform;

/// Simulation state of a moving object.
///
/// `transform.scale()` is the authored size; `p_scale` is the extra factor
/// accumulated by crossing scaling portals. Both multiply into the world matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalBody {
    pub transform: Transform,
    pub prev_position: Vec3,
    pub velocity: Vec3,
    pub gravity: Vec3,
    /// Fraction of velocity lost per step.
    pub drag: f32,
    /// Fraction of the normal velocity kept on impact.
    pub bounce: f32,
    /// Fraction of the tangential velocity lost on impact.
    pub friction: f32,
    pub p_scale: f32,
    pub hit_spheres: Vec<Sphere>,
    crossed: Option<FaceId>,
}

impl PhysicalBody {
    pub fn new(transform: Transform) -> Self {
        Self {
            prev_position: transform.position(),
            transform,
            velocity: Vec3::ZERO,
            gravity: Vec3::new(0.0, -9.8, 0.0),
            drag: 0.002,
            bounce: 0.0,
            friction: 0.0,
            p_scale: 1.0,
            hit_spheres: Vec::new(),
            crossed: None,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position()
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.transform.set_position(position);
    }

    /// Moves the body without sweeping: `prev_position` follows along.
    pub fn place(&mut self, position: Vec3) {
        self.set_position(position);
        self.prev_position = position;
    }

    /// The portal face crossed during the current step, if any.
    pub fn crossed(&self) -> Option<FaceId> {
        self.crossed
    }

    pub(crate) fn record_crossing(&mut self, face: FaceId) {
        self.crossed = Some(face);
    }

    pub fn local_to_world(&self) -> Mat4 {
        let p = self.transform.position();
        let r = self.transform.rotation();
        let s = self.transform.scale() * self.p_scale;
        Transform::from_parts(p, r, s).to_matrix()
    }

    pub fn world_to_local(&self) -> Mat4 {
        let p = self.transform.position();
        let r = self.transform.rotation();
        let s = self.transform.scale() * self.p_scale;
        Transform::from_parts(p, r, s).inverse_matrix()
    }

    /// Starts a step: remembers where the body was and integrates velocity.
    pub fn update(&mut self, dt: f32) {
        self.prev_position = self.position();
        self.crossed = None;
        self.velocity += self.gravity * (self.p_scale * dt);
        self.velocity = self.velocity * (1.0 - self.drag);
        self.transform.translate(self.velocity * dt);
    }

    /// Resolves a contact by moving out along `push` and reflecting velocity.
    pub fn on_collide(&mut self, push: Vec3) {
        self.transform.translate(push);
        let len_sq = push.magnitude_squared();
        if len_sq <= f32::EPSILON {
            return;
        }
        let into = self.velocity.dot(push) / len_sq;
        if into < 0.0 {
            let normal_part = push * into;
            let tangent_part = self.velocity - normal_part;
            self.velocity = tangent_part * (1.0 - self.friction) - normal_part * self.bounce;
        }
    }

    /// Tests each hit sphere against a collider set in `object_to_world` space.
    ///
    /// `respond` receives every world-space push and is expected to apply it,
    /// typically through [`PhysicalBody::on_collide`]. Returns whether anything hit.
    pub fn collide_with<F>(
        &mut self,
        object_to_world: &Mat4,
        colliders: &[Collider],
        mut respond: F,
    ) -> bool
    where
        F: FnMut(&mut PhysicalBody, Vec3),
    {
        let mut hit = false;
        for i in 0..self.hit_spheres.len() {
            let sphere = self.hit_spheres[i];
            for collider in colliders {
                let world_to_unit = sphere.local_to_unit() * self.world_to_local();
                let local_to_unit = world_to_unit * *object_to_world;
                if let Some(push) = collider.collide(&local_to_unit) {
                    let world_push = world_to_unit.inverse_or_identity().mul_direction(push);
                    respond(self, world_push);
                    hit = true;
                }
            }
        }
        hit
    }
}
