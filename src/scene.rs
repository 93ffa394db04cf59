//! Scene objects and the world they live in.
//!
//! Objects are either static (a plain [`Transform`]) or physical (a
//! [`PhysicalBody`] that moves, collides and can cross portals). Code that
//! only cares about physical state asks with [`SceneObject::physical_mut`]
//! instead of matching on the object kind.

use std::fmt;

use crate::collider::Sphere;
use crate::light::DirectionalLight;
use crate::math::{mat4::Mat4, vec3::Vec3};
use crate::mesh::{Mesh, Opening, TunnelShape};
use crate::physics::PhysicalBody;
use crate::portal::PortalSet;
use crate::render::Sky;
use crate::transform::Transform;

/// Tunnel wall thickness in tunnel-local units.
const TUNNEL_WALL: f32 = 0.2;
/// Full-size tunnel mouth: 1.2 wide, 2 tall, standing on `y = 0`.
const FULL_MOUTH: Opening = Opening::new(0.6, 0.0, 2.0);
/// Keeps the portal quad a hair inside the mouth so its edges never z-fight the rim.
const DOOR_INSET: f32 = 0.001;

/// The three tunnel variants levels are built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelKind {
    Normal,
    /// Exit mouth at half size; walking through shrinks the traveller.
    Scale,
    /// Exit mouth two units lower than the entry.
    Slope,
}

impl TunnelKind {
    /// Parses the level-file subtype; matching is case-insensitive.
    pub fn parse(subtype: &str) -> Option<Self> {
        match subtype.to_ascii_lowercase().as_str() {
            "" | "normal" => Some(Self::Normal),
            "scale" => Some(Self::Scale),
            "slope" => Some(Self::Slope),
            _ => None,
        }
    }

    pub fn shape(self) -> TunnelShape {
        let exit = match self {
            Self::Normal => FULL_MOUTH,
            Self::Scale => Opening::new(0.3, 0.0, 1.0),
            Self::Slope => Opening::new(0.6, -2.0, 0.0),
        };
        TunnelShape {
            entry: FULL_MOUTH,
            exit,
            wall: TUNNEL_WALL,
        }
    }

    /// World frame of a door portal: door 1 is the `+Z` mouth, door 2 the `-Z` mouth.
    ///
    /// The portal quad spans `[-1, 1]`, so its scale is the mouth's half extents.
    /// Only the tunnel's X scale carries over, which keeps doors of a uniformly
    /// scaled tunnel proportional.
    pub fn door_frame(self, tunnel: &Transform, door: u32) -> Option<Transform> {
        let shape = self.shape();
        let (mouth, z) = match door {
            1 => (shape.entry, 1.0),
            2 => (shape.exit, -1.0),
            _ => return None,
        };
        let size = tunnel.scale().x;
        let local = Vec3::new(0.0, (mouth.bottom + mouth.top) * 0.5, z);
        let scale = Vec3::new(
            mouth.half_width,
            mouth.height() * 0.5 - DOOR_INSET,
            mouth.half_width / FULL_MOUTH.half_width,
        ) * size;

        Some(Transform::from_parts(
            tunnel.to_matrix().mul_point(local),
            tunnel.rotation(),
            scale,
        ))
    }
}

/// What an object is, as named in level files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Tunnel(TunnelKind),
    Ground { sloped: bool },
    Pillar,
    Ball,
    Prop,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tunnel(kind) => write!(f, "Tunnel({kind:?})"),
            Self::Ground { sloped: true } => f.write_str("Ground(Slope)"),
            Self::Ground { sloped: false } => f.write_str("Ground(Flat)"),
            Self::Pillar => f.write_str("Pillar"),
            Self::Ball => f.write_str("Ball"),
            Self::Prop => f.write_str("Prop"),
        }
    }
}

/// Static placement or full physical state.
#[derive(Debug, Clone)]
pub enum Body {
    Static(Transform),
    Physical(PhysicalBody),
}

#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub kind: ObjectKind,
    pub body: Body,
    /// Renderable and collidable geometry in object-local space.
    pub mesh: Option<Mesh>,
    pub color: u32,
}

impl SceneObject {
    pub fn new(
        name: impl Into<String>,
        kind: ObjectKind,
        body: Body,
        mesh: Option<Mesh>,
        color: u32,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            body,
            mesh,
            color,
        }
    }

    /// A bouncing ball of unit local radius.
    pub fn ball(name: impl Into<String>, transform: Transform, color: u32) -> Self {
        let mut body = PhysicalBody::new(transform);
        body.hit_spheres.push(Sphere::new(Vec3::ZERO, 1.0));
        body.bounce = 0.6;
        body.friction = 0.05;
        Self::new(
            name,
            ObjectKind::Ball,
            Body::Physical(body),
            Some(Mesh::uv_sphere(8, 12)),
            color,
        )
    }

    pub fn transform(&self) -> &Transform {
        match &self.body {
            Body::Static(transform) => transform,
            Body::Physical(body) => &body.transform,
        }
    }

    pub fn local_to_world(&self) -> Mat4 {
        match &self.body {
            Body::Static(transform) => transform.to_matrix(),
            Body::Physical(body) => body.local_to_world(),
        }
    }

    pub fn physical(&self) -> Option<&PhysicalBody> {
        match &self.body {
            Body::Physical(body) => Some(body),
            Body::Static(_) => None,
        }
    }

    pub fn physical_mut(&mut self) -> Option<&mut PhysicalBody> {
        match &mut self.body {
            Body::Physical(body) => Some(body),
            Body::Static(_) => None,
        }
    }

    /// Advances physical objects by `dt`; static objects ignore it.
    pub fn update(&mut self, dt: f32) {
        if let Some(body) = self.physical_mut() {
            body.update(dt);
        }
    }
}

/// Everything the renderer and the simulation share.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub portals: PortalSet,
    pub sky: Sky,
    pub light: DirectionalLight,
}

impl Scene {
    pub fn new(objects: Vec<SceneObject>, portals: PortalSet) -> Self {
        Self {
            objects,
            portals,
            sky: Sky::default(),
            light: DirectionalLight::default(),
        }
    }

    pub fn find(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn normal_tunnel_doors_sit_at_both_mouths() {
        let mut t = Transform::new();
        t.set_position(Vec3::new(2.0, 0.0, 0.0));
        let door1 = TunnelKind::Normal.door_frame(&t, 1).unwrap();
        let door2 = TunnelKind::Normal.door_frame(&t, 2).unwrap();

        assert_abs_diff_eq!(door1.position(), Vec3::new(2.0, 1.0, 1.0), epsilon = 1e-6);
        assert_abs_diff_eq!(door2.position(), Vec3::new(2.0, 1.0, -1.0), epsilon = 1e-6);
        assert_abs_diff_eq!(door1.scale(), Vec3::new(0.6, 0.999, 1.0), epsilon = 1e-6);
        assert!(TunnelKind::Normal.door_frame(&t, 3).is_none());
    }

    #[test]
    fn scale_tunnel_exit_is_half_size() {
        let mut t = Transform::new();
        t.set_scale_uniform(2.0);
        let exit = TunnelKind::Scale.door_frame(&t, 2).unwrap();
        assert_abs_diff_eq!(exit.position(), Vec3::new(0.0, 1.0, -2.0), epsilon = 1e-6);
        assert_abs_diff_eq!(exit.scale(), Vec3::new(0.6, 0.998, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn slope_tunnel_exit_is_lower() {
        let exit = TunnelKind::Slope.door_frame(&Transform::new(), 2).unwrap();
        assert_abs_diff_eq!(exit.position(), Vec3::new(0.0, -1.0, -1.0), epsilon = 1e-6);
    }

    #[test]
    fn subtype_parsing() {
        assert_eq!(TunnelKind::parse("SCALE"), Some(TunnelKind::Scale));
        assert_eq!(TunnelKind::parse(""), Some(TunnelKind::Normal));
        assert_eq!(TunnelKind::parse("spiral"), None);
    }

    #[test]
    fn only_physical_objects_expose_a_body() {
        let wall = SceneObject::new(
            "wall",
            ObjectKind::Pillar,
            Body::Static(Transform::new()),
            None,
            0,
        );
        let mut ball = SceneObject::ball("ball", Transform::new(), 0);
        assert!(wall.physical().is_none());
        assert!(ball.physical_mut().is_some());
    }
}
