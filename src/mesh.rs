//! Triangle meshes and the procedural shapes levels are built from.
//!
//! A [`Mesh`] is indexed geometry in object-local space plus the quad
//! colliders physics tests against. Procedural constructors cover the level
//! building blocks; arbitrary props can be loaded from OBJ files.

use std::path::Path;

use thiserror::Error;

use crate::collider::Collider;
use crate::math::vec3::Vec3;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to load OBJ file: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("OBJ file {0} contains no triangles")]
    Empty(String),
}

/// A triangle as three 0-based vertex indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub a: usize,
    pub b: usize,
    pub c: usize,
}

/// Opening of a tunnel mouth in tunnel-local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Opening {
    pub half_width: f32,
    pub bottom: f32,
    pub top: f32,
}

impl Opening {
    pub const fn new(half_width: f32, bottom: f32, top: f32) -> Self {
        Self {
            half_width,
            bottom,
            top,
        }
    }

    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }
}

/// Cross-sections of a tunnel at its `+Z` mouth (`entry`) and `-Z` mouth (`exit`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TunnelShape {
    pub entry: Opening,
    pub exit: Opening,
    pub wall: f32,
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    name: String,
    vertices: Vec<Vec3>,
    faces: Vec<Face>,
    colliders: Vec<Collider>,
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    /// Iterates the triangles as vertex positions.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.faces
            .iter()
            .map(|f| [self.vertices[f.a], self.vertices[f.b], self.vertices[f.c]])
    }

    /// Appends a planar quad as two triangles, optionally with a collider.
    pub fn add_quad(&mut self, corners: [Vec3; 4], solid: bool) {
        let base = self.vertices.len();
        self.vertices.extend_from_slice(&corners);
        self.faces.push(Face {
            a: base,
            b: base + 1,
            c: base + 2,
        });
        self.faces.push(Face {
            a: base,
            b: base + 2,
            c: base + 3,
        });
        if solid {
            self.colliders.push(Collider::from_quad(corners));
        }
    }

    /// The portal surface: `[-1, 1]` in X and Y at `z = 0`, no collider.
    pub fn portal_quad() -> Self {
        let mut mesh = Self::new("portal");
        mesh.add_quad(
            [
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(-1.0, 1.0, 0.0),
            ],
            false,
        );
        mesh
    }

    /// Axis-aligned box with a collider on every side.
    pub fn cuboid(name: impl Into<String>, min: Vec3, max: Vec3) -> Self {
        let mut mesh = Self::new(name);
        let p = |x: f32, y: f32, z: f32| Vec3::new(x, y, z);
        let (a, b) = (min, max);
        // -Z, +Z, -X, +X, -Y, +Y
        mesh.add_quad([p(a.x, a.y, a.z), p(b.x, a.y, a.z), p(b.x, b.y, a.z), p(a.x, b.y, a.z)], true);
        mesh.add_quad([p(b.x, a.y, b.z), p(a.x, a.y, b.z), p(a.x, b.y, b.z), p(b.x, b.y, b.z)], true);
        mesh.add_quad([p(a.x, a.y, b.z), p(a.x, a.y, a.z), p(a.x, b.y, a.z), p(a.x, b.y, b.z)], true);
        mesh.add_quad([p(b.x, a.y, a.z), p(b.x, a.y, b.z), p(b.x, b.y, b.z), p(b.x, b.y, a.z)], true);
        mesh.add_quad([p(a.x, a.y, b.z), p(b.x, a.y, b.z), p(b.x, a.y, a.z), p(a.x, a.y, a.z)], true);
        mesh.add_quad([p(a.x, b.y, a.z), p(b.x, b.y, a.z), p(b.x, b.y, b.z), p(a.x, b.y, b.z)], true);
        mesh
    }

    /// Unit ground tile in X/Z. A sloped tile drops to `y = -2` at `z = -1`.
    pub fn ground(sloped: bool) -> Self {
        let far_y = if sloped { -2.0 } else { 0.0 };
        let mut mesh = Self::new("ground");
        mesh.add_quad(
            [
                Vec3::new(-1.0, far_y, -1.0),
                Vec3::new(1.0, far_y, -1.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(-1.0, 0.0, 1.0),
            ],
            true,
        );
        mesh
    }

    /// A walled tunnel running from its entry mouth at `z = 1` to its exit at `z = -1`.
    ///
    /// Side walls and roof are solid on both faces. A floor is only added
    /// when the mouths sit at different heights, since a level floor already
    /// covers the flat case.
    pub fn tunnel(shape: &TunnelShape) -> Self {
        let TunnelShape { entry, exit, wall } = *shape;
        let mut mesh = Self::new("tunnel");
        let inner = |o: Opening, z: f32| {
            [
                Vec3::new(-o.half_width, o.bottom, z),
                Vec3::new(-o.half_width, o.top, z),
                Vec3::new(o.half_width, o.top, z),
                Vec3::new(o.half_width, o.bottom, z),
            ]
        };
        let outer = |o: Opening, z: f32| {
            let w = o.half_width + wall;
            let t = o.top + wall;
            [
                Vec3::new(-w, o.bottom, z),
                Vec3::new(-w, t, z),
                Vec3::new(w, t, z),
                Vec3::new(w, o.bottom, z),
            ]
        };

        // Corner order: bottom-left, top-left, top-right, bottom-right.
        let (ie, ix) = (inner(entry, 1.0), inner(exit, -1.0));
        let (oe, ox) = (outer(entry, 1.0), outer(exit, -1.0));

        for (e, x) in [(ie, ix), (oe, ox)] {
            mesh.add_quad([e[0], e[1], x[1], x[0]], true); // left
            mesh.add_quad([e[3], e[2], x[2], x[3]], true); // right
            mesh.add_quad([e[1], e[2], x[2], x[1]], true); // roof
        }
        if entry.bottom != exit.bottom {
            mesh.add_quad([ie[0], ie[3], ix[3], ix[0]], true);
        }

        // Rims closing the wall thickness at both mouths.
        for (i, o) in [(ie, oe), (ix, ox)] {
            mesh.add_quad([o[0], o[1], i[1], i[0]], false);
            mesh.add_quad([i[3], i[2], o[2], o[3]], false);
            mesh.add_quad([i[1], o[1], o[2], i[2]], false);
        }
        mesh
    }

    /// Latitude/longitude sphere of radius 1 around the origin.
    pub fn uv_sphere(rings: usize, segments: usize) -> Self {
        let rings = rings.max(2);
        let segments = segments.max(3);
        let mut mesh = Self::new("sphere");

        for ring in 0..=rings {
            let phi = std::f32::consts::PI * ring as f32 / rings as f32;
            for seg in 0..segments {
                let theta = std::f32::consts::TAU * seg as f32 / segments as f32;
                mesh.vertices.push(Vec3::new(
                    phi.sin() * theta.cos(),
                    phi.cos(),
                    phi.sin() * theta.sin(),
                ));
            }
        }
        for ring in 0..rings {
            for seg in 0..segments {
                let next = (seg + 1) % segments;
                let a = ring * segments + seg;
                let b = ring * segments + next;
                let c = (ring + 1) * segments + next;
                let d = (ring + 1) * segments + seg;
                if ring != 0 {
                    mesh.faces.push(Face { a, b, c: d });
                }
                if ring != rings - 1 {
                    mesh.faces.push(Face { a: b, b: c, c: d });
                }
            }
        }
        mesh
    }

    /// Loads every object in an OBJ file into a single mesh.
    ///
    /// OBJ props are decorative and carry no colliders.
    pub fn from_obj(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let (models, _materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "prop".to_string());
        let mut mesh = Self::new(name);
        for model in models {
            let base = mesh.vertices.len();
            mesh.vertices.extend(
                model
                    .mesh
                    .positions
                    .chunks_exact(3)
                    .map(|p| Vec3::new(p[0], p[1], p[2])),
            );
            mesh.faces.extend(model.mesh.indices.chunks_exact(3).map(|i| Face {
                a: base + i[0] as usize,
                b: base + i[1] as usize,
                c: base + i[2] as usize,
            }));
        }

        if mesh.faces.is_empty() {
            return Err(LoadError::Empty(path.display().to_string()));
        }
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRAIGHT: TunnelShape = TunnelShape {
        entry: Opening::new(0.6, 0.0, 2.0),
        exit: Opening::new(0.6, 0.0, 2.0),
        wall: 0.2,
    };

    #[test]
    fn portal_quad_is_two_triangles_without_colliders() {
        let quad = Mesh::portal_quad();
        assert_eq!(quad.faces().len(), 2);
        assert!(quad.colliders().is_empty());
    }

    #[test]
    fn cuboid_has_six_solid_sides() {
        let mesh = Mesh::cuboid("box", Vec3::splat(-1.0), Vec3::ONE);
        assert_eq!(mesh.faces().len(), 12);
        assert_eq!(mesh.colliders().len(), 6);
    }

    #[test]
    fn straight_tunnel_has_no_floor() {
        let mesh = Mesh::tunnel(&STRAIGHT);
        // inner and outer walls + roof, no floor
        assert_eq!(mesh.colliders().len(), 6);
        assert!(mesh.vertices().iter().all(|v| v.y >= 0.0));
    }

    #[test]
    fn sloped_tunnel_gets_a_floor() {
        let shape = TunnelShape {
            exit: Opening::new(0.6, -2.0, 0.0),
            ..STRAIGHT
        };
        assert_eq!(Mesh::tunnel(&shape).colliders().len(), 7);
    }

    #[test]
    fn sphere_indices_are_in_range() {
        let mesh = Mesh::uv_sphere(6, 8);
        let n = mesh.vertices().len();
        assert!(mesh
            .faces()
            .iter()
            .all(|f| f.a < n && f.b < n && f.c < n));
        assert!(mesh.vertices().iter().all(|v| (v.magnitude() - 1.0).abs() < 1e-5));
    }

    #[test]
    fn missing_obj_is_an_error() {
        assert!(Mesh::from_obj("does/not/exist.obj").is_err());
    }
}
