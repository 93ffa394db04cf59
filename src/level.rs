//! Level files and turning them into a scene.
//!
//! Levels are JSON documents listing objects. Building one is two-phase:
//! [`build_level`] creates every object and portal and returns the links it
//! could not wire yet as a queue of [`PendingConnection`]s, which
//! [`resolve_connections`](crate::portal::resolve_connections) then drains.
//!
//! ```json
//! {
//!   "name": "loop",
//!   "player_start": [0, 1.5, -3],
//!   "objects": [
//!     { "type": "Ground", "scale": 20 },
//!     { "type": "Tunnel", "id": "A", "position": [0, 0, 0],
//!       "portals": [{ "door": 2, "connects_to": "B.door1" }] },
//!     { "type": "Tunnel", "subtype": "Scale", "id": "B", "position": [10, 0, 0] }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::colors;
use crate::config::EngineConfig;
use crate::math::vec3::Vec3;
use crate::mesh::Mesh;
use crate::portal::{DoorRef, PendingConnection, PortalError, PortalId, PortalSet};
use crate::scene::{Body, ObjectKind, SceneObject, TunnelKind};
use crate::transform::Transform;

#[derive(Error, Debug)]
pub enum LevelError {
    #[error("failed to read level file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse level file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no level registered as '{0}'")]
    UnknownLevel(String),

    #[error("level needs more than the {limit} portals allowed")]
    TooManyPortals { limit: usize },

    #[error(transparent)]
    Portal(PortalError),
}

impl From<PortalError> for LevelError {
    fn from(err: PortalError) -> Self {
        match err {
            PortalError::CapacityExceeded { limit } => LevelError::TooManyPortals { limit },
            other => LevelError::Portal(other),
        }
    }
}

/// `scale` may be one number or a list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScaleRecord {
    Uniform(f32),
    Vector(Vec<f32>),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PortalLink {
    pub door: u32,
    /// `"<tunnel>.door<N>"`.
    pub connects_to: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObjectRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub subtype: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub position: Vec<f32>,
    /// Euler angles in radians.
    #[serde(default)]
    pub rotation: Vec<f32>,
    #[serde(default)]
    pub scale: Option<ScaleRecord>,
    #[serde(default)]
    pub color: Option<[u8; 3]>,
    /// OBJ file for `Prop`, relative to the level file.
    #[serde(default)]
    pub mesh: Option<PathBuf>,
    #[serde(default)]
    pub portals: Vec<PortalLink>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LevelDescription {
    #[serde(default = "default_level_name")]
    pub name: String,
    #[serde(default)]
    pub player_start: Option<[f32; 3]>,
    #[serde(default)]
    pub objects: Vec<ObjectRecord>,
    /// Directory relative asset paths resolve against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

fn default_level_name() -> String {
    "Unnamed Level".to_string()
}

impl LevelDescription {
    pub fn from_json(text: &str) -> Result<Self, LevelError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut desc = Self::from_json(&text)?;
        desc.base_dir = path.parent().map(Path::to_path_buf);
        Ok(desc)
    }
}

/// Maps level names to files.
#[derive(Debug, Clone, Default)]
pub struct LevelManager {
    levels: BTreeMap<String, PathBuf>,
}

impl LevelManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every `*.json` in `dir` under its file stem.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, LevelError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|source| LevelError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut manager = Self::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem() {
                    manager.register(stem.to_string_lossy(), path.clone());
                }
            }
        }
        Ok(manager)
    }

    pub fn register(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.levels.insert(name.into(), path.into());
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.levels.keys().map(String::as_str)
    }

    pub fn path(&self, name: &str) -> Option<&Path> {
        self.levels.get(name).map(PathBuf::as_path)
    }

    pub fn load(&self, name: &str) -> Result<LevelDescription, LevelError> {
        let path = self
            .path(name)
            .ok_or_else(|| LevelError::UnknownLevel(name.to_string()))?;
        LevelDescription::from_file(path)
    }
}

/// Everything [`build_level`] produces.
#[derive(Debug, Clone)]
pub struct LevelBuild {
    pub name: String,
    pub objects: Vec<SceneObject>,
    pub portals: PortalSet,
    /// Links to doors that were not known when their source was built.
    pub pending: Vec<PendingConnection>,
    pub player_start: Vec3,
}

/// Reads up to three components; anything else logs and yields `default`.
fn vec3_or(values: &[f32], default: Vec3, field: &str, id: &str) -> Vec3 {
    match values {
        [] => default,
        [x, y, z, ..] => Vec3::new(*x, *y, *z),
        _ => {
            warn!("object '{id}': {field} needs 3 components, using {default:?}");
            default
        }
    }
}

fn scale_of(record: &ObjectRecord) -> Vec3 {
    match &record.scale {
        None => Vec3::ONE,
        Some(ScaleRecord::Uniform(s)) => Vec3::splat(*s),
        Some(ScaleRecord::Vector(v)) => match v.as_slice() {
            [s] => Vec3::splat(*s),
            [x, y, z, ..] => Vec3::new(*x, *y, *z),
            _ => {
                warn!("object '{}': invalid scale, using 1", record.id);
                Vec3::ONE
            }
        },
    }
}

fn transform_of(record: &ObjectRecord) -> Transform {
    Transform::from_parts(
        vec3_or(&record.position, Vec3::ZERO, "position", &record.id),
        vec3_or(&record.rotation, Vec3::ZERO, "rotation", &record.id),
        scale_of(record),
    )
}

/// Builds objects and portals. Connections are queued, not made.
///
/// Authoring mistakes (unknown types, bad links, unreadable meshes) skip the
/// offending object or link with a warning. Running out of portal slots is
/// [`LevelError::TooManyPortals`].
pub fn build_level(desc: &LevelDescription, config: &EngineConfig) -> Result<LevelBuild, LevelError> {
    let mut objects = Vec::with_capacity(desc.objects.len());
    let mut portals = PortalSet::with_limit(config.max_portals);
    let mut pending = Vec::new();

    for (index, record) in desc.objects.iter().enumerate() {
        let name = if record.id.is_empty() {
            format!("{}#{index}", record.kind)
        } else {
            record.id.clone()
        };
        let transform = transform_of(record);
        let color = record.color.map(|[r, g, b]| colors::rgb(r, g, b));

        let object = match record.kind.to_ascii_lowercase().as_str() {
            "tunnel" => {
                let Some(kind) = TunnelKind::parse(&record.subtype) else {
                    warn!("tunnel '{name}': unknown subtype '{}', skipped", record.subtype);
                    continue;
                };
                let doors = build_doors(&mut portals, kind, &transform, &record.id)?;
                queue_links(record, &doors, &mut pending);
                SceneObject::new(
                    name,
                    ObjectKind::Tunnel(kind),
                    Body::Static(transform),
                    Some(Mesh::tunnel(&kind.shape())),
                    color.unwrap_or(colors::TUNNEL),
                )
            }
            "ground" => {
                let sloped = record.subtype.eq_ignore_ascii_case("slope");
                SceneObject::new(
                    name,
                    ObjectKind::Ground { sloped },
                    Body::Static(transform),
                    Some(Mesh::ground(sloped)),
                    color.unwrap_or(colors::GROUND),
                )
            }
            "pillar" => SceneObject::new(
                name,
                ObjectKind::Pillar,
                Body::Static(transform),
                Some(Mesh::cuboid(
                    "pillar",
                    Vec3::new(-0.15, 0.0, -0.15),
                    Vec3::new(0.15, 3.0, 0.15),
                )),
                color.unwrap_or(colors::PILLAR),
            ),
            "ball" => SceneObject::ball(name, transform, color.unwrap_or(colors::BALL)),
            "prop" => {
                let Some(relative) = &record.mesh else {
                    warn!("prop '{name}' has no mesh, skipped");
                    continue;
                };
                let path = match &desc.base_dir {
                    Some(dir) => dir.join(relative),
                    None => relative.clone(),
                };
                let mesh = match Mesh::from_obj(&path) {
                    Ok(mesh) => mesh,
                    Err(err) => {
                        warn!("prop '{name}': {err}, skipped");
                        continue;
                    }
                };
                SceneObject::new(
                    name,
                    ObjectKind::Prop,
                    Body::Static(transform),
                    Some(mesh),
                    color.unwrap_or(colors::PROP),
                )
            }
            other => {
                warn!("object '{name}': unknown type '{other}', skipped");
                continue;
            }
        };
        debug!("built {} '{}'", object.kind, object.name);
        objects.push(object);
    }

    let player_start = desc
        .player_start
        .map(|[x, y, z]| Vec3::new(x, y, z))
        .unwrap_or(Vec3::new(0.0, config.player.height, 0.0));

    info!(
        "built level '{}': {} object(s), {} portal(s), {} pending link(s)",
        desc.name,
        objects.len(),
        portals.len(),
        pending.len()
    );
    Ok(LevelBuild {
        name: desc.name.clone(),
        objects,
        portals,
        pending,
        player_start,
    })
}

/// Adds both door portals of a tunnel; returns them indexed by door - 1.
fn build_doors(
    portals: &mut PortalSet,
    kind: TunnelKind,
    tunnel: &Transform,
    id: &str,
) -> Result<[PortalId; 2], LevelError> {
    let mut door = |n: u32| -> Result<PortalId, LevelError> {
        let frame = kind.door_frame(tunnel, n).unwrap_or(*tunnel);
        Ok(portals.add(frame, Some(DoorRef::new(id, n)))?)
    };
    Ok([door(1)?, door(2)?])
}

fn queue_links(record: &ObjectRecord, doors: &[PortalId; 2], pending: &mut Vec<PendingConnection>) {
    for link in &record.portals {
        let Some(&portal) = (link.door as usize)
            .checked_sub(1)
            .and_then(|i| doors.get(i))
        else {
            warn!("tunnel '{}': no door {}, link ignored", record.id, link.door);
            continue;
        };
        let Some(target) = DoorRef::parse(&link.connects_to) else {
            warn!(
                "tunnel '{}': malformed link '{}', ignored",
                record.id, link.connects_to
            );
            continue;
        };
        pending.push(PendingConnection { portal, target });
    }
}
