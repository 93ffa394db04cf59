//! Portals: bounded planar quads whose two faces are glued to faces of
//! other portals.
//!
//! Portals live in a [`PortalSet`] arena and are addressed by [`PortalId`].
//! A portal's local quad spans `[-1, 1]` in X and Y at `z = 0`; its normal is
//! the local +Z axis in world space.

mod resolver;
mod warp;

pub use resolver::{resolve_connections, DoorRef, PendingConnection, ResolveReport};
pub use warp::{connect_warps, FaceId, PortalId, Side, Warp};

use log::warn;
use thiserror::Error;

use crate::math::{mat4::Mat4, vec3::Vec3};
use crate::transform::Transform;

/// Half extent of the portal quad in local units.
pub const PORTAL_EXTENT: f32 = 1.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PortalError {
    #[error("portal limit of {limit} reached")]
    CapacityExceeded { limit: usize },

    #[error("{0} cannot be connected to itself")]
    SelfLoop(PortalId),

    #[error("unknown {0}")]
    UnknownPortal(PortalId),

    #[error("{0} has a frame that cannot be inverted")]
    DegenerateFrame(PortalId),
}

/// A two-sided portal with one warp per face.
#[derive(Debug, Clone)]
pub struct Portal {
    id: PortalId,
    transform: Transform,
    local_to_world: Mat4,
    world_to_local: Mat4,
    /// Set when the frame has no inverse (e.g. zero scale). Such a portal has
    /// no extent: it is never crossed and never connected.
    degenerate: bool,
    /// Warp used when looking at or crossing from the front side.
    pub front: Warp,
    /// Warp used when looking at or crossing from the back side.
    pub back: Warp,
    source: Option<DoorRef>,
}

impl Portal {
    fn new(id: PortalId, transform: Transform, source: Option<DoorRef>) -> Self {
        let inverse = transform.try_inverse_matrix();
        if inverse.is_none() {
            warn!("{id} has degenerate scale {:?}; it will stay unconnected", transform.scale());
        }
        Self {
            id,
            transform,
            local_to_world: transform.to_matrix(),
            world_to_local: inverse.unwrap_or_else(Mat4::identity),
            degenerate: inverse.is_none(),
            front: Warp::new(FaceId::new(id, Side::Front)),
            back: Warp::new(FaceId::new(id, Side::Back)),
            source,
        }
    }

    pub fn id(&self) -> PortalId {
        self.id
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position()
    }

    /// The tunnel door this portal was built for, if any.
    pub fn source(&self) -> Option<&DoorRef> {
        self.source.as_ref()
    }

    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    pub fn local_to_world(&self) -> Mat4 {
        self.local_to_world
    }

    pub fn world_to_local(&self) -> Mat4 {
        self.world_to_local
    }

    /// Unit normal; points into the front half-space.
    pub fn normal(&self) -> Vec3 {
        self.transform.forward()
    }

    pub fn warp(&self, side: Side) -> &Warp {
        match side {
            Side::Front => &self.front,
            Side::Back => &self.back,
        }
    }

    pub fn warp_mut(&mut self, side: Side) -> &mut Warp {
        match side {
            Side::Front => &mut self.front,
            Side::Back => &mut self.back,
        }
    }

    /// Side of the plane `point` lies on. Points on the plane count as back.
    pub fn side_of(&self, point: Vec3) -> Side {
        if self.normal().dot(point - self.position()) > 0.0 {
            Side::Front
        } else {
            Side::Back
        }
    }

    /// Unit offset from the plane toward the side `point` is on.
    pub fn bump(&self, point: Vec3) -> Vec3 {
        match self.side_of(point) {
            Side::Front => self.normal(),
            Side::Back => -self.normal(),
        }
    }

    /// Tests the segment `a -> b` against the portal quad shifted by `bump`.
    ///
    /// Returns the face crossed, named after the side `a` started on, or
    /// `None` when both ends are on the same side, the segment lies in the
    /// plane, or the hit point falls outside the quad. A degenerate portal is
    /// never hit.
    pub fn intersects(&self, a: Vec3, b: Vec3, bump: Vec3) -> Option<Side> {
        if self.degenerate {
            return None;
        }
        let n = self.normal();
        let origin = self.position() + bump;
        let da = n.dot(a - origin);
        let db = n.dot(b - origin);
        if da * db > 0.0 || (da - db).abs() <= f32::EPSILON {
            return None;
        }

        let t = da / (da - db);
        let hit = a + (b - a) * t;
        let local = self.world_to_local.mul_point(hit - bump);
        if local.x.abs() > PORTAL_EXTENT || local.y.abs() > PORTAL_EXTENT {
            return None;
        }

        Some(if da > db { Side::Front } else { Side::Back })
    }

    /// Distance from `point` to the nearest point of the portal quad, or to
    /// its position when the quad is degenerate.
    pub fn distance_to(&self, point: Vec3) -> f32 {
        if self.degenerate {
            return (self.position() - point).magnitude();
        }
        let local = self.world_to_local.mul_point(point);
        let clamped = Vec3::new(
            local.x.clamp(-PORTAL_EXTENT, PORTAL_EXTENT),
            local.y.clamp(-PORTAL_EXTENT, PORTAL_EXTENT),
            0.0,
        );
        (self.local_to_world.mul_point(clamped) - point).magnitude()
    }
}

/// Arena of every portal in a level.
#[derive(Debug, Clone, Default)]
pub struct PortalSet {
    portals: Vec<Portal>,
    limit: usize,
}

impl PortalSet {
    /// An empty set that refuses to grow past `limit` portals.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            portals: Vec::new(),
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.portals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.portals.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Adds an unconnected portal.
    pub fn add(
        &mut self,
        transform: Transform,
        source: Option<DoorRef>,
    ) -> Result<PortalId, PortalError> {
        if self.portals.len() >= self.limit {
            return Err(PortalError::CapacityExceeded { limit: self.limit });
        }
        let id = PortalId(self.portals.len());
        self.portals.push(Portal::new(id, transform, source));
        Ok(id)
    }

    pub fn get(&self, id: PortalId) -> Option<&Portal> {
        self.portals.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Portal> {
        self.portals.iter()
    }

    pub fn warp(&self, face: FaceId) -> Option<&Warp> {
        self.get(face.portal).map(|p| p.warp(face.side))
    }

    /// Portals whose source door matches `door`.
    pub fn find_by_door<'a>(&'a self, door: &'a DoorRef) -> impl Iterator<Item = &'a Portal> {
        self.portals
            .iter()
            .filter(move |p| p.source.as_ref() == Some(door))
    }

    /// Distance from `point` to the closest portal quad, or infinity.
    pub fn nearest_distance(&self, point: Vec3) -> f32 {
        self.portals
            .iter()
            .map(|p| p.distance_to(point))
            .fold(f32::INFINITY, f32::min)
    }

    /// Connects two faces of different portals.
    ///
    /// A face that was already linked elsewhere is unlinked first, and its
    /// old partner returns to identity, so links always stay symmetric.
    /// Degenerate portals are rejected and nothing is unlinked.
    pub fn connect_faces(&mut self, a: FaceId, b: FaceId) -> Result<(), PortalError> {
        if a.portal == b.portal {
            return Err(PortalError::SelfLoop(a.portal));
        }
        for face in [a, b] {
            let portal = self
                .get(face.portal)
                .ok_or(PortalError::UnknownPortal(face.portal))?;
            if portal.degenerate {
                return Err(PortalError::DegenerateFrame(face.portal));
            }
        }
        for face in [a, b] {
            let old = self.warp(face).and_then(Warp::to_face);
            if let Some(old) = old.filter(|old| *old != a && *old != b) {
                if let Some(p) = self.portals.get_mut(old.portal.0) {
                    p.warp_mut(old.side).disconnect();
                }
            }
        }

        let (pa, pb) = pair_mut(&mut self.portals, a.portal.0, b.portal.0);
        let (ta, tb) = (pa.transform, pb.transform);
        connect_warps(pa.warp_mut(a.side), &ta, pb.warp_mut(b.side), &tb);
        Ok(())
    }

    /// Glues portal `a` to portal `b`: the front of each to the back of the other.
    pub fn connect(&mut self, a: PortalId, b: PortalId) -> Result<(), PortalError> {
        self.connect_faces(FaceId::new(a, Side::Front), FaceId::new(b, Side::Back))?;
        self.connect_faces(FaceId::new(a, Side::Back), FaceId::new(b, Side::Front))
    }
}

/// Mutable references to two distinct elements.
fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(i, j);
    if i < j {
        let (left, right) = items.split_at_mut(j);
        (&mut left[i], &mut right[0])
    } else {
        let (left, right) = items.split_at_mut(i);
        (&mut right[0], &mut left[j])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn portal_at(set: &mut PortalSet, position: Vec3, yaw: f32) -> PortalId {
        let mut t = Transform::new();
        t.set_position(position).set_yaw(yaw);
        set.add(t, None).unwrap()
    }

    #[test]
    fn capacity_is_enforced() {
        let mut set = PortalSet::with_limit(1);
        portal_at(&mut set, Vec3::ZERO, 0.0);
        let err = set.add(Transform::new(), None).unwrap_err();
        assert_eq!(err, PortalError::CapacityExceeded { limit: 1 });
    }

    #[test]
    fn connect_links_front_to_back_both_ways() {
        let mut set = PortalSet::with_limit(4);
        let a = portal_at(&mut set, Vec3::ZERO, 0.0);
        let b = portal_at(&mut set, Vec3::new(5.0, 0.0, 0.0), 0.0);
        set.connect(a, b).unwrap();

        let pa = set.get(a).unwrap();
        let pb = set.get(b).unwrap();
        assert_eq!(pa.front.to_face(), Some(FaceId::new(b, Side::Back)));
        assert_eq!(pa.back.to_face(), Some(FaceId::new(b, Side::Front)));
        assert_eq!(pb.back.to_face(), Some(FaceId::new(a, Side::Front)));
        assert_eq!(pb.front.to_face(), Some(FaceId::new(a, Side::Back)));
        assert_eq!(pa.front.delta, pb.back.delta_inv);
    }

    #[test]
    fn self_connection_is_rejected() {
        let mut set = PortalSet::with_limit(2);
        let a = portal_at(&mut set, Vec3::ZERO, 0.0);
        assert_eq!(set.connect(a, a), Err(PortalError::SelfLoop(a)));
        assert!(!set.get(a).unwrap().front.is_connected());
    }

    #[test]
    fn relinking_unlinks_old_partner() {
        let mut set = PortalSet::with_limit(3);
        let a = portal_at(&mut set, Vec3::ZERO, 0.0);
        let b = portal_at(&mut set, Vec3::new(5.0, 0.0, 0.0), 0.0);
        let c = portal_at(&mut set, Vec3::new(-5.0, 0.0, 0.0), 0.0);
        set.connect(a, b).unwrap();
        set.connect(c, b).unwrap();

        assert!(!set.get(a).unwrap().front.is_connected());
        assert!(!set.get(a).unwrap().back.is_connected());
        assert_eq!(
            set.get(b).unwrap().back.to_face(),
            Some(FaceId::new(c, Side::Front))
        );
    }

    #[test]
    fn intersects_reports_starting_side() {
        let mut set = PortalSet::with_limit(1);
        let id = portal_at(&mut set, Vec3::new(0.0, 1.0, 0.0), 0.0);
        let portal = set.get(id).unwrap();
        let front = Vec3::new(0.2, 1.0, 0.5);
        let back = Vec3::new(0.2, 1.0, -0.5);
        assert_eq!(portal.intersects(front, back, Vec3::ZERO), Some(Side::Front));
        assert_eq!(portal.intersects(back, front, Vec3::ZERO), Some(Side::Back));
        assert_eq!(portal.intersects(front, front * 1.1, Vec3::ZERO), None);
    }

    #[test]
    fn grazing_outside_extent_does_not_intersect() {
        let mut set = PortalSet::with_limit(1);
        let id = portal_at(&mut set, Vec3::ZERO, 0.0);
        let portal = set.get(id).unwrap();
        let a = Vec3::new(1.01, 0.0, 0.1);
        let b = Vec3::new(1.01, 0.0, -0.1);
        assert_eq!(portal.intersects(a, b, Vec3::ZERO), None);
    }

    #[test]
    fn zero_scale_portal_has_no_extent() {
        let mut set = PortalSet::with_limit(2);
        let mut t = Transform::new();
        t.set_position(Vec3::new(5.0, 0.0, 5.0)).set_scale_uniform(0.0);
        let flat = set.add(t, None).unwrap();
        let other = portal_at(&mut set, Vec3::new(-5.0, 0.0, 0.0), 0.0);

        let portal = set.get(flat).unwrap();
        assert!(portal.is_degenerate());
        let a = Vec3::new(0.0, 0.0, 5.01);
        let b = Vec3::new(0.0, 0.0, 4.99);
        assert_eq!(portal.intersects(a, b, Vec3::ZERO), None);
        assert_relative_eq!(portal.distance_to(Vec3::new(5.0, 0.0, 8.0)), 3.0);

        assert_eq!(set.connect(flat, other), Err(PortalError::DegenerateFrame(flat)));
        assert_eq!(set.connect(other, flat), Err(PortalError::DegenerateFrame(flat)));
        assert!(!set.get(flat).unwrap().front.is_connected());
        assert!(!set.get(other).unwrap().front.is_connected());
        assert!(!set.get(other).unwrap().back.is_connected());
    }

    #[test]
    fn degenerate_link_keeps_existing_partner() {
        let mut set = PortalSet::with_limit(3);
        let a = portal_at(&mut set, Vec3::ZERO, 0.0);
        let b = portal_at(&mut set, Vec3::new(5.0, 0.0, 0.0), 0.0);
        let mut t = Transform::new();
        t.set_scale_uniform(0.0);
        let flat = set.add(t, None).unwrap();
        set.connect(a, b).unwrap();

        assert!(set.connect(a, flat).is_err());
        assert_eq!(
            set.get(a).unwrap().front.to_face(),
            Some(FaceId::new(b, Side::Back))
        );
    }

    #[test]
    fn bump_points_toward_query_side() {
        let mut set = PortalSet::with_limit(1);
        let id = portal_at(&mut set, Vec3::ZERO, 0.0);
        let portal = set.get(id).unwrap();
        assert_relative_eq!(portal.bump(Vec3::new(0.0, 0.0, 3.0)), Vec3::FORWARD);
        assert_relative_eq!(portal.bump(Vec3::new(0.0, 0.0, -3.0)), -Vec3::FORWARD);
    }

    #[test]
    fn distance_clamps_to_quad() {
        let mut set = PortalSet::with_limit(1);
        let id = portal_at(&mut set, Vec3::ZERO, 0.0);
        let portal = set.get(id).unwrap();
        assert_relative_eq!(portal.distance_to(Vec3::new(0.5, 0.5, 2.0)), 2.0);
        assert_abs_diff_eq!(
            portal.distance_to(Vec3::new(4.0, 0.0, 0.0)),
            3.0,
            epsilon = 1e-6
        );
        assert_relative_eq!(set.nearest_distance(Vec3::new(0.0, 0.0, -0.25)), 0.25);
    }
}
