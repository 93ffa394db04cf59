//! Warps: the rigid (possibly scaled) maps that glue two portal faces.
//!
//! A [`Warp`] lives on one face of a portal. Once connected, `delta` carries
//! world coordinates near that face to world coordinates near the partner
//! face, and `delta_inv` carries them back. The partner warp stores the same
//! pair swapped, so `a.delta == b.delta_inv` always holds.

use std::fmt;

use log::warn;

use crate::math::mat4::Mat4;
use crate::transform::Transform;

/// Arena handle of a portal inside a [`PortalSet`](super::PortalSet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortalId(pub(crate) usize);

impl PortalId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PortalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "portal#{}", self.0)
    }
}

/// Which side of a portal plane a face looks out of.
///
/// `Front` is the half-space the portal normal points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Front,
    Back,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Front => Side::Back,
            Side::Back => Side::Front,
        }
    }
}

/// Address of one face of one portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceId {
    pub portal: PortalId,
    pub side: Side,
}

impl FaceId {
    pub fn new(portal: PortalId, side: Side) -> Self {
        Self { portal, side }
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.side {
            Side::Front => "front",
            Side::Back => "back",
        };
        write!(f, "{}.{}", self.portal, side)
    }
}

/// The connection state of a single portal face.
#[derive(Debug, Clone, PartialEq)]
pub struct Warp {
    /// Maps the owning face's world to the partner face's world.
    pub delta: Mat4,
    /// Inverse of `delta`; what a camera looking through this face composes with.
    pub delta_inv: Mat4,
    from: FaceId,
    to: Option<FaceId>,
}

impl Warp {
    /// An unconnected warp: identity both ways.
    pub fn new(from: FaceId) -> Self {
        Self {
            delta: Mat4::identity(),
            delta_inv: Mat4::identity(),
            from,
            to: None,
        }
    }

    /// The face that owns this warp.
    pub fn from_face(&self) -> FaceId {
        self.from
    }

    /// The partner face, if connected.
    pub fn to_face(&self) -> Option<FaceId> {
        self.to
    }

    pub fn is_connected(&self) -> bool {
        self.to.is_some()
    }

    /// Returns the warp to identity with no partner.
    pub fn disconnect(&mut self) {
        self.delta = Mat4::identity();
        self.delta_inv = Mat4::identity();
        self.to = None;
    }
}

/// Connects two warps given the world frames of the portals that own them.
///
/// Both warps end up pointing at each other with mutually inverse deltas:
/// `a.delta = B.local_to_world * A.world_to_local` and `b.delta` is its
/// inverse. If either frame cannot be inverted both warps are left
/// unconnected at identity and `false` is returned.
pub fn connect_warps(a: &mut Warp, a_frame: &Transform, b: &mut Warp, b_frame: &Transform) -> bool {
    let (Some(a_world_to_local), Some(b_world_to_local)) =
        (a_frame.try_inverse_matrix(), b_frame.try_inverse_matrix())
    else {
        warn!(
            "cannot invert portal frame while connecting {} and {}; leaving both unconnected",
            a.from, b.from
        );
        a.disconnect();
        b.disconnect();
        return false;
    };

    a.to = Some(b.from);
    b.to = Some(a.from);
    a.delta = b_frame.to_matrix() * a_world_to_local;
    b.delta = a_frame.to_matrix() * b_world_to_local;
    a.delta_inv = b.delta;
    b.delta_inv = a.delta;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::vec3::Vec3;
    use approx::assert_abs_diff_eq;

    fn face(index: usize, side: Side) -> FaceId {
        FaceId::new(PortalId(index), side)
    }

    fn frame(position: Vec3, yaw: f32, scale: f32) -> Transform {
        let mut t = Transform::new();
        t.set_position(position).set_yaw(yaw).set_scale_uniform(scale);
        t
    }

    #[test]
    fn connected_deltas_are_inverse() {
        let fa = frame(Vec3::new(1.0, 0.0, 2.0), 0.3, 1.0);
        let fb = frame(Vec3::new(-4.0, 1.0, 7.0), -1.2, 0.5);
        let mut a = Warp::new(face(0, Side::Front));
        let mut b = Warp::new(face(1, Side::Back));
        connect_warps(&mut a, &fa, &mut b, &fb);

        assert_abs_diff_eq!(a.delta * a.delta_inv, Mat4::identity(), epsilon = 1e-5);
        assert_eq!(a.delta, b.delta_inv);
        assert_eq!(b.delta, a.delta_inv);
        assert_eq!(a.to_face(), Some(b.from_face()));
        assert_eq!(b.to_face(), Some(a.from_face()));
    }

    #[test]
    fn delta_maps_portal_center_to_partner_center() {
        let fa = frame(Vec3::new(0.0, 1.0, 0.0), 0.0, 1.0);
        let fb = frame(Vec3::new(10.0, 1.0, -3.0), 1.0, 2.0);
        let mut a = Warp::new(face(0, Side::Front));
        let mut b = Warp::new(face(1, Side::Back));
        connect_warps(&mut a, &fa, &mut b, &fb);

        assert_abs_diff_eq!(
            a.delta.mul_point(fa.position()),
            fb.position(),
            epsilon = 1e-5
        );
        assert_abs_diff_eq!(
            a.delta.mul_direction(fa.forward()),
            fb.forward() * 2.0,
            epsilon = 1e-5
        );
    }

    #[test]
    fn degenerate_frame_leaves_faces_unconnected() {
        let fa = frame(Vec3::ZERO, 0.0, 0.0);
        let fb = frame(Vec3::new(3.0, 0.0, 0.0), 0.0, 1.0);
        let mut a = Warp::new(face(0, Side::Front));
        let mut b = Warp::new(face(1, Side::Back));
        assert!(!connect_warps(&mut a, &fa, &mut b, &fb));

        assert!(!a.is_connected());
        assert!(!b.is_connected());
        assert_eq!(a.delta, Mat4::identity());
        assert_eq!(b.delta_inv, Mat4::identity());
    }

    #[test]
    fn disconnect_resets_to_identity() {
        let mut a = Warp::new(face(0, Side::Front));
        let mut b = Warp::new(face(1, Side::Back));
        connect_warps(
            &mut a,
            &frame(Vec3::ZERO, 0.0, 1.0),
            &mut b,
            &frame(Vec3::UP, 0.0, 1.0),
        );
        a.disconnect();
        assert!(!a.is_connected());
        assert_eq!(a.delta, Mat4::identity());
    }
}
