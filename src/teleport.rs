//! Carrying bodies through portals.
//!
//! Each step a body sweeps from `prev_position` to its current position. If
//! that segment passes through a connected portal face, the body is remapped
//! by the face's warp in one go: position, previous position, velocity, yaw
//! and physical scale all change together, so no observer sees a half-moved
//! body. The crossing test uses a plane nudged toward the side the body came
//! from and the remapped position is pushed the same distance past the
//! partner plane, so the body cannot re-trigger on the frame it arrives.
//!
//! Velocity goes through the full warp, scale included: a body entering a
//! half-size exit leaves at half the speed, matching its halved `p_scale`.
//! Speed is only preserved across connections of equal scale.

use log::trace;

use crate::physics::PhysicalBody;
use crate::portal::{FaceId, Portal, PortalSet};

/// Attempts to carry `body` through `portal`.
///
/// `bump_epsilon` is the crossing margin at unit physical scale; it is
/// multiplied by the body's `p_scale`. Returns `true` when the body was
/// remapped. A body that already crossed during this step, a miss, or an
/// unconnected face all leave the body untouched.
pub fn try_cross(body: &mut PhysicalBody, portal: &Portal, bump_epsilon: f32) -> bool {
    if body.crossed().is_some() {
        return false;
    }

    let bump = portal.bump(body.prev_position) * (bump_epsilon * body.p_scale);
    let Some(side) = portal.intersects(body.prev_position, body.position(), bump) else {
        return false;
    };
    let warp = portal.warp(side);
    if !warp.is_connected() {
        return false;
    }

    let delta = warp.delta;
    let position = delta.mul_point(body.position() - bump * 2.0);
    let forward = delta.mul_direction(body.transform.forward());

    body.velocity = delta.mul_direction(body.velocity);
    body.place(position);
    body.transform.set_yaw((-forward.x).atan2(forward.z));
    body.p_scale *= delta.x_axis().magnitude();
    body.record_crossing(warp.from_face());

    trace!(
        "body crossed {} -> {:?}, p_scale now {}",
        warp.from_face(),
        warp.to_face(),
        body.p_scale
    );
    true
}

/// Tests `body` against every portal, stopping at the first crossing.
pub fn cross_portals(
    body: &mut PhysicalBody,
    portals: &PortalSet,
    bump_epsilon: f32,
) -> Option<FaceId> {
    for portal in portals.iter() {
        if try_cross(body, portal, bump_epsilon) {
            return body.crossed();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::vec3::Vec3;
    use crate::portal::{PortalId, Side};
    use crate::transform::Transform;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    const EPS: f32 = 2e-3;

    fn frame(position: Vec3, yaw: f32, scale: f32) -> Transform {
        let mut t = Transform::new();
        t.set_position(position).set_yaw(yaw).set_scale_uniform(scale);
        t
    }

    /// Portal A at the origin facing +Z, portal B at x = 10 facing +Z.
    fn linked_pair() -> (PortalSet, PortalId, PortalId) {
        let mut set = PortalSet::with_limit(4);
        let a = set.add(frame(Vec3::new(0.0, 1.0, 0.0), 0.0, 1.0), None).unwrap();
        let b = set.add(frame(Vec3::new(10.0, 1.0, 0.0), 0.0, 1.0), None).unwrap();
        set.connect(a, b).unwrap();
        (set, a, b)
    }

    fn moving_body(from: Vec3, to: Vec3) -> PhysicalBody {
        let mut t = Transform::new();
        t.set_position(to);
        let mut body = PhysicalBody::new(t);
        body.prev_position = from;
        body.velocity = (to - from) * 10.0;
        body
    }

    #[test]
    fn staying_on_one_side_never_crosses() {
        let (set, _, _) = linked_pair();
        let mut body = moving_body(Vec3::new(-0.5, 1.0, 0.4), Vec3::new(0.5, 1.0, 0.3));
        assert_eq!(cross_portals(&mut body, &set, EPS), None);
        assert_relative_eq!(body.position(), Vec3::new(0.5, 1.0, 0.3));
    }

    #[test]
    fn crossing_remaps_the_whole_state() {
        let (set, a, b) = linked_pair();
        let mut body = moving_body(Vec3::new(0.2, 1.0, 0.1), Vec3::new(0.2, 1.0, -0.1));

        let face = cross_portals(&mut body, &set, EPS);
        assert_eq!(face, Some(FaceId::new(a, Side::Front)));

        let pos = body.position();
        assert_abs_diff_eq!(pos.x, 10.2, epsilon = 1e-4);
        assert!(pos.z < -0.1, "pushed past the partner plane, got {}", pos.z);
        assert_relative_eq!(body.prev_position, pos);
        assert_abs_diff_eq!(body.velocity, Vec3::new(0.0, 0.0, -2.0), epsilon = 1e-4);
        assert_relative_eq!(body.p_scale, 1.0, epsilon = 1e-5);

        // Now on the back side of B.
        assert_eq!(set.get(b).unwrap().side_of(pos), Side::Back);
    }

    #[test]
    fn grazing_past_the_edge_does_not_cross() {
        let (set, _, _) = linked_pair();
        let mut body = moving_body(Vec3::new(1.05, 1.0, 0.1), Vec3::new(1.05, 1.0, -0.1));
        assert_eq!(cross_portals(&mut body, &set, EPS), None);
    }

    #[test]
    fn arriving_body_does_not_bounce_back() {
        let (set, _, _) = linked_pair();
        let mut body = moving_body(Vec3::new(0.2, 1.0, 0.1), Vec3::new(0.2, 1.0, 0.0005));
        // Segment ends inside the margin: the nudged plane is already crossed.
        let mut crossed = cross_portals(&mut body, &set, EPS).is_some();
        if !crossed {
            body.prev_position = body.position();
            body.set_position(Vec3::new(0.2, 1.0, -0.0005));
            crossed = cross_portals(&mut body, &set, EPS).is_some();
        }
        assert!(crossed);

        // Next step: drift back toward B by less than the margin.
        let arrived = body.position();
        body.update(0.0);
        body.set_position(arrived + Vec3::new(0.0, 0.0, 5e-4));
        assert_eq!(cross_portals(&mut body, &set, EPS), None);
    }

    #[test]
    fn at_most_one_crossing_per_step() {
        let mut set = PortalSet::with_limit(4);
        let a = set.add(frame(Vec3::new(0.0, 1.0, 0.0), 0.0, 1.0), None).unwrap();
        let c = set.add(frame(Vec3::new(0.0, 1.0, -0.5), 0.0, 1.0), None).unwrap();
        let b = set.add(frame(Vec3::new(20.0, 1.0, 0.0), 0.0, 1.0), None).unwrap();
        let d = set.add(frame(Vec3::new(-20.0, 1.0, 0.0), 0.0, 1.0), None).unwrap();
        set.connect(a, b).unwrap();
        set.connect(c, d).unwrap();

        let mut body = moving_body(Vec3::new(0.0, 1.0, 1.0), Vec3::new(0.0, 1.0, -1.0));
        assert_eq!(cross_portals(&mut body, &set, EPS), Some(FaceId::new(a, Side::Front)));
        // A second pass in the same step is refused even if the new segment hit something.
        body.prev_position = Vec3::new(-20.0, 1.0, 1.0);
        assert_eq!(cross_portals(&mut body, &set, EPS), None);
        assert_eq!(body.crossed(), Some(FaceId::new(a, Side::Front)));
    }

    #[test]
    fn unconnected_face_is_solid_air() {
        let mut set = PortalSet::with_limit(1);
        set.add(frame(Vec3::new(0.0, 1.0, 0.0), 0.0, 1.0), None).unwrap();
        let mut body = moving_body(Vec3::new(0.0, 1.0, 0.1), Vec3::new(0.0, 1.0, -0.1));
        assert_eq!(cross_portals(&mut body, &set, EPS), None);
        assert_relative_eq!(body.position(), Vec3::new(0.0, 1.0, -0.1));
    }

    #[test]
    fn zero_scale_portal_is_never_crossed() {
        let mut set = PortalSet::with_limit(2);
        let a = set.add(frame(Vec3::new(5.0, 0.0, 5.0), 0.0, 0.0), None).unwrap();
        let b = set.add(frame(Vec3::new(10.0, 1.0, 0.0), 0.0, 1.0), None).unwrap();
        assert!(set.connect(a, b).is_err());
        assert!(!set.get(a).unwrap().front.is_connected());

        let mut body = moving_body(Vec3::new(0.0, 0.0, 5.01), Vec3::new(0.0, 0.0, 4.99));
        assert_eq!(cross_portals(&mut body, &set, EPS), None);
        assert_relative_eq!(body.position(), Vec3::new(0.0, 0.0, 4.99));
    }

    #[test]
    fn scaling_portal_shrinks_body_and_turns_yaw() {
        let mut set = PortalSet::with_limit(2);
        let a = set.add(frame(Vec3::new(0.0, 1.0, 0.0), 0.0, 1.0), None).unwrap();
        let b = set
            .add(frame(Vec3::new(5.0, 0.5, 5.0), std::f32::consts::FRAC_PI_2, 0.5), None)
            .unwrap();
        set.connect(a, b).unwrap();

        let mut body = moving_body(Vec3::new(0.0, 1.0, 0.1), Vec3::new(0.0, 1.0, -0.1));
        body.transform.set_yaw(std::f32::consts::PI);
        assert!(cross_portals(&mut body, &set, EPS).is_some());
        assert_relative_eq!(body.p_scale, 0.5, epsilon = 1e-5);
        assert_relative_eq!(body.velocity.magnitude(), 1.0, epsilon = 1e-4);
        let yaw = body.transform.rotation().y;
        let expected = std::f32::consts::PI + std::f32::consts::FRAC_PI_2;
        assert_abs_diff_eq!(yaw.sin(), expected.sin(), epsilon = 1e-4);
        assert_abs_diff_eq!(yaw.cos(), expected.cos(), epsilon = 1e-4);
    }
}
