//! Deferred portal connections.
//!
//! Level objects name the door they lead to (`"B.door1"`) before that door
//! exists. Building a level queues a [`PendingConnection`] per link; once
//! every portal is built, [`resolve_connections`] wires the queue up.
//! Unmatched links are authoring errors: they are logged and dropped and the
//! portal stays unconnected.

use std::fmt;

use log::{debug, info, warn};

use super::{PortalId, PortalSet};

/// A door on a tunnel: `tunnel` id plus 1-based door index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DoorRef {
    pub tunnel: String,
    pub door: u32,
}

impl DoorRef {
    pub fn new(tunnel: impl Into<String>, door: u32) -> Self {
        Self {
            tunnel: tunnel.into(),
            door,
        }
    }

    /// Parses `"<tunnel>.door<N>"`. The tunnel id may itself contain dots.
    pub fn parse(text: &str) -> Option<Self> {
        let (tunnel, door) = text.rsplit_once('.')?;
        let index = door.strip_prefix("door")?.parse().ok()?;
        if tunnel.is_empty() {
            return None;
        }
        Some(Self::new(tunnel, index))
    }
}

impl fmt::Display for DoorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.door{}", self.tunnel, self.door)
    }
}

/// A link recorded while building a level, waiting for its target to exist.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingConnection {
    pub portal: PortalId,
    pub target: DoorRef,
}

/// Outcome of resolving a pending-connection queue.
#[derive(Debug, Default, Clone)]
pub struct ResolveReport {
    /// `(source, target)` pairs that were connected.
    pub resolved: Vec<(PortalId, PortalId)>,
    pub dropped: Vec<PendingConnection>,
}

impl ResolveReport {
    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

/// Connects every pending link whose target door exists.
///
/// Matching is by tunnel id and door index. If several portals claim the
/// same door the first one built wins.
pub fn resolve_connections(
    portals: &mut PortalSet,
    pending: impl IntoIterator<Item = PendingConnection>,
) -> ResolveReport {
    let mut report = ResolveReport::default();

    for link in pending {
        let matches: Vec<PortalId> = portals.find_by_door(&link.target).map(|p| p.id()).collect();
        let Some(&target) = matches.first() else {
            warn!(
                "dropping connection from {}: no door named {}",
                link.portal, link.target
            );
            report.dropped.push(link);
            continue;
        };
        if matches.len() > 1 {
            warn!("door {} is ambiguous; using {}", link.target, target);
        }

        match portals.connect(link.portal, target) {
            Ok(()) => {
                debug!("connected {} -> {} ({})", link.portal, target, link.target);
                report.resolved.push((link.portal, target));
            }
            Err(err) => {
                warn!("dropping connection to {}: {}", link.target, err);
                report.dropped.push(link);
            }
        }
    }

    info!(
        "resolved {} portal connection(s), dropped {}",
        report.resolved_count(),
        report.dropped_count()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::vec3::Vec3;
    use crate::portal::{FaceId, Side};
    use crate::transform::Transform;

    fn add_door(set: &mut PortalSet, tunnel: &str, door: u32, x: f32) -> PortalId {
        let mut t = Transform::new();
        t.set_position(Vec3::new(x, 1.0, 0.0));
        set.add(t, Some(DoorRef::new(tunnel, door))).unwrap()
    }

    #[test]
    fn parse_door_refs() {
        assert_eq!(DoorRef::parse("B.door1"), Some(DoorRef::new("B", 1)));
        assert_eq!(DoorRef::parse("hall.a.door2"), Some(DoorRef::new("hall.a", 2)));
        assert_eq!(DoorRef::parse("B.window1"), None);
        assert_eq!(DoorRef::parse("door1"), None);
        assert_eq!(DoorRef::parse(".door1"), None);
        assert_eq!(DoorRef::new("A", 2).to_string(), "A.door2");
    }

    #[test]
    fn matching_door_is_connected() {
        let mut set = PortalSet::with_limit(4);
        let a2 = add_door(&mut set, "A", 2, 0.0);
        let b1 = add_door(&mut set, "B", 1, 10.0);
        let report = resolve_connections(
            &mut set,
            vec![PendingConnection {
                portal: a2,
                target: DoorRef::new("B", 1),
            }],
        );

        assert_eq!(report.resolved, vec![(a2, b1)]);
        assert!(report.dropped.is_empty());
        assert_eq!(
            set.get(a2).unwrap().front.to_face(),
            Some(FaceId::new(b1, Side::Back))
        );
    }

    #[test]
    fn unmatched_link_is_dropped_without_error() {
        let mut set = PortalSet::with_limit(4);
        let a2 = add_door(&mut set, "A", 2, 0.0);
        add_door(&mut set, "B", 1, 10.0);
        let report = resolve_connections(
            &mut set,
            vec![PendingConnection {
                portal: a2,
                target: DoorRef::new("Z", 1),
            }],
        );

        assert_eq!(report.resolved_count(), 0);
        assert_eq!(report.dropped_count(), 1);
        assert!(!set.get(a2).unwrap().front.is_connected());
    }

    #[test]
    fn link_to_own_door_is_dropped() {
        let mut set = PortalSet::with_limit(2);
        let a1 = add_door(&mut set, "A", 1, 0.0);
        let report = resolve_connections(
            &mut set,
            vec![PendingConnection {
                portal: a1,
                target: DoorRef::new("A", 1),
            }],
        );
        assert_eq!(report.dropped_count(), 1);
    }

    #[test]
    fn ambiguous_door_uses_first_built() {
        let mut set = PortalSet::with_limit(4);
        let a2 = add_door(&mut set, "A", 2, 0.0);
        let first = add_door(&mut set, "B", 1, 10.0);
        let second = add_door(&mut set, "B", 1, 20.0);
        let report = resolve_connections(
            &mut set,
            vec![
                PendingConnection {
                    portal: a2,
                    target: DoorRef::new("B", 1),
                },
                PendingConnection {
                    portal: a2,
                    target: DoorRef::new("C", 1),
                },
            ],
        );

        assert_eq!(report.resolved, vec![(a2, first)]);
        assert_eq!(report.dropped_count(), 1);
        assert_eq!(report.dropped[0].target, DoorRef::new("C", 1));
        assert!(!set.get(second).unwrap().back.is_connected());
    }

    #[test]
    fn mirrored_links_are_idempotent() {
        let mut set = PortalSet::with_limit(4);
        let a2 = add_door(&mut set, "A", 2, 0.0);
        let b1 = add_door(&mut set, "B", 1, 10.0);
        let report = resolve_connections(
            &mut set,
            vec![
                PendingConnection {
                    portal: a2,
                    target: DoorRef::new("B", 1),
                },
                PendingConnection {
                    portal: b1,
                    target: DoorRef::new("A", 2),
                },
            ],
        );
        assert_eq!(report.resolved_count(), 2);
        let pa = set.get(a2).unwrap();
        let pb = set.get(b1).unwrap();
        assert_eq!(pa.front.delta, pb.back.delta_inv);
        assert_eq!(pa.back.to_face(), Some(FaceId::new(b1, Side::Front)));
    }
}
