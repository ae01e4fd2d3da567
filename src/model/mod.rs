//! Hierarchy nodes and the handles that link them.
//!
//! Nodes are owned by a [`ClusterArena`] and refer to each other through
//! [`ClusterKey`] handles: parent, children and the child anchoring a parent's
//! index entry are all keys, never references.

mod arena;
mod delta;
mod keyset;

pub use arena::ClusterArena;
pub use delta::ClusterDelta;
pub use keyset::KeySet;

use crate::index::IndexEntry;
use geocluster_types::PointCount;

/// Stable handle of a node inside its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterKey(pub(crate) u32);

impl ClusterKey {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Pending event of a node in the ordered strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFlag {
    #[default]
    None,
    Inserted,
    Updated,
    Deleted,
}

/// The index-visible proxy of a node at one level.
///
/// Radius and range queries search advocators; each points at exactly one
/// node. Its position can be moved without touching the node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Advocator {
    pub x: f64,
    pub y: f64,
    pub seq: u64,
    pub cluster: ClusterKey,
}

impl IndexEntry for Advocator {
    fn x(&self) -> f64 {
        self.x
    }

    fn y(&self) -> f64 {
        self.y
    }
}

/// A node's position as stored in its level's cluster index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterEntry {
    pub x: f64,
    pub y: f64,
    pub key: ClusterKey,
}

impl IndexEntry for ClusterEntry {
    fn x(&self) -> f64 {
        self.x
    }

    fn y(&self) -> f64 {
        self.y
    }
}

/// A node of the hierarchy.
///
/// Coordinates are in the projected plane. `origin` is the load-order index of
/// the raw point the node grew from; the external id is derived from it.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub x: f64,
    pub y: f64,
    pub origin: u64,
    pub seq: u64,
    pub level: u8,
    pub count: PointCount,
    pub parent: Option<ClusterKey>,
    pub children: Vec<ClusterKey>,
    pub advocator: Option<Advocator>,
    /// The child whose position anchors this node's advocator
    pub advocator_child: Option<ClusterKey>,
    /// Removed from the cluster index until the next flush
    pub dirty: bool,
    pub indexed: Option<ClusterEntry>,
    pub delta: Option<ClusterDelta>,
    pub flag: EventFlag,
    /// Zoom at which the node first splits into several children
    pub expansion_zoom: Option<u8>,
}

impl Cluster {
    /// A raw point.
    pub fn point(x: f64, y: f64, origin: u64, level: u8) -> Self {
        Self::with_count(x, y, origin, origin, level, PointCount::Raw)
    }

    pub fn with_count(x: f64, y: f64, origin: u64, seq: u64, level: u8, count: PointCount) -> Self {
        Self {
            x,
            y,
            origin,
            seq,
            level,
            count,
            parent: None,
            children: Vec::new(),
            advocator: None,
            advocator_child: None,
            dirty: false,
            indexed: None,
            delta: None,
            flag: EventFlag::None,
            expansion_zoom: None,
        }
    }

    /// A parent for `child` one level coarser, sitting at the child's position.
    pub fn parent_of(child_key: ClusterKey, child: &Cluster) -> Self {
        let mut parent = Self::with_count(
            child.x,
            child.y,
            child.origin,
            child.seq,
            child.level.saturating_sub(1),
            child.count,
        );
        parent.children.push(child_key);
        parent.advocator_child = Some(child_key);
        parent
    }

    pub fn weight(&self) -> u32 {
        self.count.weight()
    }

    /// External id: the origin for raw points, `(origin << 5) | (level + 1)` for clusters.
    pub fn id(&self) -> i64 {
        encode_id(self.origin, self.count, self.level)
    }

    /// This node's mass as a positive delta.
    pub fn mass(&self) -> ClusterDelta {
        ClusterDelta::of(self.x, self.y, self.weight())
    }

    /// Fold `delta` into the centroid and count.
    ///
    /// The first change turns a raw point into a cluster. A delta that would
    /// empty the node leaves it untouched; callers remove such nodes instead.
    pub fn apply(&mut self, delta: &ClusterDelta) {
        let weight = i64::from(self.weight());
        let total = weight + delta.num_points;
        if total <= 0 {
            return;
        }
        let wx = self.x * weight as f64 + delta.wx;
        let wy = self.y * weight as f64 + delta.wy;
        self.x = wx / total as f64;
        self.y = wy / total as f64;
        self.count = PointCount::Aggregated(total as u32);
    }

    /// Record a pending change for propagation to the parent.
    pub fn push_delta(&mut self, delta: ClusterDelta) {
        match self.delta.as_mut() {
            Some(pending) => pending.combine(&delta),
            None => self.delta = Some(delta),
        }
    }

    pub fn entry(&self, key: ClusterKey) -> ClusterEntry {
        ClusterEntry {
            x: self.x,
            y: self.y,
            key,
        }
    }

    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        ((self.x - x).powi(2) + (self.y - y).powi(2)).sqrt()
    }

    /// Distance between the node and its own advocator.
    pub fn drift(&self) -> f64 {
        self.advocator
            .map(|adv| self.distance_to(adv.x, adv.y))
            .unwrap_or(0.0)
    }
}

/// `(origin << 5) | (zoom + 1)` for clusters, the origin itself for raw points.
pub fn encode_id(origin: u64, count: PointCount, zoom: u8) -> i64 {
    match count {
        PointCount::Raw => origin as i64,
        PointCount::Aggregated(_) => ((origin as i64) << 5) | (i64::from(zoom) + 1),
    }
}

/// Origin and zoom packed in a cluster id.
pub fn decode_id(id: i64) -> (u64, u8) {
    ((id >> 5) as u64, ((id & 31) - 1).max(0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_encoding() {
        let raw = Cluster::point(0.5, 0.5, 42, 10);
        assert_eq!(raw.id(), 42);

        let mut cluster = raw.clone();
        cluster.apply(&ClusterDelta::of(0.6, 0.5, 1));
        assert_eq!(cluster.count, PointCount::Aggregated(2));
        assert_eq!(cluster.id(), (42 << 5) | 11);
        assert_eq!(decode_id(cluster.id()), (42, 10));
    }

    #[test]
    fn test_apply_weighted_centroid() {
        let mut cluster = Cluster::point(0.0, 0.0, 0, 5);
        cluster.apply(&ClusterDelta::of(1.0, 1.0, 1));
        cluster.apply(&ClusterDelta::of(1.0, 1.0, 2));
        assert_eq!(cluster.weight(), 4);
        assert!((cluster.x - 0.75).abs() < 1e-12);

        cluster.apply(&ClusterDelta::of(1.0, 1.0, 2).negated());
        assert_eq!(cluster.weight(), 2);
        assert!((cluster.x - 0.5).abs() < 1e-12);
        assert!((cluster.y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_apply_refuses_to_empty() {
        let mut cluster = Cluster::point(0.3, 0.3, 0, 5);
        cluster.apply(&ClusterDelta::of(0.3, 0.3, 1).negated());
        assert_eq!(cluster.count, PointCount::Raw);
        assert_eq!(cluster.x, 0.3);
    }

    #[test]
    fn test_parent_of_copies_identity() {
        let child = Cluster::with_count(0.2, 0.4, 7, 9, 6, PointCount::Aggregated(3));
        let parent = Cluster::parent_of(ClusterKey(4), &child);
        assert_eq!(parent.level, 5);
        assert_eq!(parent.seq, 9);
        assert_eq!(parent.weight(), 3);
        assert_eq!(parent.children, vec![ClusterKey(4)]);
        assert_eq!(parent.advocator_child, Some(ClusterKey(4)));
    }
}
