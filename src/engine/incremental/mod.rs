//! Incremental hierarchies.
//!
//! Raw points always enter at `max_zoom`: a point within the level radius of
//! an existing advocator joins the earliest such node, otherwise it founds a
//! node of its own. How that change travels to the coarser levels is the
//! [`Propagation`] strategy:
//!
//! - `Eager` pushes every change to the root before the next point.
//! - `LevelBatched` collects inserts, updates and deletes per level and
//!   settles one level at a time after the whole batch is in.
//! - `Ordered` replays each level in creation order; with `mu` at zero the
//!   result does not depend on how the points were split into batches.

mod eager;
mod level_batched;
mod ordered;

use crate::compute::projection::ZoomRadii;
use crate::config::ClusterConfig;
use crate::error::Result;
use crate::hierarchy::{Hierarchy, Layout};
use crate::model::{Cluster, ClusterDelta, ClusterKey};
use geocluster_types::{ClusteringStrategy, LevelCounts};
use level_batched::LevelEvents;
use ordered::EventQueue;

/// How changes at one level reach the coarser ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Eager,
    LevelBatched,
    Ordered,
}

impl Propagation {
    /// The propagation behind an incremental strategy; `None` for `Batch`.
    pub fn from_strategy(strategy: ClusteringStrategy) -> Option<Self> {
        match strategy {
            ClusteringStrategy::Batch => None,
            ClusteringStrategy::Eager => Some(Propagation::Eager),
            ClusteringStrategy::LevelBatched => Some(Propagation::LevelBatched),
            ClusteringStrategy::Ordered => Some(Propagation::Ordered),
        }
    }

    pub fn strategy(self) -> ClusteringStrategy {
        match self {
            Propagation::Eager => ClusteringStrategy::Eager,
            Propagation::LevelBatched => ClusteringStrategy::LevelBatched,
            Propagation::Ordered => ClusteringStrategy::Ordered,
        }
    }
}

/// Outcome of placing one raw point at the finest level.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Insertion {
    /// The point became a node of its own.
    Founded(ClusterKey),
    /// The point was folded into an existing node.
    Joined { target: ClusterKey, delta: ClusterDelta },
}

pub struct IncrementalEngine {
    pub(crate) hierarchy: Hierarchy,
    propagation: Propagation,
    /// Advocator drift, as a fraction of the parent radius, that triggers a shift
    mu: f64,
    events: Vec<LevelEvents>,
    queues: Vec<EventQueue>,
    counts: Vec<LevelCounts>,
}

impl IncrementalEngine {
    pub fn new(config: &ClusterConfig, propagation: Propagation) -> Self {
        let radii = ZoomRadii::new(config.radius, config.extent, config.max_zoom);
        let hierarchy = Hierarchy::new(config.min_zoom, config.max_zoom, radii, config.index, Layout::Nested);
        let levels = usize::from(config.max_zoom - config.min_zoom) + 1;
        Self {
            hierarchy,
            propagation,
            mu: config.mu,
            events: (0..levels).map(|_| LevelEvents::default()).collect(),
            queues: (0..levels).map(|_| EventQueue::default()).collect(),
            counts: Vec::new(),
        }
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn propagation(&self) -> Propagation {
        self.propagation
    }

    /// Add projected points and settle every level.
    ///
    /// Returns what each level pass did, finest level first. A load that runs
    /// out of node keys stops where it is and leaves the hierarchy partially
    /// updated.
    pub fn load(&mut self, points: &[(f64, f64)]) -> Result<Vec<LevelCounts>> {
        let (min, max) = (self.hierarchy.min_zoom, self.hierarchy.top_zoom);
        self.counts = (min..=max).rev().map(LevelCounts::new).collect();
        match self.propagation {
            Propagation::Eager => self.load_eager(points)?,
            Propagation::LevelBatched => self.load_level_batched(points)?,
            Propagation::Ordered => self.load_ordered(points)?,
        }
        Ok(std::mem::take(&mut self.counts))
    }

    fn slot(&self, zoom: u8) -> usize {
        usize::from(zoom - self.hierarchy.min_zoom)
    }

    /// Counters of the current load for `zoom`.
    fn counts_mut(&mut self, zoom: u8) -> &mut LevelCounts {
        let slot = usize::from(self.hierarchy.top_zoom - zoom);
        &mut self.counts[slot]
    }

    /// Radius for grouping nodes of `zoom` under the next coarser level.
    fn parent_radius(&self, zoom: u8) -> f64 {
        self.hierarchy.radii.parent_radius(zoom)
    }

    /// Place one raw point at the finest level.
    ///
    /// The joined node is touched and its mass updated; propagating that
    /// change is left to the caller.
    pub(crate) fn insert_point(&mut self, x: f64, y: f64) -> Result<Insertion> {
        let h = &mut self.hierarchy;
        let top = h.top_zoom;
        let origin = h.total_points;

        let nearby = h.advocators_near(top, x, y, h.radius(top));
        let insertion = match Hierarchy::earliest(&nearby) {
            None => {
                let key = h.admit(Cluster::point(x, y, origin, top))?;
                Insertion::Founded(key)
            }
            Some(adv) => {
                let delta = ClusterDelta::of(x, y, 1);
                h.touch(adv.cluster);
                h.arena[adv.cluster].apply(&delta);
                Insertion::Joined {
                    target: adv.cluster,
                    delta,
                }
            }
        };

        let owner = match insertion {
            Insertion::Founded(key) => key,
            Insertion::Joined { target, .. } => target,
        };
        h.total_points += 1;
        h.owners.push(owner);
        let counts = self.counts_mut(top);
        match insertion {
            Insertion::Founded(_) => counts.inserted += 1,
            Insertion::Joined { .. } => counts.updated += 1,
        }
        Ok(insertion)
    }

    /// Whether `key` is the child anchoring its parent's advocator.
    fn anchors_parent(&self, key: ClusterKey) -> bool {
        let arena = &self.hierarchy.arena;
        arena[key]
            .parent
            .is_some_and(|parent| arena[parent].advocator_child == Some(key))
    }

    /// Nodes at `zoom` within `radius` of `(x, y)` by centroid.
    fn clusters_near(&self, zoom: u8, x: f64, y: f64, radius: f64) -> Vec<ClusterKey> {
        self.hierarchy
            .level(zoom)
            .clusters
            .as_ref()
            .map(|index| {
                index
                    .within(geo::Coord { x, y }, radius)
                    .into_iter()
                    .map(|entry| entry.key)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Merge candidates for a node anchoring its parent: nodes of the same
    /// level within the parent radius that belong to a later group and do not
    /// anchor it themselves.
    fn merge_candidates(&self, key: ClusterKey, parent: ClusterKey) -> Vec<ClusterKey> {
        let arena = &self.hierarchy.arena;
        let node = &arena[key];
        let parent_seq = arena[parent].seq;
        self.clusters_near(node.level, node.x, node.y, self.parent_radius(node.level))
            .into_iter()
            .filter(|&other| other != key)
            .filter(|&other| match arena[other].parent {
                Some(group) if group == parent => false,
                Some(group) => !self.anchors_parent(other) && arena[group].seq > parent_seq,
                None => true,
            })
            .collect()
    }

    /// Children of `parent` that ended up farther than the parent radius from
    /// the anchoring child `key`.
    fn split_candidates(&self, key: ClusterKey, parent: ClusterKey) -> Vec<ClusterKey> {
        let arena = &self.hierarchy.arena;
        let node = &arena[key];
        let radius = self.parent_radius(node.level);
        arena[parent]
            .children
            .iter()
            .copied()
            .filter(|&child| child != key && arena[child].distance_to(node.x, node.y) > radius)
            .collect()
    }

    /// Whether a non-anchoring child drifted out of its parent's reach.
    fn strayed(&self, key: ClusterKey, parent: ClusterKey) -> bool {
        let arena = &self.hierarchy.arena;
        let radius = self.parent_radius(arena[key].level);
        arena[parent]
            .advocator
            .is_some_and(|adv| arena[key].distance_to(adv.x, adv.y) > radius)
    }

    /// Nodes at `zoom` whose advocator drifted past the shift threshold.
    fn drifted(&self, zoom: u8) -> Vec<ClusterKey> {
        let threshold = self.mu * self.parent_radius(zoom);
        let h = &self.hierarchy;
        h.level(zoom)
            .members
            .iter()
            .filter(|&key| h.arena[key].drift() > threshold)
            .collect()
    }
}
