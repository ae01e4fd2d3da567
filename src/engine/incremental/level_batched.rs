//! Level-batched propagation.
//!
//! The whole batch is placed at the finest level first, recording which
//! nodes were inserted, updated or left empty. Levels are then settled one
//! at a time from the finest up: pending deltas move to the parents, empty
//! nodes are removed, drifted advocators are shifted and new nodes find a
//! group one level up. Each settled level only queues work for the next.

use super::{IncrementalEngine, Insertion};
use crate::error::Result;
use crate::hierarchy::Hierarchy;
use crate::model::{Cluster, ClusterDelta, ClusterKey, KeySet};

/// Nodes of one level with work pending.
#[derive(Debug, Default)]
pub(crate) struct LevelEvents {
    /// New or regrouped nodes that still need a parent
    inserted: KeySet,
    /// Nodes whose pending delta has not reached the parent yet
    updated: KeySet,
    /// Nodes that lost their last child and wait for removal
    deleted: KeySet,
}

impl LevelEvents {
    fn clear(&mut self) {
        self.inserted.clear();
        self.updated.clear();
        self.deleted.clear();
    }
}

impl IncrementalEngine {
    pub(super) fn load_level_batched(&mut self, points: &[(f64, f64)]) -> Result<()> {
        let (min, max) = (self.hierarchy.min_zoom, self.hierarchy.top_zoom);
        for &(x, y) in points {
            match self.insert_point(x, y)? {
                Insertion::Founded(key) => {
                    let slot = self.slot(max);
                    self.events[slot].inserted.insert(key);
                }
                Insertion::Joined { target, delta } => self.record_update(target, delta),
            }
        }

        for zoom in ((min + 1)..=max).rev() {
            self.settle_level(zoom)?;
        }

        let slot = self.slot(min);
        for key in self.events[slot].updated.take() {
            self.hierarchy.arena[key].delta = None;
        }
        for key in self.events[slot].deleted.take() {
            self.hierarchy.arena.free(key);
        }
        self.events[slot].clear();
        self.hierarchy.flush(min);
        Ok(())
    }

    fn settle_level(&mut self, zoom: u8) -> Result<()> {
        let slot = self.slot(zoom);
        self.hierarchy.flush(zoom);

        for key in self.events[slot].updated.to_vec() {
            let delta = self.hierarchy.arena[key].delta.take();
            if let (Some(delta), Some(parent)) = (delta, self.hierarchy.arena[key].parent) {
                self.apply_update(parent, delta);
            }
            self.counts_mut(zoom).updated += 1;
        }

        for key in self.events[slot].deleted.take() {
            self.events[slot].updated.remove(key);
            if let Some(parent) = self.hierarchy.arena[key].parent {
                self.split(parent, key);
            }
            self.hierarchy.arena.free(key);
            self.counts_mut(zoom).deleted += 1;
        }

        let threshold = self.mu * self.parent_radius(zoom);
        for key in self.events[slot].updated.take() {
            if !self.hierarchy.arena.contains(key) || self.hierarchy.arena[key].drift() <= threshold {
                continue;
            }
            self.shift_batched(key);
            self.counts_mut(zoom).shifted += 1;
        }

        for key in self.events[slot].inserted.take() {
            if self.hierarchy.arena.contains(key) && self.hierarchy.arena[key].parent.is_none() {
                self.regroup(key)?;
            }
        }
        Ok(())
    }

    /// Queue `delta` on `key` for its parent, unless `key` is new at its
    /// level and will be grouped with its full mass anyway.
    fn record_update(&mut self, key: ClusterKey, delta: ClusterDelta) {
        let slot = self.slot(self.hierarchy.arena[key].level);
        let events = &mut self.events[slot];
        if events.inserted.contains(key) {
            return;
        }
        events.updated.insert(key);
        self.hierarchy.arena[key].push_delta(delta);
    }

    fn apply_update(&mut self, key: ClusterKey, delta: ClusterDelta) {
        self.hierarchy.touch(key);
        self.hierarchy.arena[key].apply(&delta);
        self.record_update(key, delta);
    }

    fn merge(&mut self, parent: ClusterKey, child: ClusterKey) {
        let mass = self.hierarchy.arena[child].mass();
        self.hierarchy.arena.link(parent, child);
        self.apply_update(parent, mass);
    }

    /// Take `child` out of `parent`. A parent left empty is pulled from its
    /// level at once and removed from its own parent when that level settles.
    fn split(&mut self, parent: ClusterKey, child: ClusterKey) {
        self.hierarchy.arena.unlink(parent, child);
        if self.hierarchy.arena[parent].children.is_empty() {
            self.mark_deleted(parent);
        } else {
            let removed = self.hierarchy.arena[child].mass().negated();
            self.apply_update(parent, removed);
        }
    }

    /// The node keeps its mass and any pending delta, so that once the delta
    /// has reached the parent, removing the node takes away exactly what the
    /// parent holds.
    fn mark_deleted(&mut self, key: ClusterKey) {
        let slot = self.slot(self.hierarchy.arena[key].level);
        self.hierarchy.retire(key);
        let events = &mut self.events[slot];
        if events.inserted.remove(key) {
            self.hierarchy.arena.free(key);
        } else {
            events.deleted.insert(key);
        }
    }

    fn shift_batched(&mut self, key: ClusterKey) {
        let slot = self.slot(self.hierarchy.arena[key].level);
        let Some(parent) = self.hierarchy.arena[key].parent else {
            self.hierarchy.place_advocator(key);
            return;
        };

        if self.hierarchy.arena[parent].advocator_child == Some(key) {
            let to_merge = self.merge_candidates(key, parent);
            let to_split = self.split_candidates(key, parent);
            self.hierarchy.place_advocator(key);

            for other in to_merge {
                if let Some(previous) = self.hierarchy.arena[other].parent {
                    self.split(previous, other);
                }
                self.events[slot].inserted.remove(other);
                self.merge(parent, other);
            }
            for child in to_split {
                self.split(parent, child);
                self.events[slot].inserted.insert(child);
            }
        } else {
            if self.strayed(key, parent) {
                self.split(parent, key);
                self.events[slot].inserted.insert(key);
            }
            self.hierarchy.place_advocator(key);
        }
    }

    /// Group a parentless node one level up.
    fn regroup(&mut self, key: ClusterKey) -> Result<()> {
        let node = &self.hierarchy.arena[key];
        let zoom = node.level - 1;
        let (x, y) = (node.x, node.y);
        let nearby = self.hierarchy.advocators_near(zoom, x, y, self.hierarchy.radius(zoom));

        match Hierarchy::earliest(&nearby) {
            None => {
                let parent = Cluster::parent_of(key, &self.hierarchy.arena[key]);
                let parent = self.hierarchy.admit(parent)?;
                self.hierarchy.arena[key].parent = Some(parent);
                let slot = self.slot(zoom);
                self.events[slot].inserted.insert(parent);
                self.counts_mut(zoom).inserted += 1;
            }
            Some(adv) => {
                self.merge(adv.cluster, key);
                self.counts_mut(zoom).updated += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::compute::projection::project;
    use crate::config::ClusterConfig;
    use crate::engine::incremental::{IncrementalEngine, Propagation};

    fn engine(max_zoom: u8) -> IncrementalEngine {
        IncrementalEngine::new(&ClusterConfig::new(0, max_zoom), Propagation::LevelBatched)
    }

    fn load(engine: &mut IncrementalEngine, points: &[(f64, f64)]) {
        let projected: Vec<(f64, f64)> = points.iter().map(|&(lng, lat)| project(lng, lat)).collect();
        engine.load(&projected).unwrap();
    }

    #[test]
    fn test_batch_settles_every_level() {
        let mut engine = engine(10);
        load(&mut engine, &[(0.0, 0.0), (0.001, 0.001), (50.0, 50.0), (50.001, 50.001)]);
        let h = engine.hierarchy();
        assert_eq!(h.level(1).members.len(), 2);
        assert_eq!(h.level(0).members.len(), 1);
        assert!(h.check_invariants().is_empty(), "{:?}", h.check_invariants());
        assert!(engine.events.iter().all(|e| e.inserted.is_empty() && e.updated.is_empty()));
    }

    #[test]
    fn test_deltas_reach_the_root() {
        let mut engine = engine(6);
        load(&mut engine, &[(1.0, 1.0)]);
        load(&mut engine, &[(1.00001, 1.0), (1.00002, 1.0)]);
        let h = engine.hierarchy();
        let root = h.level(0).members.iter().next().unwrap();
        assert_eq!(h.arena[root].weight(), 3);
        assert!(h.arena.iter().all(|(_, c)| c.delta.is_none()));
        assert!(h.check_invariants().is_empty(), "{:?}", h.check_invariants());
    }

    #[test]
    fn test_many_small_batches() {
        let mut engine = engine(12);
        for batch in 0..10 {
            let points: Vec<(f64, f64)> = (0..15)
                .map(|i| {
                    let t = (batch * 15 + i) as f64;
                    ((t * 7.3) % 40.0 - 20.0, (t * 3.1) % 30.0 - 15.0)
                })
                .collect();
            load(&mut engine, &points);
        }
        let h = engine.hierarchy();
        assert_eq!(h.total_points(), 150);
        assert!(h.check_invariants().is_empty(), "{:?}", h.check_invariants());
    }
}
