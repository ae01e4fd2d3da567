//! Ordered propagation.
//!
//! Every level is kept equal to the greedy grouping obtained by visiting its
//! nodes in creation order: a node joins the earliest older group whose
//! anchor lies within the parent radius, or else founds a group anchored at
//! its own position. Changes are replayed per level through a queue ordered
//! by sequence number, and a node whose standing changes re-queues the later
//! nodes that may have decided differently because of it. A group's anchor
//! follows its founder only once the founder drifts further than `mu` times
//! the group radius. With `mu` at zero the resulting grouping does not depend
//! on how the input was split into loads.

use super::{IncrementalEngine, Insertion};
use crate::error::Result;
use crate::hierarchy::Hierarchy;
use crate::model::{Cluster, ClusterDelta, ClusterKey, EventFlag};
use geocluster_types::PointCount;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Nodes of one level waiting to be settled, lowest sequence first.
#[derive(Debug, Default)]
pub(crate) struct EventQueue {
    heap: BinaryHeap<Reverse<(u64, ClusterKey)>>,
}

impl EventQueue {
    fn push(&mut self, seq: u64, key: ClusterKey) {
        self.heap.push(Reverse((seq, key)));
    }

    fn pop(&mut self) -> Option<ClusterKey> {
        self.heap.pop().map(|Reverse((_, key))| key)
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// What `node`'s parent currently accounts for: its mass without the part
/// still pending in `delta`.
fn held_mass(node: &Cluster, delta: Option<&ClusterDelta>) -> ClusterDelta {
    match delta {
        Some(delta) => node.mass().combined(&delta.negated()),
        None => node.mass(),
    }
}

impl IncrementalEngine {
    pub(super) fn load_ordered(&mut self, points: &[(f64, f64)]) -> Result<()> {
        let (min, max) = (self.hierarchy.min_zoom, self.hierarchy.top_zoom);
        for &(x, y) in points {
            match self.insert_point(x, y)? {
                Insertion::Founded(key) => self.enqueue(key, EventFlag::Inserted),
                Insertion::Joined { target, delta } => {
                    self.normalize_count(target);
                    self.note_change(target, delta);
                }
            }
        }

        for zoom in ((min + 1)..=max).rev() {
            self.hierarchy.flush(zoom);
            let slot = self.slot(zoom);
            while let Some(key) = self.queues[slot].pop() {
                let Some(node) = self.hierarchy.arena.get_mut(key) else {
                    continue;
                };
                let flag = std::mem::take(&mut node.flag);
                match flag {
                    EventFlag::None => {}
                    EventFlag::Deleted => self.settle_deleted(key),
                    EventFlag::Inserted | EventFlag::Updated => self.settle(key)?,
                }
            }
        }
        self.hierarchy.flush(min);
        Ok(())
    }

    /// Queue `key` on its level, merging with an event already pending.
    /// Nodes of the coarsest level have no parent to settle against.
    fn enqueue(&mut self, key: ClusterKey, flag: EventFlag) {
        let node = &mut self.hierarchy.arena[key];
        if node.level == self.hierarchy.min_zoom {
            if flag == EventFlag::Deleted {
                self.hierarchy.arena.free(key);
            }
            return;
        }
        match (node.flag, flag) {
            (EventFlag::None, _) => {
                node.flag = flag;
                let (seq, level) = (node.seq, node.level);
                let slot = self.slot(level);
                self.queues[slot].push(seq, key);
            }
            (_, EventFlag::Deleted) => node.flag = EventFlag::Deleted,
            _ => {}
        }
    }

    /// Record a change of `key` for its parent. New nodes are grouped with
    /// their full mass when settled, so they need no delta.
    fn note_change(&mut self, key: ClusterKey, delta: ClusterDelta) {
        let node = &mut self.hierarchy.arena[key];
        if node.flag == EventFlag::Inserted || node.level == self.hierarchy.min_zoom {
            return;
        }
        node.push_delta(delta);
        self.enqueue(key, EventFlag::Updated);
    }

    /// A node holding a single raw point reads as that point.
    fn normalize_count(&mut self, key: ClusterKey) {
        let arena = &self.hierarchy.arena;
        let node = &arena[key];
        let single_raw = node.weight() == 1
            && node.children.len() == 1
            && arena[node.children[0]].count.is_raw();
        if single_raw {
            self.hierarchy.arena[key].count = PointCount::Raw;
        }
    }

    fn adjust(&mut self, key: ClusterKey, delta: ClusterDelta) {
        self.hierarchy.touch(key);
        self.hierarchy.arena[key].apply(&delta);
        self.normalize_count(key);
        self.note_change(key, delta);
    }

    fn join(&mut self, group: ClusterKey, child: ClusterKey) {
        let mass = self.hierarchy.arena[child].mass();
        self.hierarchy.arena.link(group, child);
        self.adjust(group, mass);
    }

    /// Take `child`, holding `held`, out of `group`. A group that loses its
    /// founder is dissolved: it stops accepting members and every remaining
    /// member is settled again.
    fn leave(&mut self, group: ClusterKey, child: ClusterKey, held: ClusterDelta) {
        let was_founder = self.hierarchy.arena[group].advocator_child == Some(child);
        self.hierarchy.arena.unlink(group, child);

        if self.hierarchy.arena[group].children.is_empty() {
            let zoom = self.hierarchy.arena[group].level;
            self.hierarchy.retire(group);
            self.enqueue(group, EventFlag::Deleted);
            self.counts_mut(zoom).deleted += 1;
            return;
        }

        self.adjust(group, held.negated());
        if was_founder {
            self.hierarchy.remove_advocator(group);
            for member in self.hierarchy.arena[group].children.clone() {
                self.enqueue(member, EventFlag::Updated);
            }
        }
    }

    fn found(&mut self, key: ClusterKey) -> Result<()> {
        let parent = Cluster::parent_of(key, &self.hierarchy.arena[key]);
        let parent = self.hierarchy.admit(parent)?;
        self.hierarchy.arena[key].parent = Some(parent);
        let zoom = self.hierarchy.arena[parent].level;
        self.counts_mut(zoom).inserted += 1;
        self.enqueue(parent, EventFlag::Inserted);
        Ok(())
    }

    /// Queue the nodes of `zoom` later than `seq` whose centroid lies within
    /// the parent radius of `(x, y)`.
    fn revisit_near(&mut self, zoom: u8, x: f64, y: f64, seq: u64) {
        let radius = self.parent_radius(zoom);
        for key in self.clusters_near(zoom, x, y, radius) {
            if self.hierarchy.arena[key].seq > seq {
                self.enqueue(key, EventFlag::Updated);
            }
        }
    }

    fn settle(&mut self, key: ClusterKey) -> Result<()> {
        let node = &self.hierarchy.arena[key];
        let (x, y, seq, zoom) = (node.x, node.y, node.seq, node.level);
        let parent = node.parent;
        let group_zoom = zoom - 1;

        let older: Vec<_> = self
            .hierarchy
            .advocators_near(group_zoom, x, y, self.hierarchy.radius(group_zoom))
            .into_iter()
            .filter(|adv| adv.seq < seq)
            .collect();
        let target = Hierarchy::earliest(&older).map(|adv| adv.cluster);

        let delta = self.hierarchy.arena[key].delta.take();
        let held = held_mass(&self.hierarchy.arena[key], delta.as_ref());

        match (target, parent) {
            (Some(group), Some(current)) if group == current => {
                if let Some(delta) = delta {
                    self.adjust(current, delta);
                }
                self.counts_mut(zoom).updated += 1;
            }
            (Some(group), _) => {
                if let Some(current) = parent {
                    self.leave(current, key, held);
                }
                self.join(group, key);
                self.counts_mut(zoom - 1).updated += 1;
            }
            (None, Some(current)) if self.hierarchy.arena[current].advocator_child == Some(key) => {
                if let Some(delta) = delta {
                    self.adjust(current, delta);
                }
                self.counts_mut(zoom).updated += 1;
                let threshold = self.mu * self.parent_radius(zoom);
                let anchor = self.hierarchy.arena[current].advocator;
                if let Some(anchor) = anchor
                    && self.hierarchy.arena[key].distance_to(anchor.x, anchor.y) > threshold
                {
                    self.hierarchy.move_advocator(current, x, y);
                    self.counts_mut(zoom).shifted += 1;
                    self.revisit_near(zoom, anchor.x, anchor.y, seq);
                    self.revisit_near(zoom, x, y, seq);
                }
            }
            (None, _) => {
                if let Some(current) = parent {
                    self.leave(current, key, held);
                }
                self.found(key)?;
                self.revisit_near(zoom, x, y, seq);
            }
        }
        Ok(())
    }

    fn settle_deleted(&mut self, key: ClusterKey) {
        let node = &self.hierarchy.arena[key];
        let held = held_mass(node, node.delta.as_ref());
        let parent = node.parent;
        if let Some(parent) = parent {
            self.leave(parent, key, held);
        }
        self.hierarchy.arena.free(key);
    }
}
