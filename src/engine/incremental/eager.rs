//! Eager propagation: every change reaches the root before the next point.

use super::{IncrementalEngine, Insertion};
use crate::error::Result;
use crate::hierarchy::Hierarchy;
use crate::model::{Cluster, ClusterDelta, ClusterKey};

impl IncrementalEngine {
    pub(super) fn load_eager(&mut self, points: &[(f64, f64)]) -> Result<()> {
        let (min, max) = (self.hierarchy.min_zoom, self.hierarchy.top_zoom);
        for &(x, y) in points {
            match self.insert_point(x, y)? {
                Insertion::Founded(key) => {
                    if max > min {
                        self.attach(key)?;
                    }
                }
                Insertion::Joined { target, delta } => {
                    let parent = self.hierarchy.arena[target].parent;
                    self.propagate(parent, &delta);
                }
            }
        }

        for zoom in ((min + 1)..=max).rev() {
            self.hierarchy.flush(zoom);
            for key in self.drifted(zoom) {
                if self.hierarchy.arena.contains(key) {
                    self.shift_eager(key)?;
                    self.counts_mut(zoom).shifted += 1;
                }
            }
        }
        self.hierarchy.flush(min);
        Ok(())
    }

    /// Give a parentless node a parent: the earliest group within reach one
    /// level up, or a new node founded in its image.
    fn attach(&mut self, child: ClusterKey) -> Result<()> {
        let node = &self.hierarchy.arena[child];
        let zoom = node.level - 1;
        let (x, y) = (node.x, node.y);
        let nearby = self.hierarchy.advocators_near(zoom, x, y, self.hierarchy.radius(zoom));

        match Hierarchy::earliest(&nearby) {
            None => {
                let parent = Cluster::parent_of(child, &self.hierarchy.arena[child]);
                let key = self.hierarchy.admit(parent)?;
                self.hierarchy.arena[child].parent = Some(key);
                self.counts_mut(zoom).inserted += 1;
                if zoom > self.hierarchy.min_zoom {
                    self.attach(key)?;
                }
            }
            Some(adv) => self.adopt(adv.cluster, child),
        }
        Ok(())
    }

    /// Make `child` a child of `parent` and add its mass up the chain.
    fn adopt(&mut self, parent: ClusterKey, child: ClusterKey) {
        let mass = self.hierarchy.arena[child].mass();
        let zoom = self.hierarchy.arena[parent].level;
        self.hierarchy.touch(parent);
        self.hierarchy.arena[parent].apply(&mass);
        self.hierarchy.arena.link(parent, child);
        self.counts_mut(zoom).updated += 1;
        let grandparent = self.hierarchy.arena[parent].parent;
        self.propagate(grandparent, &mass);
    }

    /// Apply `delta` to `from` and every ancestor above it.
    fn propagate(&mut self, from: Option<ClusterKey>, delta: &ClusterDelta) {
        let mut cursor = from;
        while let Some(key) = cursor {
            self.hierarchy.touch(key);
            self.hierarchy.arena[key].apply(delta);
            cursor = self.hierarchy.arena[key].parent;
        }
    }

    /// Take `child` out of `parent`. A parent left without children is
    /// removed and detached from its own parent in turn.
    fn detach(&mut self, parent: ClusterKey, child: ClusterKey) {
        let mass = self.hierarchy.arena[child].mass();
        self.hierarchy.arena.unlink(parent, child);

        if self.hierarchy.arena[parent].children.is_empty() {
            let zoom = self.hierarchy.arena[parent].level;
            let grandparent = self.hierarchy.arena[parent].parent;
            self.hierarchy.retire(parent);
            if let Some(grandparent) = grandparent {
                self.detach(grandparent, parent);
            }
            self.hierarchy.arena.free(parent);
            self.counts_mut(zoom).deleted += 1;
        } else {
            let removed = mass.negated();
            self.hierarchy.touch(parent);
            self.hierarchy.arena[parent].apply(&removed);
            let grandparent = self.hierarchy.arena[parent].parent;
            self.propagate(grandparent, &removed);
        }
    }

    /// Re-anchor a drifted node and repair the group memberships around it.
    fn shift_eager(&mut self, key: ClusterKey) -> Result<()> {
        let Some(parent) = self.hierarchy.arena[key].parent else {
            self.hierarchy.place_advocator(key);
            return Ok(());
        };

        if self.hierarchy.arena[parent].advocator_child == Some(key) {
            let to_merge = self.merge_candidates(key, parent);
            let to_split = self.split_candidates(key, parent);
            self.hierarchy.place_advocator(key);

            for other in to_merge {
                if let Some(previous) = self.hierarchy.arena[other].parent {
                    self.detach(previous, other);
                }
                self.adopt(parent, other);
            }
            for child in to_split {
                self.detach(parent, child);
                self.attach(child)?;
            }
        } else {
            if self.strayed(key, parent) {
                self.detach(parent, key);
                self.attach(key)?;
            }
            self.hierarchy.place_advocator(key);
        }
        Ok(())
    }
}
