//! Per-level state shared by every clustering strategy.
//!
//! Each zoom level owns an advocator index (what viewport queries search and
//! what new members join through), an optional cluster index holding node
//! centroids (what shifts search for merge candidates), the set of member
//! nodes and a queue of nodes waiting to be re-indexed.

use crate::compute::projection::{ZoomRadii, unproject};
use crate::error::Result;
use crate::index::{IndexKind, SpatialIndex, create_index};
use crate::model::{Advocator, Cluster, ClusterArena, ClusterEntry, ClusterKey, KeySet};
use geocluster_types::ClusterRecord;

pub struct Level {
    pub zoom: u8,
    pub advocators: Box<dyn SpatialIndex<Advocator>>,
    pub clusters: Option<Box<dyn SpatialIndex<ClusterEntry>>>,
    pub members: KeySet,
    pub pending: Vec<ClusterKey>,
}

/// How nodes of consecutive levels relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Every node lives on exactly one level and its parent on the next
    /// coarser one; children are direct.
    Nested,
    /// Unmerged nodes are shared by consecutive levels and children are the
    /// raw points underneath.
    Flattened,
}

pub struct Hierarchy {
    pub(crate) min_zoom: u8,
    pub(crate) top_zoom: u8,
    pub(crate) layout: Layout,
    pub(crate) radii: ZoomRadii,
    pub(crate) arena: ClusterArena,
    pub(crate) levels: Vec<Level>,
    pub(crate) total_points: u64,
    /// Finest-level node holding each loaded point, in load order
    pub(crate) owners: Vec<ClusterKey>,
}

impl Hierarchy {
    /// Create empty levels `min_zoom..=top_zoom`.
    ///
    /// A `Nested` hierarchy queries advocators at a level with that level's
    /// radius and keeps a cluster index per level; a `Flattened` one queries a
    /// level with the next coarser radius and needs no cluster index.
    pub fn new(min_zoom: u8, top_zoom: u8, radii: ZoomRadii, kind: IndexKind, layout: Layout) -> Self {
        let levels = (min_zoom..=top_zoom)
            .map(|zoom| {
                let advocator_cell = match layout {
                    Layout::Nested => radii.at(zoom),
                    Layout::Flattened => radii.parent_radius(zoom),
                };
                Level {
                    zoom,
                    advocators: create_index(kind, advocator_cell),
                    clusters: match layout {
                        Layout::Nested => Some(create_index(kind, radii.parent_radius(zoom))),
                        Layout::Flattened => None,
                    },
                    members: KeySet::new(),
                    pending: Vec::new(),
                }
            })
            .collect();
        Self {
            min_zoom,
            top_zoom,
            layout,
            radii,
            arena: ClusterArena::new(),
            levels,
            total_points: 0,
            owners: Vec::new(),
        }
    }

    pub fn min_zoom(&self) -> u8 {
        self.min_zoom
    }

    /// Finest stored level.
    pub fn top_zoom(&self) -> u8 {
        self.top_zoom
    }

    pub fn total_points(&self) -> u64 {
        self.total_points
    }

    pub fn arena(&self) -> &ClusterArena {
        &self.arena
    }

    pub fn radius(&self, zoom: u8) -> f64 {
        self.radii.at(zoom)
    }

    pub fn contains_zoom(&self, zoom: u8) -> bool {
        (self.min_zoom..=self.top_zoom).contains(&zoom)
    }

    pub fn level(&self, zoom: u8) -> &Level {
        &self.levels[usize::from(zoom - self.min_zoom)]
    }

    pub fn level_mut(&mut self, zoom: u8) -> &mut Level {
        &mut self.levels[usize::from(zoom - self.min_zoom)]
    }

    pub fn try_level(&self, zoom: u8) -> Option<&Level> {
        if self.contains_zoom(zoom) {
            Some(self.level(zoom))
        } else {
            None
        }
    }

    pub fn record(&self, key: ClusterKey) -> ClusterRecord {
        let cluster = &self.arena[key];
        let (lng, lat) = unproject(cluster.x, cluster.y);
        ClusterRecord::new(cluster.id(), lng, lat, cluster.count)
    }

    /// Allocate a node and make it a member of its level: advocator at its
    /// position, entry in the cluster index.
    pub fn admit(&mut self, cluster: Cluster) -> Result<ClusterKey> {
        let zoom = cluster.level;
        let key = self.arena.alloc(cluster)?;
        self.level_mut(zoom).members.insert(key);
        self.place_advocator(key);
        self.index_cluster(key);
        Ok(key)
    }

    /// Put `key`'s advocator at its current position.
    pub fn place_advocator(&mut self, key: ClusterKey) {
        let (x, y) = (self.arena[key].x, self.arena[key].y);
        self.move_advocator(key, x, y);
    }

    /// Move `key`'s advocator to `(x, y)`, creating it if needed.
    pub fn move_advocator(&mut self, key: ClusterKey, x: f64, y: f64) {
        let cluster = &self.arena[key];
        let zoom = cluster.level;
        let seq = cluster.seq;
        let old = cluster.advocator;
        let advocator = Advocator {
            x,
            y,
            seq,
            cluster: key,
        };
        let level = self.level_mut(zoom);
        if let Some(old) = old {
            level.advocators.delete(&old);
        }
        level.advocators.insert(advocator);
        self.arena[key].advocator = Some(advocator);
    }

    pub fn remove_advocator(&mut self, key: ClusterKey) {
        let zoom = self.arena[key].level;
        if let Some(old) = self.arena[key].advocator.take() {
            self.level_mut(zoom).advocators.delete(&old);
        }
    }

    /// Insert the node's current position into its level's cluster index.
    pub fn index_cluster(&mut self, key: ClusterKey) {
        let cluster = &self.arena[key];
        let zoom = cluster.level;
        let entry = cluster.entry(key);
        let slot = usize::from(zoom - self.min_zoom);
        if let Some(index) = self.levels[slot].clusters.as_mut() {
            index.insert(entry);
            self.arena[key].indexed = Some(entry);
        }
    }

    pub fn unindex_cluster(&mut self, key: ClusterKey) {
        let zoom = self.arena[key].level;
        if let Some(entry) = self.arena[key].indexed.take()
            && let Some(index) = self.level_mut(zoom).clusters.as_mut()
        {
            index.delete(&entry);
        }
    }

    /// Take the node out of its cluster index ahead of a coordinate change and
    /// queue it for re-indexing.
    pub fn touch(&mut self, key: ClusterKey) {
        self.unindex_cluster(key);
        let cluster = &mut self.arena[key];
        if !cluster.dirty {
            cluster.dirty = true;
            let zoom = cluster.level;
            self.level_mut(zoom).pending.push(key);
        }
    }

    /// Re-index every node touched since the last flush of `zoom`.
    pub fn flush(&mut self, zoom: u8) {
        let pending = std::mem::take(&mut self.level_mut(zoom).pending);
        for key in pending {
            let Some(cluster) = self.arena.get_mut(key) else {
                continue;
            };
            if !cluster.dirty {
                continue;
            }
            cluster.dirty = false;
            self.index_cluster(key);
        }
    }

    /// Remove the node from every structure of its level, keeping it allocated.
    pub fn retire(&mut self, key: ClusterKey) {
        self.remove_advocator(key);
        self.unindex_cluster(key);
        let cluster = &mut self.arena[key];
        cluster.dirty = false;
        let zoom = cluster.level;
        self.level_mut(zoom).members.remove(key);
    }

    /// Nodes at `zoom` whose advocator lies within `radius` of `(x, y)`.
    pub fn advocators_near(&self, zoom: u8, x: f64, y: f64, radius: f64) -> Vec<Advocator> {
        self.level(zoom)
            .advocators
            .within(geo::Coord { x, y }, radius)
    }

    /// The advocator with the smallest sequence number, ties broken by key.
    pub fn earliest(advocators: &[Advocator]) -> Option<Advocator> {
        advocators
            .iter()
            .copied()
            .min_by_key(|adv| (adv.seq, adv.cluster))
    }

    /// The node holding point `point` at `zoom`.
    pub fn node_at(&self, point: usize, zoom: u8) -> Option<ClusterKey> {
        if !self.contains_zoom(zoom) {
            return None;
        }
        let mut node = *self.owners.get(point)?;
        while let Some(parent) = self.arena[node].parent {
            if self.arena[parent].level < zoom {
                break;
            }
            node = parent;
        }
        Some(node)
    }

    /// Check mass, centroid and linkage invariants over every level.
    ///
    /// Returns one message per violation; an empty list means the hierarchy
    /// is consistent.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();
        for level in &self.levels {
            let zoom = level.zoom;
            let mut mass = 0u64;
            for key in level.members.iter() {
                let Some(cluster) = self.arena.get(key) else {
                    violations.push(format!("zoom {}: member {:?} was freed", zoom, key));
                    continue;
                };
                mass += u64::from(cluster.weight());

                if !cluster.x.is_finite() || !cluster.y.is_finite() {
                    violations.push(format!("zoom {}: node {} has a non-finite centroid", zoom, cluster.id()));
                }
                if cluster.advocator.is_none() {
                    violations.push(format!("zoom {}: node {} has no advocator", zoom, cluster.id()));
                }
                self.check_children(zoom, key, cluster, &mut violations);

                if self.layout == Layout::Nested && zoom > self.min_zoom {
                    match cluster.parent.and_then(|p| self.arena.get(p)) {
                        Some(parent) if parent.level + 1 == zoom && parent.children.contains(&key) => {}
                        Some(_) => violations.push(format!(
                            "zoom {}: node {} is not listed by its parent",
                            zoom,
                            cluster.id()
                        )),
                        None => violations.push(format!("zoom {}: node {} has no parent", zoom, cluster.id())),
                    }
                }
            }
            if mass != self.total_points {
                violations.push(format!(
                    "zoom {}: level holds {} points, expected {}",
                    zoom, mass, self.total_points
                ));
            }
        }
        violations
    }

    fn check_children(&self, zoom: u8, key: ClusterKey, cluster: &Cluster, violations: &mut Vec<String>) {
        if cluster.children.is_empty() {
            return;
        }
        let mut weight = 0u64;
        let (mut wx, mut wy) = (0.0, 0.0);
        for &child_key in &cluster.children {
            let Some(child) = self.arena.get(child_key) else {
                violations.push(format!("zoom {}: node {} lists a freed child", zoom, cluster.id()));
                return;
            };
            if self.layout == Layout::Nested && child.parent != Some(key) {
                violations.push(format!(
                    "zoom {}: child {} of {} points elsewhere",
                    zoom,
                    child.id(),
                    cluster.id()
                ));
            }
            let w = f64::from(child.weight());
            weight += u64::from(child.weight());
            wx += child.x * w;
            wy += child.y * w;
        }
        if weight != u64::from(cluster.weight()) {
            violations.push(format!(
                "zoom {}: node {} counts {} points but its children hold {}",
                zoom,
                cluster.id(),
                cluster.weight(),
                weight
            ));
            return;
        }
        let tolerance = 1e-9;
        let (cx, cy) = (wx / weight as f64, wy / weight as f64);
        if (cx - cluster.x).abs() > tolerance || (cy - cluster.y).abs() > tolerance {
            violations.push(format!(
                "zoom {}: node {} sits at ({}, {}) but its children average ({}, {})",
                zoom,
                cluster.id(),
                cluster.x,
                cluster.y,
                cx,
                cy
            ));
        }
    }
}
