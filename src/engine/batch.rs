//! One-shot agglomeration of the whole point set.
//!
//! Raw points sit on level `max_zoom + 1`. Each coarser level is built from
//! the one below: every node not yet absorbed gathers all neighbours within
//! the level radius, and if it found any they are replaced by a parent at
//! their weighted centroid. Nodes that found nobody carry over unchanged.

use crate::compute::projection::ZoomRadii;
use crate::config::ClusterConfig;
use crate::error::Result;
use crate::hierarchy::{Hierarchy, Layout};
use crate::model::{Advocator, Cluster, ClusterKey};
use geo::Coord;
use geocluster_types::{IndexKind, LevelCounts, PointCount};
use rustc_hash::FxHashSet;

pub struct BatchEngine {
    hierarchy: Hierarchy,
    kind: IndexKind,
    min_zoom: u8,
    max_zoom: u8,
    radii: ZoomRadii,
    points: Vec<(f64, f64)>,
}

impl BatchEngine {
    pub fn new(config: &ClusterConfig) -> Self {
        let radii = ZoomRadii::new(config.radius, config.extent, config.max_zoom);
        Self {
            hierarchy: Self::empty(config.min_zoom, config.max_zoom, &radii, config.index),
            kind: config.index,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            radii,
            points: Vec::new(),
        }
    }

    fn empty(min_zoom: u8, max_zoom: u8, radii: &ZoomRadii, kind: IndexKind) -> Hierarchy {
        Hierarchy::new(min_zoom, max_zoom + 1, radii.clone(), kind, Layout::Flattened)
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// Add projected points and rebuild every level from the full set.
    ///
    /// A failed rebuild keeps the previous hierarchy and drops `points`.
    pub fn load(&mut self, points: &[(f64, f64)]) -> Result<Vec<LevelCounts>> {
        let kept = self.points.len();
        self.points.extend_from_slice(points);
        let rebuilt = self.rebuild();
        if rebuilt.is_err() {
            self.points.truncate(kept);
        }
        rebuilt
    }

    fn rebuild(&mut self) -> Result<Vec<LevelCounts>> {
        let mut h = Self::empty(self.min_zoom, self.max_zoom, &self.radii, self.kind);
        let top = self.max_zoom + 1;

        let mut current: Vec<ClusterKey> = Vec::with_capacity(self.points.len());
        for (origin, &(x, y)) in self.points.iter().enumerate() {
            current.push(h.arena.alloc(Cluster::point(x, y, origin as u64, top))?);
        }
        h.owners = current.clone();
        h.total_points = self.points.len() as u64;
        install(&mut h, top, &current);

        let mut counts = Vec::new();
        for zoom in (self.min_zoom..=self.max_zoom).rev() {
            let (next, level_counts) = cluster_level(&mut h, &current, zoom)?;
            install(&mut h, zoom, &next);
            log::debug!(
                "zoom {}: {} nodes from {} ({} merged)",
                zoom,
                next.len(),
                current.len(),
                level_counts.inserted
            );
            counts.push(level_counts);
            current = next;
        }

        self.hierarchy = h;
        Ok(counts)
    }
}

/// Make `keys` the members of `zoom` and index them.
fn install(h: &mut Hierarchy, zoom: u8, keys: &[ClusterKey]) {
    let mut entries = Vec::with_capacity(keys.len());
    for &key in keys {
        let cluster = &mut h.arena[key];
        let advocator = Advocator {
            x: cluster.x,
            y: cluster.y,
            seq: cluster.seq,
            cluster: key,
        };
        cluster.advocator = Some(advocator);
        entries.push(advocator);
    }
    let level = h.level_mut(zoom);
    for &key in keys {
        level.members.insert(key);
    }
    level.advocators.load(entries);
}

/// Build level `zoom` from the nodes of `zoom + 1`.
fn cluster_level(h: &mut Hierarchy, current: &[ClusterKey], zoom: u8) -> Result<(Vec<ClusterKey>, LevelCounts)> {
    let radius = h.radius(zoom);
    let mut counts = LevelCounts::new(zoom);
    let mut visited: FxHashSet<ClusterKey> = FxHashSet::default();
    let mut next = Vec::with_capacity(current.len());

    for &key in current {
        if !visited.insert(key) {
            continue;
        }
        let (x, y) = (h.arena[key].x, h.arena[key].y);
        let neighbors = h.level(zoom + 1).advocators.within(Coord { x, y }, radius);

        let mut mass = h.arena[key].mass();
        let mut merged = Vec::new();
        for adv in neighbors {
            if visited.insert(adv.cluster) {
                mass.combine(&h.arena[adv.cluster].mass());
                merged.push(adv.cluster);
            }
        }

        let Some((cx, cy)) = mass.centroid().filter(|_| !merged.is_empty()) else {
            next.push(key);
            continue;
        };

        let seed = &h.arena[key];
        let mut parent = Cluster::with_count(
            cx,
            cy,
            seed.origin,
            seed.seq,
            zoom,
            PointCount::Aggregated(mass.num_points as u32),
        );
        for &member in std::iter::once(&key).chain(&merged) {
            let node = &h.arena[member];
            if node.children.is_empty() {
                parent.children.push(member);
            } else {
                parent.children.extend_from_slice(&node.children);
            }
        }
        parent.expansion_zoom = Some(zoom + 1);

        let parent_key = h.arena.alloc(parent)?;
        for member in std::iter::once(key).chain(merged) {
            h.arena[member].parent = Some(parent_key);
        }
        counts.inserted += 1;
        next.push(parent_key);
    }

    Ok((next, counts))
}
