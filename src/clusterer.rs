//! The `Clusterer` facade.
//!
//! One type serves every strategy: the batch engine for
//! [`ClusteringStrategy::Batch`], the incremental engine with the matching
//! propagation otherwise. Loads are validated before anything is mutated and
//! reported to the configured [`LoadObserver`].
//!
//! # Examples
//!
//! ```rust
//! use geocluster::{ClusterConfig, Clusterer, Viewport};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut clusterer = Clusterer::new(ClusterConfig::new(0, 10))?;
//! clusterer.load_coords(&[(0.0, 0.0), (0.001, 0.001), (50.0, 50.0)])?;
//!
//! let visible = clusterer.clusters(&Viewport::world(), 2);
//! assert_eq!(visible.len(), 2);
//! # Ok(())
//! # }
//! ```

use crate::compute::projection::project;
use crate::config::ClusterConfig;
use crate::engine::{BatchEngine, IncrementalEngine, Propagation};
use crate::error::{ClusterError, Result};
use crate::hierarchy::Hierarchy;
use crate::observer::{LoadObserver, LogObserver};
use crate::query::{self, TreeCut};
use geocluster_types::{ClusterRecord, ClusteringStrategy, LevelCounts, LoadStats, PointTuple, Viewport};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

enum Engine {
    Batch(BatchEngine),
    Incremental(IncrementalEngine),
}

impl Engine {
    fn new(config: &ClusterConfig) -> Self {
        match Propagation::from_strategy(config.strategy) {
            Some(propagation) => Engine::Incremental(IncrementalEngine::new(config, propagation)),
            None => Engine::Batch(BatchEngine::new(config)),
        }
    }

    fn hierarchy(&self) -> &Hierarchy {
        match self {
            Engine::Batch(engine) => engine.hierarchy(),
            Engine::Incremental(engine) => engine.hierarchy(),
        }
    }

    fn load(&mut self, points: &[(f64, f64)]) -> Result<Vec<LevelCounts>> {
        match self {
            Engine::Batch(engine) => engine.load(points),
            Engine::Incremental(engine) => engine.load(points),
        }
    }
}

/// Node count of one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSize {
    pub zoom: u8,
    pub nodes: usize,
}

/// Snapshot of a hierarchy's size and load history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyStats {
    pub strategy: ClusteringStrategy,
    pub total_points: u64,
    /// Finest level first
    pub levels: Vec<LevelSize>,
    pub loads: u64,
    pub totals: LoadStats,
}

/// A multi-resolution cluster hierarchy over geographic points.
pub struct Clusterer {
    config: ClusterConfig,
    engine: Engine,
    observer: Arc<dyn LoadObserver>,
    loads: u64,
    totals: LoadStats,
}

impl std::fmt::Debug for Clusterer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clusterer")
            .field("config", &self.config)
            .field("total_points", &self.len())
            .field("loads", &self.loads)
            .finish()
    }
}

impl Clusterer {
    /// Create an empty hierarchy.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::InvalidConfig` if the configuration does not validate.
    pub fn new(config: ClusterConfig) -> Result<Self> {
        Self::with_observer(config, Arc::new(LogObserver))
    }

    /// Create an empty hierarchy reporting loads to `observer`.
    pub fn with_observer(config: ClusterConfig, observer: Arc<dyn LoadObserver>) -> Result<Self> {
        config.validate().map_err(ClusterError::InvalidConfig)?;
        Ok(Self {
            engine: Engine::new(&config),
            config,
            observer,
            loads: 0,
            totals: LoadStats::new(),
        })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn strategy(&self) -> ClusteringStrategy {
        self.config.strategy
    }

    pub fn min_zoom(&self) -> u8 {
        self.config.min_zoom
    }

    pub fn max_zoom(&self) -> u8 {
        self.config.max_zoom
    }

    /// Finest queryable level: one past `max_zoom` for the batch strategy,
    /// which keeps the raw points there.
    pub fn top_zoom(&self) -> u8 {
        self.hierarchy().top_zoom()
    }

    /// Points loaded so far.
    pub fn len(&self) -> u64 {
        self.hierarchy().total_points()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn hierarchy(&self) -> &Hierarchy {
        self.engine.hierarchy()
    }

    /// Add points to the hierarchy.
    ///
    /// Every point is checked before the hierarchy is touched; a single
    /// non-finite coordinate rejects the whole batch. Tuple ids are ignored:
    /// points are numbered in load order, continuing across loads.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::InvalidInput` for a non-finite coordinate and
    /// `ClusterError::CapacityExceeded` when the hierarchy runs out of node
    /// keys.
    pub fn load(&mut self, points: &[PointTuple]) -> Result<LoadStats> {
        let coords: Vec<(f64, f64)> = points.iter().map(|p| (p.x, p.y)).collect();
        self.load_coords(&coords)
    }

    /// Add `(longitude, latitude)` pairs; ids follow load order.
    pub fn load_coords(&mut self, coords: &[(f64, f64)]) -> Result<LoadStats> {
        if let Some((i, (lng, lat))) = coords
            .iter()
            .enumerate()
            .find(|(_, (lng, lat))| !lng.is_finite() || !lat.is_finite())
        {
            return Err(ClusterError::InvalidInput(format!(
                "point {} has non-finite coordinates ({}, {})",
                i, lng, lat
            )));
        }

        let mut stats = LoadStats::new();
        if coords.is_empty() {
            return Ok(stats);
        }

        let projected: Vec<(f64, f64)> = coords.iter().map(|&(lng, lat)| project(lng, lat)).collect();
        let started = Instant::now();
        let levels = self.engine.load(&projected)?;
        stats.elapsed = started.elapsed();
        stats.points = coords.len() as u64;

        for counts in &levels {
            stats.record_level(counts);
            self.observer.level_processed(self.config.strategy, counts);
        }
        self.observer.load_finished(self.config.strategy, &stats);

        self.loads += 1;
        self.totals.accumulate(&stats);
        Ok(stats)
    }

    /// Clusters visible in `viewport` at `zoom`, clamped to the stored levels.
    pub fn clusters(&self, viewport: &Viewport, zoom: u8) -> Vec<ClusterRecord> {
        query::clusters(self.hierarchy(), viewport, zoom)
    }

    /// Every node of level `zoom`, or `None` outside the stored levels.
    pub fn clusters_at(&self, zoom: u8) -> Option<Vec<ClusterRecord>> {
        query::clusters_at(self.hierarchy(), zoom)
    }

    /// Projected distance between the nodes with ids `a` and `b` at `zoom`.
    pub fn cluster_distance(&self, zoom: u8, a: i64, b: i64) -> Option<f64> {
        query::cluster_distance(self.hierarchy(), zoom, a, b)
    }

    /// Grouping radius of `zoom` in the projected plane.
    pub fn radius(&self, zoom: u8) -> Option<f64> {
        self.hierarchy().radii.get(zoom)
    }

    /// Id of the node holding each loaded point at `zoom`, in load order.
    pub fn clustering_labels(&self, zoom: u8) -> Option<Vec<i64>> {
        query::labels(self.hierarchy(), zoom)
    }

    pub fn clusters_tree_cut(&self, viewport: &Viewport, zoom: u8, cut: &TreeCut) -> Vec<ClusterRecord> {
        query::tree_cut(self.hierarchy(), viewport, zoom, cut)
    }

    /// Zoom at which the node `id` of level `zoom` first splits into several
    /// children. Recorded by the batch strategy only.
    pub fn expansion_zoom(&self, zoom: u8, id: i64) -> Option<u8> {
        query::expansion_zoom(self.hierarchy(), zoom, id)
    }

    pub fn stats(&self) -> HierarchyStats {
        let h = self.hierarchy();
        HierarchyStats {
            strategy: self.config.strategy,
            total_points: h.total_points(),
            levels: (h.min_zoom()..=h.top_zoom())
                .rev()
                .map(|zoom| LevelSize {
                    zoom,
                    nodes: h.level(zoom).members.len(),
                })
                .collect(),
            loads: self.loads,
            totals: self.totals.clone(),
        }
    }

    /// Consistency violations of the hierarchy; empty when it is sound.
    pub fn check_invariants(&self) -> Vec<String> {
        self.hierarchy().check_invariants()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::test_support::RecordingObserver;

    fn config(strategy: ClusteringStrategy) -> ClusterConfig {
        ClusterConfig::new(0, 10).with_strategy(strategy)
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = ClusterConfig::new(0, 10);
        config.min_zoom = 12;
        assert!(matches!(Clusterer::new(config), Err(ClusterError::InvalidConfig(_))));
    }

    #[test]
    fn test_non_finite_batch_is_rejected_whole() {
        let mut clusterer = Clusterer::new(config(ClusteringStrategy::LevelBatched)).unwrap();
        let err = clusterer
            .load_coords(&[(1.0, 1.0), (f64::NAN, 2.0)])
            .unwrap_err();
        assert!(matches!(err, ClusterError::InvalidInput(_)));
        assert!(clusterer.is_empty());
        assert_eq!(clusterer.stats().loads, 0);
    }

    #[test]
    fn test_observer_sees_every_level() {
        let observer = Arc::new(RecordingObserver::default());
        let mut clusterer =
            Clusterer::with_observer(config(ClusteringStrategy::Eager), observer.clone()).unwrap();
        clusterer.load_coords(&[(3.0, 4.0), (3.0001, 4.0)]).unwrap();

        assert_eq!(observer.levels.lock().len(), 11);
        let loads = observer.loads.lock();
        assert_eq!(loads.len(), 1);
        assert_eq!(loads[0].points, 2);
        assert_eq!(loads[0].inserted, 1 + 10);
    }

    #[test]
    fn test_stats_track_loads() {
        let mut clusterer = Clusterer::new(config(ClusteringStrategy::Batch)).unwrap();
        clusterer.load_coords(&[(0.0, 0.0)]).unwrap();
        clusterer.load_coords(&[(20.0, 20.0), (40.0, -20.0)]).unwrap();

        let stats = clusterer.stats();
        assert_eq!(stats.total_points, 3);
        assert_eq!(stats.loads, 2);
        assert_eq!(stats.totals.points, 3);
        assert_eq!(stats.levels.len(), 12);
        assert_eq!(stats.levels[0], LevelSize { zoom: 11, nodes: 3 });
        assert_eq!(clusterer.top_zoom(), 11);
    }

    #[test]
    fn test_empty_load_is_a_no_op() {
        let mut clusterer = Clusterer::new(config(ClusteringStrategy::Ordered)).unwrap();
        let stats = clusterer.load(&[]).unwrap();
        assert_eq!(stats.points, 0);
        assert_eq!(clusterer.stats().loads, 0);
    }
}
