//! Thread-safe wrapper for shared hierarchies.
//!
//! `SyncClusterer` puts a [`Clusterer`] behind `Arc<RwLock<_>>`: a load takes
//! the write lock for its whole run, so readers never observe a half-settled
//! hierarchy, while queries share the read lock and run side by side.
//!
//! # Examples
//!
//! ```rust
//! use geocluster::{ClusterConfig, SyncClusterer, Viewport};
//! use std::thread;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let clusterer = SyncClusterer::new(ClusterConfig::new(0, 12))?;
//!
//! let writer = clusterer.clone();
//! let handle = thread::spawn(move || writer.load_coords(&[(2.35, 48.85), (2.36, 48.86)]));
//! handle.join().unwrap()?;
//!
//! assert_eq!(clusterer.len(), 2);
//! assert_eq!(clusterer.clusters(&Viewport::world(), 0).len(), 1);
//! # Ok(())
//! # }
//! ```

use crate::clusterer::{Clusterer, HierarchyStats};
use crate::config::ClusterConfig;
use crate::error::Result;
use crate::query::TreeCut;
use geocluster_types::{ClusterRecord, LoadStats, PointTuple, Viewport};
use parking_lot::RwLock;
use std::sync::Arc;

/// Single-writer, multi-reader handle to a [`Clusterer`]. Clones share the
/// same hierarchy.
#[derive(Clone, Debug)]
pub struct SyncClusterer {
    inner: Arc<RwLock<Clusterer>>,
}

impl SyncClusterer {
    pub fn new(config: ClusterConfig) -> Result<Self> {
        Ok(Self::from_clusterer(Clusterer::new(config)?))
    }

    pub fn from_clusterer(clusterer: Clusterer) -> Self {
        Self {
            inner: Arc::new(RwLock::new(clusterer)),
        }
    }

    /// Run `f` under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&Clusterer) -> R) -> R {
        f(&self.inner.read())
    }

    // ===== Loads =====

    pub fn load(&self, points: &[PointTuple]) -> Result<LoadStats> {
        self.inner.write().load(points)
    }

    pub fn load_coords(&self, coords: &[(f64, f64)]) -> Result<LoadStats> {
        self.inner.write().load_coords(coords)
    }

    // ===== Queries =====

    pub fn clusters(&self, viewport: &Viewport, zoom: u8) -> Vec<ClusterRecord> {
        self.inner.read().clusters(viewport, zoom)
    }

    pub fn clusters_at(&self, zoom: u8) -> Option<Vec<ClusterRecord>> {
        self.inner.read().clusters_at(zoom)
    }

    pub fn cluster_distance(&self, zoom: u8, a: i64, b: i64) -> Option<f64> {
        self.inner.read().cluster_distance(zoom, a, b)
    }

    pub fn clustering_labels(&self, zoom: u8) -> Option<Vec<i64>> {
        self.inner.read().clustering_labels(zoom)
    }

    pub fn clusters_tree_cut(&self, viewport: &Viewport, zoom: u8, cut: &TreeCut) -> Vec<ClusterRecord> {
        self.inner.read().clusters_tree_cut(viewport, zoom, cut)
    }

    pub fn expansion_zoom(&self, zoom: u8, id: i64) -> Option<u8> {
        self.inner.read().expansion_zoom(zoom, id)
    }

    pub fn radius(&self, zoom: u8) -> Option<f64> {
        self.inner.read().radius(zoom)
    }

    pub fn stats(&self) -> HierarchyStats {
        self.inner.read().stats()
    }

    pub fn len(&self) -> u64 {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
