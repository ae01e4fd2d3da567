//! Multi-resolution clustering of geographic points for map display.
//!
//! A [`Clusterer`] keeps one level of clusters per zoom. Points are grouped
//! greedily by screen-space radius, either rebuilt from scratch on every load
//! or folded into the existing hierarchy incrementally.
//!
//! ```rust
//! use geocluster::{ClusterConfig, Clusterer, ClusteringStrategy, Viewport};
//!
//! let config = ClusterConfig::new(0, 14).with_strategy(ClusteringStrategy::LevelBatched);
//! let mut clusterer = Clusterer::new(config)?;
//!
//! clusterer.load_coords(&[(-74.0060, 40.7128), (-73.9855, 40.7580), (-0.1278, 51.5074)])?;
//! let overview = clusterer.clusters(&Viewport::world(), 1);
//! assert_eq!(overview.len(), 2);
//! # Ok::<(), geocluster::ClusterError>(())
//! ```

pub mod builder;
pub mod clusterer;
pub mod compute;
pub mod config;
pub mod engine;
pub mod error;
pub mod hierarchy;
pub mod index;
pub mod model;
pub mod observer;
pub mod query;

#[cfg(feature = "geojson")]
pub mod geojson;

#[cfg(feature = "sync")]
pub mod registry;
#[cfg(feature = "sync")]
pub mod sync;

pub use builder::ClustererBuilder;
pub use clusterer::{Clusterer, HierarchyStats, LevelSize};
pub use config::ClusterConfig;
pub use error::{ClusterError, Result};
pub use observer::{LoadObserver, LogObserver, NoopObserver};
pub use query::{DistanceMeasure, TreeCut};

pub use compute::labels::{adjusted_rand_index, rand_index};
pub use index::{GridIndex, IndexEntry, KdTree, RTreeIndex, SpatialIndex};

pub use geocluster_types::{
    ClusterRecord, ClusteringStrategy, IndexKind, LevelCounts, LoadStats, PointCount, PointTuple,
    Viewport,
};

#[cfg(feature = "sync")]
pub use registry::ClustererRegistry;
#[cfg(feature = "sync")]
pub use sync::SyncClusterer;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{ClusterConfig, ClusterError, Clusterer, ClustererBuilder, Result};

    pub use crate::{ClusterRecord, ClusteringStrategy, IndexKind, PointTuple, Viewport};

    pub use crate::{DistanceMeasure, TreeCut};

    #[cfg(feature = "sync")]
    pub use crate::{ClustererRegistry, SyncClusterer};
}
