//! # geocluster-types
//!
//! Value types exchanged between the geocluster hierarchy and the code around it.
//!
//! - **Input**: `PointTuple`, the `(x, y, id)` records a data source produces
//! - **Output**: `ClusterRecord` and its `PointCount`
//! - **Queries**: `Viewport`, a lon/lat box that may cross the antimeridian
//! - **Configuration**: `IndexKind`, `ClusteringStrategy`
//! - **Statistics**: `LoadStats`, `LevelCounts`
//!
//! All types are serializable with Serde.
//!
//! ## Examples
//!
//! ```rust
//! use geocluster_types::point::PointTuple;
//! use geocluster_types::viewport::Viewport;
//!
//! let tuple = PointTuple::new(-74.0060, 40.7128, 7);
//! let view = Viewport::new(170.0, -10.0, -170.0, 10.0);
//! assert!(view.wraps_antimeridian());
//! assert_eq!(tuple.id, 7);
//! ```

pub mod cluster;
pub mod config;
pub mod point;
pub mod stats;
pub mod viewport;

pub use cluster::{ClusterRecord, PointCount};
pub use config::{ClusteringStrategy, IndexKind};
pub use point::PointTuple;
pub use stats::{LevelCounts, LoadStats};
pub use viewport::Viewport;
