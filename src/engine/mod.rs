//! Clustering engines.
//!
//! [`BatchEngine`] rebuilds every level from scratch on each load;
//! [`IncrementalEngine`] folds new points into the existing hierarchy.

pub mod batch;
pub mod incremental;

pub use batch::BatchEngine;
pub use incremental::{IncrementalEngine, Propagation};
