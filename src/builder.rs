//! Builder for clusterers.
//!
//! Collects configuration piecemeal, optionally from a file, and validates it
//! once in [`ClustererBuilder::build`] instead of panicking on the first bad
//! value.

use crate::clusterer::Clusterer;
use crate::config::ClusterConfig;
use crate::error::Result;
use crate::observer::{LoadObserver, LogObserver};
use geocluster_types::{ClusteringStrategy, IndexKind};
use std::path::Path;
use std::sync::Arc;

/// Builder for [`Clusterer`].
pub struct ClustererBuilder {
    config: ClusterConfig,
    observer: Arc<dyn LoadObserver>,
}

impl std::fmt::Debug for ClustererBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClustererBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ClustererBuilder {
    /// Start from the default configuration.
    pub fn new() -> Self {
        Self {
            config: ClusterConfig::default(),
            observer: Arc::new(LogObserver),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ClusterConfig) -> Self {
        self.config = config;
        self
    }

    /// Read the configuration from a JSON or TOML file.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        self.config = ClusterConfig::from_file(path)?;
        Ok(self)
    }

    pub fn zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.config.min_zoom = min_zoom;
        self.config.max_zoom = max_zoom;
        self
    }

    /// Cluster radius in pixels.
    pub fn radius(mut self, radius: f64) -> Self {
        self.config.radius = radius;
        self
    }

    /// Tile extent in pixels.
    pub fn extent(mut self, extent: f64) -> Self {
        self.config.extent = extent;
        self
    }

    /// Shift threshold as a fraction of the parent radius.
    pub fn mu(mut self, mu: f64) -> Self {
        self.config.mu = mu;
        self
    }

    pub fn index(mut self, index: IndexKind) -> Self {
        self.config.index = index;
        self
    }

    pub fn strategy(mut self, strategy: ClusteringStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Report loads to `observer` instead of the log.
    pub fn observer(mut self, observer: Arc<dyn LoadObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Validate the configuration and create an empty hierarchy.
    pub fn build(self) -> Result<Clusterer> {
        Clusterer::with_observer(self.config, self.observer)
    }
}

impl Default for ClustererBuilder {
    fn default() -> Self {
        Self::new()
    }
}
