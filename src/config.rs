//! Hierarchy configuration.

use crate::compute::projection::zoom_radius;
use crate::error::{ClusterError, Result};
use geocluster_types::{ClusteringStrategy, IndexKind};
use serde::de::Error;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Highest supported `max_zoom`: cluster ids keep `zoom + 1` in five bits.
pub const MAX_SUPPORTED_ZOOM: u8 = 30;

/// Configuration for one cluster hierarchy.
///
/// # Examples
///
/// ```rust
/// use geocluster::ClusterConfig;
///
/// let json = r#"{
///     "max_zoom": 12,
///     "radius": 40.0,
///     "index": "KDTree",
///     "strategy": "ordered"
/// }"#;
/// let config = ClusterConfig::from_json(json).unwrap();
/// assert_eq!(config.max_zoom, 12);
/// assert_eq!(config.extent, 256.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Coarsest level kept in the hierarchy
    #[serde(default = "ClusterConfig::default_min_zoom")]
    pub min_zoom: u8,

    /// Finest clustered level; the batch strategy also keeps raw points at `max_zoom + 1`
    #[serde(default = "ClusterConfig::default_max_zoom")]
    pub max_zoom: u8,

    /// Cluster radius in pixels
    #[serde(default = "ClusterConfig::default_radius")]
    pub radius: f64,

    /// Tile extent in pixels
    #[serde(default = "ClusterConfig::default_extent")]
    pub extent: f64,

    /// Fraction of the parent radius a node may drift from its advocator
    /// before the advocator is shifted
    #[serde(default = "ClusterConfig::default_mu")]
    pub mu: f64,

    /// Unknown names fall back to the k-d tree
    #[serde(default, deserialize_with = "lenient_index_kind")]
    pub index: IndexKind,

    #[serde(default)]
    pub strategy: ClusteringStrategy,
}

impl ClusterConfig {
    const fn default_min_zoom() -> u8 {
        0
    }

    const fn default_max_zoom() -> u8 {
        17
    }

    const fn default_radius() -> f64 {
        60.0
    }

    const fn default_extent() -> f64 {
        256.0
    }

    const fn default_mu() -> f64 {
        0.5
    }

    pub fn new(min_zoom: u8, max_zoom: u8) -> Self {
        Self {
            min_zoom,
            max_zoom,
            ..Self::default()
        }
    }

    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        assert!(min_zoom <= max_zoom, "min_zoom must not exceed max_zoom");
        assert!(
            max_zoom <= MAX_SUPPORTED_ZOOM,
            "max_zoom must be at most {}",
            MAX_SUPPORTED_ZOOM
        );
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        assert!(
            radius.is_finite() && radius > 0.0,
            "Radius must be positive and finite"
        );
        self.radius = radius;
        self
    }

    pub fn with_extent(mut self, extent: f64) -> Self {
        assert!(
            extent.is_finite() && extent > 0.0,
            "Extent must be positive and finite"
        );
        self.extent = extent;
        self
    }

    pub fn with_mu(mut self, mu: f64) -> Self {
        assert!(mu.is_finite() && mu >= 0.0, "Mu must be non-negative and finite");
        self.mu = mu;
        self
    }

    pub fn with_index(mut self, index: IndexKind) -> Self {
        self.index = index;
        self
    }

    pub fn with_strategy(mut self, strategy: ClusteringStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Clustering radius at `zoom` in projected units.
    pub fn radius_at(&self, zoom: u8) -> f64 {
        zoom_radius(self.radius, self.extent, zoom)
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.min_zoom > self.max_zoom {
            return Err(format!(
                "min_zoom ({}) must not exceed max_zoom ({})",
                self.min_zoom, self.max_zoom
            ));
        }

        if self.max_zoom > MAX_SUPPORTED_ZOOM {
            return Err(format!(
                "max_zoom must be at most {}, got {}",
                MAX_SUPPORTED_ZOOM, self.max_zoom
            ));
        }

        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err("Radius must be positive and finite".to_string());
        }

        if !self.extent.is_finite() || self.extent <= 0.0 {
            return Err("Extent must be positive and finite".to_string());
        }

        if !self.mu.is_finite() || self.mu < 0.0 {
            return Err("Mu must be non-negative and finite".to_string());
        }

        Ok(())
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let config: ClusterConfig = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        let config: ClusterConfig = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load configuration from a `.json` or `.toml` file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            #[cfg(feature = "toml")]
            Some("toml") => Ok(Self::from_toml(&contents)?),
            Some("json") | None => Ok(Self::from_json(&contents)?),
            Some(other) => Err(ClusterError::InvalidConfig(format!(
                "unsupported configuration format '{}'",
                other
            ))),
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            min_zoom: Self::default_min_zoom(),
            max_zoom: Self::default_max_zoom(),
            radius: Self::default_radius(),
            extent: Self::default_extent(),
            mu: Self::default_mu(),
            index: IndexKind::default(),
            strategy: ClusteringStrategy::default(),
        }
    }
}

fn lenient_index_kind<'de, D>(deserializer: D) -> std::result::Result<IndexKind, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    Ok(name.parse().unwrap_or_else(|err: String| {
        log::warn!("{}, falling back to {}", err, IndexKind::default());
        IndexKind::default()
    }))
}
