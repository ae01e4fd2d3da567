//! One independent hierarchy per keyword.
//!
//! Sessions that cluster different data sets each get their own
//! [`SyncClusterer`], created on first use from a shared configuration.

use crate::config::ClusterConfig;
use crate::error::{ClusterError, Result};
use crate::sync::SyncClusterer;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;

/// A validated registry keyword.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Keyword(String);

impl Keyword {
    /// Validate a keyword: non-empty, without null bytes, at most 255 bytes.
    pub fn parse<S: Into<String>>(name: S) -> Result<Self> {
        let name = name.into();

        if name.is_empty() {
            return Err(ClusterError::InvalidInput("Keyword cannot be empty".into()));
        }

        if name.contains('\0') {
            return Err(ClusterError::InvalidInput(
                "Keyword cannot contain null bytes".into(),
            ));
        }

        if name.len() > 255 {
            return Err(ClusterError::InvalidInput(
                "Keyword cannot exceed 255 characters".into(),
            ));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Keyword to hierarchy map.
#[derive(Debug)]
pub struct ClustererRegistry {
    config: ClusterConfig,
    clusterers: RwLock<FxHashMap<Keyword, SyncClusterer>>,
}

impl ClustererRegistry {
    /// Every hierarchy the registry creates uses `config`.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::InvalidConfig` if the configuration does not validate.
    pub fn new(config: ClusterConfig) -> Result<Self> {
        config.validate().map_err(ClusterError::InvalidConfig)?;
        Ok(Self {
            config,
            clusterers: RwLock::new(FxHashMap::default()),
        })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// The hierarchy for `keyword`, created empty if it does not exist yet.
    pub fn get_or_create(&self, keyword: &str) -> Result<SyncClusterer> {
        let keyword = Keyword::parse(keyword)?;
        if let Some(existing) = self.clusterers.read().get(&keyword) {
            return Ok(existing.clone());
        }

        let mut clusterers = self.clusterers.write();
        if let Some(existing) = clusterers.get(&keyword) {
            return Ok(existing.clone());
        }
        let created = SyncClusterer::new(self.config.clone())?;
        log::debug!("created hierarchy for keyword '{}'", keyword);
        clusterers.insert(keyword, created.clone());
        Ok(created)
    }

    pub fn get(&self, keyword: &str) -> Option<SyncClusterer> {
        let keyword = Keyword::parse(keyword).ok()?;
        self.clusterers.read().get(&keyword).cloned()
    }

    /// Drop the hierarchy for `keyword`. Handles already given out stay usable.
    pub fn remove(&self, keyword: &str) -> Option<SyncClusterer> {
        let keyword = Keyword::parse(keyword).ok()?;
        self.clusterers.write().remove(&keyword)
    }

    /// Registered keywords, sorted.
    pub fn keywords(&self) -> Vec<String> {
        let mut keywords: Vec<String> = self
            .clusterers
            .read()
            .keys()
            .map(|k| k.as_str().to_string())
            .collect();
        keywords.sort();
        keywords
    }

    pub fn len(&self) -> usize {
        self.clusterers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusterers.read().is_empty()
    }
}
