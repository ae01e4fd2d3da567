//! Error types for geocluster.

use thiserror::Error;

/// Errors surfaced by configuration, construction and loading.
///
/// Query calls never fail: an out-of-range zoom or an unknown id yields `None`.
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The node arena ran out of keys partway through a load. Batch
    /// hierarchies are left as they were; an incremental one may be partially
    /// updated and should be rebuilt.
    #[error("Cluster capacity exceeded: no key left after {0} nodes")]
    CapacityExceeded(usize),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "toml")]
    #[error("TOML error: {0}")]
    Toml(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ClusterError>;

#[cfg(feature = "toml")]
impl From<toml::de::Error> for ClusterError {
    fn from(err: toml::de::Error) -> Self {
        ClusterError::Toml(err.to_string())
    }
}

#[cfg(feature = "toml")]
impl From<toml::ser::Error> for ClusterError {
    fn from(err: toml::ser::Error) -> Self {
        ClusterError::Toml(err.to_string())
    }
}
