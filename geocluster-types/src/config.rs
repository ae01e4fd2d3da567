use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Spatial index implementation backing every zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Alternating-axis binary tree with co-located duplicates kept per node
    #[default]
    #[serde(alias = "KDTree")]
    KdTree,
    /// Sparse fixed-cell grid sized to the level radius
    #[serde(alias = "GridIndex")]
    Grid,
    /// R*-tree
    #[serde(alias = "RTree")]
    RTree,
}

impl IndexKind {
    pub const ALL: [IndexKind; 3] = [IndexKind::KdTree, IndexKind::Grid, IndexKind::RTree];

    pub const fn as_str(self) -> &'static str {
        match self {
            IndexKind::KdTree => "kd_tree",
            IndexKind::Grid => "grid",
            IndexKind::RTree => "r_tree",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kd_tree" | "KDTree" | "kdtree" => Ok(IndexKind::KdTree),
            "grid" | "GridIndex" => Ok(IndexKind::Grid),
            "r_tree" | "RTree" | "rtree" => Ok(IndexKind::RTree),
            other => Err(format!("unknown index type '{}'", other)),
        }
    }
}

/// How a load propagates through the hierarchy.
///
/// `Batch` rebuilds every level from the full point set. The other three fold
/// new points into the existing hierarchy and differ in when ancestor updates
/// are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClusteringStrategy {
    #[serde(alias = "SuperCluster")]
    Batch,
    /// Ancestors are updated immediately on every merge and split
    #[serde(alias = "BiSuperCluster")]
    Eager,
    /// Changes are recorded as deltas and applied one level at a time
    #[default]
    #[serde(alias = "LBiSuperCluster")]
    LevelBatched,
    /// Per-level events are processed in sequence order
    #[serde(alias = "SBiSuperCluster")]
    Ordered,
}

impl ClusteringStrategy {
    pub const ALL: [ClusteringStrategy; 4] = [
        ClusteringStrategy::Batch,
        ClusteringStrategy::Eager,
        ClusteringStrategy::LevelBatched,
        ClusteringStrategy::Ordered,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ClusteringStrategy::Batch => "batch",
            ClusteringStrategy::Eager => "eager",
            ClusteringStrategy::LevelBatched => "level_batched",
            ClusteringStrategy::Ordered => "ordered",
        }
    }

    pub const fn is_incremental(self) -> bool {
        !matches!(self, ClusteringStrategy::Batch)
    }
}

impl fmt::Display for ClusteringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClusteringStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "batch" | "SuperCluster" => Ok(ClusteringStrategy::Batch),
            "eager" | "BiSuperCluster" => Ok(ClusteringStrategy::Eager),
            "level_batched" | "LBiSuperCluster" => Ok(ClusteringStrategy::LevelBatched),
            "ordered" | "SBiSuperCluster" => Ok(ClusteringStrategy::Ordered),
            other => Err(format!("unknown clustering strategy '{}'", other)),
        }
    }
}
