use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What one level pass of an incremental load did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCounts {
    pub zoom: u8,
    /// Nodes that joined the level below as new groups or new members
    pub inserted: u64,
    /// Nodes whose pending change was propagated
    pub updated: u64,
    /// Advocators relocated
    pub shifted: u64,
    /// Nodes removed after losing their last child
    pub deleted: u64,
}

impl LevelCounts {
    pub fn new(zoom: u8) -> Self {
        Self {
            zoom,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inserted == 0 && self.updated == 0 && self.shifted == 0 && self.deleted == 0
    }
}

/// Load statistics, for one load or accumulated over many.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadStats {
    /// Raw points received
    pub points: u64,
    pub inserted: u64,
    pub updated: u64,
    pub shifted: u64,
    pub deleted: u64,
    /// Wall time spent inside the engine
    pub elapsed: Duration,
}

impl LoadStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_level(&mut self, counts: &LevelCounts) {
        self.inserted += counts.inserted;
        self.updated += counts.updated;
        self.shifted += counts.shifted;
        self.deleted += counts.deleted;
    }

    pub fn accumulate(&mut self, other: &LoadStats) {
        self.points += other.points;
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.shifted += other.shifted;
        self.deleted += other.deleted;
        self.elapsed += other.elapsed;
    }
}
