//! Load observation.
//!
//! A [`Clusterer`](crate::Clusterer) reports every level pass and every
//! finished load to one injected observer instead of keeping global timing
//! tables. [`LogObserver`] is the default.

use geocluster_types::{ClusteringStrategy, LevelCounts, LoadStats};

/// Receives progress of loads.
pub trait LoadObserver: Send + Sync {
    /// One level of the hierarchy was settled.
    fn level_processed(&self, _strategy: ClusteringStrategy, _counts: &LevelCounts) {}

    /// A load returned.
    fn load_finished(&self, strategy: ClusteringStrategy, stats: &LoadStats);
}

/// Writes load progress through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl LoadObserver for LogObserver {
    fn level_processed(&self, strategy: ClusteringStrategy, counts: &LevelCounts) {
        if counts.is_empty() {
            return;
        }
        log::debug!(
            "{} zoom {}: inserted {}, updated {}, shifted {}, deleted {}",
            strategy,
            counts.zoom,
            counts.inserted,
            counts.updated,
            counts.shifted,
            counts.deleted
        );
    }

    fn load_finished(&self, strategy: ClusteringStrategy, stats: &LoadStats) {
        log::info!(
            "{} loaded {} points in {:?} (inserted {}, updated {}, shifted {}, deleted {})",
            strategy,
            stats.points,
            stats.elapsed,
            stats.inserted,
            stats.updated,
            stats.shifted,
            stats.deleted
        );
    }
}

/// Ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl LoadObserver for NoopObserver {
    fn load_finished(&self, _strategy: ClusteringStrategy, _stats: &LoadStats) {}
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use parking_lot::Mutex;

    /// Keeps every notification for inspection.
    #[derive(Debug, Default)]
    pub struct RecordingObserver {
        pub levels: Mutex<Vec<LevelCounts>>,
        pub loads: Mutex<Vec<LoadStats>>,
    }

    impl LoadObserver for RecordingObserver {
        fn level_processed(&self, _strategy: ClusteringStrategy, counts: &LevelCounts) {
            self.levels.lock().push(*counts);
        }

        fn load_finished(&self, _strategy: ClusteringStrategy, stats: &LoadStats) {
            self.loads.lock().push(stats.clone());
        }
    }
}
