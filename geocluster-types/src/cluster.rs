use geo::Point;
use serde::{Deserialize, Serialize};

/// How many raw points a hierarchy node stands for.
///
/// `Raw` is a single, never aggregated point. `Aggregated(n)` is a synthesized
/// cluster holding `n` points. On the wire the count is an integer where `0`
/// means `Raw`.
///
/// # Examples
///
/// ```
/// use geocluster_types::cluster::PointCount;
///
/// assert_eq!(PointCount::Raw.weight(), 1);
/// assert_eq!(PointCount::Aggregated(5).weight(), 5);
/// assert_eq!(u32::from(PointCount::Raw), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum PointCount {
    #[default]
    Raw,
    Aggregated(u32),
}

impl PointCount {
    /// Number of points represented, reading `Raw` as one.
    pub const fn weight(self) -> u32 {
        match self {
            PointCount::Raw => 1,
            PointCount::Aggregated(n) => n,
        }
    }

    pub const fn is_raw(self) -> bool {
        matches!(self, PointCount::Raw)
    }
}

impl From<u32> for PointCount {
    fn from(value: u32) -> Self {
        if value == 0 {
            PointCount::Raw
        } else {
            PointCount::Aggregated(value)
        }
    }
}

impl From<PointCount> for u32 {
    fn from(count: PointCount) -> Self {
        match count {
            PointCount::Raw => 0,
            PointCount::Aggregated(n) => n,
        }
    }
}

/// A cluster as handed out by queries, in longitude/latitude.
///
/// Records are plain values; changing one never touches the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterRecord {
    /// Load-order index for raw points, `(origin << 5) | (zoom + 1)` for clusters
    pub id: i64,
    /// Longitude in degrees
    pub x: f64,
    /// Latitude in degrees
    pub y: f64,
    /// Number of points the record stands for
    pub num_points: PointCount,
}

impl ClusterRecord {
    pub fn new(id: i64, x: f64, y: f64, num_points: PointCount) -> Self {
        Self {
            id,
            x,
            y,
            num_points,
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn weight(&self) -> u32 {
        self.num_points.weight()
    }

    pub fn is_cluster(&self) -> bool {
        !self.num_points.is_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_count_wire_form() {
        let json = serde_json::to_string(&PointCount::Raw).unwrap();
        assert_eq!(json, "0");

        let count: PointCount = serde_json::from_str("12").unwrap();
        assert_eq!(count, PointCount::Aggregated(12));
        assert_eq!(count.weight(), 12);
    }

    #[test]
    fn test_record_serialization() {
        let record = ClusterRecord::new(97, 10.0, 20.0, PointCount::Aggregated(3));
        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["num_points"], 3);
        assert!(record.is_cluster());
    }
}
