use geo::Point;
use serde::{Deserialize, Serialize};

/// A raw input record: longitude, latitude and a source identifier.
///
/// The clusterer never reads `id`. The n-th point loaded into a hierarchy is
/// known by id `n` in cluster records, labels and expansion lookups, so a
/// caller that needs its own identifiers back keeps the mapping from load
/// position to `id`.
///
/// # Examples
///
/// ```
/// use geocluster_types::point::PointTuple;
///
/// let tuple = PointTuple::new(2.3522, 48.8566, 42);
/// assert_eq!(tuple.point().x(), 2.3522);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointTuple {
    /// Longitude in degrees
    pub x: f64,
    /// Latitude in degrees
    pub y: f64,
    /// Identifier assigned by the data source
    #[serde(default)]
    pub id: i64,
}

impl PointTuple {
    pub fn new(x: f64, y: f64, id: i64) -> Self {
        Self { x, y, id }
    }

    /// Get the position as a `geo::Point`.
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Whether both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for PointTuple {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y, 0)
    }
}

impl From<Point> for PointTuple {
    fn from(point: Point) -> Self {
        Self::new(point.x(), point.y(), 0)
    }
}
