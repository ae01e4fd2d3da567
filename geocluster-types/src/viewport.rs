use serde::{Deserialize, Serialize};

/// A longitude/latitude query box.
///
/// Unlike a `geo::Rect`, the corners are not normalized: a `west` greater than
/// `east` describes a box that crosses the antimeridian.
///
/// # Examples
///
/// ```
/// use geocluster_types::viewport::Viewport;
///
/// let pacific = Viewport::new(170.0, -10.0, -170.0, 10.0);
/// assert!(pacific.wraps_antimeridian());
///
/// let world = Viewport::world();
/// assert!(world.spans_all_longitudes());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Viewport {
    /// Create a viewport from its west, south, east and north edges.
    ///
    /// # Arguments
    ///
    /// * `west` - Left edge longitude (may exceed `east` when wrapping)
    /// * `south` - Bottom edge latitude
    /// * `east` - Right edge longitude
    /// * `north` - Top edge latitude
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// The whole world.
    pub fn world() -> Self {
        Self::new(-180.0, -90.0, 180.0, 90.0)
    }

    pub fn spans_all_longitudes(&self) -> bool {
        self.east - self.west >= 360.0
    }

    /// Whether the box crosses the antimeridian once its longitudes are normalized.
    pub fn wraps_antimeridian(&self) -> bool {
        !self.spans_all_longitudes() && normalize(self.west) > self.normalized_east()
    }

    fn normalized_east(&self) -> f64 {
        if self.east == 180.0 {
            180.0
        } else {
            normalize(self.east)
        }
    }

    pub fn is_finite(&self) -> bool {
        self.west.is_finite()
            && self.south.is_finite()
            && self.east.is_finite()
            && self.north.is_finite()
    }
}

fn normalize(lng: f64) -> f64 {
    ((lng + 180.0) % 360.0 + 360.0) % 360.0 - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_detection() {
        assert!(!Viewport::new(-10.0, -10.0, 10.0, 10.0).wraps_antimeridian());
        assert!(Viewport::new(170.0, -10.0, -170.0, 10.0).wraps_antimeridian());
        assert!(!Viewport::new(170.0, -10.0, 180.0, 10.0).wraps_antimeridian());
        assert!(!Viewport::new(-180.0, -90.0, 180.0, 90.0).wraps_antimeridian());
    }

    #[test]
    fn test_shifted_longitudes_wrap() {
        // 190 normalizes to -170
        let view = Viewport::new(170.0, 0.0, 190.0, 5.0);
        assert!(view.wraps_antimeridian());
    }
}
