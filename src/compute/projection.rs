//! Longitude/latitude to the unit Web-Mercator plane and back.
//!
//! Every hierarchy level lives in the `[0, 1] x [0, 1]` plane: `x` grows
//! eastwards from the antimeridian, `y` grows southwards from the north edge.
//! Clustering radii are expressed in the same units.

use std::f64::consts::PI;

/// Longitude to `[0, 1]`.
pub fn lng_x(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

/// Latitude to `[0, 1]`, clamped at the poles.
pub fn lat_y(lat: f64) -> f64 {
    let sin = (lat * PI / 180.0).sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    y.clamp(0.0, 1.0)
}

pub fn x_lng(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

pub fn y_lat(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0) * PI / 180.0;
    360.0 * y2.exp().atan() / PI - 90.0
}

/// Wrap a longitude into `[-180, 180)`.
pub fn normalize_lng(lng: f64) -> f64 {
    ((lng + 180.0) % 360.0 + 360.0) % 360.0 - 180.0
}

pub fn clamp_lat(lat: f64) -> f64 {
    lat.clamp(-90.0, 90.0)
}

/// Project a longitude/latitude pair.
///
/// Longitudes outside `[-180, 180]` are wrapped first; `180` itself stays on
/// the east edge.
pub fn project(lng: f64, lat: f64) -> (f64, f64) {
    let lng = if (-180.0..=180.0).contains(&lng) {
        lng
    } else {
        normalize_lng(lng)
    };
    (lng_x(lng), lat_y(lat))
}

pub fn unproject(x: f64, y: f64) -> (f64, f64) {
    (x_lng(x), y_lat(y))
}

/// Clustering radius at `zoom` in projected units.
///
/// `radius` is in pixels and `extent` is the tile size in pixels.
pub fn zoom_radius(radius: f64, extent: f64, zoom: u8) -> f64 {
    radius / (extent * 2f64.powi(i32::from(zoom)))
}

/// Precomputed radius for every zoom from 0 to `max_zoom + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomRadii {
    radii: Vec<f64>,
}

impl ZoomRadii {
    pub fn new(radius: f64, extent: f64, max_zoom: u8) -> Self {
        let radii = (0..=max_zoom.saturating_add(1))
            .map(|zoom| zoom_radius(radius, extent, zoom))
            .collect();
        Self { radii }
    }

    /// Radius at `zoom`, `None` past the finest level.
    pub fn get(&self, zoom: u8) -> Option<f64> {
        self.radii.get(usize::from(zoom)).copied()
    }

    /// Radius at `zoom`, saturating at the coarsest and finest tabulated levels.
    pub fn at(&self, zoom: u8) -> f64 {
        let last = self.radii.len().saturating_sub(1);
        self.radii
            .get(usize::from(zoom).min(last))
            .copied()
            .unwrap_or(f64::INFINITY)
    }

    /// Radius of the next coarser level, the threshold that groups nodes of
    /// `zoom` under parents.
    pub fn parent_radius(&self, zoom: u8) -> f64 {
        self.at(zoom.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        assert_eq!(lng_x(0.0), 0.5);
        assert_eq!(lng_x(-180.0), 0.0);
        assert_eq!(lng_x(180.0), 1.0);
        assert!((lat_y(0.0) - 0.5).abs() < 1e-12);
        assert_eq!(lat_y(90.0), 0.0);
        assert_eq!(lat_y(-90.0), 1.0);
    }

    #[test]
    fn test_round_trip() {
        for &(lng, lat) in &[(0.0, 0.0), (-74.006, 40.7128), (151.2, -33.87), (179.9, 84.0)] {
            let (x, y) = project(lng, lat);
            let (lng2, lat2) = unproject(x, y);
            assert!((lng - lng2).abs() < 1e-9, "lng {} vs {}", lng, lng2);
            assert!((lat - lat2).abs() < 1e-9, "lat {} vs {}", lat, lat2);
        }
    }

    #[test]
    fn test_normalize_lng() {
        assert_eq!(normalize_lng(190.0), -170.0);
        assert_eq!(normalize_lng(-190.0), 170.0);
        assert_eq!(normalize_lng(180.0), -180.0);
        assert_eq!(normalize_lng(45.0), 45.0);
        assert_eq!(project(540.0, 0.0).0, 0.0);
    }

    #[test]
    fn test_radius_strictly_decreasing() {
        let radii = ZoomRadii::new(60.0, 256.0, 17);
        assert!((radii.at(0) - 60.0 / 256.0).abs() < 1e-15);
        for zoom in 1..=18 {
            assert!(radii.at(zoom) < radii.at(zoom - 1));
        }
        assert!(radii.get(19).is_none());
        assert_eq!(radii.parent_radius(0), radii.at(0));
        assert_eq!(radii.parent_radius(5), radii.at(4));
    }
}
