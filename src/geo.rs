//! Geographic helpers
//!
//! Positions are WGS84 decimal degrees.

use serde::{Deserialize, Serialize};

use crate::consts::EARTH_RADIUS_KM;

/// A point on the globe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance in kilometres (haversine)
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = lat2 - lat1;
        let dlng = (other.lng - self.lng).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        // Rounding can push `a` a hair past 1 for antipodal points
        let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();
        EARTH_RADIUS_KM * c
    }

    /// Bring a raw map click into range before it reaches the engine.
    ///
    /// Latitude is clamped to [-90, 90]; longitude is wrapped into
    /// [-180, 180) since the map widget lets the player pan across the
    /// antimeridian. Returns `None` for non-finite input.
    pub fn clamped(&self) -> Option<GeoPoint> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return None;
        }
        Some(GeoPoint {
            lat: self.lat.clamp(-90.0, 90.0),
            lng: normalize_longitude(self.lng),
        })
    }
}

/// Normalized longitude to [-180, 180)
#[inline]
pub fn normalize_longitude(lng: f64) -> f64 {
    (lng + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_same_point_is_zero() {
        let rome = GeoPoint::new(41.9028, 12.4964);
        assert!(rome.distance_km(&rome).abs() < 1e-9);
    }

    #[test]
    fn test_distance_known_pair() {
        // Paris -> London is roughly 344 km
        let paris = GeoPoint::new(48.8566, 2.3522);
        let london = GeoPoint::new(51.5074, -0.1278);
        let d = paris.distance_km(&london);
        assert!((d - 343.5).abs() < 2.0, "got {d}");
    }

    #[test]
    fn test_distance_antipodal() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 180.0);
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!((a.distance_km(&b) - half_circumference).abs() < 1e-6);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let tokyo = GeoPoint::new(35.6762, 139.6503);
        let lima = GeoPoint::new(-12.0464, -77.0428);
        assert!((tokyo.distance_km(&lima) - lima.distance_km(&tokyo)).abs() < 1e-9);
    }

    #[test]
    fn test_clamped_wraps_and_clamps() {
        let p = GeoPoint::new(95.0, 190.0).clamped().unwrap();
        assert!((p.lat - 90.0).abs() < 1e-12);
        assert!((p.lng + 170.0).abs() < 1e-9);

        let q = GeoPoint::new(-12.5, -540.0).clamped().unwrap();
        assert!((q.lng + 180.0).abs() < 1e-9);

        assert!(GeoPoint::new(f64::NAN, 0.0).clamped().is_none());
    }
}
