//! Geographic points and spherical distance

use serde::{Deserialize, Serialize};

/// Equatorial Earth radius used for spherical distances, in meters
pub const EARTH_RADIUS_METERS: f64 = 6_378_100.0;

/// A (longitude, latitude) pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Checked constructor; rejects non-finite or out-of-range coordinates
    pub fn try_new(longitude: f64, latitude: f64) -> Result<Self, String> {
        let point = Self::new(longitude, latitude);
        point.validate()?;
        Ok(point)
    }

    /// Check both coordinates are finite and within WGS84 bounds
    pub fn validate(&self) -> Result<(), String> {
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(format!("longitude {} out of range [-180, 180]", self.longitude));
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(format!("latitude {} out of range [-90, 90]", self.latitude));
        }
        Ok(())
    }

    /// Great-circle distance to `other` in meters (haversine)
    pub fn distance_meters(&self, other: &GeoPoint) -> f64 {
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlng = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2)
            + self.latitude.to_radians().cos()
                * other.latitude.to_radians().cos()
                * (dlng / 2.0).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_METERS * c
    }
}
