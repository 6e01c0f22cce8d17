// models/src/geo.rs

use serde::{Deserialize, Serialize};

use crate::errors::{EmergencyError, Result};

/// A WGS84 point. Latitude in [-90, 90], longitude in [-180, 180].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geolocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl Geolocation {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(EmergencyError::Validation(format!(
                "latitude out of range: {}",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(EmergencyError::Validation(format!(
                "longitude out of range: {}",
                longitude
            )));
        }
        Ok(Geolocation {
            latitude,
            longitude,
        })
    }

    /// Shareable map link embedded in SMS templates.
    pub fn map_link(&self) -> String {
        format!(
            "https://maps.google.com/?q={},{}",
            self.latitude, self.longitude
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(Geolocation::new(91.0, 0.0).is_err());
        assert!(Geolocation::new(-91.0, 0.0).is_err());
        assert!(Geolocation::new(0.0, 181.0).is_err());
        assert!(Geolocation::new(0.0, -181.0).is_err());
        assert!(Geolocation::new(f64::NAN, 0.0).is_err());
        assert!(Geolocation::new(45.5, -73.6).is_ok());
    }
}
