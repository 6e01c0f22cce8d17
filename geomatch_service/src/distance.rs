// geomatch_service/src/distance.rs

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two WGS84 points, in kilometers.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        for (lat, lon) in [(0.0, 0.0), (45.5017, -73.5673), (-33.4489, -70.6693)] {
            assert_eq!(haversine_km(lat, lon, lat, lon), 0.0);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let d1 = haversine_km(4.711, -74.0721, 4.6097, -74.0817);
        let d2 = haversine_km(4.6097, -74.0817, 4.711, -74.0721);
        assert!((d1 - d2).abs() < 1e-9);
    }

    #[test]
    fn known_distance_is_close() {
        // Bogotá to Medellín, roughly 246 km great-circle.
        let d = haversine_km(4.711, -74.0721, 6.2442, -75.5812);
        assert!((d - 246.0).abs() < 5.0, "got {}", d);
    }
}
