use geo::{Distance, Haversine};
use serde::{Deserialize, Serialize};

/// A WGS84 coordinate pair.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Great-circle distance to `other` in kilometers.
    pub fn haversine_km(&self, other: &GeoPoint) -> f64 {
        let haversine = Haversine;
        haversine.distance(geo::Point::from(self), geo::Point::from(other)) / 1_000.0
    }
}

impl From<&GeoPoint> for geo::Point<f64> {
    fn from(point: &GeoPoint) -> Self {
        geo::Point::new(point.lng, point.lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let brussels = GeoPoint::new(50.8503, 4.3517);
        assert_eq!(brussels.haversine_km(&brussels), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let brussels = GeoPoint::new(50.8503, 4.3517);
        let antwerp = GeoPoint::new(51.2194, 4.4025);
        assert_eq!(
            brussels.haversine_km(&antwerp),
            antwerp.haversine_km(&brussels)
        );
    }

    #[test]
    fn brussels_antwerp_is_about_41_km() {
        let brussels = GeoPoint::new(50.8503, 4.3517);
        let antwerp = GeoPoint::new(51.2194, 4.4025);
        let km = brussels.haversine_km(&antwerp);
        assert!((40.0..43.0).contains(&km), "got {km}");
    }
}
