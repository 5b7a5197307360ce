use geo::{Distance, Haversine};

use crate::{
    meters::Meters,
    oracle::{DistanceOracle, DistanceResult, OracleError},
};

/// Parses an address written as `"lat,lon"`.
pub fn parse_coordinates(address: &str) -> Option<geo::Point> {
    let (lat, lon) = address.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lon: f64 = lon.trim().parse().ok()?;

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return None;
    }

    Some(geo::Point::new(lon, lat))
}

/// Great-circle distances between coordinate addresses, scaled by a detour factor
/// to approximate road distances. Free-form addresses cannot be located without
/// geocoding and always fail.
#[derive(Debug, Clone, Copy)]
pub struct AsTheCrowFlies {
    detour_factor: f64,
}

impl AsTheCrowFlies {
    pub fn new(detour_factor: f64) -> Self {
        Self { detour_factor }
    }

    pub fn detour_factor(&self) -> f64 {
        self.detour_factor
    }

    fn locate(address: &str) -> Result<geo::Point, OracleError> {
        parse_coordinates(address).ok_or_else(|| {
            OracleError::Failure(format!("{address:?} is not a \"lat,lon\" coordinate"))
        })
    }
}

impl Default for AsTheCrowFlies {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl DistanceOracle for AsTheCrowFlies {
    async fn distance(&self, origin: &str, destination: &str) -> DistanceResult {
        let from = Self::locate(origin)?;
        let to = Self::locate(destination)?;

        let haversine = Haversine;
        Ok(Meters::new(haversine.distance(from, to) * self.detour_factor))
    }
}
