//! Validated query coordinates.

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;

/// Geographic point (lon/lat), range-checked on construction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    /// Build a point, rejecting non-finite or out-of-range coordinates.
    ///
    /// Longitude is checked first.
    pub fn new(lon: f64, lat: f64) -> Result<Self, ResolveError> {
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(ResolveError::Validation {
                field: "longitude",
                value: lon,
            });
        }
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ResolveError::Validation {
                field: "latitude",
                value: lat,
            });
        }
        Ok(Self { lon, lat })
    }

    pub fn to_geo(self) -> geo::Point<f64> {
        geo::Point::new(self.lon, self.lat)
    }
}
