use serde::{Deserialize, Serialize};

use super::DomainError;

/// A named point on the map. Coordinates are validated at construction,
/// so a `Location` in hand is always within range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    name: String,
    latitude: f64,
    longitude: f64,
}

impl Location {
    pub fn new(
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::InvalidLocation("name is empty".into()));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(DomainError::InvalidLocation(format!(
                "latitude {} out of range",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(DomainError::InvalidLocation(format!(
                "longitude {} out of range",
                longitude
            )));
        }
        Ok(Location {
            name,
            latitude,
            longitude,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}
