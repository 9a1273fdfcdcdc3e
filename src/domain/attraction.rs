//! Attraction catalog entries and ranked nearby attractions

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::location::Location;

/// A point of interest. The catalog is loaded once and shared read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attraction {
    pub attraction_id: Uuid,
    pub attraction_name: String,
    pub city: String,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Attraction {
    pub fn new(
        name: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            attraction_id: Uuid::new_v4(),
            attraction_name: name.into(),
            city: city.into(),
            state: state.into(),
            latitude,
            longitude,
        }
    }

    pub fn location(&self) -> Location {
        Location::new(self.latitude, self.longitude)
    }
}

/// One entry of a nearby-attractions answer. Produced per query, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyAttraction {
    pub attraction_name: String,
    pub attraction_location: Location,
    pub user_location: Location,
    /// Statute miles between `user_location` and `attraction_location`
    pub distance: f64,
    pub reward_points: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attraction_location() {
        let a = Attraction::new("Bronx Zoo", "Bronx", "NY", 40.852905, -73.872971);
        assert_eq!(a.location(), Location::new(40.852905, -73.872971));
    }

    #[test]
    fn test_attraction_ids_are_unique() {
        let a = Attraction::new("A", "c", "s", 0.0, 0.0);
        let b = Attraction::new("A", "c", "s", 0.0, 0.0);
        assert_ne!(a.attraction_id, b.attraction_id);
    }

    #[test]
    fn test_attraction_parses_gps_payload() {
        let body = r#"{
            "attractionName": "Disneyland",
            "city": "Anaheim",
            "state": "CA",
            "attractionId": "9a1d2b3c-4e5f-4a6b-8c7d-0e1f2a3b4c5d",
            "latitude": 33.817595,
            "longitude": -117.922008
        }"#;

        let a: Attraction = serde_json::from_str(body).unwrap();
        assert_eq!(a.attraction_name, "Disneyland");
        assert_eq!(a.state, "CA");
    }
}
