//! HTTP client for the preferences (trip pricing) service

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::domain::Provider;
use crate::error::{Result, TourtrackError};

use super::http::{build_client, endpoint, get_json};
use super::{QuoteRequest, TripPricer};

/// Trip pricer backed by `GET /getPrice`.
pub struct HttpTripPricer {
    client: Client,
    base_url: String,
}

impl HttpTripPricer {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = build_client(timeout)
            .map_err(|e| TourtrackError::Pricing(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

/// Query string for a quote. The pricing service names the user id
/// parameter `attractionId`.
pub fn quote_query(request: &QuoteRequest) -> Vec<(&'static str, String)> {
    vec![
        ("apiKey", request.api_key.clone()),
        ("attractionId", request.user_id.to_string()),
        ("adults", request.adults.to_string()),
        ("children", request.children.to_string()),
        ("nightsStay", request.nights.to_string()),
        ("rewardsPoints", request.reward_points.to_string()),
    ]
}

#[async_trait]
impl TripPricer for HttpTripPricer {
    async fn quote(&self, request: &QuoteRequest) -> Result<Vec<Provider>> {
        let url = endpoint(&self.base_url, "getPrice");
        get_json(&self.client, &url, &quote_query(request))
            .await
            .map_err(TourtrackError::Pricing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_quote_query() {
        let user_id = Uuid::new_v4();
        let request = QuoteRequest {
            api_key: "test-server-api-key".to_string(),
            user_id,
            adults: 2,
            children: 1,
            nights: 5,
            reward_points: 340,
        };

        let query = quote_query(&request);
        assert_eq!(query[0], ("apiKey", "test-server-api-key".to_string()));
        assert_eq!(query[1], ("attractionId", user_id.to_string()));
        assert_eq!(query[4], ("nightsStay", "5".to_string()));
        assert_eq!(query[5], ("rewardsPoints", "340".to_string()));
    }
}
