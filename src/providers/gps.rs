//! HTTP client for the gps service

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use uuid::Uuid;

use crate::domain::{Attraction, VisitedLocation};
use crate::error::{Result, TourtrackError};

use super::Locator;
use super::http::{build_client, endpoint, get_json};

/// Locator backed by `GET /getUserLocation` and `GET /getAttractions`.
pub struct HttpLocator {
    client: Client,
    base_url: String,
}

impl HttpLocator {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = build_client(timeout)
            .map_err(|e| TourtrackError::Locator(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Locator for HttpLocator {
    async fn fetch_location(&self, user_id: Uuid) -> Result<VisitedLocation> {
        let url = endpoint(&self.base_url, "getUserLocation");
        let visited: VisitedLocation = get_json(&self.client, &url, &[("userId", user_id.to_string())])
            .await
            .map_err(TourtrackError::Locator)?;

        if visited.user_id != user_id {
            return Err(TourtrackError::Locator(format!(
                "location for {} returned for user {}",
                visited.user_id, user_id
            )));
        }
        if !visited.location.is_valid() {
            return Err(TourtrackError::Locator(format!(
                "out of range location {:?} for user {}",
                visited.location, user_id
            )));
        }

        log::debug!("Located user {} at {:?}", user_id, visited.location);
        Ok(visited)
    }

    async fn fetch_attractions(&self) -> Result<Vec<Attraction>> {
        let url = endpoint(&self.base_url, "getAttractions");
        get_json(&self.client, &url, &[]).await.map_err(TourtrackError::Locator)
    }
}
