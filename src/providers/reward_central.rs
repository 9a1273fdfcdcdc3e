//! HTTP client for the rewards service

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use uuid::Uuid;

use crate::error::{Result, TourtrackError};

use super::RewardPoints;
use super::http::{build_client, endpoint, get_json};

/// Reward points backed by `GET /getRewardPoints`.
pub struct HttpRewardPoints {
    client: Client,
    base_url: String,
}

impl HttpRewardPoints {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = build_client(timeout)
            .map_err(|e| TourtrackError::Scoring(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl RewardPoints for HttpRewardPoints {
    async fn reward_points(&self, attraction_id: Uuid, user_id: Uuid) -> Result<i32> {
        let url = endpoint(&self.base_url, "getRewardPoints");
        let query = [
            ("attractionId", attraction_id.to_string()),
            ("userId", user_id.to_string()),
        ];
        get_json(&self.client, &url, &query).await.map_err(TourtrackError::Scoring)
    }
}
