//! External collaborators
//!
//! This module provides:
//! - Provider traits the tracking core depends on (locator, reward points,
//!   reward scoring, trip pricing)
//! - reqwest-backed implementations talking to the gps, rewards and
//!   preferences services
//! - RewardsService, the scorer that turns proximity into rewards
//! - Mock implementations for tests and load runs

pub mod gps;
pub mod http;
pub mod mock;
pub mod reward_central;
pub mod rewards;
pub mod trip_pricer;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Attraction, Provider, UserHandle, VisitedLocation};
use crate::error::Result;

pub use gps::HttpLocator;
pub use mock::{MockLocator, MockScorer, MockTripPricer, StaticRewardPoints};
pub use reward_central::HttpRewardPoints;
pub use rewards::{ATTRACTION_PROXIMITY_RANGE_MILES, DEFAULT_PROXIMITY_BUFFER_MILES, RewardsService};
pub use trip_pricer::HttpTripPricer;

/// Resolves a user's current position.
#[async_trait]
pub trait Locator: Send + Sync {
    /// Current position of a user. Dropping the future aborts the call.
    async fn fetch_location(&self, user_id: Uuid) -> Result<VisitedLocation>;

    /// The attraction catalog known to the location provider
    async fn fetch_attractions(&self) -> Result<Vec<Attraction>>;
}

/// Looks up how many points an attraction is worth to a user.
#[async_trait]
pub trait RewardPoints: Send + Sync {
    async fn reward_points(&self, attraction_id: Uuid, user_id: Uuid) -> Result<i32>;
}

/// Recomputes a user's rewards after a fresh observation.
#[async_trait]
pub trait RewardScorer: Send + Sync {
    /// Append any newly earned rewards; returns how many were added
    async fn score_user(&self, user: &UserHandle, attractions: &[Attraction]) -> Result<usize>;
}

/// Parameters of a trip price quote
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    pub api_key: String,
    pub user_id: Uuid,
    pub adults: u32,
    pub children: u32,
    pub nights: u32,
    pub reward_points: i32,
}

/// Asks external providers for trip offers.
#[async_trait]
pub trait TripPricer: Send + Sync {
    async fn quote(&self, request: &QuoteRequest) -> Result<Vec<Provider>>;
}
