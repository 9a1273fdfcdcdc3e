//! User records and the shared handle the registry hands out
//!
//! A `UserHandle` is the unit of sharing: the registry, the fan-out workers
//! and the service facade all hold clones of the same handle. Location
//! history is append-only through `User::add_to_visited_locations`.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::attraction::Attraction;
use super::location::VisitedLocation;

/// Travel preferences used when asking the trip pricer for offers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserPreferences {
    pub attraction_proximity: u32,
    pub currency: String,
    pub lower_price_point: f64,
    pub high_price_point: f64,
    pub trip_duration: u32,
    pub ticket_quantity: u32,
    pub number_of_adults: u32,
    pub number_of_children: u32,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            attraction_proximity: u32::MAX,
            currency: "USD".to_string(),
            lower_price_point: 0.0,
            high_price_point: f64::from(u32::MAX),
            trip_duration: 1,
            ticket_quantity: 1,
            number_of_adults: 1,
            number_of_children: 0,
        }
    }
}

/// Points granted for having been near an attraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReward {
    pub visited_location: VisitedLocation,
    pub attraction: Attraction,
    pub reward_points: i32,
}

/// A trip offer returned by the pricing provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub name: String,
    pub price: f64,
    pub trip_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: Uuid,
    pub user_name: String,
    pub phone_number: String,
    pub email_address: String,
    pub latest_location_timestamp: Option<DateTime<Utc>>,
    visited_locations: Vec<VisitedLocation>,
    user_rewards: Vec<UserReward>,
    pub user_preferences: UserPreferences,
    pub trip_deals: Vec<Provider>,
}

impl User {
    pub fn new(
        user_id: Uuid,
        user_name: impl Into<String>,
        phone_number: impl Into<String>,
        email_address: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
            phone_number: phone_number.into(),
            email_address: email_address.into(),
            latest_location_timestamp: None,
            visited_locations: Vec::new(),
            user_rewards: Vec::new(),
            user_preferences: UserPreferences::default(),
            trip_deals: Vec::new(),
        }
    }

    pub fn visited_locations(&self) -> &[VisitedLocation] {
        &self.visited_locations
    }

    pub fn last_visited_location(&self) -> Option<&VisitedLocation> {
        self.visited_locations.last()
    }

    pub fn add_to_visited_locations(&mut self, visited: VisitedLocation) {
        self.latest_location_timestamp = Some(visited.time_visited);
        self.visited_locations.push(visited);
    }

    pub fn user_rewards(&self) -> &[UserReward] {
        &self.user_rewards
    }

    pub fn has_reward_for(&self, attraction_id: Uuid) -> bool {
        self.user_rewards
            .iter()
            .any(|r| r.attraction.attraction_id == attraction_id)
    }

    /// Append a reward unless one already exists for the same attraction.
    /// Returns whether the reward was added.
    pub fn add_user_reward(&mut self, reward: UserReward) -> bool {
        if self.has_reward_for(reward.attraction.attraction_id) {
            return false;
        }
        self.user_rewards.push(reward);
        true
    }

    /// Sum of all reward points, clamped to the `i32` range
    pub fn total_reward_points(&self) -> i32 {
        self.user_rewards
            .iter()
            .fold(0i32, |total, r| total.saturating_add(r.reward_points))
    }
}

/// Shared, concurrently accessible user record.
///
/// The id and name never change, so they are kept outside the lock.
#[derive(Debug, Clone)]
pub struct UserHandle {
    id: Uuid,
    name: Arc<str>,
    inner: Arc<RwLock<User>>,
}

impl UserHandle {
    pub fn new(user: User) -> Self {
        Self {
            id: user.user_id,
            name: Arc::from(user.user_name.as_str()),
            inner: Arc::new(RwLock::new(user)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read access. A poisoned lock still holds a consistent record because
    /// every mutation is a single push or assignment, so the guard is recovered.
    pub fn read(&self) -> RwLockReadGuard<'_, User> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, User> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether both handles point at the same record
    pub fn same_record(&self, other: &UserHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<User> for UserHandle {
    fn from(user: User) -> Self {
        Self::new(user)
    }
}
