//! TourGuide service facade
//!
//! Ties the registry, the tracking core and the providers together behind
//! the operations the outer surfaces (CLI, HTTP front-ends) need. Out-of-cycle
//! refreshes go through the same in-flight set as the scheduled batches, so a
//! user is never refreshed by two callers at once.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::{
    Attraction, BatchOutcome, Location, NearbyAttraction, Provider, RefreshStatus, User, UserHandle, UserPreferences,
    UserReward, VisitedLocation,
};
use crate::error::{Result, TourtrackError};
use crate::providers::{Locator, QuoteRequest, RewardPoints, RewardScorer, TripPricer};
use crate::ranking::{NEARBY_ATTRACTIONS_LIMIT, nearest, to_nearby};
use crate::registry::UserRegistry;
use crate::tracker::{FanOutExecutor, Refresher, Tracker, TrackerConfig};

/// External collaborators used by the service
pub struct Collaborators {
    pub locator: Arc<dyn Locator>,
    pub scorer: Arc<dyn RewardScorer>,
    pub reward_points: Arc<dyn RewardPoints>,
    pub trip_pricer: Arc<dyn TripPricer>,
}

/// Tunables for building the service
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Size of the fan-out worker pool
    pub worker_count: usize,
    /// Scheduler interval and batch budget
    pub tracker: TrackerConfig,
    /// Key sent with every trip price quote
    pub trip_pricer_api_key: String,
}

pub struct TourGuideService {
    registry: Arc<UserRegistry>,
    executor: Arc<FanOutExecutor>,
    tracker: Tracker,
    reward_points: Arc<dyn RewardPoints>,
    trip_pricer: Arc<dyn TripPricer>,
    trip_pricer_api_key: String,
}

impl TourGuideService {
    /// Build the service. The tracker is created stopped.
    pub fn new(
        registry: Arc<UserRegistry>,
        attractions: Vec<Attraction>,
        collaborators: Collaborators,
        settings: ServiceSettings,
    ) -> Result<Self> {
        let refresher = Refresher::new(collaborators.locator, collaborators.scorer, Arc::from(attractions));
        let executor = Arc::new(FanOutExecutor::new(refresher, settings.worker_count)?);
        let tracker = Tracker::new(executor.clone(), registry.clone(), settings.tracker);

        Ok(Self {
            registry,
            executor,
            tracker,
            reward_points: collaborators.reward_points,
            trip_pricer: collaborators.trip_pricer,
            trip_pricer_api_key: settings.trip_pricer_api_key,
        })
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    pub fn registry(&self) -> &Arc<UserRegistry> {
        &self.registry
    }

    pub fn attractions(&self) -> &[Attraction] {
        self.executor.refresher().attractions()
    }

    pub fn get_user(&self, user_name: &str) -> Result<UserHandle> {
        self.registry
            .get(user_name)
            .ok_or_else(|| TourtrackError::UserNotFound(user_name.to_string()))
    }

    pub fn get_all_users(&self) -> Vec<UserHandle> {
        self.registry.get_all()
    }

    /// Register a user. An existing user with the same name is kept.
    pub fn add_user(&self, user: User) -> UserHandle {
        let (handle, inserted) = self.registry.add(user);
        if !inserted {
            log::debug!("User {} already registered", handle.name());
        }
        handle
    }

    /// Refresh one user now, outside the schedule.
    ///
    /// Fails with `InvalidState` if the user is already being refreshed. A
    /// scoring failure after a successful locate still returns the location.
    pub async fn track_user_location(&self, user: &UserHandle) -> Result<VisitedLocation> {
        let refresher = self.executor.refresher();
        let Some(_claim) = refresher.claim(user.id()) else {
            return Err(TourtrackError::InvalidState(format!(
                "{} is already being tracked",
                user.name()
            )));
        };

        let outcome = refresher.refresh(user, &CancellationToken::new()).await;
        match (outcome.status, outcome.location) {
            (RefreshStatus::Failed(e), _) => Err(TourtrackError::Locator(e)),
            (_, Some(location)) => Ok(location),
            (status, None) => Err(TourtrackError::Locator(format!("refresh ended as {:?}", status))),
        }
    }

    /// Run one batch over every registered user, independently of the tracker.
    pub async fn track_all_users(&self, budget: Duration) -> BatchOutcome {
        self.executor
            .run_batch(self.registry.get_all(), Instant::now() + budget, &CancellationToken::new())
            .await
    }

    /// Last known location, tracking the user first if none is known.
    pub async fn get_user_location(&self, user: &UserHandle) -> Result<VisitedLocation> {
        let last = user.read().last_visited_location().cloned();
        match last {
            Some(visited) => Ok(visited),
            None => self.track_user_location(user).await,
        }
    }

    /// Last known location of every user that has one
    pub fn get_all_current_locations(&self) -> HashMap<Uuid, Location> {
        self.registry
            .get_all()
            .into_iter()
            .filter_map(|user| {
                let last = user.read().last_visited_location().map(|v| v.location);
                last.map(|location| (user.id(), location))
            })
            .collect()
    }

    pub fn get_user_rewards(&self, user: &UserHandle) -> Vec<UserReward> {
        user.read().user_rewards().to_vec()
    }

    /// The five attractions closest to the user's current location, with the
    /// points each one is worth to the user.
    pub async fn get_nearby_attractions(&self, user: &UserHandle) -> Result<Vec<NearbyAttraction>> {
        let visited = self.get_user_location(user).await?;
        let reference = visited.location;
        let ranked = nearest(&reference, self.attractions(), NEARBY_ATTRACTIONS_LIMIT);

        let points = try_join_all(
            ranked
                .iter()
                .map(|r| self.reward_points.reward_points(r.attraction.attraction_id, user.id())),
        )
        .await?;

        Ok(ranked
            .into_iter()
            .zip(points)
            .map(|(r, points)| to_nearby(&reference, r, points))
            .collect())
    }

    /// Ask the trip pricer for offers matching the user's preferences and
    /// accumulated reward points. The offers replace the user's trip deals.
    pub async fn get_trip_deals(&self, user: &UserHandle) -> Result<Vec<Provider>> {
        let request = {
            let record = user.read();
            let preferences = &record.user_preferences;
            QuoteRequest {
                api_key: self.trip_pricer_api_key.clone(),
                user_id: record.user_id,
                adults: preferences.number_of_adults,
                children: preferences.number_of_children,
                nights: preferences.trip_duration,
                reward_points: record.total_reward_points(),
            }
        };

        let offers = self.trip_pricer.quote(&request).await?;
        user.write().trip_deals = offers.clone();
        log::debug!("{} trip offers for {}", offers.len(), user.name());
        Ok(offers)
    }

    pub fn get_user_preferences(&self, user: &UserHandle) -> UserPreferences {
        user.read().user_preferences.clone()
    }

    pub fn set_user_preferences(&self, user: &UserHandle, preferences: UserPreferences) {
        user.write().user_preferences = preferences;
    }
}
