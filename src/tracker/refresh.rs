//! Per-user refresh task.
//!
//! Locate the user, append the observation, then score. Every failure is
//! turned into a [`RefreshOutcome`]; nothing escapes as an error or panic
//! into the caller's shared state.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::{Attraction, RefreshOutcome, UserHandle};
use crate::providers::{Locator, RewardScorer};

/// Set of users with a refresh currently in flight.
#[derive(Debug, Clone, Default)]
pub struct InFlightUsers {
    users: Arc<Mutex<HashSet<Uuid>>>,
}

impl InFlightUsers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a user for refreshing. `None` if someone already holds the claim.
    pub fn claim(&self, user_id: Uuid) -> Option<InFlightClaim> {
        let inserted = self
            .users
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(user_id);
        inserted.then(|| InFlightClaim {
            user_id,
            users: self.users.clone(),
        })
    }

    pub fn contains(&self, user_id: Uuid) -> bool {
        self.users
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&user_id)
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive right to refresh one user; released on drop.
#[derive(Debug)]
pub struct InFlightClaim {
    user_id: Uuid,
    users: Arc<Mutex<HashSet<Uuid>>>,
}

impl InFlightClaim {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        self.users
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.user_id);
    }
}

/// Everything a refresh needs. Cheap to clone; each worker holds one.
#[derive(Clone)]
pub struct Refresher {
    locator: Arc<dyn Locator>,
    scorer: Arc<dyn RewardScorer>,
    attractions: Arc<[Attraction]>,
    in_flight: InFlightUsers,
}

impl Refresher {
    pub fn new(locator: Arc<dyn Locator>, scorer: Arc<dyn RewardScorer>, attractions: Arc<[Attraction]>) -> Self {
        Self {
            locator,
            scorer,
            attractions,
            in_flight: InFlightUsers::new(),
        }
    }

    pub fn attractions(&self) -> &Arc<[Attraction]> {
        &self.attractions
    }

    pub fn in_flight(&self) -> &InFlightUsers {
        &self.in_flight
    }

    pub fn claim(&self, user_id: Uuid) -> Option<InFlightClaim> {
        self.in_flight.claim(user_id)
    }

    /// Refresh one user. The caller must hold the user's [`InFlightClaim`].
    ///
    /// If `cancel` fires, the pending provider call is dropped and the
    /// outcome is `TimedOut`, carrying the location if it was already appended.
    pub async fn refresh(&self, user: &UserHandle, cancel: &CancellationToken) -> RefreshOutcome {
        let user_id = user.id();

        let located = tokio::select! {
            biased;
            _ = cancel.cancelled() => return RefreshOutcome::timed_out(user_id, None),
            result = self.locator.fetch_location(user_id) => result,
        };

        let visited = match located {
            Ok(visited) => visited,
            Err(e) => {
                tracing::warn!(user = %user.name(), error = %e, "Location refresh failed");
                return RefreshOutcome::failed(user_id, e.to_string());
            }
        };

        user.write().add_to_visited_locations(visited.clone());

        let scored = tokio::select! {
            biased;
            _ = cancel.cancelled() => return RefreshOutcome::timed_out(user_id, Some(visited)),
            result = self.scorer.score_user(user, &self.attractions) => result,
        };

        match scored {
            Ok(added) => {
                tracing::debug!(user = %user.name(), rewards_added = added, "User refreshed");
                RefreshOutcome::succeeded(user_id, visited)
            }
            Err(e) => {
                tracing::warn!(user = %user.name(), error = %e, "Reward scoring failed after locate");
                RefreshOutcome::scoring_failed(user_id, visited, e.to_string())
            }
        }
    }
}
