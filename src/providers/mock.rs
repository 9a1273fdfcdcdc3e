//! In-process provider implementations for tests and load runs.
//!
//! `MockLocator` records call counts and the peak number of concurrent
//! calls so callers can check that fan-out stays within its worker bound.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Attraction, Location, Provider, UserHandle, VisitedLocation};
use crate::error::{Result, TourtrackError};

use super::{Locator, QuoteRequest, RewardPoints, RewardScorer, TripPricer};

/// Decrements the in-flight counter when a call finishes or is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct MockLocator {
    latency: Duration,
    location: Location,
    attractions: Vec<Attraction>,
    failing: Mutex<HashSet<Uuid>>,
    slow: Mutex<HashMap<Uuid, Duration>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockLocator {
    pub fn new() -> Self {
        Self {
            latency: Duration::ZERO,
            location: Location::new(33.817595, -117.922008),
            attractions: Vec::new(),
            failing: Mutex::new(HashSet::new()),
            slow: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Delay applied to every location call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Position returned for every user
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    pub fn with_attractions(mut self, attractions: Vec<Attraction>) -> Self {
        self.attractions = attractions;
        self
    }

    /// Make every call for `user_id` fail
    pub fn fail_for(&self, user_id: Uuid) {
        self.failing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(user_id);
    }

    /// Override the latency for one user
    pub fn slow_for(&self, user_id: Uuid, latency: Duration) {
        self.slow
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(user_id, latency);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous location calls observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn latency_for(&self, user_id: Uuid) -> Duration {
        self.slow
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&user_id)
            .copied()
            .unwrap_or(self.latency)
    }

    fn is_failing(&self, user_id: Uuid) -> bool {
        self.failing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&user_id)
    }
}

impl Default for MockLocator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Locator for MockLocator {
    async fn fetch_location(&self, user_id: Uuid) -> Result<VisitedLocation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        let latency = self.latency_for(user_id);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if self.is_failing(user_id) {
            return Err(TourtrackError::Locator(format!("simulated failure for {}", user_id)));
        }

        Ok(VisitedLocation::now(user_id, self.location))
    }

    async fn fetch_attractions(&self) -> Result<Vec<Attraction>> {
        Ok(self.attractions.clone())
    }
}

/// Reward points provider answering the same value for everything.
pub struct StaticRewardPoints {
    points: i32,
    calls: AtomicUsize,
}

impl StaticRewardPoints {
    pub fn new(points: i32) -> Self {
        Self {
            points,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RewardPoints for StaticRewardPoints {
    async fn reward_points(&self, _attraction_id: Uuid, _user_id: Uuid) -> Result<i32> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.points)
    }
}

/// Scorer that appends nothing, optionally failing or sleeping.
pub struct MockScorer {
    failure: Option<String>,
    latency: Duration,
    calls: AtomicUsize,
}

impl MockScorer {
    /// Succeeds immediately without touching the user
    pub fn noop() -> Self {
        Self {
            failure: None,
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails every call with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::noop()
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RewardScorer for MockScorer {
    async fn score_user(&self, _user: &UserHandle, _attractions: &[Attraction]) -> Result<usize> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match &self.failure {
            Some(message) => Err(TourtrackError::Scoring(message.clone())),
            None => Ok(0),
        }
    }
}

/// Trip pricer returning a fixed number of offers and remembering the last request.
pub struct MockTripPricer {
    offers: usize,
    last_request: Mutex<Option<QuoteRequest>>,
}

impl MockTripPricer {
    pub fn new(offers: usize) -> Self {
        Self {
            offers,
            last_request: Mutex::new(None),
        }
    }

    pub fn last_request(&self) -> Option<QuoteRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl TripPricer for MockTripPricer {
    async fn quote(&self, request: &QuoteRequest) -> Result<Vec<Provider>> {
        *self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(request.clone());

        let offers = (0..self.offers)
            .map(|i| Provider {
                name: format!("Provider {}", i + 1),
                price: 100.0 * (i + 1) as f64 * f64::from(request.nights.max(1)),
                trip_id: Uuid::new_v4(),
            })
            .collect();
        Ok(offers)
    }
}
