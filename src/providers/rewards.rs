//! Proximity-based reward scoring.
//!
//! A user earns a reward for an attraction the first time any of their
//! visited locations falls within the proximity buffer of it. Points come
//! from the reward points provider.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;

use crate::domain::{Attraction, Location, UserHandle, UserReward, VisitedLocation};
use crate::error::Result;
use crate::ranking::distance_miles;

use super::{RewardPoints, RewardScorer};

/// Distance within which a visit earns a reward
pub const DEFAULT_PROXIMITY_BUFFER_MILES: f64 = 10.0;

/// Distance within which an attraction counts as "in range" of a location
pub const ATTRACTION_PROXIMITY_RANGE_MILES: f64 = 200.0;

pub struct RewardsService {
    points: Arc<dyn RewardPoints>,
    proximity_buffer_miles: f64,
    attraction_proximity_range_miles: f64,
}

impl RewardsService {
    pub fn new(points: Arc<dyn RewardPoints>) -> Self {
        Self {
            points,
            proximity_buffer_miles: DEFAULT_PROXIMITY_BUFFER_MILES,
            attraction_proximity_range_miles: ATTRACTION_PROXIMITY_RANGE_MILES,
        }
    }

    pub fn with_proximity_buffer(mut self, miles: f64) -> Self {
        self.proximity_buffer_miles = miles;
        self
    }

    pub fn with_attraction_proximity_range(mut self, miles: f64) -> Self {
        self.attraction_proximity_range_miles = miles;
        self
    }

    pub fn proximity_buffer(&self) -> f64 {
        self.proximity_buffer_miles
    }

    pub fn is_within_attraction_proximity(&self, attraction: &Attraction, location: &Location) -> bool {
        distance_miles(&attraction.location(), location) <= self.attraction_proximity_range_miles
    }

    fn near_attraction(&self, visited: &VisitedLocation, attraction: &Attraction) -> bool {
        distance_miles(&visited.location, &attraction.location()) <= self.proximity_buffer_miles
    }

    /// Points the user would get for an attraction
    pub async fn reward_points(&self, attraction: &Attraction, user: &UserHandle) -> Result<i32> {
        self.points.reward_points(attraction.attraction_id, user.id()).await
    }

    /// Attractions not yet rewarded that some visit was close enough to,
    /// paired with the first such visit.
    fn earned<'a>(&self, user: &UserHandle, attractions: &'a [Attraction]) -> Vec<(&'a Attraction, VisitedLocation)> {
        let record = user.read();
        attractions
            .iter()
            .filter(|attraction| !record.has_reward_for(attraction.attraction_id))
            .filter_map(|attraction| {
                record
                    .visited_locations()
                    .iter()
                    .find(|visited| self.near_attraction(visited, attraction))
                    .map(|visited| (attraction, visited.clone()))
            })
            .collect()
    }
}

#[async_trait]
impl RewardScorer for RewardsService {
    async fn score_user(&self, user: &UserHandle, attractions: &[Attraction]) -> Result<usize> {
        let earned = self.earned(user, attractions);
        if earned.is_empty() {
            return Ok(0);
        }

        let user_id = user.id();
        let points = try_join_all(
            earned
                .iter()
                .map(|(attraction, _)| self.points.reward_points(attraction.attraction_id, user_id)),
        )
        .await?;

        let mut record = user.write();
        let mut added = 0;
        for ((attraction, visited_location), reward_points) in earned.into_iter().zip(points) {
            let reward = UserReward {
                visited_location,
                attraction: attraction.clone(),
                reward_points,
            };
            if record.add_user_reward(reward) {
                added += 1;
            }
        }

        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::error::TourtrackError;
    use crate::providers::mock::StaticRewardPoints;
    use uuid::Uuid;

    struct FailingPoints;

    #[async_trait]
    impl RewardPoints for FailingPoints {
        async fn reward_points(&self, _attraction_id: Uuid, _user_id: Uuid) -> Result<i32> {
            Err(TourtrackError::Scoring("rewards service down".to_string()))
        }
    }

    fn catalog() -> Vec<Attraction> {
        vec![
            Attraction::new("Disneyland", "Anaheim", "CA", 33.817595, -117.922008),
            Attraction::new("Bronx Zoo", "Bronx", "NY", 40.852905, -73.872971),
        ]
    }

    fn user_at(location: Location) -> UserHandle {
        let mut user = User::new(Uuid::new_v4(), "jon", "000", "jon@tourGuide.com");
        user.add_to_visited_locations(VisitedLocation::now(user.user_id, location));
        UserHandle::new(user)
    }

    #[tokio::test]
    async fn test_user_near_attraction_gets_reward() {
        let attractions = catalog();
        let user = user_at(attractions[0].location());
        let service = RewardsService::new(Arc::new(StaticRewardPoints::new(250)));

        let added = service.score_user(&user, &attractions).await.unwrap();

        assert_eq!(added, 1);
        let record = user.read();
        assert_eq!(record.user_rewards().len(), 1);
        assert_eq!(record.user_rewards()[0].attraction.attraction_name, "Disneyland");
        assert_eq!(record.user_rewards()[0].reward_points, 250);
    }

    #[tokio::test]
    async fn test_scoring_twice_does_not_duplicate() {
        let attractions = catalog();
        let user = user_at(attractions[1].location());
        let service = RewardsService::new(Arc::new(StaticRewardPoints::new(10)));

        service.score_user(&user, &attractions).await.unwrap();
        let added = service.score_user(&user, &attractions).await.unwrap();

        assert_eq!(added, 0);
        assert_eq!(user.read().user_rewards().len(), 1);
    }

    #[tokio::test]
    async fn test_far_user_gets_nothing() {
        let attractions = catalog();
        let user = user_at(Location::new(-45.0, 100.0));
        let service = RewardsService::new(Arc::new(StaticRewardPoints::new(10)));

        assert_eq!(service.score_user(&user, &attractions).await.unwrap(), 0);
        assert!(user.read().user_rewards().is_empty());
    }

    #[tokio::test]
    async fn test_huge_buffer_rewards_every_attraction() {
        let attractions = catalog();
        let user = user_at(Location::new(-45.0, 100.0));
        let service = RewardsService::new(Arc::new(StaticRewardPoints::new(10))).with_proximity_buffer(f64::MAX);

        assert_eq!(service.score_user(&user, &attractions).await.unwrap(), attractions.len());
    }

    #[tokio::test]
    async fn test_points_failure_adds_nothing() {
        let attractions = catalog();
        let user = user_at(attractions[0].location());
        let service = RewardsService::new(Arc::new(FailingPoints));

        let err = service.score_user(&user, &attractions).await.unwrap_err();
        assert!(matches!(err, TourtrackError::Scoring(_)));
        assert!(user.read().user_rewards().is_empty());
    }

    #[test]
    fn test_attraction_proximity_range() {
        let attractions = catalog();
        let service = RewardsService::new(Arc::new(StaticRewardPoints::new(1)));

        assert!(service.is_within_attraction_proximity(&attractions[0], &Location::new(34.0, -118.0)));
        assert!(!service.is_within_attraction_proximity(&attractions[0], &attractions[1].location()));
    }
}
