//! High volume tracking integration tests
//!
//! Drives full batches over generated users through the public API with
//! mock providers standing in for the gps and rewards services.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tourtrack::domain::{Attraction, Location};
use tourtrack::providers::{MockLocator, MockScorer, RewardsService, StaticRewardPoints};
use tourtrack::ranking::{distance_miles, rank};
use tourtrack::registry::{UserRegistry, UserSource};
use tourtrack::tracker::{FanOutExecutor, Refresher};

fn catalog() -> Vec<Attraction> {
    vec![
        Attraction::new("Disneyland", "Anaheim", "CA", 33.817595, -117.922008),
        Attraction::new("McKinley Tower", "Anchorage", "AK", 61.218887, -149.877502),
        Attraction::new("Franklin Park Zoo", "Boston", "MA", 42.302601, -71.086731),
        Attraction::new("Bronx Zoo", "Bronx", "NY", 40.852905, -73.872971),
        Attraction::new("Flatiron Building", "New York City", "NY", 40.741112, -73.989723),
        Attraction::new("Jackson Hole", "Jackson Hole", "WY", 43.582767, -110.821999),
        Attraction::new("Legend Valley", "Thornville", "OH", 39.937778, -82.40667),
    ]
}

#[tokio::test]
async fn test_hundred_users_hundred_workers() {
    let registry = UserRegistry::with_internal_users(100);
    let locator = Arc::new(MockLocator::new().with_latency(Duration::from_millis(20)));
    let refresher = Refresher::new(locator.clone(), Arc::new(MockScorer::noop()), Arc::from(catalog()));
    let executor = FanOutExecutor::new(refresher, 100).unwrap();
    let deadline = Instant::now() + Duration::from_secs(15 * 60);

    let started = Instant::now();
    let outcome = executor
        .run_batch(registry.all_users().unwrap(), deadline, &CancellationToken::new())
        .await;

    assert_eq!(outcome.dispatched, 100);
    assert_eq!(outcome.succeeded, 100);
    assert!(outcome.within_budget);
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(locator.max_in_flight() <= 100);

    // Generated users start with three observations
    for user in registry.get_all() {
        assert_eq!(user.read().visited_locations().len(), 4);
    }
}

#[tokio::test]
async fn test_small_pool_bounds_concurrency() {
    let registry = UserRegistry::with_internal_users(200);
    let locator = Arc::new(MockLocator::new().with_latency(Duration::from_millis(5)));
    let refresher = Refresher::new(locator.clone(), Arc::new(MockScorer::noop()), Arc::from(catalog()));
    let executor = FanOutExecutor::new(refresher, 16).unwrap();

    let outcome = executor
        .run_batch(
            registry.get_all(),
            Instant::now() + Duration::from_secs(60),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(outcome.succeeded, 200);
    assert!(locator.max_in_flight() <= 16);
    assert_eq!(locator.calls(), 200);
}

#[tokio::test]
async fn test_batch_with_rewards_scoring() {
    let registry = UserRegistry::with_internal_users(50);
    let points = Arc::new(StaticRewardPoints::new(10));
    let scorer = RewardsService::new(points.clone());
    // Everyone is placed at Disneyland
    let locator = Arc::new(MockLocator::new());
    let refresher = Refresher::new(locator, Arc::new(scorer), Arc::from(catalog()));
    let executor = FanOutExecutor::new(refresher, 8).unwrap();

    let outcome = executor
        .run_batch(
            registry.get_all(),
            Instant::now() + Duration::from_secs(60),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(outcome.succeeded, 50);
    for user in registry.get_all() {
        let record = user.read();
        assert!(
            record
                .user_rewards()
                .iter()
                .any(|r| r.attraction.attraction_name == "Disneyland")
        );
    }
}

#[tokio::test]
async fn test_one_failing_user_does_not_affect_others() {
    let registry = UserRegistry::with_internal_users(30);
    let locator = Arc::new(MockLocator::new());
    let victim = registry.get("internalUser7").unwrap();
    locator.fail_for(victim.id());
    let before = victim.read().visited_locations().to_vec();

    let refresher = Refresher::new(locator, Arc::new(MockScorer::noop()), Arc::from(catalog()));
    let executor = FanOutExecutor::new(refresher, 5).unwrap();
    let outcome = executor
        .run_batch(
            registry.get_all(),
            Instant::now() + Duration::from_secs(60),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.succeeded, 29);
    assert_eq!(victim.read().visited_locations(), before.as_slice());
}

#[test]
fn test_rank_reference_scenario() {
    let attractions = vec![
        Attraction::new("Jackson Hole", "Jackson Hole", "WY", 43.582767, -110.821999),
        Attraction::new("Bronx Zoo", "Bronx", "NY", 40.852905, -73.872971),
        Attraction::new("McKinley Tower", "Anchorage", "AK", 61.218887, -149.877502),
        Attraction::new("Flatiron Building", "New York City", "NY", 40.741112, -73.989723),
        Attraction::new("Franklin Park Zoo", "Boston", "MA", 42.302601, -71.086731),
    ];
    let reference = Location::new(47.305969, 71.710449);

    let ranked = rank(&reference, &attractions, |_| 0);

    let names: Vec<&str> = ranked.iter().map(|n| n.attraction_name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "McKinley Tower",
            "Franklin Park Zoo",
            "Bronx Zoo",
            "Flatiron Building",
            "Jackson Hole"
        ]
    );
    assert!(ranked.windows(2).all(|w| w[0].distance < w[1].distance));
    for nearby in &ranked {
        assert_eq!(nearby.distance, distance_miles(&reference, &nearby.attraction_location));
    }
}
