//! Tracker lifecycle integration tests
//!
//! Exercises the service facade and its tracker end to end: start, cycle,
//! stop, and the interaction between scheduled and on-demand refreshes.

use std::sync::Arc;
use std::time::Duration;

use tourtrack::domain::Attraction;
use tourtrack::providers::{MockLocator, MockScorer, MockTripPricer, StaticRewardPoints};
use tourtrack::registry::UserRegistry;
use tourtrack::service::{Collaborators, ServiceSettings, TourGuideService};
use tourtrack::tracker::{TrackerConfig, TrackerState};

fn service(locator: Arc<MockLocator>, users: usize, tracker: TrackerConfig) -> TourGuideService {
    let attractions = vec![
        Attraction::new("Disneyland", "Anaheim", "CA", 33.817595, -117.922008),
        Attraction::new("Bronx Zoo", "Bronx", "NY", 40.852905, -73.872971),
    ];
    TourGuideService::new(
        Arc::new(UserRegistry::with_internal_users(users)),
        attractions,
        Collaborators {
            locator,
            scorer: Arc::new(MockScorer::noop()),
            reward_points: Arc::new(StaticRewardPoints::new(5)),
            trip_pricer: Arc::new(MockTripPricer::new(5)),
        },
        ServiceSettings {
            worker_count: 10,
            tracker,
            trip_pricer_api_key: "test-server-api-key".to_string(),
        },
    )
    .unwrap()
}

#[tokio::test]
async fn test_tracker_cycles_until_stopped() {
    let locator = Arc::new(MockLocator::new().with_latency(Duration::from_millis(5)));
    let service = service(locator.clone(), 20, TrackerConfig::new(Duration::from_millis(50)));

    assert!(service.tracker().start());
    tokio::time::sleep(Duration::from_millis(300)).await;
    service.tracker().stop().await;

    let stats = service.tracker().stats();
    assert!(stats.cycles >= 2);
    assert_eq!(stats.max_batches_in_flight, 1);
    assert_eq!(service.tracker().state(), TrackerState::Stopped);

    // No more calls once stopped
    let calls = locator.calls();
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(locator.calls(), calls);
}

#[tokio::test]
async fn test_stop_returns_promptly_with_stuck_locator() {
    let locator = Arc::new(MockLocator::new().with_latency(Duration::from_secs(120)));
    let service = service(locator.clone(), 30, TrackerConfig::default());

    service.tracker().start();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(locator.in_flight(), 10);

    tokio::time::timeout(Duration::from_secs(5), service.tracker().stop())
        .await
        .unwrap();

    assert_eq!(locator.in_flight(), 0);
    let outcome = service.tracker().stats().last_outcome.unwrap();
    assert_eq!(outcome.dispatched, 30);
    assert_eq!(outcome.timed_out, 30);
}

#[tokio::test]
async fn test_batch_budget_bounds_each_cycle() {
    let locator = Arc::new(MockLocator::new().with_latency(Duration::from_secs(120)));
    let config = TrackerConfig::new(Duration::from_secs(300)).with_batch_budget(Duration::from_millis(100));
    let service = service(locator, 5, config);

    service.tracker().start();
    tokio::time::sleep(Duration::from_millis(400)).await;

    // The first batch hit its budget and the tracker is sleeping out the interval
    let stats = service.tracker().stats();
    assert_eq!(stats.cycles, 1);
    assert_eq!(stats.batches_in_flight, 0);
    let outcome = stats.last_outcome.unwrap();
    assert_eq!(outcome.timed_out, 5);
    assert!(!outcome.within_budget);

    service.tracker().stop().await;
}

#[tokio::test]
async fn test_on_demand_refresh_skipped_while_batch_holds_user() {
    let locator = Arc::new(MockLocator::new().with_latency(Duration::from_millis(300)));
    let service = service(locator, 3, TrackerConfig::default());
    let user = service.get_user("internalUser0").unwrap();

    service.tracker().start();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = service.track_user_location(&user).await.unwrap_err();
    assert!(err.to_string().contains("already being tracked"));

    service.tracker().stop().await;
}

#[tokio::test]
async fn test_current_locations_after_cycle() {
    let locator = Arc::new(MockLocator::new());
    let service = service(locator, 10, TrackerConfig::default());

    service.tracker().start();
    tokio::time::sleep(Duration::from_millis(100)).await;
    service.tracker().stop().await;

    let locations = service.get_all_current_locations();
    assert_eq!(locations.len(), 10);
    for user in service.get_all_users() {
        let record = user.read();
        assert_eq!(record.visited_locations().len(), 4);
        assert_eq!(locations[&user.id()], record.last_visited_location().unwrap().location);
    }
}
