//! Generated in-memory users for test mode and load runs.
//!
//! Each user gets three random past observations so that "current location"
//! is defined before the first tracking cycle runs.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::domain::{Location, User, VisitedLocation};

/// Web-mercator latitude bound used when generating positions
const MAX_GENERATED_LATITUDE: f64 = 85.051_128_78;

const GENERATED_HISTORY_LEN: usize = 3;

const GENERATED_HISTORY_DAYS: i64 = 30;

/// Name of the i-th generated user
pub fn internal_user_name(index: usize) -> String {
    format!("internalUser{}", index)
}

/// Build `count` users named `internalUser0..count`.
pub fn generate_internal_users(count: usize) -> Vec<User> {
    let mut rng = rand::rng();
    (0..count)
        .map(|i| {
            let name = internal_user_name(i);
            let email = format!("{}@tourGuide.com", name);
            let mut user = User::new(Uuid::new_v4(), name, "000", email);
            // History is oldest first, so the last entry is the newest
            let mut times: Vec<DateTime<Utc>> = (0..GENERATED_HISTORY_LEN).map(|_| random_time(&mut rng)).collect();
            times.sort();
            for time_visited in times {
                let visited = VisitedLocation::new(user.user_id, random_location(&mut rng), time_visited);
                user.add_to_visited_locations(visited);
            }
            user
        })
        .collect()
}

fn random_location(rng: &mut impl Rng) -> Location {
    Location::new(
        rng.random_range(-MAX_GENERATED_LATITUDE..MAX_GENERATED_LATITUDE),
        rng.random_range(-180.0..180.0),
    )
}

fn random_time(rng: &mut impl Rng) -> DateTime<Utc> {
    Utc::now() - Duration::days(rng.random_range(0..GENERATED_HISTORY_DAYS))
}
