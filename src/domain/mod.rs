//! Domain types for tourtrack
//!
//! This module contains all core domain types:
//! - Location / VisitedLocation: positions and timestamped observations
//! - Attraction / NearbyAttraction: the catalog and ranked answers
//! - User / UserHandle: user records and the shared handle workers append to
//! - RefreshOutcome / BatchOutcome: per-task and per-batch results

pub mod attraction;
pub mod location;
pub mod outcome;
pub mod user;

pub use attraction::{Attraction, NearbyAttraction};
pub use location::{Location, VisitedLocation};
pub use outcome::{BatchOutcome, RefreshOutcome, RefreshStatus};
pub use user::{Provider, User, UserHandle, UserPreferences, UserReward};
