//! Location tracking core
//!
//! - `refresh`: locate-then-score for a single user, cancellable
//! - `executor`: bounded worker pool running one batch against a deadline
//! - `scheduler`: the `Tracker` control loop with its start/stop lifecycle

pub mod executor;
pub mod refresh;
pub mod scheduler;

pub use executor::{DEFAULT_WORKER_COUNT, FanOutExecutor};
pub use refresh::{InFlightClaim, InFlightUsers, Refresher};
pub use scheduler::{DEFAULT_TRACKING_INTERVAL, Tracker, TrackerConfig, TrackerState, TrackerStats};
