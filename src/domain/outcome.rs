//! Refresh and batch outcome types.
//!
//! Failures inside a batch never propagate as errors; they end up here.

use std::time::Duration;

use uuid::Uuid;

use super::location::VisitedLocation;

/// Terminal state of one refresh task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshStatus {
    /// Location appended and scoring completed
    Succeeded,
    /// Location appended, scoring failed afterwards
    ScoringFailed(String),
    /// Locator call failed; history untouched
    Failed(String),
    /// Cancelled by the batch deadline or shutdown
    TimedOut,
}

/// Outcome of refreshing a single user.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshOutcome {
    pub user_id: Uuid,
    /// Set whenever the location was appended, even if a later step failed
    pub location: Option<VisitedLocation>,
    pub status: RefreshStatus,
}

impl RefreshOutcome {
    pub fn succeeded(user_id: Uuid, location: VisitedLocation) -> Self {
        Self {
            user_id,
            location: Some(location),
            status: RefreshStatus::Succeeded,
        }
    }

    pub fn scoring_failed(user_id: Uuid, location: VisitedLocation, error: impl Into<String>) -> Self {
        Self {
            user_id,
            location: Some(location),
            status: RefreshStatus::ScoringFailed(error.into()),
        }
    }

    pub fn failed(user_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            user_id,
            location: None,
            status: RefreshStatus::Failed(error.into()),
        }
    }

    pub fn timed_out(user_id: Uuid, location: Option<VisitedLocation>) -> Self {
        Self {
            user_id,
            location,
            status: RefreshStatus::TimedOut,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RefreshStatus::Succeeded
    }
}

/// Aggregate result of one batch.
///
/// `dispatched` counts unique users queued for the batch; every one of them ends
/// in exactly one of `succeeded`, `partial`, `failed` or `timed_out`.
/// `skipped` counts duplicates and users already being refreshed elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub dispatched: usize,
    pub succeeded: usize,
    pub partial: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub skipped: usize,
    pub elapsed: Duration,
    pub within_budget: bool,
}

impl BatchOutcome {
    /// Outcome of a batch over an empty user set
    pub fn empty() -> Self {
        Self {
            within_budget: true,
            ..Default::default()
        }
    }

    /// Number of dispatched users that reached a terminal outcome
    pub fn completed(&self) -> usize {
        self.succeeded + self.partial + self.failed + self.timed_out
    }

    pub fn is_clean(&self) -> bool {
        self.succeeded == self.dispatched && self.within_budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::location::Location;

    #[test]
    fn test_refresh_outcome_constructors() {
        let id = Uuid::new_v4();
        let visited = VisitedLocation::now(id, Location::new(0.0, 0.0));

        assert!(RefreshOutcome::succeeded(id, visited.clone()).is_success());

        let partial = RefreshOutcome::scoring_failed(id, visited.clone(), "503");
        assert_eq!(partial.location, Some(visited));
        assert_eq!(partial.status, RefreshStatus::ScoringFailed("503".into()));

        let failed = RefreshOutcome::failed(id, "refused");
        assert!(failed.location.is_none());
        assert!(!failed.is_success());

        assert_eq!(RefreshOutcome::timed_out(id, None).status, RefreshStatus::TimedOut);
    }

    #[test]
    fn test_empty_batch_is_clean() {
        let outcome = BatchOutcome::empty();
        assert!(outcome.is_clean());
        assert_eq!(outcome.completed(), 0);
    }

    #[test]
    fn test_batch_completed_sum() {
        let outcome = BatchOutcome {
            dispatched: 10,
            succeeded: 5,
            partial: 1,
            failed: 2,
            timed_out: 2,
            skipped: 3,
            elapsed: Duration::from_secs(1),
            within_budget: false,
        };
        assert_eq!(outcome.completed(), 10);
        assert!(!outcome.is_clean());
    }
}
