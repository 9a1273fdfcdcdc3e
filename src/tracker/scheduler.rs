//! Cycle scheduler
//!
//! The tracker owns one control loop that repeatedly:
//! - Fetches the current user set from the registry
//! - Runs one batch on the fan-out executor, bounded by the batch budget
//! - Sleeps for whatever is left of the interval
//!
//! A cycle never starts before the previous batch has returned, so at most
//! one batch is in flight per tracker.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::domain::BatchOutcome;
use crate::registry::UserSource;

use super::executor::FanOutExecutor;

/// Default time between the starts of two cycles
pub const DEFAULT_TRACKING_INTERVAL: Duration = Duration::from_secs(300);

/// Configuration for the tracker control loop
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Time between the starts of two consecutive cycles
    pub interval: Duration,
    /// Deadline for each batch, measured from the start of its cycle.
    /// Falls back to `interval` when unset.
    pub batch_budget: Option<Duration>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_TRACKING_INTERVAL,
            batch_budget: None,
        }
    }
}

impl TrackerConfig {
    /// Create a config with the given interval and no separate budget
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            batch_budget: None,
        }
    }

    /// Set the per-batch deadline
    pub fn with_batch_budget(mut self, budget: Duration) -> Self {
        self.batch_budget = Some(budget);
        self
    }

    /// Effective per-batch deadline
    pub fn batch_budget(&self) -> Duration {
        self.batch_budget.unwrap_or(self.interval)
    }
}

/// Lifecycle state of a tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// No control loop exists
    Stopped,
    /// Control loop is cycling
    Running,
    /// Stop requested, waiting for the control loop to exit
    Stopping,
}

/// Counters describing what the control loop has done so far
#[derive(Debug, Clone, Default)]
pub struct TrackerStats {
    /// Cycles that ran a batch
    pub cycles: u64,
    /// Cycles abandoned because the registry could not be read
    pub failed_cycles: u64,
    /// Batches currently running
    pub batches_in_flight: usize,
    /// Highest value `batches_in_flight` ever reached
    pub max_batches_in_flight: usize,
    /// Outcome of the most recent batch
    pub last_outcome: Option<BatchOutcome>,
}

impl TrackerStats {
    fn begin_batch(&mut self) {
        self.batches_in_flight += 1;
        self.max_batches_in_flight = self.max_batches_in_flight.max(self.batches_in_flight);
    }

    fn finish_batch(&mut self, outcome: BatchOutcome) {
        self.batches_in_flight = self.batches_in_flight.saturating_sub(1);
        self.cycles += 1;
        self.last_outcome = Some(outcome);
    }
}

type SharedStats = Arc<Mutex<TrackerStats>>;

type SharedState = Arc<watch::Sender<TrackerState>>;

/// Publishes `Stopped` when the control loop task ends, however it ends.
struct PublishStopped(SharedState);

impl Drop for PublishStopped {
    fn drop(&mut self) {
        self.0.send_replace(TrackerState::Stopped);
    }
}

/// A running control loop
struct ControlLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Periodic location tracker
pub struct Tracker {
    executor: Arc<FanOutExecutor>,
    users: Arc<dyn UserSource>,
    config: TrackerConfig,
    state: SharedState,
    control: Mutex<Option<ControlLoop>>,
    stats: SharedStats,
}

impl Tracker {
    /// Create a stopped tracker
    pub fn new(executor: Arc<FanOutExecutor>, users: Arc<dyn UserSource>, config: TrackerConfig) -> Self {
        let (state, _) = watch::channel(TrackerState::Stopped);
        Self {
            executor,
            users,
            config,
            state: Arc::new(state),
            control: Mutex::new(None),
            stats: Arc::new(Mutex::new(TrackerStats::default())),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn state(&self) -> TrackerState {
        *self.state.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.state() == TrackerState::Running
    }

    /// Snapshot of the control loop counters
    pub fn stats(&self) -> TrackerStats {
        self.stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    /// Start the control loop.
    ///
    /// Returns `false` without doing anything unless the tracker is stopped.
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut control = self.control.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let started = self.state.send_if_modified(|state| {
            if *state == TrackerState::Stopped {
                *state = TrackerState::Running;
                true
            } else {
                false
            }
        });
        if !started {
            log::debug!("Tracker start ignored in state {:?}", self.state());
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(control_loop(
            self.executor.clone(),
            self.users.clone(),
            self.config.clone(),
            self.stats.clone(),
            cancel.clone(),
            PublishStopped(self.state.clone()),
        ));
        *control = Some(ControlLoop { cancel, handle });

        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            workers = self.executor.worker_count(),
            "Tracker started"
        );
        true
    }

    /// Stop the control loop and wait for it to exit.
    ///
    /// The in-flight batch, if any, is cancelled; its unfinished refreshes
    /// are reported as timeouts. Calling this on a stopped tracker returns
    /// immediately; calling it while another stop is in progress waits for
    /// that stop to finish. Dropping the returned future early does not
    /// strand the tracker: the control loop publishes `Stopped` on exit.
    pub async fn stop(&self) {
        let handle = {
            let mut control = self.control.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            match self.state() {
                TrackerState::Stopped => return,
                TrackerState::Stopping => None,
                TrackerState::Running => {
                    self.state.send_replace(TrackerState::Stopping);
                    tracing::info!("Tracker stopping");
                    control.take().map(|ControlLoop { cancel, handle }| {
                        cancel.cancel();
                        handle
                    })
                }
            }
        };

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Tracker control loop panicked");
            }
        }

        self.wait_stopped().await;
        tracing::info!("Tracker stopped");
    }

    /// Wait until the tracker reaches `Stopped`
    pub async fn wait_stopped(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|state| *state == TrackerState::Stopped).await;
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        let control = self.control.get_mut().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(control) = control.as_ref() {
            control.cancel.cancel();
        }
    }
}

async fn control_loop(
    executor: Arc<FanOutExecutor>,
    users: Arc<dyn UserSource>,
    config: TrackerConfig,
    stats: SharedStats,
    cancel: CancellationToken,
    _stopped: PublishStopped,
) {
    let budget = config.batch_budget();

    while !cancel.is_cancelled() {
        let cycle_start = Instant::now();

        match users.all_users() {
            Ok(batch) => {
                let population = batch.len();
                stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).begin_batch();

                let outcome = executor.run_batch(batch, cycle_start + budget, &cancel).await;

                tracing::info!(
                    users = population,
                    succeeded = outcome.succeeded,
                    partial = outcome.partial,
                    failed = outcome.failed,
                    timed_out = outcome.timed_out,
                    skipped = outcome.skipped,
                    elapsed_ms = outcome.elapsed.as_millis() as u64,
                    within_budget = outcome.within_budget,
                    "Tracking cycle finished"
                );
                stats
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .finish_batch(outcome);
            }
            Err(e) => {
                tracing::error!(error = %e, "Could not read users, skipping cycle");
                stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).failed_cycles += 1;
            }
        }

        let next_cycle = cycle_start + config.interval;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep_until(next_cycle) => {}
        }
    }

    tracing::debug!("Tracker control loop exited");
}
