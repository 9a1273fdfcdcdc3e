//! Bounded fan-out executor.
//!
//! A batch claims every user up front, puts the claims on a shared queue and
//! starts `min(worker_count, users)` workers that pull from it until it is
//! empty. The batch ends when all workers have returned. When the deadline
//! passes (or the caller cancels) the batch token is cancelled: in-flight
//! refreshes report `TimedOut` and whatever is still queued is counted as
//! timed out too.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::domain::{BatchOutcome, RefreshOutcome, RefreshStatus, UserHandle};
use crate::error::{Result, TourtrackError};

use super::refresh::{InFlightClaim, Refresher};

/// Default size of the worker pool
pub const DEFAULT_WORKER_COUNT: usize = 100;

type WorkQueue = Arc<Mutex<VecDeque<(UserHandle, InFlightClaim)>>>;

/// Outcome counters shared by the workers of one batch.
#[derive(Debug, Default)]
struct BatchCounters {
    succeeded: AtomicUsize,
    partial: AtomicUsize,
    failed: AtomicUsize,
    timed_out: AtomicUsize,
}

impl BatchCounters {
    fn record(&self, outcome: &RefreshOutcome) {
        let counter = match outcome.status {
            RefreshStatus::Succeeded => &self.succeeded,
            RefreshStatus::ScoringFailed(_) => &self.partial,
            RefreshStatus::Failed(_) => &self.failed,
            RefreshStatus::TimedOut => &self.timed_out,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

pub struct FanOutExecutor {
    refresher: Refresher,
    worker_count: usize,
}

impl FanOutExecutor {
    /// Fails if `worker_count` is zero, since no batch could ever finish.
    pub fn new(refresher: Refresher, worker_count: usize) -> Result<Self> {
        if worker_count == 0 {
            return Err(TourtrackError::InvalidConfig("worker_count must be > 0".to_string()));
        }
        Ok(Self {
            refresher,
            worker_count,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn refresher(&self) -> &Refresher {
        &self.refresher
    }

    /// Refresh every user once, finishing by `deadline`.
    ///
    /// Users that appear twice, or that are already being refreshed elsewhere,
    /// are not dispatched and count as skipped. Cancelling `cancel` ends the
    /// batch early exactly like the deadline does.
    pub async fn run_batch(&self, users: Vec<UserHandle>, deadline: Instant, cancel: &CancellationToken) -> BatchOutcome {
        let started = Instant::now();
        let total = users.len();

        let queue: VecDeque<(UserHandle, InFlightClaim)> = users
            .into_iter()
            .filter_map(|user| self.refresher.claim(user.id()).map(|claim| (user, claim)))
            .collect();
        let dispatched = queue.len();
        let skipped = total - dispatched;

        if dispatched == 0 {
            return BatchOutcome {
                skipped,
                elapsed: started.elapsed(),
                ..BatchOutcome::empty()
            };
        }

        let queue: WorkQueue = Arc::new(Mutex::new(queue));
        let counters = Arc::new(BatchCounters::default());
        let batch_cancel = cancel.child_token();

        let mut pool = JoinSet::new();
        for worker_id in 0..self.worker_count.min(dispatched) {
            pool.spawn(run_worker(
                worker_id,
                self.refresher.clone(),
                queue.clone(),
                counters.clone(),
                batch_cancel.clone(),
            ));
        }

        let expiry = tokio::time::sleep_until(deadline);
        tokio::pin!(expiry);
        let mut expired = false;

        loop {
            tokio::select! {
                joined = pool.join_next() => match joined {
                    None => break,
                    Some(Ok(())) => {}
                    Some(Err(e)) => {
                        // The worker died mid-refresh; that user gets no other outcome
                        tracing::error!(error = %e, "Refresh worker panicked");
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                    }
                },
                _ = &mut expiry, if !expired => {
                    expired = true;
                    tracing::warn!(dispatched, "Batch deadline reached, cancelling in-flight refreshes");
                    batch_cancel.cancel();
                }
            }
        }

        let unstarted = {
            let mut remaining = queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let count = remaining.len();
            remaining.clear();
            count
        };
        counters.timed_out.fetch_add(unstarted, Ordering::Relaxed);

        let timed_out = counters.timed_out.load(Ordering::Relaxed);
        BatchOutcome {
            dispatched,
            succeeded: counters.succeeded.load(Ordering::Relaxed),
            partial: counters.partial.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
            timed_out,
            skipped,
            elapsed: started.elapsed(),
            within_budget: timed_out == 0 && Instant::now() <= deadline,
        }
    }
}

async fn run_worker(
    worker_id: usize,
    refresher: Refresher,
    queue: WorkQueue,
    counters: Arc<BatchCounters>,
    cancel: CancellationToken,
) {
    let mut handled = 0usize;

    while !cancel.is_cancelled() {
        let next = queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        let Some((user, _claim)) = next else {
            break;
        };

        let outcome = refresher.refresh(&user, &cancel).await;
        counters.record(&outcome);
        handled += 1;
    }

    tracing::trace!(worker_id, handled, "Refresh worker finished");
}
