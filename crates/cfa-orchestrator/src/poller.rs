//! Result polling loop
//!
//! One [`ResultPoller`] drives at most one poll task. The task fetches on a
//! fixed interval and writes through [`AnalysisStore::dispatch_in_epoch`], so a
//! response that lands after its epoch was superseded is dropped. The loop
//! ends on a `FINAL` solution, a poll failure, a stale epoch or [`ResultPoller::cancel`].

use crate::api::{CounterfactualApi, CounterfactualId, ExecutionId};
use cfa_model::{CounterfactualStatus, StatusPatch};
use cfa_reducer::{AnalysisStore, Epoch, Intent};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug)]
struct ActivePoll {
    job: CounterfactualId,
    epoch: Epoch,
    handle: JoinHandle<()>,
}

/// Cancellable poll task owner
pub struct ResultPoller {
    api: Arc<dyn CounterfactualApi>,
    store: Arc<AnalysisStore>,
    execution: ExecutionId,
    interval: Duration,
    active: Mutex<Option<ActivePoll>>,
}

impl std::fmt::Debug for ResultPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultPoller")
            .field("execution", &self.execution)
            .field("interval", &self.interval)
            .field("active", &self.active_job())
            .finish_non_exhaustive()
    }
}

impl ResultPoller {
    /// Create an idle poller
    #[must_use]
    pub fn new(
        api: Arc<dyn CounterfactualApi>,
        store: Arc<AnalysisStore>,
        execution: ExecutionId,
        interval: Duration,
    ) -> Self {
        Self {
            api,
            store,
            execution,
            interval,
            active: Mutex::new(None),
        }
    }

    /// Start polling `job` on behalf of `epoch`, replacing any running loop.
    ///
    /// Returns `false` and leaves the running loop alone when `epoch` is no
    /// longer the store's current epoch or is older than the running loop's.
    /// Must be called within a tokio runtime.
    #[must_use = "a refused start means the job was superseded"]
    pub fn start(&self, job: CounterfactualId, epoch: Epoch) -> bool {
        let mut active = self.active.lock();
        let current = self.store.current_epoch();
        if epoch != current {
            tracing::debug!("Refusing to poll job {} for {} (store is at {})", job, epoch, current);
            return false;
        }
        if let Some(running) = active.as_ref().filter(|poll| !poll.handle.is_finished()) {
            if running.epoch > epoch {
                tracing::debug!(
                    "Refusing to poll job {} for {}; job {} holds {}",
                    job,
                    epoch,
                    running.job,
                    running.epoch
                );
                return false;
            }
        }

        if let Some(previous) = active.take() {
            tracing::debug!("Replacing poll loop for job {}", previous.job);
            previous.handle.abort();
        }

        tracing::info!("Polling job {} every {:?} ({})", job, self.interval, epoch);
        let handle = tokio::spawn(poll_loop(
            Arc::clone(&self.api),
            Arc::clone(&self.store),
            self.execution.clone(),
            job.clone(),
            epoch,
            self.interval,
        ));
        *active = Some(ActivePoll { job, epoch, handle });
        true
    }

    /// Stop the running loop, if any. In-flight fetches are abandoned.
    pub fn cancel(&self) {
        if let Some(previous) = self.active.lock().take() {
            tracing::debug!("Cancelling poll loop for job {} ({})", previous.job, previous.epoch);
            previous.handle.abort();
        }
    }

    /// Whether a loop is still running
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|poll| !poll.handle.is_finished())
    }

    /// Job of the running loop
    #[must_use]
    pub fn active_job(&self) -> Option<CounterfactualId> {
        self.active
            .lock()
            .as_ref()
            .filter(|poll| !poll.handle.is_finished())
            .map(|poll| poll.job.clone())
    }
}

impl Drop for ResultPoller {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn poll_loop(
    api: Arc<dyn CounterfactualApi>,
    store: Arc<AnalysisStore>,
    execution: ExecutionId,
    job: CounterfactualId,
    epoch: Epoch,
    period: Duration,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        if store.current_epoch() != epoch {
            tracing::debug!("Job {} superseded before tick; stopping", job);
            return;
        }

        match api.poll(&execution, &job).await {
            Ok(response) => {
                let finished = response.is_final();
                tracing::debug!(
                    "Job {} returned {} solution(s), final: {}",
                    job,
                    response.solutions.len(),
                    finished
                );

                let mut intents = vec![Intent::SetResults(response.solutions)];
                if finished {
                    intents.push(Intent::SetStatus(
                        StatusPatch::status(CounterfactualStatus::Completed)
                            .with_execution_time(chrono::Utc::now())
                            .clear_error(),
                    ));
                }

                match store.dispatch_in_epoch(epoch, intents) {
                    Ok(true) if finished => {
                        tracing::info!("Job {} completed", job);
                        return;
                    }
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::debug!("Dropped stale response for job {}", job);
                        return;
                    }
                    Err(e) => {
                        tracing::error!("Failed to apply results for job {}: {}", job, e);
                        return;
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Polling job {} failed: {}", job, e);
                let failed = Intent::SetStatus(
                    StatusPatch::status(CounterfactualStatus::Failed).with_error(e.to_string()),
                );
                if let Err(e) = store.dispatch_in_epoch(epoch, vec![failed]) {
                    tracing::error!("Failed to record poll failure for job {}: {}", job, e);
                }
                return;
            }
        }
    }
}
