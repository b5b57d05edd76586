//! Submission orchestration
//!
//! ```text
//! NOT_STARTED --submit--> RUNNING --poll(final)--> COMPLETED
//!                            |  \--poll failure--> FAILED
//!                            \-----submit failure--> FAILED
//! ```
//!
//! Every submission opens a new store epoch. Results and status written for
//! an older epoch are dropped, so a superseded job can never overwrite the
//! state of a newer one.

use crate::api::{CounterfactualApi, CounterfactualId, ExecutionId, SubmitRequest};
use crate::config::CfaConfig;
use crate::error::OrchestratorError;
use crate::poller::ResultPoller;
use cfa_model::{CounterfactualStatus, StatusPatch};
use cfa_reducer::{blockers, AnalysisStore, Intent};
use std::sync::Arc;

/// Drives submissions and polling for one execution's analysis
pub struct CounterfactualOrchestrator {
    api: Arc<dyn CounterfactualApi>,
    store: Arc<AnalysisStore>,
    execution: ExecutionId,
    poller: ResultPoller,
}

impl std::fmt::Debug for CounterfactualOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CounterfactualOrchestrator")
            .field("execution", &self.execution)
            .field("poller", &self.poller)
            .finish_non_exhaustive()
    }
}

impl CounterfactualOrchestrator {
    /// Create orchestrator over an existing store
    #[must_use]
    pub fn new(
        api: Arc<dyn CounterfactualApi>,
        store: Arc<AnalysisStore>,
        execution: ExecutionId,
        config: &CfaConfig,
    ) -> Self {
        let poller = ResultPoller::new(
            Arc::clone(&api),
            Arc::clone(&store),
            execution.clone(),
            config.poll_interval(),
        );
        Self {
            api,
            store,
            execution,
            poller,
        }
    }

    /// Submit the current query and start polling.
    ///
    /// Any running poll loop is cancelled first. On a remote failure the
    /// status becomes `FAILED` and the previous results are kept.
    ///
    /// # Errors
    /// - `SubmissionNotAllowed` when the enablement policy refuses (no request is sent)
    /// - `SubmissionFailed` when the service rejects or cannot be reached
    /// - `Superseded` when another submission or a teardown won the race
    pub async fn submit(&self) -> Result<CounterfactualId, OrchestratorError> {
        let state = self.store.snapshot();
        let blocked = blockers(&state);
        if !blocked.is_empty() {
            let reasons: Vec<String> = blocked.iter().map(ToString::to_string).collect();
            tracing::warn!("Submission refused: {}", reasons.join("; "));
            return Err(OrchestratorError::SubmissionNotAllowed(reasons));
        }

        self.poller.cancel();
        let request = SubmitRequest::from_state(&state);
        let epoch = self.store.begin_epoch_with(vec![Intent::SetStatus(
            StatusPatch::status(CounterfactualStatus::Running)
                .clear_error()
                .clear_execution_time(),
        )])?;

        tracing::info!(
            "Submitting counterfactual search for execution {} ({} goal(s), {} input(s))",
            self.execution,
            request.goals.len(),
            request.search_domains.len()
        );

        match self.api.submit(&self.execution, &request).await {
            Ok(job) => {
                if !self.store.dispatch_in_epoch(epoch, vec![Intent::SetResults(Vec::new())])? {
                    tracing::debug!("Job {} accepted after being superseded; ignoring", job);
                    return Err(OrchestratorError::Superseded);
                }
                if !self.poller.start(job.clone(), epoch) {
                    tracing::debug!("Job {} lost the race to a newer submission; ignoring", job);
                    return Err(OrchestratorError::Superseded);
                }
                tracing::info!("Counterfactual job {} accepted", job);
                Ok(job)
            }
            Err(e) => {
                tracing::error!("Counterfactual submission failed: {}", e);
                let failed = Intent::SetStatus(
                    StatusPatch::status(CounterfactualStatus::Failed).with_error(e.to_string()),
                );
                if !self.store.dispatch_in_epoch(epoch, vec![failed])? {
                    return Err(OrchestratorError::Superseded);
                }
                Err(OrchestratorError::SubmissionFailed(e))
            }
        }
    }

    /// Stop polling and invalidate in-flight work
    pub fn shutdown(&self) {
        self.poller.cancel();
        self.store.advance_epoch();
    }

    /// Whether a poll loop is running
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.poller.is_active()
    }

    /// Job currently being polled
    #[must_use]
    pub fn active_job(&self) -> Option<CounterfactualId> {
        self.poller.active_job()
    }

    /// Execution this orchestrator submits for
    #[inline]
    #[must_use]
    pub fn execution(&self) -> &ExecutionId {
        &self.execution
    }

    /// Shared state store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<AnalysisStore> {
        &self.store
    }
}

impl Drop for CounterfactualOrchestrator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
