//! State container for one analysis
//!
//! Owns the [`AnalysisState`] and funnels every mutation through
//! [`transition`]. Each dispatch runs under a single lock and:
//! 1. applies the intent
//! 2. resets a finished run when the query is edited
//! 3. resynchronises the cached `is_disabled` flag with the policy
//! 4. publishes the new state to subscribers
//!
//! Asynchronous writers (the poll loop) dispatch with an [`Epoch`]; writes
//! from a superseded epoch are dropped.

use crate::error::TransitionError;
use crate::intent::Intent;
use crate::policy;
use crate::transition::transition;
use cfa_model::{AnalysisState, CounterfactualStatus, StatusPatch};
use parking_lot::Mutex;
use tokio::sync::watch;

/// Generation of asynchronous work against the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(pub u64);

impl std::fmt::Display for Epoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "epoch-{}", self.0)
    }
}

#[derive(Debug)]
struct StoreInner {
    state: AnalysisState,
    epoch: u64,
}

/// Single-owner state container
#[derive(Debug)]
pub struct AnalysisStore {
    inner: Mutex<StoreInner>,
    publisher: watch::Sender<AnalysisState>,
}

impl AnalysisStore {
    /// Create store; the enablement cache is synchronised immediately
    #[must_use]
    pub fn new(state: AnalysisState) -> Self {
        let state = sync_enablement(state);
        let (publisher, _) = watch::channel(state.clone());
        Self {
            inner: Mutex::new(StoreInner { state, epoch: 0 }),
            publisher,
        }
    }

    /// Current state
    #[must_use]
    pub fn snapshot(&self) -> AnalysisState {
        self.inner.lock().state.clone()
    }

    /// Receive every published state
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AnalysisState> {
        self.publisher.subscribe()
    }

    /// Whether a search may be submitted now
    #[must_use]
    pub fn submission_allowed(&self) -> bool {
        policy::submission_allowed(&self.inner.lock().state)
    }

    /// Current epoch
    #[must_use]
    pub fn current_epoch(&self) -> Epoch {
        Epoch(self.inner.lock().epoch)
    }

    /// Start a new epoch, invalidating every write keyed to older ones
    pub fn advance_epoch(&self) -> Epoch {
        let mut inner = self.inner.lock();
        inner.epoch += 1;
        tracing::debug!("Advanced analysis store to epoch {}", inner.epoch);
        Epoch(inner.epoch)
    }

    /// Apply a synchronous intent
    ///
    /// # Errors
    /// Propagates [`TransitionError`]; the state is left untouched.
    pub fn dispatch(&self, intent: Intent) -> Result<(), TransitionError> {
        let mut inner = self.inner.lock();
        self.apply(&mut inner, vec![intent])
    }

    /// Apply intents atomically if `epoch` is still current.
    ///
    /// Returns `Ok(false)` and changes nothing when the epoch was superseded.
    ///
    /// # Errors
    /// Propagates [`TransitionError`]; the state is left untouched.
    pub fn dispatch_in_epoch(
        &self,
        epoch: Epoch,
        intents: Vec<Intent>,
    ) -> Result<bool, TransitionError> {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch.0 {
            tracing::debug!(
                "Dropping {} intent(s) from stale {} (current epoch-{})",
                intents.len(),
                epoch,
                inner.epoch
            );
            return Ok(false);
        }
        self.apply(&mut inner, intents)?;
        Ok(true)
    }

    /// Start a fresh epoch and apply intents in it, atomically
    ///
    /// # Errors
    /// Propagates [`TransitionError`]; the epoch still advances.
    pub fn begin_epoch_with(&self, intents: Vec<Intent>) -> Result<Epoch, TransitionError> {
        let mut inner = self.inner.lock();
        inner.epoch += 1;
        let epoch = Epoch(inner.epoch);
        tracing::debug!("Advanced analysis store to {}", epoch);
        self.apply(&mut inner, intents)?;
        Ok(epoch)
    }

    /// Replace the whole state (re-initialisation for another execution).
    ///
    /// Advances the epoch so in-flight work for the previous execution
    /// cannot write into the new one.
    pub fn reset(&self, state: AnalysisState) -> Epoch {
        let state = sync_enablement(state);
        let mut inner = self.inner.lock();
        inner.epoch += 1;
        inner.state = state.clone();
        self.publisher.send_replace(state);
        Epoch(inner.epoch)
    }

    fn apply(&self, inner: &mut StoreInner, intents: Vec<Intent>) -> Result<(), TransitionError> {
        let mut state = inner.state.clone();

        for intent in intents {
            tracing::trace!("Applying {}", intent.kind());
            let resets_run = intent.is_query_edit() && state.status.execution_status.is_terminal();
            state = transition(state, intent)?;

            if resets_run {
                tracing::debug!("Query edited after a finished run; clearing results");
                state = transition(state, Intent::SetResults(Vec::new()))?;
                state = transition(
                    state,
                    Intent::SetStatus(
                        StatusPatch::status(CounterfactualStatus::NotStarted)
                            .clear_error()
                            .clear_execution_time(),
                    ),
                )?;
            }
        }

        let state = sync_enablement(state);
        inner.state = state.clone();
        self.publisher.send_replace(state);
        Ok(())
    }
}

/// Resynchronise the cached flag when it disagrees with the policy
fn sync_enablement(state: AnalysisState) -> AnalysisState {
    let allowed = policy::submission_allowed(&state);
    if state.status.is_disabled != allowed {
        return state;
    }
    let patch = StatusPatch::new().with_disabled(!allowed);
    // SET_STATUS cannot fail
    match transition(state.clone(), Intent::SetStatus(patch)) {
        Ok(next) => next,
        Err(_) => state,
    }
}
