//! Analysis session
//!
//! Bundles the store, the orchestrator and the editor configuration for the
//! execution currently under analysis. Switching execution tears the old
//! orchestrator down before the store is re-initialised.

use crate::api::{CounterfactualApi, CounterfactualId, ExecutionId};
use crate::config::CfaConfig;
use crate::error::{CommitError, OrchestratorError};
use crate::orchestrator::CounterfactualOrchestrator;
use cfa_model::{AnalysisState, CategoryEditor, ConstraintId, Observation, RangeEditor};
use cfa_reducer::{AnalysisStore, Intent, TransitionError};
use std::sync::Arc;
use tokio::sync::watch;

/// One execution's counterfactual analysis
pub struct AnalysisSession {
    api: Arc<dyn CounterfactualApi>,
    config: CfaConfig,
    store: Arc<AnalysisStore>,
    orchestrator: CounterfactualOrchestrator,
}

impl std::fmt::Debug for AnalysisSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisSession")
            .field("config", &self.config)
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

impl AnalysisSession {
    /// Open a session seeded from an execution's outcomes and inputs
    #[must_use]
    pub fn open(
        api: Arc<dyn CounterfactualApi>,
        config: CfaConfig,
        execution: ExecutionId,
        outcomes: &[Observation],
        inputs: &[Observation],
    ) -> Self {
        Self::with_state(api, config, execution, AnalysisState::from_execution(outcomes, inputs))
    }

    /// Open a session over a prepared state
    #[must_use]
    pub fn with_state(
        api: Arc<dyn CounterfactualApi>,
        config: CfaConfig,
        execution: ExecutionId,
        state: AnalysisState,
    ) -> Self {
        let store = Arc::new(AnalysisStore::new(state));
        let orchestrator =
            CounterfactualOrchestrator::new(Arc::clone(&api), Arc::clone(&store), execution, &config);
        tracing::debug!("Opened analysis session for execution {}", orchestrator.execution());
        Self {
            api,
            config,
            store,
            orchestrator,
        }
    }

    /// Shared state store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<AnalysisStore> {
        &self.store
    }

    /// Current state
    #[must_use]
    pub fn snapshot(&self) -> AnalysisState {
        self.store.snapshot()
    }

    /// Observe state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AnalysisState> {
        self.store.subscribe()
    }

    /// Apply a user intent
    ///
    /// # Errors
    /// Propagates [`TransitionError`].
    pub fn dispatch(&self, intent: Intent) -> Result<(), TransitionError> {
        self.store.dispatch(intent)
    }

    /// Submit the current query
    ///
    /// # Errors
    /// See [`CounterfactualOrchestrator::submit`].
    pub async fn submit(&self) -> Result<CounterfactualId, OrchestratorError> {
        self.orchestrator.submit().await
    }

    /// Orchestrator for the current execution
    #[inline]
    #[must_use]
    pub fn orchestrator(&self) -> &CounterfactualOrchestrator {
        &self.orchestrator
    }

    /// Session configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CfaConfig {
        &self.config
    }

    /// Numeric editor seeded from the constraint's current domain
    #[must_use]
    pub fn range_editor(&self, id: ConstraintId) -> Option<RangeEditor> {
        self.store.snapshot().constraint(id).map(RangeEditor::for_constraint)
    }

    /// Categorical editor seeded from the constraint's current domain
    #[must_use]
    pub fn category_editor(&self, id: ConstraintId) -> Option<CategoryEditor> {
        let strictness = self.config.category_strictness;
        self.store
            .snapshot()
            .constraint(id)
            .map(|c| CategoryEditor::for_constraint(c, strictness))
    }

    /// Validate a numeric edit and write it to the constraint
    ///
    /// # Errors
    /// `Range` with the validator message, or `Transition` for an unknown id.
    pub fn commit_range(&self, id: ConstraintId, editor: &RangeEditor) -> Result<(), CommitError> {
        let domain = editor.commit()?;
        self.store.dispatch(Intent::SetConstraintDomain { id, domain })?;
        Ok(())
    }

    /// Validate a categorical edit and write it to the constraint
    ///
    /// # Errors
    /// `Category` when rejected, or `Transition` for an unknown id.
    pub fn commit_categories(
        &self,
        id: ConstraintId,
        editor: &CategoryEditor,
    ) -> Result<(), CommitError> {
        let domain = editor.commit()?;
        self.store.dispatch(Intent::SetConstraintDomain { id, domain })?;
        Ok(())
    }

    /// Re-initialise for another execution.
    ///
    /// Polling for the previous execution stops and its late responses are
    /// dropped.
    pub fn switch_execution(
        &mut self,
        execution: ExecutionId,
        outcomes: &[Observation],
        inputs: &[Observation],
    ) {
        tracing::info!(
            "Switching analysis from execution {} to {}",
            self.orchestrator.execution(),
            execution
        );
        self.orchestrator.shutdown();
        self.store.reset(AnalysisState::from_execution(outcomes, inputs));
        self.orchestrator = CounterfactualOrchestrator::new(
            Arc::clone(&self.api),
            Arc::clone(&self.store),
            execution,
            &self.config,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{PollResponse, SubmitRequest};
    use crate::error::ApiError;
    use async_trait::async_trait;
    use cfa_model::{CategoryEditError, CategoryStrictness, Domain, DomainValidationError};
    use serde_json::json;

    struct Unreachable;

    #[async_trait]
    impl CounterfactualApi for Unreachable {
        async fn submit(&self, _: &ExecutionId, _: &SubmitRequest) -> Result<CounterfactualId, ApiError> {
            Err(ApiError::Transport("offline".into()))
        }

        async fn poll(&self, _: &ExecutionId, _: &CounterfactualId) -> Result<PollResponse, ApiError> {
            Err(ApiError::Transport("offline".into()))
        }
    }

    fn session(config: CfaConfig) -> AnalysisSession {
        AnalysisSession::open(
            Arc::new(Unreachable),
            config,
            ExecutionId::new("exec-1"),
            &[Observation::new("Approved", json!(false)).with_id("o1")],
            &[
                Observation::new("Score", json!(620)),
                Observation::new("Region", json!("north")),
            ],
        )
    }

    #[test]
    fn commit_range_writes_domain() {
        let session = session(CfaConfig::new());
        let id = session.snapshot().search_constraints[0].id;

        let mut editor = session.range_editor(id).unwrap();
        editor.set_lower(Some(500.0));
        editor.set_upper(Some(800.0));
        session.commit_range(id, &editor).unwrap();

        assert_eq!(
            session.snapshot().constraint(id).unwrap().domain,
            Some(Domain::range(500.0, 800.0))
        );
    }

    #[test]
    fn commit_range_surfaces_validator_message() {
        let session = session(CfaConfig::new());
        let id = session.snapshot().search_constraints[0].id;

        let mut editor = session.range_editor(id).unwrap();
        editor.set_lower(Some(5.0));
        editor.set_upper(Some(5.0));
        let err = session.commit_range(id, &editor).unwrap_err();

        assert_eq!(err, CommitError::Range(DomainValidationError::BoundsEqual));
        assert!(session.snapshot().constraint(id).unwrap().domain.is_none());
    }

    #[test]
    fn category_editor_uses_configured_strictness() {
        let session = session(CfaConfig::new().with_category_strictness(CategoryStrictness::RejectEmpty));
        let id = session.snapshot().search_constraints[1].id;

        let mut editor = session.category_editor(id).unwrap();
        assert_eq!(editor.strictness(), CategoryStrictness::RejectEmpty);
        assert_eq!(editor.categories(), ["north".to_string()]);

        editor.push("");
        let err = session.commit_categories(id, &editor).unwrap_err();
        assert_eq!(err, CommitError::Category(CategoryEditError::EmptyCategory(1)));

        editor.update(1, "south").unwrap();
        session.commit_categories(id, &editor).unwrap();
        assert_eq!(
            session.snapshot().constraint(id).unwrap().domain,
            Some(Domain::categorical(["north", "south"]))
        );
    }

    #[tokio::test]
    async fn switch_execution_reinitialises_state() {
        let mut session = session(CfaConfig::new());
        let before = session.store().current_epoch();

        session.switch_execution(
            ExecutionId::new("exec-2"),
            &[Observation::new("Rate", json!(3.5)).with_id("o9")],
            &[],
        );

        let state = session.snapshot();
        assert_eq!(state.goals.len(), 1);
        assert_eq!(state.goals[0].id.as_str(), "o9");
        assert!(state.search_constraints.is_empty());
        assert_eq!(session.orchestrator().execution().as_str(), "exec-2");
        assert!(session.store().current_epoch() > before);
    }
}
