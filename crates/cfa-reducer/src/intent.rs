//! Intents accepted by the transition function

use crate::error::{programming_error, TransitionError};
use cfa_model::{ConstraintId, Domain, Goal, ResultSet, StatusPatch};
use serde::{Deserialize, Serialize};

/// Closed set of state mutations.
///
/// Consumers outside Rust send these as
/// `{"type": "TOGGLE_CONSTRAINT", "payload": "<constraint id>"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    /// Replace the goal list (goal-selection dialog confirmed)
    SetGoals(Vec<Goal>),
    /// Flip `is_fixed` on one constraint
    ToggleConstraint(ConstraintId),
    /// `is_fixed = !selected` on every constraint
    ToggleAllConstraints(bool),
    /// Attach an already validated domain
    SetConstraintDomain {
        /// Target constraint
        id: ConstraintId,
        /// Domain to attach
        domain: Domain,
    },
    /// Merge into the status block
    SetStatus(StatusPatch),
    /// Replace the result list
    SetResults(Vec<ResultSet>),
}

impl Intent {
    /// Decode an intent dispatched by the rendering layer
    ///
    /// # Errors
    /// `UnrecognizedIntent` if the tag or payload does not match any intent.
    pub fn from_json(raw: &str) -> Result<Self, TransitionError> {
        serde_json::from_str(raw)
            .map_err(|e| programming_error(TransitionError::UnrecognizedIntent(e.to_string())))
    }

    /// Whether the intent edits the query (goals or constraints)
    #[inline]
    #[must_use]
    pub fn is_query_edit(&self) -> bool {
        matches!(
            self,
            Intent::SetGoals(_)
                | Intent::ToggleConstraint(_)
                | Intent::ToggleAllConstraints(_)
                | Intent::SetConstraintDomain { .. }
        )
    }

    /// Wire tag, for logging
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Intent::SetGoals(_) => "SET_GOALS",
            Intent::ToggleConstraint(_) => "TOGGLE_CONSTRAINT",
            Intent::ToggleAllConstraints(_) => "TOGGLE_ALL_CONSTRAINTS",
            Intent::SetConstraintDomain { .. } => "SET_CONSTRAINT_DOMAIN",
            Intent::SetStatus(_) => "SET_STATUS",
            Intent::SetResults(_) => "SET_RESULTS",
        }
    }
}
