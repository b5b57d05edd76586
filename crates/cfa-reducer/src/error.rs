//! Error types for the transition function

use cfa_model::{ConstraintId, GoalId};

/// Transition failures.
///
/// Every variant signals a client defect (an intent the reducer cannot
/// interpret), never a user-recoverable condition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// Intent tag or payload not recognized
    #[error("unrecognized intent: {0}")]
    UnrecognizedIntent(String),

    /// Intent names a constraint that does not exist
    #[error("unknown search constraint: {0}")]
    UnknownConstraint(ConstraintId),

    /// Goal list contains the same id twice
    #[error("duplicate goal id: {0}")]
    DuplicateGoal(GoalId),
}

/// Surface a programming error.
///
/// Panics under the `strict-debug` feature; otherwise hands the error back
/// so callers can report it.
pub(crate) fn programming_error(error: TransitionError) -> TransitionError {
    tracing::error!("Rejected intent: {}", error);

    #[cfg(feature = "strict-debug")]
    panic!("Illegal intent: {error}");

    #[allow(unreachable_code)]
    error
}
