//! Enablement policy
//!
//! Whether a search may be submitted is derived from goals and constraints
//! alone. The store caches the negation in `status.is_disabled` and
//! resynchronises it after every dispatch.

use cfa_model::AnalysisState;

/// Why submission is currently blocked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionBlocker {
    /// No constraint is free to vary with a usable domain
    NoSearchableConstraint,
    /// Varying number/string constraints still lack a domain
    IncompleteConstraints(Vec<String>),
    /// Every goal is `FIXED` or `UNSUPPORTED`
    NoTargetGoal,
}

impl std::fmt::Display for SubmissionBlocker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSearchableConstraint => f.write_str("select at least one input to vary"),
            Self::IncompleteConstraints(names) => {
                write!(f, "provide a domain for: {}", names.join(", "))
            }
            Self::NoTargetGoal => f.write_str("select at least one outcome as a target"),
        }
    }
}

/// Whether a search may be submitted for `state`
#[inline]
#[must_use]
pub fn submission_allowed(state: &AnalysisState) -> bool {
    blockers(state).is_empty()
}

/// Every reason submission is blocked, in display order
#[must_use]
pub fn blockers(state: &AnalysisState) -> Vec<SubmissionBlocker> {
    let mut blockers = Vec::new();

    if !state.search_constraints.iter().any(|c| c.is_searchable()) {
        blockers.push(SubmissionBlocker::NoSearchableConstraint);
    }

    let incomplete: Vec<String> = state
        .search_constraints
        .iter()
        .filter(|c| c.is_incomplete())
        .map(|c| c.name.clone())
        .collect();
    if !incomplete.is_empty() {
        blockers.push(SubmissionBlocker::IncompleteConstraints(incomplete));
    }

    if !state.goals.iter().any(|g| g.role.is_target()) {
        blockers.push(SubmissionBlocker::NoTargetGoal);
    }

    blockers
}
