//! The transition function
//!
//! `transition(state, intent)` is the only way goals, constraints, results
//! and status change. It is pure: no I/O, no clock, no randomness.

use crate::error::{programming_error, TransitionError};
use crate::intent::Intent;
use cfa_model::{AnalysisState, ConstraintId, Goal, GoalRole, SearchConstraint};
use std::collections::HashSet;

/// Apply one intent to `state`.
///
/// # Errors
/// - `UnknownConstraint` if a constraint intent names an id not in `state`
/// - `DuplicateGoal` if `SET_GOALS` carries the same goal id twice
///
/// Errors leave no partial update behind (the input state is consumed and
/// only the `Ok` value is meant to be kept).
pub fn transition(mut state: AnalysisState, intent: Intent) -> Result<AnalysisState, TransitionError> {
    match intent {
        Intent::SetGoals(goals) => {
            let mut seen = HashSet::with_capacity(goals.len());
            for goal in &goals {
                if !seen.insert(&goal.id) {
                    return Err(programming_error(TransitionError::DuplicateGoal(goal.id.clone())));
                }
            }
            state.goals = goals.into_iter().map(normalize_role).collect();
        }
        Intent::ToggleConstraint(id) => {
            let constraint = constraint_mut(&mut state, id)?;
            if !constraint.is_unsupported {
                constraint.is_fixed = !constraint.is_fixed;
            }
        }
        Intent::ToggleAllConstraints(selected) => {
            for constraint in state.search_constraints.iter_mut().filter(|c| !c.is_unsupported) {
                constraint.is_fixed = !selected;
            }
        }
        Intent::SetConstraintDomain { id, domain } => {
            constraint_mut(&mut state, id)?.domain = Some(domain);
        }
        Intent::SetStatus(patch) => state.status.merge(patch),
        Intent::SetResults(results) => state.results = results,
    }

    Ok(state)
}

/// Re-classify goals whose value was reset to the original.
///
/// `ORIGINAL`/`FIXED` goals with `value == original_value` become `FIXED`.
/// `FLOATING` and `UNSUPPORTED` are explicit choices and are kept, except
/// that a structured goal is always `UNSUPPORTED`.
fn normalize_role(mut goal: Goal) -> Goal {
    if !goal.type_ref.is_supported() {
        goal.role = GoalRole::Unsupported;
    } else if matches!(goal.role, GoalRole::Original | GoalRole::Fixed) && goal.is_unchanged() {
        goal.role = GoalRole::Fixed;
    }
    goal
}

fn constraint_mut(
    state: &mut AnalysisState,
    id: ConstraintId,
) -> Result<&mut SearchConstraint, TransitionError> {
    state
        .search_constraints
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| programming_error(TransitionError::UnknownConstraint(id)))
}
