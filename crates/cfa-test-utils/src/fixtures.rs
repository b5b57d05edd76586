//! Canned analysis states and service replies

use cfa_model::{
    AnalysisState, Assignment, Domain, FieldValue, Goal, GoalRole, ResultSet, SearchConstraint,
    SolutionStage,
};
use cfa_orchestrator::PollResponse;
use serde_json::json;

/// A rejected loan application: two outcomes, four inputs (one structured),
/// nothing selected yet
pub fn loan_state() -> AnalysisState {
    AnalysisState::new(
        vec![Goal::new("o-approved", "Approved", false), Goal::new("o-rate", "Rate", 7.5)],
        vec![
            SearchConstraint::new("Score", 620.0),
            SearchConstraint::new("Employed", false),
            SearchConstraint::new("Region", "north"),
            SearchConstraint::new("Profile", FieldValue::Structured(json!({"age": 41}))),
        ],
    )
}

/// [`loan_state`] ready to submit: approval pinned to `true`, the rate left
/// as a target and the score varying over `[500, 850]`
pub fn ready_state() -> AnalysisState {
    let mut state = loan_state();
    state.goals[0] = state.goals[0].clone().with_value(true).with_role(GoalRole::Fixed);
    state.search_constraints[0] = state.search_constraints[0]
        .clone()
        .varying()
        .with_domain(Domain::range(500.0, 850.0));
    state
}

/// One valid solution at `stage`
pub fn solution(id: &str, stage: &str) -> ResultSet {
    ResultSet::new(id, SolutionStage::new(stage))
        .valid()
        .with_inputs(vec![Assignment::new("Score", json!(700))])
        .with_outputs(vec![Assignment::new("Approved", json!(true))])
}

/// Poll reply holding one solution at `stage`
pub fn poll_response(id: &str, stage: &str) -> PollResponse {
    PollResponse::new(vec![solution(id, stage)])
}
