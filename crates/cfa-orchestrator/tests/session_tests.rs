use cfa_model::{CounterfactualStatus, GoalRole, Observation};
use cfa_orchestrator::{AnalysisSession, CfaConfig, ExecutionId, OrchestratorError};
use cfa_reducer::Intent;
use cfa_test_utils::fixtures::poll_response;
use cfa_test_utils::ScriptedApi;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;

fn outcomes() -> Vec<Observation> {
    vec![Observation::new("Approved", json!(false)).with_id("o-approved")]
}

fn inputs() -> Vec<Observation> {
    vec![
        Observation::new("Score", json!(620)),
        Observation::new("Employed", json!(false)),
        Observation::new("Profile", json!({"age": 41})),
    ]
}

#[tokio::test(start_paused = true)]
async fn test_fixed_goal_blocks_until_floating() {
    let api = ScriptedApi::new();
    api.accept("cf-1")
        .script_polls("cf-1", [Ok(poll_response("s1", "FINAL"))]);
    let session = AnalysisSession::open(
        api.clone(),
        CfaConfig::new(),
        ExecutionId::new("exec-1"),
        &outcomes(),
        &inputs(),
    );

    // Pin the only outcome to its desired value
    let mut goals = session.snapshot().goals;
    goals[0] = goals[0].clone().with_value(true).with_role(GoalRole::Fixed);
    session.dispatch(Intent::SetGoals(goals)).unwrap();

    let score = session.snapshot().search_constraints[0].id;
    let mut editor = session.range_editor(score).unwrap();
    editor.set_lower(Some(500.0));
    editor.set_upper(Some(850.0));
    session.commit_range(score, &editor).unwrap();
    session.dispatch(Intent::ToggleConstraint(score)).unwrap();

    assert!(session.snapshot().status.is_disabled);
    let err = session.submit().await.unwrap_err();
    assert!(err.is_user_fixable());
    assert!(api.submitted().is_empty());

    let mut goals = session.snapshot().goals;
    goals[0].role = GoalRole::Floating;
    session.dispatch(Intent::SetGoals(goals)).unwrap();
    assert!(!session.snapshot().status.is_disabled);

    session.submit().await.unwrap();
    let (execution, request) = api.submitted().remove(0);
    assert_eq!(execution.as_str(), "exec-1");
    // FLOATING goals are not transmitted
    assert!(request.goals.is_empty());
    assert_eq!(request.search_domains.len(), 3);

    tokio::time::sleep(Duration::from_millis(3100)).await;
    assert_eq!(
        session.snapshot().status.execution_status,
        CounterfactualStatus::Completed
    );
}

#[tokio::test(start_paused = true)]
async fn test_toggle_all_skips_structured_input() {
    let session = AnalysisSession::open(
        ScriptedApi::new(),
        CfaConfig::new(),
        ExecutionId::new("exec-1"),
        &outcomes(),
        &inputs(),
    );

    session.dispatch(Intent::ToggleAllConstraints(true)).unwrap();
    let state = session.snapshot();
    assert!(!state.search_constraints[0].is_fixed);
    assert!(!state.search_constraints[1].is_fixed);
    assert!(state.search_constraints[2].is_fixed);

    // Score varies without a domain
    let err = session.submit().await.unwrap_err();
    match err {
        OrchestratorError::SubmissionNotAllowed(reasons) => {
            assert!(reasons.iter().any(|r| r.contains("Score")));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_switch_execution_drops_late_results() {
    let api = ScriptedApi::new();
    api.accept("cf-1");
    let gate = api.gate_polls("cf-1");
    api.script_polls("cf-1", [Ok(poll_response("late", "FINAL"))]);

    let mut session = AnalysisSession::open(
        api.clone(),
        CfaConfig::new(),
        ExecutionId::new("exec-1"),
        &outcomes(),
        &inputs(),
    );
    let employed = session.snapshot().search_constraints[1].id;
    session.dispatch(Intent::ToggleConstraint(employed)).unwrap();
    session.submit().await.unwrap();

    tokio::time::sleep(Duration::from_millis(3100)).await;
    assert_eq!(api.poll_count(), 1);

    session.switch_execution(ExecutionId::new("exec-2"), &outcomes(), &[]);
    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(10_000)).await;

    let state = session.snapshot();
    assert!(state.results.is_empty());
    assert_eq!(state.status.execution_status, CounterfactualStatus::NotStarted);
    assert!(!session.orchestrator().is_polling());
    assert_eq!(api.poll_count(), 1);
}
