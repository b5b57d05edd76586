use cfa_model::{CounterfactualStatus, Domain, StatusPatch};
use cfa_orchestrator::{
    ApiError, CfaConfig, CounterfactualId, CounterfactualOrchestrator, ExecutionId,
    OrchestratorError, ResultPoller,
};
use cfa_reducer::{AnalysisStore, Intent};
use cfa_test_utils::fixtures::{self, poll_response};
use cfa_test_utils::ScriptedApi;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

const TICK: Duration = Duration::from_millis(3000);

fn ready_store() -> Arc<AnalysisStore> {
    Arc::new(AnalysisStore::new(fixtures::ready_state()))
}

fn orchestrator(api: &Arc<ScriptedApi>, store: &Arc<AnalysisStore>) -> CounterfactualOrchestrator {
    CounterfactualOrchestrator::new(
        api.clone(),
        Arc::clone(store),
        ExecutionId::new("exec-1"),
        &CfaConfig::new(),
    )
}

/// Sleep past `ticks` poll ticks
async fn after_ticks(ticks: u32) {
    sleep(TICK * ticks + Duration::from_millis(100)).await;
}

#[tokio::test(start_paused = true)]
async fn test_polling_stops_after_final_result() {
    let api = ScriptedApi::new();
    api.accept("cf-1").script_polls(
        "cf-1",
        [
            Ok(poll_response("s1", "PARTIAL")),
            Ok(poll_response("s2", "PARTIAL")),
            Ok(poll_response("s3", "FINAL")),
        ],
    );
    let store = ready_store();
    let orchestrator = orchestrator(&api, &store);

    let job = orchestrator.submit().await.unwrap();
    assert_eq!(job, CounterfactualId::new("cf-1"));
    assert_eq!(store.snapshot().status.execution_status, CounterfactualStatus::Running);
    assert_eq!(api.poll_count(), 0);

    after_ticks(2).await;
    let state = store.snapshot();
    assert_eq!(api.poll_count(), 2);
    assert_eq!(state.status.execution_status, CounterfactualStatus::Running);
    assert_eq!(state.results[0].solution_id, "s2");

    sleep(TICK).await;
    let state = store.snapshot();
    assert_eq!(api.poll_count(), 3);
    assert_eq!(state.status.execution_status, CounterfactualStatus::Completed);
    assert!(state.status.last_execution_time.is_some());
    assert_eq!(state.results[0].solution_id, "s3");
    assert!(!orchestrator.is_polling());

    after_ticks(10).await;
    assert_eq!(api.poll_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_superseding_submission_drops_old_job() {
    let api = ScriptedApi::new();
    api.accept("cf-old").accept("cf-new");
    let old_gate = api.gate_polls("cf-old");
    api.script_polls("cf-old", [Ok(poll_response("old", "FINAL"))]);
    api.script_polls(
        "cf-new",
        [Ok(poll_response("new", "PARTIAL")), Ok(poll_response("new-final", "FINAL"))],
    );
    let store = ready_store();
    let orchestrator = orchestrator(&api, &store);

    orchestrator.submit().await.unwrap();
    after_ticks(1).await;
    assert_eq!(api.poll_count_for("cf-old"), 1);

    // Old poll is still in flight when the new job is submitted
    let job = orchestrator.submit().await.unwrap();
    assert_eq!(job.as_str(), "cf-new");
    old_gate.notify_one();

    after_ticks(2).await;
    let state = store.snapshot();
    assert_eq!(state.status.execution_status, CounterfactualStatus::Completed);
    assert_eq!(state.results.len(), 1);
    assert_eq!(state.results[0].solution_id, "new-final");
    assert_eq!(api.poll_count_for("cf-old"), 1);
    assert_eq!(api.poll_count_for("cf-new"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_response_for_stale_epoch_is_dropped() {
    let api = ScriptedApi::new();
    let gate = api.gate_polls("cf-1");
    api.script_polls("cf-1", [Ok(poll_response("late", "FINAL"))]);
    let store = ready_store();
    let poller = ResultPoller::new(api.clone(), Arc::clone(&store), ExecutionId::new("exec-1"), TICK);

    let epoch = store.advance_epoch();
    assert!(poller.start(CounterfactualId::new("cf-1"), epoch));
    after_ticks(1).await;
    assert_eq!(api.poll_count(), 1);
    assert!(poller.is_active());

    // Superseded without cancelling the task; only the epoch guards the store
    store.advance_epoch();
    gate.notify_one();
    sleep(Duration::from_millis(10)).await;

    let state = store.snapshot();
    assert!(state.results.is_empty());
    assert_eq!(state.status.execution_status, CounterfactualStatus::NotStarted);
    assert!(!poller.is_active());

    after_ticks(5).await;
    assert_eq!(api.poll_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_submit_refused_when_policy_blocks() {
    let api = ScriptedApi::new();
    api.accept("cf-1");
    let store = Arc::new(AnalysisStore::new(fixtures::loan_state()));
    let orchestrator = orchestrator(&api, &store);

    let err = orchestrator.submit().await.unwrap_err();
    assert!(matches!(err, OrchestratorError::SubmissionNotAllowed(ref reasons) if !reasons.is_empty()));
    assert!(api.submitted().is_empty());
    assert_eq!(store.snapshot().status.execution_status, CounterfactualStatus::NotStarted);
}

#[tokio::test(start_paused = true)]
async fn test_submit_failure_keeps_last_results() {
    let api = ScriptedApi::new();
    api.reject(ApiError::Status {
        status: 500,
        body: "search backend down".into(),
    });
    let store = ready_store();
    store
        .dispatch(Intent::SetResults(vec![fixtures::solution("s0", "FINAL")]))
        .unwrap();
    store
        .dispatch(Intent::SetStatus(StatusPatch::status(CounterfactualStatus::Completed)))
        .unwrap();
    let orchestrator = orchestrator(&api, &store);

    let err = orchestrator.submit().await.unwrap_err();
    assert!(matches!(err, OrchestratorError::SubmissionFailed(ApiError::Status { status: 500, .. })));

    let state = store.snapshot();
    assert_eq!(state.status.execution_status, CounterfactualStatus::Failed);
    assert!(state.status.error.as_deref().unwrap_or_default().contains("search backend down"));
    assert_eq!(state.results[0].solution_id, "s0");
    assert!(!orchestrator.is_polling());
    assert_eq!(api.submitted().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_poll_failure_stops_loop() {
    let api = ScriptedApi::new();
    api.accept("cf-1").script_polls(
        "cf-1",
        [
            Ok(poll_response("s1", "PARTIAL")),
            Err(ApiError::Transport("connection reset".into())),
        ],
    );
    let store = ready_store();
    let orchestrator = orchestrator(&api, &store);

    orchestrator.submit().await.unwrap();
    after_ticks(2).await;

    let state = store.snapshot();
    assert_eq!(state.status.execution_status, CounterfactualStatus::Failed);
    assert!(state.status.error.as_deref().unwrap_or_default().contains("connection reset"));
    assert_eq!(state.results[0].solution_id, "s1");
    assert!(!orchestrator.is_polling());

    after_ticks(5).await;
    assert_eq!(api.poll_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_stops_fetches() {
    let api = ScriptedApi::new();
    api.accept("cf-1");
    let store = ready_store();
    let orchestrator = orchestrator(&api, &store);

    orchestrator.submit().await.unwrap();
    after_ticks(1).await;
    assert_eq!(api.poll_count(), 1);
    assert_eq!(orchestrator.active_job(), Some(CounterfactualId::new("cf-1")));

    drop(orchestrator);
    after_ticks(10).await;
    assert_eq!(api.poll_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_submission_superseded_in_flight() {
    let api = ScriptedApi::new();
    api.accept("cf-1");
    let gate = api.gate_submits();
    let store = ready_store();
    let orchestrator = Arc::new(orchestrator(&api, &store));

    let pending = tokio::spawn({
        let orchestrator = Arc::clone(&orchestrator);
        async move { orchestrator.submit().await }
    });
    sleep(Duration::from_millis(10)).await;
    assert_eq!(api.submitted().len(), 1);

    orchestrator.shutdown();
    gate.notify_one();

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, OrchestratorError::Superseded));
    assert!(!orchestrator.is_polling());

    after_ticks(3).await;
    assert_eq!(api.poll_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_resubmit_after_completion_clears_results_on_accept() {
    let api = ScriptedApi::new();
    api.accept("cf-1").accept("cf-2");
    api.script_polls("cf-1", [Ok(poll_response("first", "FINAL"))]);
    let store = ready_store();
    let orchestrator = orchestrator(&api, &store);

    orchestrator.submit().await.unwrap();
    after_ticks(1).await;
    assert_eq!(store.snapshot().status.execution_status, CounterfactualStatus::Completed);

    orchestrator.submit().await.unwrap();
    let state = store.snapshot();
    assert_eq!(state.status.execution_status, CounterfactualStatus::Running);
    assert!(state.results.is_empty());
    assert!(state.status.last_execution_time.is_none());
    assert!(orchestrator.is_polling());
}

#[tokio::test(start_paused = true)]
async fn test_late_start_for_older_epoch_keeps_newer_loop() {
    let api = ScriptedApi::new();
    let store = ready_store();
    let poller = ResultPoller::new(api.clone(), Arc::clone(&store), ExecutionId::new("exec-1"), TICK);

    let older = store.advance_epoch();
    let newer = store.advance_epoch();
    assert!(poller.start(CounterfactualId::new("cf-new"), newer));
    // The older submission reaches the poller after the newer one
    assert!(!poller.start(CounterfactualId::new("cf-old"), older));
    assert_eq!(poller.active_job(), Some(CounterfactualId::new("cf-new")));

    after_ticks(1).await;
    assert_eq!(api.poll_count_for("cf-new"), 1);
    assert_eq!(api.poll_count_for("cf-old"), 0);
    assert!(poller.is_active());
}

#[tokio::test(start_paused = true)]
async fn test_start_for_stale_epoch_is_refused() {
    let api = ScriptedApi::new();
    let store = ready_store();
    let poller = ResultPoller::new(api.clone(), Arc::clone(&store), ExecutionId::new("exec-1"), TICK);

    let stale = store.advance_epoch();
    store.advance_epoch();
    assert!(!poller.start(CounterfactualId::new("cf-1"), stale));
    assert!(!poller.is_active());

    after_ticks(2).await;
    assert_eq!(api.poll_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_edit_during_inflight_poll_survives_results() {
    let api = ScriptedApi::new();
    api.accept("cf-1");
    let gate = api.gate_polls("cf-1");
    api.script_polls("cf-1", [Ok(poll_response("s1", "PARTIAL"))]);
    let store = ready_store();
    let orchestrator = orchestrator(&api, &store);

    orchestrator.submit().await.unwrap();
    after_ticks(1).await;
    assert_eq!(api.poll_count(), 1);

    // The first poll is blocked inside the service while the user edits
    let snapshot = store.snapshot();
    let score = snapshot.search_constraints[0].id;
    let employed = snapshot.search_constraints[1].id;
    store
        .dispatch(Intent::SetConstraintDomain {
            id: score,
            domain: Domain::range(600.0, 700.0),
        })
        .unwrap();
    store.dispatch(Intent::ToggleConstraint(employed)).unwrap();

    gate.notify_one();
    sleep(Duration::from_millis(10)).await;

    let state = store.snapshot();
    assert_eq!(state.search_constraints[0].domain, Some(Domain::range(600.0, 700.0)));
    assert!(!state.search_constraints[1].is_fixed);
    assert_eq!(state.results.len(), 1);
    assert_eq!(state.results[0].solution_id, "s1");
    assert_eq!(state.status.execution_status, CounterfactualStatus::Running);
    assert!(orchestrator.is_polling());
}
