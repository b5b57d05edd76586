//! Scripted [`CounterfactualApi`] double
//!
//! Submissions pop queued replies; polls pop per-job scripts and fall back to
//! an empty, non-final reply once a script runs out. A job can be gated so
//! its polls block until the test releases them.

use async_trait::async_trait;
use cfa_orchestrator::{
    ApiError, CounterfactualApi, CounterfactualId, ExecutionId, PollResponse, SubmitRequest,
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Default)]
struct Script {
    submits: VecDeque<Result<CounterfactualId, ApiError>>,
    polls: HashMap<CounterfactualId, VecDeque<Result<PollResponse, ApiError>>>,
    poll_counts: HashMap<CounterfactualId, usize>,
    poll_gates: HashMap<CounterfactualId, Arc<Notify>>,
    submit_gate: Option<Arc<Notify>>,
    submitted: Vec<(ExecutionId, SubmitRequest)>,
}

#[derive(Default)]
pub struct ScriptedApi {
    script: Mutex<Script>,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a successful submission
    pub fn accept(&self, job: &str) -> &Self {
        self.script
            .lock()
            .submits
            .push_back(Ok(CounterfactualId::new(job)));
        self
    }

    /// Queue a failed submission
    pub fn reject(&self, error: ApiError) -> &Self {
        self.script.lock().submits.push_back(Err(error));
        self
    }

    /// Queue poll replies for `job`
    pub fn script_polls<I>(&self, job: &str, replies: I) -> &Self
    where
        I: IntoIterator<Item = Result<PollResponse, ApiError>>,
    {
        self.script
            .lock()
            .polls
            .entry(CounterfactualId::new(job))
            .or_default()
            .extend(replies);
        self
    }

    /// Block polls of `job` until the returned handle is notified (once per poll)
    pub fn gate_polls(&self, job: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.script
            .lock()
            .poll_gates
            .insert(CounterfactualId::new(job), Arc::clone(&gate));
        gate
    }

    /// Block submissions until the returned handle is notified (once per submit)
    pub fn gate_submits(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.script.lock().submit_gate = Some(Arc::clone(&gate));
        gate
    }

    /// Total polls across jobs
    pub fn poll_count(&self) -> usize {
        self.script.lock().poll_counts.values().sum()
    }

    /// Polls of one job
    pub fn poll_count_for(&self, job: &str) -> usize {
        self.script
            .lock()
            .poll_counts
            .get(&CounterfactualId::new(job))
            .copied()
            .unwrap_or(0)
    }

    /// Every request received, in order
    pub fn submitted(&self) -> Vec<(ExecutionId, SubmitRequest)> {
        self.script.lock().submitted.clone()
    }
}

#[async_trait]
impl CounterfactualApi for ScriptedApi {
    async fn submit(
        &self,
        execution: &ExecutionId,
        request: &SubmitRequest,
    ) -> Result<CounterfactualId, ApiError> {
        let gate = {
            let mut script = self.script.lock();
            script.submitted.push((execution.clone(), request.clone()));
            script.submit_gate.clone()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.script
            .lock()
            .submits
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transport("no scripted submission".into())))
    }

    async fn poll(
        &self,
        _execution: &ExecutionId,
        job: &CounterfactualId,
    ) -> Result<PollResponse, ApiError> {
        let (reply, gate) = {
            let mut script = self.script.lock();
            *script.poll_counts.entry(job.clone()).or_default() += 1;
            let reply = script
                .polls
                .get_mut(job)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| Ok(PollResponse::default()));
            (reply, script.poll_gates.get(job).cloned())
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        reply
    }
}
