//! Decision-analysis service contract
//!
//! [`CounterfactualApi`] is the seam between the orchestrator and the remote
//! search; [`crate::http::HttpCounterfactualApi`] is the production client and
//! tests substitute scripted implementations.

use crate::error::ApiError;
use async_trait::async_trait;
use cfa_model::{AnalysisState, Domain, FieldValue, GoalId, ResultSet, TypeRef};
use serde::{Deserialize, Serialize};

/// Decision execution the analysis explains
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(pub String);

impl ExecutionId {
    /// Create execution ID
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as str
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remote search job handle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CounterfactualId(pub String);

impl CounterfactualId {
    /// Create job ID
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as str
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CounterfactualId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Goal as transmitted (role stripped)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireGoal {
    /// Outcome id
    pub id: GoalId,
    /// Outcome name
    pub name: String,
    /// Value kind
    pub type_ref: TypeRef,
    /// Desired value
    pub value: FieldValue,
    /// Observed value
    pub original_value: FieldValue,
}

/// Search constraint as transmitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSearchDomain {
    /// Input name
    pub name: String,
    /// Value kind
    pub type_ref: TypeRef,
    /// Observed value
    pub value: FieldValue,
    /// Excluded from the search space
    pub fixed: bool,
    /// Permitted values when varying
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,
}

/// Body of a job submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    /// Goals to reach or hold
    pub goals: Vec<WireGoal>,
    /// Every input, varying or not
    pub search_domains: Vec<WireSearchDomain>,
}

impl SubmitRequest {
    /// Build the request for the current query.
    ///
    /// Only `FIXED` and `ORIGINAL` goals are sent; every constraint is sent.
    #[must_use]
    pub fn from_state(state: &AnalysisState) -> Self {
        let goals = state
            .goals
            .iter()
            .filter(|g| g.role.is_transmitted())
            .map(|g| WireGoal {
                id: g.id.clone(),
                name: g.name.clone(),
                type_ref: g.type_ref,
                value: g.value.clone(),
                original_value: g.original_value.clone(),
            })
            .collect();

        let search_domains = state
            .search_constraints
            .iter()
            .map(|c| WireSearchDomain {
                name: c.name.clone(),
                type_ref: c.type_ref,
                value: c.value.clone(),
                fixed: c.is_fixed,
                domain: c.domain.clone(),
            })
            .collect();

        Self {
            goals,
            search_domains,
        }
    }
}

/// Reply to a job submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    /// Job handle for polling
    pub counterfactual_id: CounterfactualId,
}

/// Reply to a poll
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    /// Latest solutions, replacing any earlier ones
    #[serde(default)]
    pub solutions: Vec<ResultSet>,
}

impl PollResponse {
    /// Create from solutions
    #[inline]
    #[must_use]
    pub fn new(solutions: Vec<ResultSet>) -> Self {
        Self { solutions }
    }

    /// Whether a `FINAL` solution is present
    #[inline]
    #[must_use]
    pub fn is_final(&self) -> bool {
        ResultSet::contains_final(&self.solutions)
    }
}

/// Remote counterfactual search service
#[async_trait]
pub trait CounterfactualApi: Send + Sync {
    /// Create a search job
    async fn submit(
        &self,
        execution: &ExecutionId,
        request: &SubmitRequest,
    ) -> Result<CounterfactualId, ApiError>;

    /// Fetch the latest solutions of a job
    async fn poll(
        &self,
        execution: &ExecutionId,
        job: &CounterfactualId,
    ) -> Result<PollResponse, ApiError>;
}
