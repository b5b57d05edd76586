//! Result sets returned by the remote counterfactual search

use serde::{Deserialize, Serialize};

/// Stage tag of a result set.
///
/// The service reports intermediate stages under several names; only
/// [`SolutionStage::FINAL`] carries meaning on the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolutionStage(pub String);

impl SolutionStage {
    /// Sentinel marking the terminating result set
    pub const FINAL: &'static str = "FINAL";

    /// Stage from its wire name
    #[inline]
    #[must_use]
    pub fn new(stage: impl Into<String>) -> Self {
        Self(stage.into())
    }

    /// The final stage
    #[inline]
    #[must_use]
    pub fn final_stage() -> Self {
        Self::new(Self::FINAL)
    }

    /// Whether this is the terminating stage
    #[inline]
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.0 == Self::FINAL
    }
}

impl Default for SolutionStage {
    fn default() -> Self {
        Self::new("INTERMEDIATE")
    }
}

impl std::fmt::Display for SolutionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One named value inside a candidate solution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// Input or outcome name
    pub name: String,
    /// Kind as reported by the service (free-form)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_ref: Option<String>,
    /// Assigned value
    #[serde(default)]
    pub value: serde_json::Value,
}

impl Assignment {
    /// Create assignment
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            type_ref: None,
            value,
        }
    }
}

/// One batch of candidate assignments tagged with a stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    /// Service-assigned solution id
    #[serde(default)]
    pub solution_id: String,
    /// Stage tag
    #[serde(default)]
    pub stage: SolutionStage,
    /// Whether the candidate satisfies every goal
    #[serde(default)]
    pub is_valid: bool,
    /// Candidate input assignment
    #[serde(default)]
    pub inputs: Vec<Assignment>,
    /// Outcomes produced by the candidate inputs
    #[serde(default)]
    pub outputs: Vec<Assignment>,
}

impl ResultSet {
    /// Create an empty result set
    #[must_use]
    pub fn new(solution_id: impl Into<String>, stage: SolutionStage) -> Self {
        Self {
            solution_id: solution_id.into(),
            stage,
            is_valid: false,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Mark valid
    #[inline]
    #[must_use]
    pub fn valid(mut self) -> Self {
        self.is_valid = true;
        self
    }

    /// With candidate inputs
    #[inline]
    #[must_use]
    pub fn with_inputs(mut self, inputs: Vec<Assignment>) -> Self {
        self.inputs = inputs;
        self
    }

    /// With resulting outputs
    #[inline]
    #[must_use]
    pub fn with_outputs(mut self, outputs: Vec<Assignment>) -> Self {
        self.outputs = outputs;
        self
    }

    /// Whether this is the terminating result set
    #[inline]
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.stage.is_final()
    }

    /// Whether any result set in `sets` is final
    #[must_use]
    pub fn contains_final(sets: &[ResultSet]) -> bool {
        sets.iter().any(ResultSet::is_final)
    }
}
