//! Aggregate state of one counterfactual analysis

use crate::results::ResultSet;
use crate::status::ExecutionStatus;
use crate::types::{ConstraintId, FieldValue, Goal, GoalId, SearchConstraint};
use serde::{Deserialize, Serialize};

/// An outcome or input observed on the analysed execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Outcome id; inputs usually have none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Outcome or input name
    pub name: String,
    /// Observed value
    pub value: serde_json::Value,
}

impl Observation {
    /// Create observation without id
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            id: None,
            name: name.into(),
            value,
        }
    }

    /// With outcome id
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Goals, constraints, results and status of one analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisState {
    /// Desired outcomes
    #[serde(default)]
    pub goals: Vec<Goal>,
    /// Inputs the search may vary
    #[serde(default)]
    pub search_constraints: Vec<SearchConstraint>,
    /// Latest result sets from the service
    #[serde(default)]
    pub results: Vec<ResultSet>,
    /// Search status
    #[serde(default)]
    pub status: ExecutionStatus,
}

impl AnalysisState {
    /// Create state from explicit goals and constraints
    #[must_use]
    pub fn new(goals: Vec<Goal>, search_constraints: Vec<SearchConstraint>) -> Self {
        Self {
            goals,
            search_constraints,
            results: Vec::new(),
            status: ExecutionStatus::default(),
        }
    }

    /// Default state for a viewed execution.
    ///
    /// Outcomes become `ORIGINAL` goals (structured ones `UNSUPPORTED`);
    /// inputs become fixed constraints without a domain. An outcome without
    /// an id is identified by its name.
    #[must_use]
    pub fn from_execution(outcomes: &[Observation], inputs: &[Observation]) -> Self {
        let goals = outcomes
            .iter()
            .map(|o| {
                let id = o.id.clone().unwrap_or_else(|| o.name.clone());
                Goal::new(id, o.name.clone(), FieldValue::from_json(o.value.clone()))
            })
            .collect();

        let search_constraints = inputs
            .iter()
            .map(|i| SearchConstraint::new(i.name.clone(), FieldValue::from_json(i.value.clone())))
            .collect();

        Self::new(goals, search_constraints)
    }

    /// Look up a goal
    #[inline]
    #[must_use]
    pub fn goal(&self, id: &GoalId) -> Option<&Goal> {
        self.goals.iter().find(|g| &g.id == id)
    }

    /// Look up a constraint
    #[inline]
    #[must_use]
    pub fn constraint(&self, id: ConstraintId) -> Option<&SearchConstraint> {
        self.search_constraints.iter().find(|c| c.id == id)
    }

    /// Look up a constraint by input name
    #[inline]
    #[must_use]
    pub fn constraint_by_name(&self, name: &str) -> Option<&SearchConstraint> {
        self.search_constraints.iter().find(|c| c.name == name)
    }

    /// Number of valid solutions among the current results
    #[must_use]
    pub fn valid_solution_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_valid).count()
    }
}
