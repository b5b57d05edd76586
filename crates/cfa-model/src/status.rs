//! Execution status of a counterfactual search

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of one counterfactual search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CounterfactualStatus {
    /// Nothing submitted for the current query
    #[default]
    NotStarted,
    /// Submitted and polling
    Running,
    /// A final result set was observed
    Completed,
    /// Submission or polling failed
    Failed,
}

impl CounterfactualStatus {
    /// Whether the search has stopped for good
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for CounterfactualStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotStarted => "NOT_STARTED",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Status block of an analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStatus {
    /// Search lifecycle
    pub execution_status: CounterfactualStatus,
    /// Cached negation of the submission policy
    pub is_disabled: bool,
    /// When the last search completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_execution_time: Option<DateTime<Utc>>,
    /// Message of the last submission or polling failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for ExecutionStatus {
    fn default() -> Self {
        Self {
            execution_status: CounterfactualStatus::NotStarted,
            is_disabled: true,
            last_execution_time: None,
            error: None,
        }
    }
}

impl ExecutionStatus {
    /// Merge a partial update; absent fields are left as they are
    pub fn merge(&mut self, patch: StatusPatch) {
        if let Some(status) = patch.execution_status {
            self.execution_status = status;
        }
        if let Some(disabled) = patch.is_disabled {
            self.is_disabled = disabled;
        }
        if let Some(time) = patch.last_execution_time {
            self.last_execution_time = time;
        }
        if let Some(error) = patch.error {
            self.error = error;
        }
    }
}

/// Partial status update carried by `SET_STATUS`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPatch {
    /// New lifecycle state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_status: Option<CounterfactualStatus>,
    /// New cached enablement flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_disabled: Option<bool>,
    /// `Some(None)` clears the timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_execution_time: Option<Option<DateTime<Utc>>>,
    /// `Some(None)` clears the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Option<String>>,
}

impl StatusPatch {
    /// Empty patch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch that only moves the lifecycle
    #[inline]
    #[must_use]
    pub fn status(status: CounterfactualStatus) -> Self {
        Self::new().with_status(status)
    }

    /// With lifecycle state
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: CounterfactualStatus) -> Self {
        self.execution_status = Some(status);
        self
    }

    /// With cached enablement flag
    #[inline]
    #[must_use]
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.is_disabled = Some(disabled);
        self
    }

    /// Stamp completion time
    #[inline]
    #[must_use]
    pub fn with_execution_time(mut self, time: DateTime<Utc>) -> Self {
        self.last_execution_time = Some(Some(time));
        self
    }

    /// Clear completion time
    #[inline]
    #[must_use]
    pub fn clear_execution_time(mut self) -> Self {
        self.last_execution_time = Some(None);
        self
    }

    /// Record failure message
    #[inline]
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(Some(error.into()));
        self
    }

    /// Clear any recorded failure
    #[inline]
    #[must_use]
    pub fn clear_error(mut self) -> Self {
        self.error = Some(None);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_only_touches_present_fields() {
        let mut status = ExecutionStatus::default();
        status.merge(StatusPatch::new().with_disabled(false));
        assert!(!status.is_disabled);
        assert_eq!(status.execution_status, CounterfactualStatus::NotStarted);

        status.merge(StatusPatch::status(CounterfactualStatus::Failed).with_error("boom"));
        assert_eq!(status.execution_status, CounterfactualStatus::Failed);
        assert!(!status.is_disabled);
        assert_eq!(status.error.as_deref(), Some("boom"));

        status.merge(StatusPatch::status(CounterfactualStatus::NotStarted).clear_error());
        assert_eq!(status.error, None);
    }

    #[test]
    fn terminal_states() {
        assert!(CounterfactualStatus::Completed.is_terminal());
        assert!(CounterfactualStatus::Failed.is_terminal());
        assert!(!CounterfactualStatus::Running.is_terminal());
        assert!(!CounterfactualStatus::NotStarted.is_terminal());
    }

    #[test]
    fn status_wire_names() {
        let json = serde_json::to_value(CounterfactualStatus::NotStarted).unwrap();
        assert_eq!(json, serde_json::json!("NOT_STARTED"));
    }
}
