//! Error types for CFA orchestration
//!
//! Provides error handling for:
//! - Transport and server failures talking to the decision service
//! - Configuration loading
//! - Submission gating and supersession
//! - Committing edited domains

use cfa_model::{CategoryEditError, DomainValidationError};
use cfa_reducer::TransitionError;
use std::path::PathBuf;

/// Remote service errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Connection, timeout or request-building failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status
    #[error("server returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// Response body did not match the expected shape
    #[error("malformed response: {0}")]
    Decode(String),

    /// Client could not be configured
    #[error("invalid client configuration: {0}")]
    Client(String),
}

impl ApiError {
    /// Check if retrying the same request could succeed.
    ///
    /// Informational only; the orchestrator never retries on its own.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Decode(_) | Self::Client(_) => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else if error.is_builder() {
            Self::Client(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// TOML did not parse
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Parsed but unusable
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Orchestration errors
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// Enablement policy refused the submission
    #[error("submission not allowed: {}", .0.join("; "))]
    SubmissionNotAllowed(Vec<String>),

    /// Remote job creation failed; status is FAILED
    #[error("submission failed: {0}")]
    SubmissionFailed(#[source] ApiError),

    /// A newer submission or a teardown happened while this one was in flight
    #[error("submission superseded")]
    Superseded,

    /// Reducer rejected an intent (client defect)
    #[error("transition error: {0}")]
    Transition(#[from] TransitionError),
}

impl OrchestratorError {
    /// Check if the user can fix this by editing the query
    #[inline]
    #[must_use]
    pub fn is_user_fixable(&self) -> bool {
        matches!(self, Self::SubmissionNotAllowed(_))
    }
}

/// Errors committing an edited domain
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommitError {
    /// Numeric bounds rejected
    #[error(transparent)]
    Range(#[from] DomainValidationError),

    /// Categories rejected
    #[error(transparent)]
    Category(#[from] CategoryEditError),

    /// Reducer rejected the commit
    #[error(transparent)]
    Transition(#[from] TransitionError),
}
