//! CFA Orchestrator - submission and polling of counterfactual searches
//!
//! Connects an [`cfa_reducer::AnalysisStore`] to the remote search service:
//! - [`CounterfactualApi`]: service contract, with an HTTP implementation
//! - [`CounterfactualOrchestrator`]: submit, track the job, stop on supersession
//! - [`ResultPoller`]: the cancellable fixed-interval poll task
//! - [`AnalysisSession`]: store, orchestrator and editors for one execution
//!
//! # Example
//!
//! ```rust,ignore
//! use cfa_orchestrator::{AnalysisSession, CfaConfig, ExecutionId, HttpCounterfactualApi};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CfaConfig::from_file("cfa.toml")?;
//! let api = Arc::new(HttpCounterfactualApi::new(&config)?);
//! let session = AnalysisSession::open(api, config, ExecutionId::new("exec-1"), &[], &[]);
//!
//! let job = session.submit().await?;
//! println!("Polling {}", job);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod poller;
pub mod session;

pub use api::{
    CounterfactualApi, CounterfactualId, ExecutionId, PollResponse, SubmitRequest, SubmitResponse,
    WireGoal, WireSearchDomain,
};
pub use config::{CfaConfig, DEFAULT_POLL_INTERVAL_MS};
pub use error::{ApiError, CommitError, ConfigError, OrchestratorError};
pub use http::HttpCounterfactualApi;
pub use orchestrator::CounterfactualOrchestrator;
pub use poller::ResultPoller;
pub use session::AnalysisSession;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
