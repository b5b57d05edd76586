//! CFA Reducer - state transitions for counterfactual analysis
//!
//! - [`transition`]: pure `(state, intent) -> state`
//! - [`policy`]: derived submission enablement
//! - [`AnalysisStore`]: the state container every writer goes through
//!
//! # Example
//!
//! ```rust
//! use cfa_model::{AnalysisState, Domain, Goal, GoalRole, SearchConstraint};
//! use cfa_reducer::{AnalysisStore, Intent};
//!
//! let score = SearchConstraint::new("Score", 5.0).with_domain(Domain::range(1.0, 10.0));
//! let id = score.id;
//! let store = AnalysisStore::new(AnalysisState::new(
//!     vec![Goal::new("g1", "Approved", true).with_role(GoalRole::Floating)],
//!     vec![score],
//! ));
//!
//! store.dispatch(Intent::ToggleConstraint(id)).unwrap();
//! assert!(store.submission_allowed());
//! ```

#![warn(unreachable_pub)]

pub mod error;
pub mod intent;
pub mod policy;
pub mod store;
pub mod transition;

pub use error::TransitionError;
pub use intent::Intent;
pub use policy::{blockers, submission_allowed, SubmissionBlocker};
pub use store::{AnalysisStore, Epoch};
pub use transition::transition;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
