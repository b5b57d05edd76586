//! CFA Model - counterfactual analysis domain types
//!
//! Value types shared by the reducer and the orchestrator:
//! - Goals (desired outcomes) and their roles
//! - Search constraints (inputs the search may vary) and their domains
//! - Execution status and result sets returned by the remote search
//! - Constraint editors validating numeric and categorical domains
//!
//! # Example
//!
//! ```rust
//! use cfa_model::{validate_range, Domain};
//!
//! let domain = validate_range(Some(1.0), Some(10.0)).unwrap();
//! assert_eq!(domain, Domain::range(1.0, 10.0));
//! ```

#![warn(unreachable_pub)]

pub mod editors;
pub mod error;
pub mod results;
pub mod state;
pub mod status;
pub mod types;

pub use editors::{validate_range, CategoryEditor, CategoryStrictness, RangeEditor};
pub use error::{CategoryEditError, DomainValidationError};
pub use results::{Assignment, ResultSet, SolutionStage};
pub use state::{AnalysisState, Observation};
pub use status::{CounterfactualStatus, ExecutionStatus, StatusPatch};
pub use types::{ConstraintId, Domain, FieldValue, Goal, GoalId, GoalRole, SearchConstraint, TypeRef};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the counterfactual model
    pub use crate::{
        AnalysisState, ConstraintId, CounterfactualStatus, Domain, FieldValue, Goal, GoalId,
        GoalRole, ResultSet, SearchConstraint, StatusPatch, TypeRef,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
