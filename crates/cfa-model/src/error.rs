//! Validation errors returned by the constraint editors
//!
//! Both error types are values handed back to the editing component; they
//! never reach the network and never abort a transition.

/// Numeric domain validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DomainValidationError {
    /// Only one bound (or none) supplied
    #[error("Please provide both min and max values")]
    MissingBound,

    /// Lower bound above upper bound
    #[error("Minimum value cannot be higher than maximum value")]
    LowerAboveUpper,

    /// Degenerate interval
    #[error("Minimum value cannot equal maximum value")]
    BoundsEqual,

    /// NaN or infinite bound
    #[error("Min and max values must be finite numbers")]
    NonFiniteBound,
}

/// Categorical domain editing failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CategoryEditError {
    /// Removing the only remaining category
    #[error("At least one category is required")]
    LastCategory,

    /// Position past the end of the list
    #[error("no category at position {0}")]
    OutOfRange(usize),

    /// Empty category under strict validation
    #[error("Category at position {0} cannot be empty")]
    EmptyCategory(usize),
}
