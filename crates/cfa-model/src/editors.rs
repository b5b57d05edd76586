//! Constraint editors
//!
//! Pure validators that turn in-progress user input into a committed
//! [`Domain`] or a validation error value:
//! - [`validate_range`] / [`RangeEditor`] for numeric constraints
//! - [`CategoryEditor`] for string constraints

use crate::error::{CategoryEditError, DomainValidationError};
use crate::types::{Domain, FieldValue, SearchConstraint};
use serde::{Deserialize, Serialize};

/// Validate candidate numeric bounds.
///
/// # Errors
/// - `MissingBound` unless both bounds are present
/// - `NonFiniteBound` for NaN or infinite bounds
/// - `LowerAboveUpper` if `lower > upper`
/// - `BoundsEqual` if `lower == upper`
#[allow(clippy::float_cmp)]
pub fn validate_range(
    lower_bound: Option<f64>,
    upper_bound: Option<f64>,
) -> Result<Domain, DomainValidationError> {
    let (Some(lower), Some(upper)) = (lower_bound, upper_bound) else {
        return Err(DomainValidationError::MissingBound);
    };

    if !lower.is_finite() || !upper.is_finite() {
        return Err(DomainValidationError::NonFiniteBound);
    }
    if lower > upper {
        return Err(DomainValidationError::LowerAboveUpper);
    }
    if lower == upper {
        return Err(DomainValidationError::BoundsEqual);
    }

    Ok(Domain::range(lower, upper))
}

/// In-progress numeric bounds
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RangeEditor {
    lower: Option<f64>,
    upper: Option<f64>,
}

impl RangeEditor {
    /// Create editor with no bounds
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the constraint's current domain, if it is a range
    #[must_use]
    pub fn for_constraint(constraint: &SearchConstraint) -> Self {
        match constraint.domain {
            Some(Domain::Range {
                lower_bound,
                upper_bound,
            }) => Self {
                lower: Some(lower_bound),
                upper: Some(upper_bound),
            },
            _ => Self::new(),
        }
    }

    /// Set or clear the lower bound
    #[inline]
    pub fn set_lower(&mut self, lower: Option<f64>) {
        self.lower = lower;
    }

    /// Set or clear the upper bound
    #[inline]
    pub fn set_upper(&mut self, upper: Option<f64>) {
        self.upper = upper;
    }

    /// Current lower bound
    #[inline]
    #[must_use]
    pub fn lower(&self) -> Option<f64> {
        self.lower
    }

    /// Current upper bound
    #[inline]
    #[must_use]
    pub fn upper(&self) -> Option<f64> {
        self.upper
    }

    /// Validate and produce the domain to commit
    ///
    /// # Errors
    /// See [`validate_range`].
    #[inline]
    pub fn commit(&self) -> Result<Domain, DomainValidationError> {
        validate_range(self.lower, self.upper)
    }
}

/// How strictly categorical input is checked on commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryStrictness {
    /// Accept categories as entered, empty strings included
    #[default]
    Lenient,
    /// Refuse empty categories
    RejectEmpty,
}

/// Ordered list of category strings being edited.
///
/// The list never becomes empty. Duplicates are kept as entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryEditor {
    categories: Vec<String>,
    strictness: CategoryStrictness,
}

impl CategoryEditor {
    /// Create editor holding a single empty category
    #[inline]
    #[must_use]
    pub fn new(strictness: CategoryStrictness) -> Self {
        Self {
            categories: vec![String::new()],
            strictness,
        }
    }

    /// Create editor from existing categories
    #[must_use]
    pub fn with_categories<I, S>(categories: I, strictness: CategoryStrictness) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut categories: Vec<String> = categories.into_iter().map(Into::into).collect();
        if categories.is_empty() {
            categories.push(String::new());
        }
        Self {
            categories,
            strictness,
        }
    }

    /// Seed from the constraint's categorical domain, else from its value
    #[must_use]
    pub fn for_constraint(constraint: &SearchConstraint, strictness: CategoryStrictness) -> Self {
        match (&constraint.domain, &constraint.value) {
            (Some(Domain::Categorical { categories }), _) => {
                Self::with_categories(categories.iter().cloned(), strictness)
            }
            (_, FieldValue::Text(original)) => Self::with_categories([original.clone()], strictness),
            _ => Self::new(strictness),
        }
    }

    /// Current categories
    #[inline]
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Configured strictness
    #[inline]
    #[must_use]
    pub fn strictness(&self) -> CategoryStrictness {
        self.strictness
    }

    /// Append a category
    #[inline]
    pub fn push(&mut self, category: impl Into<String>) {
        self.categories.push(category.into());
    }

    /// Replace the category at `index`
    ///
    /// # Errors
    /// `OutOfRange` if `index` is past the end.
    pub fn update(&mut self, index: usize, category: impl Into<String>) -> Result<(), CategoryEditError> {
        let slot = self
            .categories
            .get_mut(index)
            .ok_or(CategoryEditError::OutOfRange(index))?;
        *slot = category.into();
        Ok(())
    }

    /// Remove the category at `index`
    ///
    /// # Errors
    /// - `OutOfRange` if `index` is past the end
    /// - `LastCategory` if it is the only category left
    pub fn remove(&mut self, index: usize) -> Result<String, CategoryEditError> {
        if index >= self.categories.len() {
            return Err(CategoryEditError::OutOfRange(index));
        }
        if self.categories.len() == 1 {
            return Err(CategoryEditError::LastCategory);
        }
        Ok(self.categories.remove(index))
    }

    /// Validate and produce the domain to commit
    ///
    /// # Errors
    /// `EmptyCategory` for the first empty entry under
    /// [`CategoryStrictness::RejectEmpty`].
    pub fn commit(&self) -> Result<Domain, CategoryEditError> {
        if self.strictness == CategoryStrictness::RejectEmpty {
            if let Some(index) = self.categories.iter().position(|c| c.trim().is_empty()) {
                return Err(CategoryEditError::EmptyCategory(index));
            }
        }
        Ok(Domain::categorical(self.categories.iter().cloned()))
    }
}
