//! Core domain types for counterfactual analysis
//!
//! Defines:
//! - Goal identity, role and value
//! - Search constraints with their optional domain
//! - Primitive kinds (`TypeRef`) and values (`FieldValue`)

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Goal identifier (the outcome id reported by the decision service)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalId(pub String);

impl GoalId {
    /// Create goal ID from an outcome id
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

impl std::fmt::Display for GoalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable search constraint identifier (ULID, assigned client-side)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConstraintId(pub Ulid);

impl ConstraintId {
    /// Generate new constraint ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ConstraintId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Primitive kind of a goal or constraint value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeRef {
    /// `true` / `false`
    Boolean,
    /// Numeric (integers are carried as f64)
    Number,
    /// Free text
    String,
    /// Composite value; cannot take part in a search
    Structured,
}

impl TypeRef {
    /// Whether values of this kind can be searched over
    #[inline]
    #[must_use]
    pub fn is_supported(self) -> bool {
        !matches!(self, TypeRef::Structured)
    }
}

/// A goal or constraint value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean value
    Boolean(bool),
    /// Numeric value
    Number(f64),
    /// String value
    Text(String),
    /// Anything else the decision service reported
    Structured(serde_json::Value),
}

impl FieldValue {
    /// Primitive kind of this value
    #[must_use]
    pub fn kind(&self) -> TypeRef {
        match self {
            FieldValue::Boolean(_) => TypeRef::Boolean,
            FieldValue::Number(_) => TypeRef::Number,
            FieldValue::Text(_) => TypeRef::String,
            FieldValue::Structured(_) => TypeRef::Structured,
        }
    }

    /// Convert an arbitrary JSON value, keeping primitives primitive
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Bool(b) => FieldValue::Boolean(b),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => FieldValue::Number(f),
                None => FieldValue::Structured(serde_json::Value::Number(n)),
            },
            serde_json::Value::String(s) => FieldValue::Text(s),
            other => FieldValue::Structured(other),
        }
    }

    /// Compare two values as instances of `type_ref`.
    ///
    /// Primitives compare by value. A value whose kind disagrees with
    /// `type_ref` never compares equal, and structured values never compare
    /// equal (no structural comparison is defined for them yet).
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn value_eq(&self, other: &Self, type_ref: TypeRef) -> bool {
        match (type_ref, self, other) {
            (TypeRef::Boolean, FieldValue::Boolean(a), FieldValue::Boolean(b)) => a == b,
            (TypeRef::Number, FieldValue::Number(a), FieldValue::Number(b)) => a == b,
            (TypeRef::String, FieldValue::Text(a), FieldValue::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// Role a goal plays in the search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalRole {
    /// Untouched, informational
    Original,
    /// The search must reach exactly `value`
    Fixed,
    /// Any value is acceptable
    Floating,
    /// Cannot participate in the search
    Unsupported,
}

impl GoalRole {
    /// Whether a goal in this role counts as a search target
    #[inline]
    #[must_use]
    pub fn is_target(self) -> bool {
        !matches!(self, GoalRole::Fixed | GoalRole::Unsupported)
    }

    /// Whether the goal is transmitted with a submission
    #[inline]
    #[must_use]
    pub fn is_transmitted(self) -> bool {
        matches!(self, GoalRole::Fixed | GoalRole::Original)
    }
}

/// A desired outcome the search should reach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    /// Stable identity
    pub id: GoalId,
    /// Display label
    pub name: String,
    /// Primitive kind of `value`
    pub type_ref: TypeRef,
    /// Client-side role
    pub role: GoalRole,
    /// Current working value
    pub value: FieldValue,
    /// Value observed before any edit
    pub original_value: FieldValue,
}

impl Goal {
    /// Create a goal from an observed outcome.
    ///
    /// The goal starts `ORIGINAL` with `value == original_value`, or
    /// `UNSUPPORTED` when the outcome is structured.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let value = value.into();
        let type_ref = value.kind();
        let role = if type_ref.is_supported() {
            GoalRole::Original
        } else {
            GoalRole::Unsupported
        };
        Self {
            id: GoalId::new(id),
            name: name.into(),
            type_ref,
            role,
            original_value: value.clone(),
            value,
        }
    }

    /// With role
    #[inline]
    #[must_use]
    pub fn with_role(mut self, role: GoalRole) -> Self {
        self.role = role;
        self
    }

    /// With working value (original value untouched)
    #[inline]
    #[must_use]
    pub fn with_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.value = value.into();
        self
    }

    /// Whether the working value still equals the original one
    #[inline]
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.value.value_eq(&self.original_value, self.type_ref)
    }
}

/// Permitted value space for a varying constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Domain {
    /// Numeric interval
    #[serde(rename_all = "camelCase")]
    Range {
        /// Inclusive lower bound
        lower_bound: f64,
        /// Inclusive upper bound
        upper_bound: f64,
    },
    /// Enumerated string values
    Categorical {
        /// Ordered categories, duplicates allowed
        categories: Vec<String>,
    },
}

impl Domain {
    /// Numeric range domain
    #[inline]
    #[must_use]
    pub fn range(lower_bound: f64, upper_bound: f64) -> Self {
        Domain::Range {
            lower_bound,
            upper_bound,
        }
    }

    /// Categorical domain
    #[must_use]
    pub fn categorical<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Domain::Categorical {
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether this domain kind fits constraints of `type_ref`
    #[inline]
    #[must_use]
    pub fn fits(&self, type_ref: TypeRef) -> bool {
        matches!(
            (self, type_ref),
            (Domain::Range { .. }, TypeRef::Number) | (Domain::Categorical { .. }, TypeRef::String)
        )
    }
}

/// An original input the search may vary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConstraint {
    /// Stable identity; generated when absent from the input
    #[serde(default)]
    pub id: ConstraintId,
    /// Input name
    pub name: String,
    /// Primitive kind of `value`
    pub type_ref: TypeRef,
    /// Original observed value
    pub value: FieldValue,
    /// `true` excludes the input from the search space
    pub is_fixed: bool,
    /// Permitted values when varying
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,
    /// Composite inputs cannot vary
    #[serde(default)]
    pub is_unsupported: bool,
}

impl SearchConstraint {
    /// Create a fixed constraint from an observed input
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let value = value.into();
        let type_ref = value.kind();
        Self {
            id: ConstraintId::new(),
            name: name.into(),
            type_ref,
            value,
            is_fixed: true,
            domain: None,
            is_unsupported: !type_ref.is_supported(),
        }
    }

    /// Mark as varying
    #[inline]
    #[must_use]
    pub fn varying(mut self) -> Self {
        self.is_fixed = false;
        self
    }

    /// With domain
    #[inline]
    #[must_use]
    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domain = Some(domain);
        self
    }

    /// Whether the constraint is free to vary and fully specified
    #[inline]
    #[must_use]
    pub fn is_searchable(&self) -> bool {
        !self.is_fixed
            && !self.is_unsupported
            && (self.domain.is_some() || self.type_ref == TypeRef::Boolean)
    }

    /// A varying number/string constraint without a domain is incomplete
    #[inline]
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        !self.is_fixed
            && !self.is_unsupported
            && self.domain.is_none()
            && self.type_ref != TypeRef::Boolean
    }
}
