// crates/viewstate-core/src/core/constraint.rs
// ============================================================================
// Module: Constraint Declarations
// Description: Priority-ordered business rules that force field values.
// Purpose: Describe hard and soft rules consumed by the constraint engine.
// Dependencies: crate::core::{condition, identifiers, state}, serde, thiserror
// ============================================================================

//! ## Overview
//! A [`Constraint`] forces one or more field values whenever its predicate
//! holds. Higher priorities are applied first; ties keep declaration order.
//! A constraint with `allow_user_override = false` is *hard* and always wins.
//! A *soft* constraint skips any field present in the user override set.
//!
//! Predicates are usually declarative [`Condition`]s. Code-only schemas may
//! register a [`StatePredicate`]; its errors are programming errors and
//! propagate out of the resolver rather than being recovered.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::condition::Condition;
use crate::core::identifiers::ConstraintId;
use crate::core::identifiers::FieldName;
use crate::core::state::FieldMap;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Priority used when a declaration does not specify one.
pub const DEFAULT_CONSTRAINT_PRIORITY: i32 = 1;

/// Returns the default constraint priority (serde helper).
const fn default_priority() -> i32 {
    DEFAULT_CONSTRAINT_PRIORITY
}

// ============================================================================
// SECTION: Predicates
// ============================================================================

/// Errors raised by code-defined constraint predicates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredicateError {
    /// Predicate could not be evaluated.
    #[error("predicate failed: {0}")]
    Failed(String),
}

/// Code-defined predicate over a state snapshot.
pub trait StatePredicate: Send + Sync {
    /// Tests the predicate against `state`.
    ///
    /// # Errors
    ///
    /// Returns [`PredicateError`] when the predicate cannot be evaluated.
    fn test(&self, state: &FieldMap) -> Result<bool, PredicateError>;
}

impl<F> StatePredicate for F
where
    F: Fn(&FieldMap) -> Result<bool, PredicateError> + Send + Sync,
{
    fn test(&self, state: &FieldMap) -> Result<bool, PredicateError> {
        self(state)
    }
}

/// Shared handle to a [`StatePredicate`].
#[derive(Clone)]
pub struct SharedPredicate(Arc<dyn StatePredicate>);

impl SharedPredicate {
    /// Wraps a predicate implementation.
    #[must_use]
    pub fn new(predicate: impl StatePredicate + 'static) -> Self {
        Self(Arc::new(predicate))
    }
}

impl fmt::Debug for SharedPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedPredicate(..)")
    }
}

/// Constraint trigger.
///
/// # Invariants
/// - `Custom` predicates cannot be serialized; schemas using them are code-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintPredicate {
    /// Declarative condition.
    Condition(Condition),
    /// Code-defined predicate.
    #[serde(skip)]
    Custom(SharedPredicate),
}

impl ConstraintPredicate {
    /// Returns the declarative condition, if any.
    #[must_use]
    pub const fn as_condition(&self) -> Option<&Condition> {
        match self {
            Self::Condition(condition) => Some(condition),
            Self::Custom(_) => None,
        }
    }
}

// ============================================================================
// SECTION: Constraint Definition
// ============================================================================

/// Business rule forcing field values when its predicate holds.
///
/// # Invariants
/// - Stateless and reusable across resolutions.
/// - `apply` only names fields registered by the owning schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraint {
    /// Constraint identifier for audit records.
    pub id: ConstraintId,
    /// Trigger predicate.
    pub when: ConstraintPredicate,
    /// Forced field values.
    pub apply: FieldMap,
    /// Application priority (higher first).
    #[serde(default = "default_priority")]
    pub priority: i32,
    /// Whether a user override on a target field suppresses this rule.
    #[serde(default)]
    pub allow_user_override: bool,
    /// Human-readable reason recorded in the audit log.
    pub reason: String,
}

impl Constraint {
    /// Declares a hard constraint with the default priority.
    #[must_use]
    pub fn new(id: impl Into<ConstraintId>, when: Condition, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            when: ConstraintPredicate::Condition(when),
            apply: FieldMap::new(),
            priority: DEFAULT_CONSTRAINT_PRIORITY,
            allow_user_override: false,
            reason: reason.into(),
        }
    }

    /// Declares a hard constraint with a code-defined predicate.
    #[must_use]
    pub fn custom(
        id: impl Into<ConstraintId>,
        predicate: impl StatePredicate + 'static,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            when: ConstraintPredicate::Custom(SharedPredicate::new(predicate)),
            apply: FieldMap::new(),
            priority: DEFAULT_CONSTRAINT_PRIORITY,
            allow_user_override: false,
            reason: reason.into(),
        }
    }

    /// Adds a forced field value.
    #[must_use]
    pub fn force(mut self, field: impl Into<FieldName>, value: impl Into<Value>) -> Self {
        self.apply = self.apply.with(field, value);
        self
    }

    /// Sets the application priority.
    #[must_use]
    pub const fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Marks the constraint soft: user overrides on target fields are respected.
    #[must_use]
    pub const fn soft(mut self) -> Self {
        self.allow_user_override = true;
        self
    }

    /// Returns true when the constraint yields to user overrides.
    #[must_use]
    pub const fn is_soft(&self) -> bool {
        self.allow_user_override
    }

    /// Tests the trigger predicate against `state`.
    ///
    /// # Errors
    ///
    /// Returns [`PredicateError`] when a code-defined predicate fails.
    pub fn matches(&self, state: &FieldMap) -> Result<bool, PredicateError> {
        match &self.when {
            ConstraintPredicate::Condition(condition) => Ok(condition.evaluate(state)),
            ConstraintPredicate::Custom(predicate) => predicate.0.test(state),
        }
    }
}
