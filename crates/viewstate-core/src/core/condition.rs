// crates/viewstate-core/src/core/condition.rs
// ============================================================================
// Module: Condition Evaluator
// Description: Boolean predicates over a state snapshot.
// Purpose: Shared predicate language for constraints and UI visibility rules.
// Dependencies: crate::core::{identifiers, state}, serde, serde_json, smallvec
// ============================================================================

//! ## Overview
//! A [`Condition`] is a small boolean algebra over field values: equality,
//! inequality, `all` and `any`. Evaluation is pure and total; a malformed
//! condition (for example one naming an empty field) evaluates to `false`
//! instead of failing. Absent fields compare as JSON `null`.
//!
//! `all([])` is trivially satisfied and `any([])` is trivially
//! unsatisfiable, mirroring the identities of the underlying algebra.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;

use crate::core::identifiers::FieldName;
use crate::core::state::FieldMap;

// ============================================================================
// SECTION: Condition Definition
// ============================================================================

/// Boolean predicate over a field map.
///
/// # Invariants
/// - Evaluation never panics and never mutates the evaluated state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    /// Field value structurally equals the literal.
    Equals {
        /// Field to inspect.
        field: FieldName,
        /// Literal to compare against.
        value: Value,
    },
    /// Field value structurally differs from the literal.
    NotEquals {
        /// Field to inspect.
        field: FieldName,
        /// Literal to compare against.
        value: Value,
    },
    /// Every sub-condition holds. Empty is `true`.
    All {
        /// Sub-conditions.
        conditions: SmallVec<[Box<Self>; 4]>,
    },
    /// At least one sub-condition holds. Empty is `false`.
    Any {
        /// Sub-conditions.
        conditions: SmallVec<[Box<Self>; 4]>,
    },
}

// ============================================================================
// SECTION: Constructor Helpers
// ============================================================================

impl Condition {
    /// Creates an equality condition.
    #[must_use]
    pub fn equals(field: impl Into<FieldName>, value: impl Into<Value>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates an inequality condition.
    #[must_use]
    pub fn not_equals(field: impl Into<FieldName>, value: impl Into<Value>) -> Self {
        Self::NotEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates a conjunction of the given conditions.
    #[must_use]
    pub fn all(conditions: Vec<Self>) -> Self {
        Self::All {
            conditions: conditions.into_iter().map(Box::new).collect(),
        }
    }

    /// Creates a disjunction of the given conditions.
    #[must_use]
    pub fn any(conditions: Vec<Self>) -> Self {
        Self::Any {
            conditions: conditions.into_iter().map(Box::new).collect(),
        }
    }

    /// Creates a condition that always holds.
    #[must_use]
    pub fn always() -> Self {
        Self::All {
            conditions: SmallVec::new(),
        }
    }

    /// Creates a condition that holds when the field equals any listed literal.
    #[must_use]
    pub fn one_of<V: Into<Value>>(
        field: impl Into<FieldName>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let field = field.into();
        Self::any(values.into_iter().map(|value| Self::equals(field.clone(), value)).collect())
    }
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

impl Condition {
    /// Evaluates the condition against a state snapshot.
    #[must_use]
    pub fn evaluate(&self, state: &FieldMap) -> bool {
        match self {
            Self::Equals {
                field,
                value,
            } => {
                if field.as_str().is_empty() {
                    return false;
                }
                field_value(state, field) == value
            }
            Self::NotEquals {
                field,
                value,
            } => {
                if field.as_str().is_empty() {
                    return false;
                }
                field_value(state, field) != value
            }
            Self::All {
                conditions,
            } => conditions.iter().all(|condition| condition.evaluate(state)),
            Self::Any {
                conditions,
            } => conditions.iter().any(|condition| condition.evaluate(state)),
        }
    }

    /// Returns the nesting depth of the condition tree (leaves are depth 1).
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Equals {
                ..
            }
            | Self::NotEquals {
                ..
            } => 1,
            Self::All {
                conditions,
            }
            | Self::Any {
                conditions,
            } => 1 + conditions.iter().map(|condition| condition.depth()).max().unwrap_or(0),
        }
    }

    /// Collects every field name referenced by the condition, in tree order.
    #[must_use]
    pub fn referenced_fields(&self) -> Vec<&FieldName> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    /// Pushes referenced field names into `out`.
    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a FieldName>) {
        match self {
            Self::Equals {
                field, ..
            }
            | Self::NotEquals {
                field, ..
            } => out.push(field),
            Self::All {
                conditions,
            }
            | Self::Any {
                conditions,
            } => {
                for condition in conditions {
                    condition.collect_fields(out);
                }
            }
        }
    }
}

/// Evaluates a condition against a state snapshot.
#[must_use]
pub fn evaluate(condition: &Condition, state: &FieldMap) -> bool {
    condition.evaluate(state)
}

/// Shared `null` used for absent fields.
static NULL: Value = Value::Null;

/// Returns the field value, treating absent fields as `null`.
fn field_value<'a>(state: &'a FieldMap, field: &FieldName) -> &'a Value {
    state.get(field.as_str()).unwrap_or(&NULL)
}
