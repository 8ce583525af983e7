// crates/viewstate-core/src/runtime/constraints.rs
// ============================================================================
// Module: Constraint Engine
// Description: Single-pass, priority-ordered constraint application.
// Purpose: Reconcile a state snapshot with business rules and user overrides.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! View constraints are listed before global constraints, then stably sorted
//! by descending priority. Each constraint whose predicate holds against the
//! working state forces its values, except where the constraint is soft and
//! the field is a user override. Only actual value changes are recorded.
//!
//! This is one pass, not a solver. Schemas are expected to reach a fixed
//! point in that pass; the resolver can verify it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::constraint::Constraint;
use crate::core::constraint::PredicateError;
use crate::core::identifiers::ConstraintId;
use crate::core::schema::Schema;
use crate::core::state::ChangePriority;
use crate::core::state::ChangeRecord;
use crate::core::state::FieldMap;
use crate::core::state::UserOverrides;
use crate::core::view::View;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// A constraint predicate failed to evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("constraint {constraint} failed: {source}")]
pub struct ConstraintError {
    /// Failing constraint.
    pub constraint: ConstraintId,
    /// Predicate error.
    #[source]
    pub source: PredicateError,
}

// ============================================================================
// SECTION: Application
// ============================================================================

/// Output of one constraint pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintPass {
    /// Reconciled state.
    pub state: FieldMap,
    /// Change records in application order.
    pub changes: Vec<ChangeRecord>,
}

/// Returns view and global constraints in application order.
#[must_use]
pub fn ordered_constraints<'a>(schema: &'a Schema, view: &'a View) -> Vec<&'a Constraint> {
    let mut ordered: Vec<&Constraint> =
        view.constraints.iter().chain(schema.constraints.iter()).collect();
    ordered.sort_by(|left, right| right.priority.cmp(&left.priority));
    ordered
}

/// Applies the constraints of `view` to a copy of `state`.
///
/// # Errors
///
/// Returns [`ConstraintError`] when a code-defined predicate fails.
pub fn apply_constraints(
    schema: &Schema,
    view: &View,
    state: &FieldMap,
    overrides: &UserOverrides,
) -> Result<ConstraintPass, ConstraintError> {
    let mut working = state.clone();
    let mut changes = Vec::new();
    for constraint in ordered_constraints(schema, view) {
        let holds = constraint.matches(&working).map_err(|source| ConstraintError {
            constraint: constraint.id.clone(),
            source,
        })?;
        if !holds {
            continue;
        }
        for (field, forced) in constraint.apply.iter() {
            if constraint.is_soft() && overrides.contains(field.as_str()) {
                continue;
            }
            if working.get(field.as_str()) == Some(forced) {
                continue;
            }
            let old_value = working.set(field.clone(), forced.clone());
            changes.push(ChangeRecord {
                field: field.clone(),
                old_value,
                new_value: Some(forced.clone()),
                priority: ChangePriority::Constraint {
                    priority: constraint.priority,
                },
                reason: constraint.reason.clone(),
                constraint_id: Some(constraint.id.clone()),
            });
        }
    }
    Ok(ConstraintPass {
        state: working,
        changes,
    })
}
