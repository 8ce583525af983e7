// crates/viewstate-core/src/core/schema.rs
// ============================================================================
// Module: Resolution Schema
// Description: Fields, views, and global constraints handed to the resolver.
// Purpose: Parameterize one generic engine per feature and validate declarations.
// Dependencies: crate::core::{condition, constraint, field, identifiers, state, view}, serde, thiserror
// ============================================================================

//! ## Overview
//! A [`Schema`] is the whole declaration for one feature: the field registry,
//! the view registry (in detection order), and the global constraints. The
//! same resolver runs every schema; nothing about a feature is hard-coded.
//!
//! The view identity lives in state under [`Schema::view_field`]. It is owned
//! by the engine, not registered as a field, and serialized through the view
//! detection flags rather than through the field path.
//!
//! Security posture: schemas loaded from JSON are caller-authored but still
//! validated; see [`Schema::validate`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::condition::Condition;
use crate::core::constraint::Constraint;
use crate::core::field::Field;
use crate::core::identifiers::ConstraintId;
use crate::core::identifiers::FieldName;
use crate::core::identifiers::SchemaId;
use crate::core::identifiers::ViewId;
use crate::core::state::FieldMap;
use crate::core::view::View;
use crate::core::view::VisibilityRule;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum nesting depth accepted for declared conditions.
pub const MAX_CONDITION_DEPTH: usize = 32;

// ============================================================================
// SECTION: Schema Definition
// ============================================================================

/// Declaration of one feature's state model.
///
/// # Invariants
/// - `views` are listed in detection priority order (most specific first).
/// - `base_view` names a declared view without a detection flag.
/// - Every external key (field, legacy, detection flag, generic view key) is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    /// Schema identifier.
    pub schema_id: SchemaId,
    /// View used when detection finds nothing or a view is rejected.
    pub base_view: ViewId,
    /// State field holding the active view identifier.
    pub view_field: FieldName,
    /// Generic `view=<id>` key accepted as a low-priority detection fallback.
    #[serde(default)]
    pub view_key: Option<String>,
    /// Field registry.
    pub fields: Vec<Field>,
    /// View registry in detection order.
    pub views: Vec<View>,
    /// Constraints applied in every view.
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new(
        schema_id: impl Into<SchemaId>,
        base_view: impl Into<ViewId>,
        view_field: impl Into<FieldName>,
    ) -> Self {
        Self {
            schema_id: schema_id.into(),
            base_view: base_view.into(),
            view_field: view_field.into(),
            view_key: None,
            fields: Vec::new(),
            views: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Sets the generic view key.
    #[must_use]
    pub fn with_view_key(mut self, key: impl Into<String>) -> Self {
        self.view_key = Some(key.into());
        self
    }

    /// Registers a field.
    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Appends a view to the detection order.
    #[must_use]
    pub fn with_view(mut self, view: View) -> Self {
        self.views.push(view);
        self
    }

    /// Adds a global constraint.
    #[must_use]
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Returns the registered field named `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name.as_str() == name)
    }

    /// Returns true when `name` is a registered field.
    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Returns the view identified by `id`.
    #[must_use]
    pub fn view(&self, id: &str) -> Option<&View> {
        self.views.iter().find(|view| view.id.as_str() == id)
    }

    /// Returns the base view.
    #[must_use]
    pub fn base(&self) -> Option<&View> {
        self.view(self.base_view.as_str())
    }

    /// Computes the defaults applicable in `view`.
    ///
    /// Base view defaults are overlaid by the view's own defaults, and the
    /// view identity field is set to the view identifier.
    #[must_use]
    pub fn defaults_for(&self, view: &View) -> FieldMap {
        let base = self.base().map(|base| base.defaults.clone()).unwrap_or_default();
        base.merged(&view.defaults).with(self.view_field.clone(), view.id.as_str())
    }

    /// Validates the schema declaration.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when validation fails.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.fields.is_empty() {
            return Err(SchemaError::MissingFields);
        }
        if self.views.is_empty() {
            return Err(SchemaError::MissingViews);
        }

        ensure_unique_field_names(&self.fields)?;
        ensure_view_field_unregistered(self)?;
        ensure_unique_view_ids(&self.views)?;
        ensure_base_view(self)?;
        ensure_unique_keys(self)?;
        ensure_unique_constraint_ids(self)?;
        ensure_references_resolve(self)?;

        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Schema validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Schema declares no fields.
    #[error("schema must declare at least one field")]
    MissingFields,
    /// Schema declares no views.
    #[error("schema must declare at least one view")]
    MissingViews,
    /// Duplicate field names detected.
    #[error("duplicate field name: {0}")]
    DuplicateField(String),
    /// The view identity field is also registered as a field.
    #[error("view field {0} must not be a registered field")]
    ViewFieldRegistered(String),
    /// Duplicate view identifiers detected.
    #[error("duplicate view identifier: {0}")]
    DuplicateView(String),
    /// Base view is not declared.
    #[error("base view is not declared: {0}")]
    UnknownBaseView(String),
    /// Base view declares a detection flag.
    #[error("base view must not declare a detection flag: {0}")]
    DetectedBaseView(String),
    /// External key used more than once.
    #[error("duplicate external key: {0}")]
    DuplicateKey(String),
    /// External key is empty.
    #[error("empty external key for {0}")]
    EmptyKey(String),
    /// Duplicate constraint identifiers detected.
    #[error("duplicate constraint identifier: {0}")]
    DuplicateConstraint(String),
    /// Declaration references a field the schema does not register.
    #[error("{context} references unregistered field: {field}")]
    UnknownField {
        /// Where the reference was found.
        context: String,
        /// Unregistered field name.
        field: String,
    },
    /// Declared condition nests deeper than [`MAX_CONDITION_DEPTH`].
    #[error("{context} condition depth {depth} exceeds {MAX_CONDITION_DEPTH}")]
    ConditionTooDeep {
        /// Where the condition was found.
        context: String,
        /// Measured depth.
        depth: usize,
    },
}

// ============================================================================
// SECTION: Validation Helpers
// ============================================================================

/// Ensures field names are unique.
fn ensure_unique_field_names(fields: &[Field]) -> Result<(), SchemaError> {
    let mut seen: BTreeSet<&FieldName> = BTreeSet::new();
    for field in fields {
        if !seen.insert(&field.name) {
            return Err(SchemaError::DuplicateField(field.name.to_string()));
        }
    }
    Ok(())
}

/// Ensures the view identity field is engine-owned.
fn ensure_view_field_unregistered(schema: &Schema) -> Result<(), SchemaError> {
    if schema.is_registered(schema.view_field.as_str()) {
        return Err(SchemaError::ViewFieldRegistered(schema.view_field.to_string()));
    }
    Ok(())
}

/// Ensures view identifiers are unique.
fn ensure_unique_view_ids(views: &[View]) -> Result<(), SchemaError> {
    for (index, view) in views.iter().enumerate() {
        if views.iter().skip(index + 1).any(|other| other.id == view.id) {
            return Err(SchemaError::DuplicateView(view.id.to_string()));
        }
    }
    Ok(())
}

/// Ensures the base view exists and carries no detection flag.
fn ensure_base_view(schema: &Schema) -> Result<(), SchemaError> {
    let Some(base) = schema.base() else {
        return Err(SchemaError::UnknownBaseView(schema.base_view.to_string()));
    };
    if base.detection.is_some() {
        return Err(SchemaError::DetectedBaseView(base.id.to_string()));
    }
    Ok(())
}

/// Ensures field keys, legacy keys, view flags, and the view key share one namespace.
fn ensure_unique_keys(schema: &Schema) -> Result<(), SchemaError> {
    let mut keys: Vec<(String, &str)> = Vec::new();
    for field in &schema.fields {
        for key in field.accepted_keys() {
            keys.push((format!("field {}", field.name), key));
        }
    }
    for view in &schema.views {
        if let Some(detection) = &view.detection {
            for key in detection.accepted_keys() {
                keys.push((format!("view {}", view.id), key));
            }
        }
    }
    if let Some(key) = &schema.view_key {
        keys.push(("view key".to_string(), key.as_str()));
    }
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for (owner, key) in keys {
        if key.is_empty() {
            return Err(SchemaError::EmptyKey(owner));
        }
        if !seen.insert(key) {
            return Err(SchemaError::DuplicateKey(key.to_string()));
        }
    }
    Ok(())
}

/// Ensures constraint identifiers are unique across global and view scopes.
fn ensure_unique_constraint_ids(schema: &Schema) -> Result<(), SchemaError> {
    let mut seen: BTreeSet<&ConstraintId> = BTreeSet::new();
    let scoped = schema.views.iter().flat_map(|view| view.constraints.iter());
    for constraint in schema.constraints.iter().chain(scoped) {
        if !seen.insert(&constraint.id) {
            return Err(SchemaError::DuplicateConstraint(constraint.id.to_string()));
        }
    }
    Ok(())
}

/// Ensures every declaration names registered fields and bounded conditions.
fn ensure_references_resolve(schema: &Schema) -> Result<(), SchemaError> {
    for constraint in &schema.constraints {
        check_constraint(schema, &format!("constraint {}", constraint.id), constraint)?;
    }
    for view in &schema.views {
        let context = format!("view {}", view.id);
        check_targets(schema, &format!("{context} defaults"), view.defaults.iter())?;
        for constraint in &view.constraints {
            check_constraint(schema, &format!("{context} constraint {}", constraint.id), constraint)?;
        }
        for rule in &view.compatibility {
            check_target(schema, &format!("{context} compatibility"), &rule.field)?;
        }
        for (element, rule) in &view.ui {
            if let VisibilityRule::Conditional {
                condition,
            } = rule
            {
                check_condition(schema, &format!("{context} element {element}"), condition)?;
            }
        }
    }
    Ok(())
}

/// Checks a constraint's condition and forced targets.
fn check_constraint(
    schema: &Schema,
    context: &str,
    constraint: &Constraint,
) -> Result<(), SchemaError> {
    if let Some(condition) = constraint.when.as_condition() {
        check_condition(schema, context, condition)?;
    }
    check_targets(schema, context, constraint.apply.iter())
}

/// Checks that every written field is registered.
fn check_targets<'a>(
    schema: &Schema,
    context: &str,
    entries: impl Iterator<Item = (&'a FieldName, &'a Value)>,
) -> Result<(), SchemaError> {
    for (field, _) in entries {
        check_target(schema, context, field)?;
    }
    Ok(())
}

/// Checks that a written field is registered.
fn check_target(schema: &Schema, context: &str, field: &FieldName) -> Result<(), SchemaError> {
    if schema.is_registered(field.as_str()) {
        Ok(())
    } else {
        Err(SchemaError::UnknownField {
            context: context.to_string(),
            field: field.to_string(),
        })
    }
}

/// Checks condition depth and that read fields are registered or the view field.
fn check_condition(schema: &Schema, context: &str, condition: &Condition) -> Result<(), SchemaError> {
    let depth = condition.depth();
    if depth > MAX_CONDITION_DEPTH {
        return Err(SchemaError::ConditionTooDeep {
            context: context.to_string(),
            depth,
        });
    }
    for field in condition.referenced_fields() {
        if field != &schema.view_field {
            check_target(schema, context, field)?;
        }
    }
    Ok(())
}
