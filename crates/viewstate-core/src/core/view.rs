// crates/viewstate-core/src/core/view.rs
// ============================================================================
// Module: View Declarations
// Description: Mutually exclusive analysis modes with defaults, rules, and UI maps.
// Purpose: Describe everything a view owns so the engine stays generic.
// Dependencies: crate::core::{condition, constraint, field, identifiers, raw, state}, serde
// ============================================================================

//! ## Overview
//! A [`View`] is a statically declared mode. It carries:
//! - a detection flag read from raw input (the base view has none),
//! - default overrides layered over the base view's defaults,
//! - view-scoped constraints,
//! - a UI map from element to [`VisibilityRule`],
//! - compatibility rules that reject the view for incompatible context.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::condition::Condition;
use crate::core::constraint::Constraint;
use crate::core::field::FieldCodec;
use crate::core::identifiers::FieldName;
use crate::core::identifiers::UiElementId;
use crate::core::identifiers::ViewId;
use crate::core::raw::RawInput;
use crate::core::state::FieldMap;

// ============================================================================
// SECTION: Detection
// ============================================================================

/// Single-purpose raw input flag that selects a view.
///
/// # Invariants
/// - Keys do not collide with field keys in the owning schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDetection {
    /// Canonical flag key (emitted by the serializer as `key=1`).
    pub key: String,
    /// Legacy flag keys accepted on decode.
    #[serde(default)]
    pub legacy_keys: Vec<String>,
}

impl ViewDetection {
    /// Returns true when any accepted key is present with a truthy value.
    #[must_use]
    pub fn matches(&self, raw: &RawInput) -> bool {
        self.accepted_keys().any(|key| {
            raw.get(key).is_some_and(|values| {
                matches!(FieldCodec::Boolean.decode(values), Ok(Value::Bool(true)))
            })
        })
    }

    /// Iterates the canonical key followed by legacy keys.
    pub fn accepted_keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.key.as_str()).chain(self.legacy_keys.iter().map(String::as_str))
    }
}

// ============================================================================
// SECTION: Visibility Rules
// ============================================================================

/// UI visibility rule for one element.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VisibilityRule {
    /// Never shown; implicitly disabled.
    Hidden,
    /// Always shown.
    Visible {
        /// Whether the user may edit the element.
        toggleable: bool,
        /// Value displayed when the element is read-only.
        #[serde(default)]
        value: Option<Value>,
    },
    /// Shown only while the condition holds; disabled whenever hidden.
    Conditional {
        /// Visibility condition.
        condition: Condition,
    },
}

impl VisibilityRule {
    /// Shown and editable.
    #[must_use]
    pub const fn toggleable() -> Self {
        Self::Visible {
            toggleable: true,
            value: None,
        }
    }

    /// Shown, read-only, displaying `value`.
    #[must_use]
    pub fn locked(value: impl Into<Value>) -> Self {
        Self::Visible {
            toggleable: false,
            value: Some(value.into()),
        }
    }

    /// Shown while `condition` holds.
    #[must_use]
    pub const fn when(condition: Condition) -> Self {
        Self::Conditional {
            condition,
        }
    }
}

// ============================================================================
// SECTION: Compatibility
// ============================================================================

/// Restricts a view to states whose `field` takes one of `allowed`.
///
/// # Invariants
/// - An undefined field is considered compatible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityRule {
    /// Context field inspected.
    pub field: FieldName,
    /// Values the view supports.
    pub allowed: Vec<Value>,
}

impl CompatibilityRule {
    /// Returns a rejection reason when `state` violates the rule.
    #[must_use]
    pub fn violation(&self, state: &FieldMap) -> Option<String> {
        let value = state.defined(self.field.as_str())?;
        if self.allowed.contains(value) {
            None
        } else {
            Some(format!("{} = {value} is not supported", self.field))
        }
    }
}

// ============================================================================
// SECTION: View Definition
// ============================================================================

/// Statically declared analysis mode.
///
/// # Invariants
/// - Exactly one view is active per resolution.
/// - The base view has no detection flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct View {
    /// View identifier.
    pub id: ViewId,
    /// Raw input flag selecting this view.
    #[serde(default)]
    pub detection: Option<ViewDetection>,
    /// Defaults layered over the base view's defaults.
    #[serde(default)]
    pub defaults: FieldMap,
    /// View-scoped constraints.
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    /// UI element rules.
    #[serde(default)]
    pub ui: BTreeMap<UiElementId, VisibilityRule>,
    /// Context restrictions; any violation rejects the view.
    #[serde(default)]
    pub compatibility: Vec<CompatibilityRule>,
}

impl View {
    /// Declares an empty view.
    #[must_use]
    pub fn new(id: impl Into<ViewId>) -> Self {
        Self {
            id: id.into(),
            detection: None,
            defaults: FieldMap::new(),
            constraints: Vec::new(),
            ui: BTreeMap::new(),
            compatibility: Vec::new(),
        }
    }

    /// Sets the detection flag.
    #[must_use]
    pub fn detected_by(mut self, key: impl Into<String>) -> Self {
        self.detection = Some(ViewDetection {
            key: key.into(),
            legacy_keys: Vec::new(),
        });
        self
    }

    /// Adds a legacy detection key; ignored until `detected_by` is set.
    #[must_use]
    pub fn legacy_flag(mut self, key: impl Into<String>) -> Self {
        if let Some(detection) = self.detection.as_mut() {
            detection.legacy_keys.push(key.into());
        }
        self
    }

    /// Adds a default value.
    #[must_use]
    pub fn default_value(mut self, field: impl Into<FieldName>, value: impl Into<Value>) -> Self {
        self.defaults = self.defaults.with(field, value);
        self
    }

    /// Adds a view-scoped constraint.
    #[must_use]
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Adds a UI element rule.
    #[must_use]
    pub fn element(mut self, element: impl Into<UiElementId>, rule: VisibilityRule) -> Self {
        self.ui.insert(element.into(), rule);
        self
    }

    /// Restricts the view to the listed values of `field`.
    #[must_use]
    pub fn compatible_with<V: Into<Value>>(
        mut self,
        field: impl Into<FieldName>,
        allowed: impl IntoIterator<Item = V>,
    ) -> Self {
        self.compatibility.push(CompatibilityRule {
            field: field.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Returns the first compatibility violation for `state`, if any.
    #[must_use]
    pub fn incompatibility(&self, state: &FieldMap) -> Option<String> {
        self.compatibility.iter().find_map(|rule| rule.violation(state))
    }
}
