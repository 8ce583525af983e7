// crates/viewstate-core/src/core/state.rs
// ============================================================================
// Module: Viewstate Resolved State
// Description: Field maps, override sets, UI maps, and resolution logs.
// Purpose: Capture one deterministic resolution and its audit trail.
// Dependencies: crate::core::{hashing, identifiers, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! A [`ResolvedState`] is produced fresh by every resolution call and is never
//! mutated in place. Callers thread its `state` and `user_overrides` forward
//! into the next call so override provenance survives a session.
//!
//! [`FieldMap`] and [`UserOverrides`] expose `with`/`without` constructors
//! that return new values, keeping copy-versus-mutate boundaries explicit.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::HashDigest;
use crate::core::hashing::HashError;
use crate::core::hashing::hash_canonical_json;
use crate::core::identifiers::ConstraintId;
use crate::core::identifiers::FieldName;
use crate::core::identifiers::SchemaId;
use crate::core::identifiers::UiElementId;
use crate::core::identifiers::ViewId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Field Map
// ============================================================================

/// Ordered field-to-value map describing one application state.
///
/// # Invariants
/// - Iteration order is the lexical order of field names.
/// - `null` and absence both mean "undefined".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<FieldName, Value>);

impl FieldMap {
    /// Creates an empty field map.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns the value stored for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns the value for `field` when it is defined (present and not `null`).
    #[must_use]
    pub fn defined(&self, field: &str) -> Option<&Value> {
        self.get(field).filter(|value| !value.is_null())
    }

    /// Returns true when the map holds an entry for `field`.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Returns a copy of this map with `field` set to `value`.
    #[must_use]
    pub fn with(&self, field: impl Into<FieldName>, value: impl Into<Value>) -> Self {
        let mut next = self.clone();
        next.0.insert(field.into(), value.into());
        next
    }

    /// Returns a copy of this map without `field`.
    #[must_use]
    pub fn without(&self, field: &str) -> Self {
        let mut next = self.clone();
        next.0.remove(field);
        next
    }

    /// Returns a copy of this map overlaid with every entry of `other`.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut next = self.clone();
        for (field, value) in &other.0 {
            next.0.insert(field.clone(), value.clone());
        }
        next
    }

    /// Iterates entries in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldName, &Value)> {
        self.0.iter()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sets `field` on an engine-owned working copy.
    pub(crate) fn set(&mut self, field: FieldName, value: Value) -> Option<Value> {
        self.0.insert(field, value)
    }
}

impl<F: Into<FieldName>, V: Into<Value>> FromIterator<(F, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (F, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(field, value)| (field.into(), value.into())).collect())
    }
}

// ============================================================================
// SECTION: User Overrides
// ============================================================================

/// Set of fields whose values were explicitly chosen and differ from the applicable default.
///
/// # Invariants
/// - Only soft constraints consult this set; hard constraints ignore it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserOverrides(BTreeSet<FieldName>);

impl UserOverrides {
    /// Creates an empty override set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Returns true when `field` is a user override.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains(field)
    }

    /// Returns a copy of this set including `field`.
    #[must_use]
    pub fn with(&self, field: impl Into<FieldName>) -> Self {
        let mut next = self.clone();
        next.0.insert(field.into());
        next
    }

    /// Returns a copy of this set excluding `field`.
    #[must_use]
    pub fn without(&self, field: &str) -> Self {
        let mut next = self.clone();
        next.0.remove(field);
        next
    }

    /// Iterates override field names in order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldName> {
        self.0.iter()
    }

    /// Returns the number of overrides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no field is overridden.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Adds `field` to an engine-owned working copy.
    pub(crate) fn insert(&mut self, field: FieldName) -> bool {
        self.0.insert(field)
    }

    /// Removes `field` from an engine-owned working copy.
    pub(crate) fn remove(&mut self, field: &str) -> bool {
        self.0.remove(field)
    }
}

impl<F: Into<FieldName>> FromIterator<F> for UserOverrides {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

// ============================================================================
// SECTION: UI State
// ============================================================================

/// Visibility and editability of one UI element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiElementState {
    /// Element is shown.
    pub visible: bool,
    /// Element is read-only (always true when hidden).
    pub disabled: bool,
}

/// UI element states keyed by element identifier.
pub type UiStateMap = BTreeMap<UiElementId, UiElementState>;

// ============================================================================
// SECTION: Change Events
// ============================================================================

/// Origin of a single field change.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSource {
    /// Explicit user action; the field becomes a user override.
    User,
    /// Programmatic change; override provenance is left untouched.
    System,
}

/// Single field change submitted to `resolve_change`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Field being changed.
    pub field: FieldName,
    /// New value.
    pub value: Value,
    /// Origin of the change.
    pub source: ChangeSource,
}

impl FieldChange {
    /// Creates a user-sourced change.
    #[must_use]
    pub fn user(field: impl Into<FieldName>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            source: ChangeSource::User,
        }
    }

    /// Creates a system-sourced change.
    #[must_use]
    pub fn system(field: impl Into<FieldName>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            source: ChangeSource::System,
        }
    }
}

// ============================================================================
// SECTION: Resolution Log
// ============================================================================

/// Priority label attached to a change record.
///
/// # Invariants
/// - Variants are stable for serialization and audit matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangePriority {
    /// Value came from the active view's defaults.
    Default,
    /// Value came from explicit input.
    User,
    /// Value came from a programmatic change.
    System,
    /// Value was forced by a constraint or a view fallback.
    Constraint {
        /// Priority of the forcing rule.
        priority: i32,
    },
}

impl ChangePriority {
    /// Returns a stable human-readable label.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Default => "default".to_string(),
            Self::User => "user".to_string(),
            Self::System => "system".to_string(),
            Self::Constraint {
                priority,
            } => format!("constraint:{priority}"),
        }
    }
}

/// One field change recorded during a resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Field that changed.
    pub field: FieldName,
    /// Value before the change (`None` when undefined).
    pub old_value: Option<Value>,
    /// Value after the change (`None` when removed).
    pub new_value: Option<Value>,
    /// Priority label.
    pub priority: ChangePriority,
    /// Human-readable reason.
    pub reason: String,
    /// Constraint that forced the change, when applicable.
    pub constraint_id: Option<ConstraintId>,
}

/// What started a resolution.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionTrigger {
    /// Initial resolution from raw external input.
    Initial,
    /// Single field change.
    Change {
        /// Changed field.
        field: FieldName,
        /// Change origin.
        source: ChangeSource,
    },
    /// Major view switch.
    ViewChange {
        /// View active before the switch.
        from: ViewId,
        /// View requested by the caller.
        to: ViewId,
    },
}

/// Recoverable condition encountered during a resolution.
///
/// # Invariants
/// - Warnings never abort a resolution; they explain silent reversions to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionWarning {
    /// A field failed to decode and fell back to its default.
    DecodeFailed {
        /// Field that failed.
        field: FieldName,
        /// External key the raw value was read from.
        key: String,
        /// Raw values as supplied.
        raw: Vec<String>,
        /// Decoder error message.
        error: String,
    },
    /// The selected view was incompatible and the base view was used instead.
    ViewFallback {
        /// View that was rejected.
        rejected: ViewId,
        /// View used instead.
        fallback: ViewId,
        /// Why the view was rejected.
        reason: String,
    },
    /// A requested view identifier is not declared by the schema.
    UnknownView {
        /// Requested identifier.
        requested: ViewId,
    },
    /// Raw input exceeded configured limits and was truncated.
    InputTruncated {
        /// Offending key.
        key: String,
        /// Limit description.
        reason: String,
    },
    /// A change targeted a field the schema does not register.
    UnregisteredField {
        /// Field name as supplied.
        field: FieldName,
    },
    /// Re-running the constraint engine on its own output changed the state.
    FixedPointViolation {
        /// Changes produced by the second pass.
        changes: Vec<ChangeRecord>,
    },
}

/// Audit trail for one resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionLog {
    /// Host-supplied timestamp.
    pub timestamp: Timestamp,
    /// What triggered the resolution.
    pub trigger: ResolutionTrigger,
    /// State snapshot before the resolution.
    pub before: FieldMap,
    /// State snapshot after the resolution.
    pub after: FieldMap,
    /// Ordered change records.
    pub changes: Vec<ChangeRecord>,
    /// Recoverable conditions encountered.
    pub warnings: Vec<ResolutionWarning>,
}

// ============================================================================
// SECTION: Resolved State
// ============================================================================

/// Output bundle of one resolution.
///
/// # Invariants
/// - `state` holds the view identity field set to `view`.
/// - `user_overrides` only names fields whose explicit value differed from the applicable default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedState {
    /// Schema that produced this state.
    pub schema_id: SchemaId,
    /// Active view.
    pub view: ViewId,
    /// Reconciled field values.
    pub state: FieldMap,
    /// Derived UI element states.
    pub ui: UiStateMap,
    /// Fields explicitly chosen by the user.
    pub user_overrides: UserOverrides,
    /// Audit trail.
    pub log: ResolutionLog,
}

/// Borrowed projection hashed by [`ResolvedState::fingerprint`].
#[derive(Serialize)]
struct FingerprintView<'a> {
    /// Schema identifier.
    schema_id: &'a SchemaId,
    /// Active view.
    view: &'a ViewId,
    /// Field values.
    state: &'a FieldMap,
    /// UI element states.
    ui: &'a UiStateMap,
    /// Override set.
    user_overrides: &'a UserOverrides,
}

impl ResolvedState {
    /// Hashes the resolved state (excluding the log) over canonical JSON.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when canonicalization fails.
    pub fn fingerprint(&self, algorithm: HashAlgorithm) -> Result<HashDigest, HashError> {
        hash_canonical_json(
            algorithm,
            &FingerprintView {
                schema_id: &self.schema_id,
                view: &self.view,
                state: &self.state,
                ui: &self.ui,
                user_overrides: &self.user_overrides,
            },
        )
    }

    /// Returns the resolved value for `field`.
    #[must_use]
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.state.get(field)
    }

    /// Returns the UI state for `element`.
    #[must_use]
    pub fn element(&self, element: &str) -> Option<UiElementState> {
        self.ui.get(element).copied()
    }
}
