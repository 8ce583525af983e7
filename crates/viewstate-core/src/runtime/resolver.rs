// crates/viewstate-core/src/runtime/resolver.rs
// ============================================================================
// Module: State Resolver
// Description: Resolution entry points sequencing detection through audit.
// Purpose: Produce deterministic resolved state for one schema.
// Dependencies: crate::{core, interfaces, runtime}, serde, thiserror
// ============================================================================

//! ## Overview
//! [`StateResolver`] exposes three entry points and one exit point:
//! - [`StateResolver::resolve_initial`] decodes raw input from scratch.
//! - [`StateResolver::resolve_change`] applies one field change.
//! - [`StateResolver::resolve_view_change`] switches the active view.
//! - [`StateResolver::serialize`] encodes state back to raw output.
//!
//! Every entry point works on copies of its arguments and returns a fresh
//! [`ResolvedState`]. Recoverable problems become warnings; only invalid
//! schemas, failing code predicates, and strict fixed-point violations are
//! errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashAlgorithm;
use crate::core::identifiers::FieldName;
use crate::core::identifiers::ViewId;
use crate::core::raw::InputLimits;
use crate::core::raw::RawInput;
use crate::core::raw::RawOutput;
use crate::core::schema::Schema;
use crate::core::schema::SchemaError;
use crate::core::state::ChangePriority;
use crate::core::state::ChangeRecord;
use crate::core::state::ChangeSource;
use crate::core::state::FieldChange;
use crate::core::state::FieldMap;
use crate::core::state::ResolutionLog;
use crate::core::state::ResolutionTrigger;
use crate::core::state::ResolutionWarning;
use crate::core::state::ResolvedState;
use crate::core::state::UserOverrides;
use crate::core::view::View;
use crate::interfaces::Clock;
use crate::interfaces::ResolutionEvent;
use crate::interfaces::ResolutionSink;
use crate::runtime::constraints::ConstraintError;
use crate::runtime::constraints::apply_constraints;
use crate::runtime::decode::decode_fields;
use crate::runtime::detect::detect_view;
use crate::runtime::serialize::serialize_state;
use crate::runtime::ui::compute_ui_state;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Priority recorded for changes forced by a view fallback.
pub const VIEW_FALLBACK_PRIORITY: i32 = 100;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Fixed-point verification mode.
///
/// After the constraint pass, the engine can re-run the constraints on their
/// own output. Any further change means the schema's constraints conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedPointMode {
    /// No verification.
    Off,
    /// Record a warning and keep the single-pass result.
    Warn,
    /// Fail the resolution.
    Strict,
}

impl Default for FixedPointMode {
    fn default() -> Self {
        if cfg!(debug_assertions) { Self::Warn } else { Self::Off }
    }
}

/// Resolver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Fixed-point verification mode.
    pub fixed_point: FixedPointMode,
    /// Raw input limits.
    pub limits: InputLimits,
    /// Hash algorithm used for state fingerprints.
    pub hash_algorithm: HashAlgorithm,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fixed_point: FixedPointMode::default(),
            limits: InputLimits::default(),
            hash_algorithm: DEFAULT_HASH_ALGORITHM,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Resolution errors.
///
/// # Invariants
/// - Recoverable input problems never surface here; they are warnings.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Schema failed validation.
    #[error("invalid schema: {0}")]
    InvalidSchema(#[from] SchemaError),
    /// A code-defined constraint predicate failed.
    #[error(transparent)]
    Constraint(#[from] ConstraintError),
    /// Strict fixed-point verification found further changes.
    #[error("constraints for view {view} are not a fixed point ({changes} further changes)")]
    NotFixedPoint {
        /// View being resolved.
        view: String,
        /// Number of changes produced by the verification pass.
        changes: usize,
    },
}

// ============================================================================
// SECTION: Fixed-Point Report
// ============================================================================

/// Result of checking one view's default state against its constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedPointReport {
    /// View checked.
    pub view: ViewId,
    /// Changes the first pass made to the view defaults.
    pub first_pass: Vec<ChangeRecord>,
    /// Changes a second pass made; empty when the defaults reach a fixed point.
    pub violations: Vec<ChangeRecord>,
}

impl FixedPointReport {
    /// Returns true when the second pass changed nothing.
    #[must_use]
    pub const fn is_fixed_point(&self) -> bool {
        self.violations.is_empty()
    }
}

// ============================================================================
// SECTION: Working Copy
// ============================================================================

/// Engine-owned copy of the state being resolved.
struct Working {
    /// Field values.
    state: FieldMap,
    /// User override set.
    overrides: UserOverrides,
    /// Change records in order.
    changes: Vec<ChangeRecord>,
    /// Warnings in order.
    warnings: Vec<ResolutionWarning>,
}

impl Working {
    /// Starts from copies of the caller's state and overrides.
    fn new(state: FieldMap, overrides: UserOverrides) -> Self {
        Self {
            state,
            overrides,
            changes: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Sets `field` and records the change when the value differs.
    fn assign(
        &mut self,
        field: &FieldName,
        value: Value,
        priority: ChangePriority,
        reason: String,
    ) {
        if value.is_null() {
            self.clear(field, priority, reason);
            return;
        }
        if self.state.get(field.as_str()) == Some(&value) {
            return;
        }
        let old_value = self.state.set(field.clone(), value.clone());
        self.changes.push(ChangeRecord {
            field: field.clone(),
            old_value,
            new_value: Some(value),
            priority,
            reason,
            constraint_id: None,
        });
    }

    /// Removes `field` and records the change when it was present.
    fn clear(&mut self, field: &FieldName, priority: ChangePriority, reason: String) {
        if !self.state.contains(field.as_str()) {
            return;
        }
        let old_value = self.state.get(field.as_str()).cloned();
        self.state = self.state.without(field.as_str());
        self.changes.push(ChangeRecord {
            field: field.clone(),
            old_value,
            new_value: None,
            priority,
            reason,
            constraint_id: None,
        });
    }
}

/// Applies decoded input that differs from `defaults` as user overrides.
fn apply_explicit(work: &mut Working, decoded: &FieldMap, defaults: &FieldMap) {
    for (field, value) in decoded.iter() {
        if defaults.get(field.as_str()) == Some(value) {
            continue;
        }
        work.assign(field, value.clone(), ChangePriority::User, "explicit input".to_string());
        work.overrides.insert(field.clone());
    }
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Generic resolution engine parameterized by a [`Schema`].
pub struct StateResolver<C, K> {
    /// Validated schema.
    schema: Schema,
    /// Copy of the base view.
    base: View,
    /// Timestamp source.
    clock: C,
    /// Event sink.
    sink: K,
    /// Resolver configuration.
    config: ResolverConfig,
}

impl<C, K> StateResolver<C, K>
where
    C: Clock,
    K: ResolutionSink,
{
    /// Creates a resolver after validating `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidSchema`] when the schema fails validation.
    pub fn new(
        schema: Schema,
        clock: C,
        sink: K,
        config: ResolverConfig,
    ) -> Result<Self, ResolveError> {
        schema.validate()?;
        let base = schema
            .base()
            .cloned()
            .ok_or_else(|| SchemaError::UnknownBaseView(schema.base_view.to_string()))?;
        Ok(Self {
            schema,
            base,
            clock,
            sink,
            config,
        })
    }

    /// Returns the schema.
    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the resolver configuration.
    #[must_use]
    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Returns the view recorded in `state`, or the base view.
    #[must_use]
    pub fn active_view(&self, state: &FieldMap) -> &View {
        state
            .get(self.schema.view_field.as_str())
            .and_then(Value::as_str)
            .and_then(|id| self.schema.view(id))
            .unwrap_or(&self.base)
    }

    /// Returns the view with identifier `id`, or the base view.
    fn view_or_base(&self, id: &str) -> &View {
        self.schema.view(id).unwrap_or(&self.base)
    }

    /// Detects the view selected by raw input.
    #[must_use]
    pub fn detect(&self, raw: &RawInput) -> ViewId {
        detect_view(&self.schema, raw).view
    }

    // ------------------------------------------------------------------------
    // Initial resolution
    // ------------------------------------------------------------------------

    /// Resolves state from raw external input.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when a code predicate fails or strict
    /// fixed-point verification fails.
    pub fn resolve_initial(&self, raw: &RawInput) -> Result<ResolvedState, ResolveError> {
        let (raw, truncated) = raw.limited(&self.config.limits);
        let mut work = Working::new(FieldMap::new(), UserOverrides::new());
        work.warnings.extend(truncated);

        let detection = detect_view(&self.schema, &raw);
        if let Some(requested) = detection.unknown_request {
            work.warnings.push(ResolutionWarning::UnknownView {
                requested,
            });
        }
        let mut view = self.view_or_base(detection.view.as_str());

        let defaults = self.schema.defaults_for(view);
        for (field, value) in defaults.iter() {
            work.assign(
                field,
                value.clone(),
                ChangePriority::Default,
                format!("default for view {}", view.id),
            );
        }

        let decoded = decode_fields(&self.schema, &raw);
        work.warnings.extend(decoded.warnings);
        apply_explicit(&mut work, &decoded.values, &defaults);

        if let Some(reason) = view.incompatibility(&work.state) {
            view = self.fall_back(&mut work, view, reason);
            apply_explicit(&mut work, &decoded.values, &self.schema.defaults_for(view));
        }

        self.reconcile(ResolutionTrigger::Initial, FieldMap::new(), view, work)
    }

    // ------------------------------------------------------------------------
    // Change resolution
    // ------------------------------------------------------------------------

    /// Applies one field change to `state` and re-reconciles.
    ///
    /// A change to the view identity field is handled as a view change.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when a code predicate fails or strict
    /// fixed-point verification fails.
    pub fn resolve_change(
        &self,
        change: &FieldChange,
        state: &FieldMap,
        overrides: &UserOverrides,
    ) -> Result<ResolvedState, ResolveError> {
        if change.field == self.schema.view_field {
            let target = match &change.value {
                Value::String(id) => ViewId::new(id.as_str()),
                other => ViewId::new(other.to_string()),
            };
            return self.resolve_view_change(&target, state, overrides);
        }

        let mut view = self.active_view(state);
        let mut work = Working::new(state.clone(), overrides.clone());
        if !self.schema.is_registered(change.field.as_str()) {
            work.warnings.push(ResolutionWarning::UnregisteredField {
                field: change.field.clone(),
            });
        }

        let (priority, label) = match change.source {
            ChangeSource::User => (ChangePriority::User, "user change"),
            ChangeSource::System => (ChangePriority::System, "system change"),
        };
        work.assign(&change.field, change.value.clone(), priority, label.to_string());
        if change.source == ChangeSource::User {
            work.overrides.insert(change.field.clone());
        }

        if let Some(reason) = view.incompatibility(&work.state) {
            view = self.fall_back(&mut work, view, reason);
            // The fallback must not undo the change that caused it.
            work.assign(&change.field, change.value.clone(), priority, label.to_string());
        }

        let trigger = ResolutionTrigger::Change {
            field: change.field.clone(),
            source: change.source,
        };
        self.reconcile(trigger, state.clone(), view, work)
    }

    // ------------------------------------------------------------------------
    // View change resolution
    // ------------------------------------------------------------------------

    /// Switches `state` to `target`.
    ///
    /// Fields in the new view's defaults adopt those defaults unless they are
    /// user overrides. The view identity field is always reset and never
    /// remains an override. Fields only the previous view defaulted are
    /// cleared unless overridden.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when a code predicate fails or strict
    /// fixed-point verification fails.
    pub fn resolve_view_change(
        &self,
        target: &ViewId,
        state: &FieldMap,
        overrides: &UserOverrides,
    ) -> Result<ResolvedState, ResolveError> {
        let previous = self.active_view(state);
        let mut work = Working::new(state.clone(), overrides.clone());

        let mut view = match self.schema.view(target.as_str()) {
            Some(view) => view,
            None => {
                work.warnings.push(ResolutionWarning::UnknownView {
                    requested: target.clone(),
                });
                &self.base
            }
        };
        let mut rejection = None;
        if let Some(reason) = view.incompatibility(&work.state) {
            rejection = Some((view, reason));
            view = &self.base;
        }

        let view_field = &self.schema.view_field;
        let defaults = self.schema.defaults_for(view);
        let reason = format!("default for view {}", view.id);
        for (field, value) in defaults.iter() {
            if field == view_field {
                if rejection.is_none() {
                    work.assign(field, value.clone(), ChangePriority::Default, reason.clone());
                }
                work.overrides.remove(field.as_str());
                continue;
            }
            if work.overrides.contains(field.as_str()) {
                continue;
            }
            work.assign(field, value.clone(), ChangePriority::Default, reason.clone());
        }
        for (field, _) in previous.defaults.iter() {
            if defaults.contains(field.as_str()) || work.overrides.contains(field.as_str()) {
                continue;
            }
            work.clear(field, ChangePriority::Default, reason.clone());
        }
        if let Some((rejected, reason)) = rejection {
            self.record_fallback(&mut work, rejected, reason);
        }

        let trigger = ResolutionTrigger::ViewChange {
            from: previous.id.clone(),
            to: target.clone(),
        };
        self.reconcile(trigger, state.clone(), view, work)
    }

    // ------------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------------

    /// Serializes `state` against its active view's defaults.
    #[must_use]
    pub fn serialize(&self, state: &FieldMap) -> RawOutput {
        serialize_state(&self.schema, self.active_view(state), state)
    }

    // ------------------------------------------------------------------------
    // Schema checks
    // ------------------------------------------------------------------------

    /// Checks that every view's default state reaches a constraint fixed point.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Constraint`] when a code predicate fails.
    pub fn check_fixed_points(&self) -> Result<Vec<FixedPointReport>, ResolveError> {
        let overrides = UserOverrides::new();
        let mut reports = Vec::with_capacity(self.schema.views.len());
        for view in &self.schema.views {
            let defaults = self.schema.defaults_for(view);
            let first = apply_constraints(&self.schema, view, &defaults, &overrides)?;
            let second = apply_constraints(&self.schema, view, &first.state, &overrides)?;
            reports.push(FixedPointReport {
                view: view.id.clone(),
                first_pass: first.changes,
                violations: second.changes,
            });
        }
        Ok(reports)
    }

    // ------------------------------------------------------------------------
    // Shared steps
    // ------------------------------------------------------------------------

    /// Replaces a rejected view with the base view inside `work`.
    ///
    /// Fields the rejected view defaulted revert to base defaults unless they
    /// are user overrides. Overrides that now equal the base default are dropped.
    fn fall_back(&self, work: &mut Working, rejected: &View, reason: String) -> &View {
        let base_defaults = self.schema.defaults_for(&self.base);
        let priority = ChangePriority::Constraint {
            priority: VIEW_FALLBACK_PRIORITY,
        };
        let record_reason = format!("view {} rejected: {reason}", rejected.id);

        for (field, _) in rejected.defaults.iter() {
            if work.overrides.contains(field.as_str()) {
                continue;
            }
            match base_defaults.get(field.as_str()) {
                Some(value) => {
                    work.assign(field, value.clone(), priority, record_reason.clone());
                }
                None => work.clear(field, priority, record_reason.clone()),
            }
        }

        self.record_fallback(work, rejected, reason);
        &self.base
    }

    /// Moves the view identity field to the base view at fallback priority.
    ///
    /// Also drops overrides that now equal the base default and records the
    /// fallback warning.
    fn record_fallback(&self, work: &mut Working, rejected: &View, reason: String) {
        let base_defaults = self.schema.defaults_for(&self.base);
        let priority = ChangePriority::Constraint {
            priority: VIEW_FALLBACK_PRIORITY,
        };
        let record_reason = format!("view {} rejected: {reason}", rejected.id);

        let view_field = &self.schema.view_field;
        work.assign(
            view_field,
            Value::String(self.base.id.to_string()),
            priority,
            record_reason,
        );
        work.overrides.remove(view_field.as_str());

        let stale: Vec<FieldName> = work
            .overrides
            .iter()
            .filter(|field| {
                base_defaults
                    .get(field.as_str())
                    .is_some_and(|value| work.state.get(field.as_str()) == Some(value))
            })
            .cloned()
            .collect();
        for field in stale {
            work.overrides.remove(field.as_str());
        }

        work.warnings.push(ResolutionWarning::ViewFallback {
            rejected: rejected.id.clone(),
            fallback: self.base.id.clone(),
            reason,
        });
    }

    /// Runs constraints, fixed-point verification, and UI, then assembles the result.
    fn reconcile(
        &self,
        trigger: ResolutionTrigger,
        before: FieldMap,
        view: &View,
        mut work: Working,
    ) -> Result<ResolvedState, ResolveError> {
        let pass = apply_constraints(&self.schema, view, &work.state, &work.overrides)?;
        work.state = pass.state;
        work.changes.extend(pass.changes);
        self.verify_fixed_point(view, &mut work)?;

        let ui = compute_ui_state(view, &work.state);
        let resolved = ResolvedState {
            schema_id: self.schema.schema_id.clone(),
            view: view.id.clone(),
            ui,
            user_overrides: work.overrides,
            log: ResolutionLog {
                timestamp: self.clock.now(),
                trigger,
                before,
                after: work.state.clone(),
                changes: work.changes,
                warnings: work.warnings,
            },
            state: work.state,
        };
        self.emit(&resolved);
        Ok(resolved)
    }

    /// Re-runs the constraint pass and applies the configured mode.
    fn verify_fixed_point(&self, view: &View, work: &mut Working) -> Result<(), ResolveError> {
        if self.config.fixed_point == FixedPointMode::Off {
            return Ok(());
        }
        let pass = apply_constraints(&self.schema, view, &work.state, &work.overrides)?;
        if pass.changes.is_empty() {
            return Ok(());
        }
        match self.config.fixed_point {
            FixedPointMode::Strict => Err(ResolveError::NotFixedPoint {
                view: view.id.to_string(),
                changes: pass.changes.len(),
            }),
            FixedPointMode::Off | FixedPointMode::Warn => {
                work.warnings.push(ResolutionWarning::FixedPointViolation {
                    changes: pass.changes,
                });
                Ok(())
            }
        }
    }

    /// Emits warning events followed by the completion event.
    fn emit(&self, resolved: &ResolvedState) {
        for warning in &resolved.log.warnings {
            self.sink.record(&ResolutionEvent::from_warning(
                &resolved.schema_id,
                &resolved.view,
                warning,
            ));
        }
        self.sink.record(&ResolutionEvent::Resolved {
            schema_id: resolved.schema_id.clone(),
            timestamp: resolved.log.timestamp,
            trigger: resolved.log.trigger.clone(),
            view: resolved.view.clone(),
            changes: resolved.log.changes.len(),
            overrides: resolved.user_overrides.len(),
            warnings: resolved.log.warnings.len(),
            fingerprint: resolved.fingerprint(self.config.hash_algorithm).ok(),
        });
    }
}
