// crates/viewstate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Viewstate Interfaces
// Description: Host-supplied clock and resolution event sink contracts.
// Purpose: Keep the engine free of wall-clock reads and logging backends.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! The engine touches exactly two external collaborators: a [`Clock`] that
//! stamps resolution logs and a [`ResolutionSink`] that receives structured
//! events. Both are supplied by the host. Sinks are fire-and-forget; a sink
//! failure must never change the returned resolved state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::core::hashing::HashDigest;
use crate::core::identifiers::FieldName;
use crate::core::identifiers::SchemaId;
use crate::core::identifiers::ViewId;
use crate::core::state::ResolutionTrigger;
use crate::core::state::ResolutionWarning;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Source of resolution timestamps.
pub trait Clock: Send + Sync {
    /// Returns the timestamp for the next resolution log.
    fn now(&self) -> Timestamp;
}

// ============================================================================
// SECTION: Resolution Events
// ============================================================================

/// Structured event emitted to a [`ResolutionSink`].
///
/// # Invariants
/// - Every event mirrors a record inside the returned resolution log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ResolutionEvent {
    /// A resolution completed.
    Resolved {
        /// Schema identifier.
        schema_id: SchemaId,
        /// Log timestamp.
        timestamp: Timestamp,
        /// What triggered the resolution.
        trigger: ResolutionTrigger,
        /// Active view after resolution.
        view: ViewId,
        /// Number of change records.
        changes: usize,
        /// Number of user overrides.
        overrides: usize,
        /// Number of warnings.
        warnings: usize,
        /// Resolved state fingerprint, when hashing succeeded.
        fingerprint: Option<HashDigest>,
    },
    /// A field failed to decode.
    DecodeFailed {
        /// Schema identifier.
        schema_id: SchemaId,
        /// Field that failed.
        field: FieldName,
        /// External key read.
        key: String,
        /// Decoder error message.
        error: String,
    },
    /// A view was rejected and the base view used instead.
    ViewFallback {
        /// Schema identifier.
        schema_id: SchemaId,
        /// Rejected view.
        rejected: ViewId,
        /// View used instead.
        fallback: ViewId,
        /// Rejection reason.
        reason: String,
    },
    /// A requested view is not declared.
    UnknownView {
        /// Schema identifier.
        schema_id: SchemaId,
        /// Requested identifier.
        requested: ViewId,
    },
    /// Raw input was truncated by limits.
    InputTruncated {
        /// Schema identifier.
        schema_id: SchemaId,
        /// Offending key.
        key: String,
        /// Limit description.
        reason: String,
    },
    /// A change targeted an unregistered field.
    UnregisteredField {
        /// Schema identifier.
        schema_id: SchemaId,
        /// Field as supplied.
        field: FieldName,
    },
    /// The constraint engine did not reach a fixed point in one pass.
    FixedPointViolation {
        /// Schema identifier.
        schema_id: SchemaId,
        /// View being resolved.
        view: ViewId,
        /// Number of changes produced by the verification pass.
        changes: usize,
    },
}

impl ResolutionEvent {
    /// Builds the event mirroring a logged warning.
    #[must_use]
    pub fn from_warning(schema_id: &SchemaId, view: &ViewId, warning: &ResolutionWarning) -> Self {
        let schema_id = schema_id.clone();
        match warning {
            ResolutionWarning::DecodeFailed {
                field,
                key,
                error,
                ..
            } => Self::DecodeFailed {
                schema_id,
                field: field.clone(),
                key: key.clone(),
                error: error.clone(),
            },
            ResolutionWarning::ViewFallback {
                rejected,
                fallback,
                reason,
            } => Self::ViewFallback {
                schema_id,
                rejected: rejected.clone(),
                fallback: fallback.clone(),
                reason: reason.clone(),
            },
            ResolutionWarning::UnknownView {
                requested,
            } => Self::UnknownView {
                schema_id,
                requested: requested.clone(),
            },
            ResolutionWarning::InputTruncated {
                key,
                reason,
            } => Self::InputTruncated {
                schema_id,
                key: key.clone(),
                reason: reason.clone(),
            },
            ResolutionWarning::UnregisteredField {
                field,
            } => Self::UnregisteredField {
                schema_id,
                field: field.clone(),
            },
            ResolutionWarning::FixedPointViolation {
                changes,
            } => Self::FixedPointViolation {
                schema_id,
                view: view.clone(),
                changes: changes.len(),
            },
        }
    }

    /// Returns the stable event label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Resolved {
                ..
            } => "resolved",
            Self::DecodeFailed {
                ..
            } => "decode_failed",
            Self::ViewFallback {
                ..
            } => "view_fallback",
            Self::UnknownView {
                ..
            } => "unknown_view",
            Self::InputTruncated {
                ..
            } => "input_truncated",
            Self::UnregisteredField {
                ..
            } => "unregistered_field",
            Self::FixedPointViolation {
                ..
            } => "fixed_point_violation",
        }
    }
}

// ============================================================================
// SECTION: Resolution Sink
// ============================================================================

/// Receiver for resolution events.
pub trait ResolutionSink: Send + Sync {
    /// Records one event. Implementations must not fail the caller.
    fn record(&self, event: &ResolutionEvent);
}
