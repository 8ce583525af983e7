// crates/viewstate-core/src/runtime/serialize.rs
// ============================================================================
// Module: State Serializer
// Description: Encodes resolved state as minimal external key/value pairs.
// Purpose: Persist only what differs from the active view's defaults.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The comparison baseline is the defaults of the state's *current* view,
//! not the base view. Undefined values and values structurally equal to the
//! default are omitted. Legacy keys are never emitted. The active view is
//! written through its detection flag (or the generic view key when the
//! view has no flag); the base view emits nothing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::raw::RawOutput;
use crate::core::schema::Schema;
use crate::core::state::FieldMap;
use crate::core::view::View;

// ============================================================================
// SECTION: Serialization
// ============================================================================

/// Value emitted for a view detection flag.
pub const VIEW_FLAG_VALUE: &str = "1";

/// Serializes `state` as it would be resolved in `view`.
#[must_use]
pub fn serialize_state(schema: &Schema, view: &View, state: &FieldMap) -> RawOutput {
    let defaults = schema.defaults_for(view);
    let mut output = RawOutput::new();

    for field in &schema.fields {
        let Some(value) = state.defined(field.name.as_str()) else {
            continue;
        };
        if defaults.get(field.name.as_str()) == Some(value) {
            continue;
        }
        if let Some(encoded) = field.codec.encode(value) {
            output.insert(field.key.clone(), encoded);
        }
    }

    if view.id != schema.base_view {
        if let Some(detection) = &view.detection {
            output.insert(detection.key.clone(), VIEW_FLAG_VALUE.to_string());
        } else if let Some(key) = &schema.view_key {
            output.insert(key.clone(), view.id.to_string());
        }
    }

    output
}
