// crates/viewstate-core/src/runtime/decode.rs
// ============================================================================
// Module: Field Decoding
// Description: Decodes raw input against the field registry.
// Purpose: Turn external key/value pairs into typed field values.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Each registered field is looked up under its canonical key first, then
//! under its legacy keys in declaration order. A failed decode skips that
//! field only and yields a [`ResolutionWarning::DecodeFailed`]; the field
//! then keeps its default.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::field::Field;
use crate::core::raw::RawInput;
use crate::core::schema::Schema;
use crate::core::state::FieldMap;
use crate::core::state::ResolutionWarning;

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Decoded values plus per-field failures.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedFields {
    /// Successfully decoded values.
    pub values: FieldMap,
    /// One warning per field that failed to decode.
    pub warnings: Vec<ResolutionWarning>,
}

/// Decodes every registered field present in `raw`.
#[must_use]
pub fn decode_fields(schema: &Schema, raw: &RawInput) -> DecodedFields {
    let mut decoded = DecodedFields::default();
    for field in &schema.fields {
        let Some((key, values)) = lookup(field, raw) else {
            continue;
        };
        match field.codec.decode(values) {
            Ok(value) => {
                decoded.values.set(field.name.clone(), value);
            }
            Err(err) => decoded.warnings.push(ResolutionWarning::DecodeFailed {
                field: field.name.clone(),
                key: key.to_string(),
                raw: values.to_vec(),
                error: err.to_string(),
            }),
        }
    }
    decoded
}

/// Returns the first accepted key present in `raw` with its values.
fn lookup<'a>(field: &'a Field, raw: &'a RawInput) -> Option<(&'a str, &'a [String])> {
    field.accepted_keys().find_map(|key| raw.get(key).map(|values| (key, values)))
}
