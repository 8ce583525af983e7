// crates/viewstate-core/src/schemas/mod.rs
// ============================================================================
// Module: Built-in Schemas
// Description: Schemas shipped with the engine.
// Purpose: Centralize built-in schema names for config validation and lookup.
// Dependencies: crate::core
// ============================================================================

//! Built-in schemas for the general analysis explorer and the ranking table.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::schema::Schema;

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod explorer;
pub mod ranking;

// ============================================================================
// SECTION: Lookup
// ============================================================================

/// Names of the built-in schemas.
pub const BUILTIN_SCHEMAS: [&str; 2] = [explorer::SCHEMA_ID, ranking::SCHEMA_ID];

/// Returns true when `name` is a built-in schema.
#[must_use]
pub fn is_builtin_schema(name: &str) -> bool {
    BUILTIN_SCHEMAS.iter().any(|id| id == &name)
}

/// Builds the built-in schema named `name`.
#[must_use]
pub fn builtin_schema(name: &str) -> Option<Schema> {
    match name {
        explorer::SCHEMA_ID => Some(explorer::schema()),
        ranking::SCHEMA_ID => Some(ranking::schema()),
        _ => None,
    }
}
