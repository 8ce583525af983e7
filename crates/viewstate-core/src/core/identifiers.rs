// crates/viewstate-core/src/core/identifiers.rs
// ============================================================================
// Module: Viewstate Identifiers
// Description: Canonical opaque identifiers for schemas, fields, views, and UI elements.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the canonical identifiers used throughout the
//! resolution engine. Identifiers are opaque strings on the wire; they are
//! ordered so that maps keyed by them iterate deterministically.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::borrow::Borrow;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Macro
// ============================================================================

/// Declares a transparent string identifier with the shared helper surface.
macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

string_identifier!(
    /// Schema identifier (one per feature, e.g. `explorer` or `ranking`).
    ///
    /// # Invariants
    /// - Opaque UTF-8 string; no normalization or validation is applied by this type.
    SchemaId
);

string_identifier!(
    /// Logical field name inside a state record.
    ///
    /// # Invariants
    /// - Opaque UTF-8 string; uniqueness is enforced by schema validation.
    FieldName
);

string_identifier!(
    /// View identifier for a mutually exclusive mode of analysis.
    ///
    /// # Invariants
    /// - Opaque UTF-8 string; uniqueness is enforced by schema validation.
    ViewId
);

string_identifier!(
    /// UI element identifier used by visibility rules.
    ///
    /// # Invariants
    /// - Opaque UTF-8 string; no normalization or validation is applied by this type.
    UiElementId
);

string_identifier!(
    /// Constraint identifier used in audit records.
    ///
    /// # Invariants
    /// - Unique per schema; enforced by schema validation.
    ConstraintId
);
