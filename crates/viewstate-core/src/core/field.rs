// crates/viewstate-core/src/core/field.rs
// ============================================================================
// Module: Field Registry Types
// Description: Field declarations, external keys, and value codecs.
// Purpose: Map logical fields to compact external keys and back.
// Dependencies: crate::core::identifiers, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Each [`Field`] has one canonical external key plus zero or more legacy
//! keys accepted on decode only. A [`FieldCodec`] turns raw string values
//! into typed JSON values and back. Decode failures are ordinary errors that
//! the orchestrator downgrades to warnings; they never abort a resolution.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Number;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::FieldName;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while decoding a raw value.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// No usable value was supplied.
    #[error("no value supplied")]
    Empty,
    /// Value is not a recognized boolean literal.
    #[error("invalid boolean `{0}`")]
    InvalidBoolean(String),
    /// Value is not an integer.
    #[error("invalid integer `{0}`")]
    InvalidInteger(String),
    /// Value is not a finite number.
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    /// Value is not in the allowed set.
    #[error("value `{value}` is not one of [{allowed}]")]
    NotAllowed {
        /// Supplied value.
        value: String,
        /// Comma-joined allowed values.
        allowed: String,
    },
    /// Custom transform rejected the value.
    #[error("{0}")]
    Custom(String),
}

// ============================================================================
// SECTION: Custom Transforms
// ============================================================================

/// Caller-supplied decode/encode pair for fields with bespoke wire formats.
pub trait FieldTransform: Send + Sync {
    /// Decodes raw values (one per repeated key) into a field value.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the raw values are malformed.
    fn decode(&self, raw: &[String]) -> Result<Value, DecodeError>;

    /// Encodes a field value, or returns `None` to omit it.
    fn encode(&self, value: &Value) -> Option<String>;
}

/// Shared handle to a [`FieldTransform`].
#[derive(Clone)]
pub struct SharedTransform(Arc<dyn FieldTransform>);

impl SharedTransform {
    /// Wraps a transform implementation.
    #[must_use]
    pub fn new(transform: impl FieldTransform + 'static) -> Self {
        Self(Arc::new(transform))
    }
}

impl fmt::Debug for SharedTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedTransform(..)")
    }
}

// ============================================================================
// SECTION: Codecs
// ============================================================================

/// Value codec for a field.
///
/// # Invariants
/// - `Custom` transforms cannot be serialized; schemas using them are code-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldCodec {
    /// Free-form string.
    Text,
    /// Boolean accepting `1/0`, `true/false`, `yes/no`, `on/off`; encodes as `1`/`0`.
    Boolean,
    /// Signed integer.
    Integer,
    /// Finite floating-point number.
    Number,
    /// List of strings from repeated keys and/or comma-joined values.
    List,
    /// String restricted to an allowed set, with legacy value aliases.
    Enumerated {
        /// Allowed values.
        allowed: Vec<String>,
        /// Legacy value to current value remapping.
        #[serde(default)]
        aliases: BTreeMap<String, String>,
    },
    /// Caller-supplied transform.
    #[serde(skip)]
    Custom(SharedTransform),
}

impl FieldCodec {
    /// Creates an enumerated codec without aliases.
    #[must_use]
    pub fn enumerated<S: Into<String>>(allowed: impl IntoIterator<Item = S>) -> Self {
        Self::Enumerated {
            allowed: allowed.into_iter().map(Into::into).collect(),
            aliases: BTreeMap::new(),
        }
    }

    /// Decodes raw values into a field value.
    ///
    /// Scalar codecs read the first supplied value.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the raw values are malformed.
    pub fn decode(&self, raw: &[String]) -> Result<Value, DecodeError> {
        match self {
            Self::List => Ok(decode_list(raw)),
            Self::Custom(transform) => transform.0.decode(raw),
            Self::Text => Ok(Value::String(first(raw)?.to_string())),
            Self::Boolean => decode_bool(first(raw)?).map(Value::Bool),
            Self::Integer => {
                let text = first(raw)?.trim();
                text.parse::<i64>()
                    .map(Value::from)
                    .map_err(|_| DecodeError::InvalidInteger(text.to_string()))
            }
            Self::Number => {
                let text = first(raw)?.trim();
                text.parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| DecodeError::InvalidNumber(text.to_string()))
            }
            Self::Enumerated {
                allowed,
                aliases,
            } => {
                let text = first(raw)?.trim();
                let canonical = aliases.get(text).map_or(text, String::as_str);
                if allowed.iter().any(|candidate| candidate == canonical) {
                    Ok(Value::String(canonical.to_string()))
                } else {
                    Err(DecodeError::NotAllowed {
                        value: text.to_string(),
                        allowed: allowed.join(","),
                    })
                }
            }
        }
    }

    /// Encodes a field value, or returns `None` when it cannot be represented.
    #[must_use]
    pub fn encode(&self, value: &Value) -> Option<String> {
        match (self, value) {
            (Self::Custom(transform), _) => transform.0.encode(value),
            (_, Value::Null | Value::Object(_)) => None,
            (_, Value::Bool(flag)) => Some(if *flag { "1" } else { "0" }.to_string()),
            (_, Value::String(text)) => Some(text.clone()),
            (_, Value::Number(number)) => Some(number.to_string()),
            (_, Value::Array(items)) => {
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(text) => parts.push(text.clone()),
                        Value::Number(number) => parts.push(number.to_string()),
                        Value::Bool(flag) => parts.push(if *flag { "1" } else { "0" }.to_string()),
                        Value::Null | Value::Array(_) | Value::Object(_) => return None,
                    }
                }
                Some(parts.join(","))
            }
        }
    }
}

/// Returns the first raw value.
fn first(raw: &[String]) -> Result<&str, DecodeError> {
    raw.first().map(String::as_str).ok_or(DecodeError::Empty)
}

/// Parses boolean literals; a present key with an empty value means `true`.
fn decode_bool(text: &str) -> Result<bool, DecodeError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "" | "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(DecodeError::InvalidBoolean(text.to_string())),
    }
}

/// Splits repeated and comma-joined values into a string array.
fn decode_list(raw: &[String]) -> Value {
    Value::Array(
        raw.iter()
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| Value::String(item.to_string()))
            .collect(),
    )
}

// ============================================================================
// SECTION: Field Declaration
// ============================================================================

/// Declared field in a schema.
///
/// # Invariants
/// - `key` and every entry of `legacy_keys` are unique across the schema.
/// - Legacy keys are accepted on decode and never emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    /// Logical field name.
    pub name: FieldName,
    /// Canonical external key.
    pub key: String,
    /// Legacy keys accepted on decode.
    #[serde(default)]
    pub legacy_keys: Vec<String>,
    /// Value codec.
    pub codec: FieldCodec,
}

impl Field {
    /// Declares a field.
    #[must_use]
    pub fn new(name: impl Into<FieldName>, key: impl Into<String>, codec: FieldCodec) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            legacy_keys: Vec::new(),
            codec,
        }
    }

    /// Declares a boolean field.
    #[must_use]
    pub fn boolean(name: impl Into<FieldName>, key: impl Into<String>) -> Self {
        Self::new(name, key, FieldCodec::Boolean)
    }

    /// Declares a free-form text field.
    #[must_use]
    pub fn text(name: impl Into<FieldName>, key: impl Into<String>) -> Self {
        Self::new(name, key, FieldCodec::Text)
    }

    /// Declares a list field.
    #[must_use]
    pub fn list(name: impl Into<FieldName>, key: impl Into<String>) -> Self {
        Self::new(name, key, FieldCodec::List)
    }

    /// Adds a legacy key accepted on decode.
    #[must_use]
    pub fn legacy(mut self, key: impl Into<String>) -> Self {
        self.legacy_keys.push(key.into());
        self
    }

    /// Iterates the canonical key followed by legacy keys.
    pub fn accepted_keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.key.as_str()).chain(self.legacy_keys.iter().map(String::as_str))
    }
}
