// crates/viewstate-core/src/core/raw.rs
// ============================================================================
// Module: Raw External Input
// Description: Key/value boundary equivalent to URL query parameters.
// Purpose: Parse, limit, and render the engine's external representation.
// Dependencies: crate::core::state, serde, url
// ============================================================================

//! ## Overview
//! The engine boundary is a map of string keys to one or more string values
//! (repeated keys carry arrays). [`RawInput`] is what the engine decodes;
//! [`RawOutput`] is what the serializer emits, with exactly one value per key.
//!
//! Security posture: raw input comes from links that may be stale, hand-edited,
//! or hostile. [`InputLimits`] caps the number of pairs and the size of each
//! value; anything beyond the caps is dropped with a warning, never an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use url::form_urlencoded;

use crate::core::state::ResolutionWarning;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Default maximum number of key/value pairs accepted per resolution.
pub const DEFAULT_MAX_PAIRS: usize = 256;
/// Default maximum byte length of a single raw value.
pub const DEFAULT_MAX_VALUE_BYTES: usize = 4096;

/// Limits applied to raw input before decoding.
///
/// # Invariants
/// - Both limits are non-zero when produced by validated configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLimits {
    /// Maximum number of key/value pairs.
    pub max_pairs: usize,
    /// Maximum byte length of a single value.
    pub max_value_bytes: usize,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_pairs: DEFAULT_MAX_PAIRS,
            max_value_bytes: DEFAULT_MAX_VALUE_BYTES,
        }
    }
}

// ============================================================================
// SECTION: Raw Input
// ============================================================================

/// Raw external input keyed by external key.
///
/// # Invariants
/// - Keys iterate in lexical order; values keep their supplied order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawInput(BTreeMap<String, Vec<String>>);

impl RawInput {
    /// Creates an empty input.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Parses a URL query string (a leading `?` is ignored).
    #[must_use]
    pub fn parse_query(query: &str) -> Self {
        let trimmed = query.strip_prefix('?').unwrap_or(query);
        form_urlencoded::parse(trimmed.as_bytes()).fold(Self::new(), |input, (key, value)| {
            input.with(key.into_owned(), value.into_owned())
        })
    }

    /// Returns a copy of this input with `value` appended under `key`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Returns the values supplied for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    /// Returns true when `key` was supplied at least once.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterates keys and their values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    /// Returns the total number of key/value pairs.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// Returns true when no pairs were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Applies `limits`, returning the retained input and a warning per dropped pair.
    #[must_use]
    pub fn limited(&self, limits: &InputLimits) -> (Self, Vec<ResolutionWarning>) {
        let mut kept = Self::new();
        let mut warnings = Vec::new();
        let mut pairs = 0usize;
        for (key, values) in &self.0 {
            for value in values {
                if value.len() > limits.max_value_bytes {
                    warnings.push(ResolutionWarning::InputTruncated {
                        key: key.clone(),
                        reason: format!(
                            "value of {} bytes exceeds limit of {}",
                            value.len(),
                            limits.max_value_bytes
                        ),
                    });
                    continue;
                }
                if pairs >= limits.max_pairs {
                    warnings.push(ResolutionWarning::InputTruncated {
                        key: key.clone(),
                        reason: format!("pair limit of {} reached", limits.max_pairs),
                    });
                    continue;
                }
                pairs += 1;
                kept = kept.with(key.clone(), value.clone());
            }
        }
        (kept, warnings)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawInput {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), |input, (key, value)| input.with(key, value))
    }
}

// ============================================================================
// SECTION: Raw Output
// ============================================================================

/// Minimal external representation emitted by the serializer.
///
/// # Invariants
/// - One value per key; keys iterate in lexical order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawOutput(BTreeMap<String, String>);

impl RawOutput {
    /// Creates an empty output.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns the value emitted for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterates emitted pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Returns the number of emitted keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when nothing was emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Renders the output as a canonical query string (no leading `?`).
    #[must_use]
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new()).extend_pairs(self.0.iter()).finish()
    }

    /// Converts the output back into decodable input.
    #[must_use]
    pub fn to_input(&self) -> RawInput {
        self.0.iter().map(|(key, value)| (key.clone(), value.clone())).collect()
    }

    /// Inserts a pair while the serializer builds the output.
    pub(crate) fn insert(&mut self, key: String, value: String) {
        self.0.insert(key, value);
    }
}
