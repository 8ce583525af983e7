// crates/viewstate-core/src/core/hashing.rs
// ============================================================================
// Module: Viewstate Fingerprints
// Description: Content hashes over RFC 8785 canonical JSON.
// Purpose: Let independent resolvers prove they reached the same state.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! A server renderer and an interactive client that resolve the same input
//! must agree on the result. Both fingerprint the resolved state by hashing
//! its JCS canonical form, so key order and number formatting never affect
//! the digest.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fmt::Write as _;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Algorithms
// ============================================================================

/// Digest algorithm used for state fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256.
    Sha256,
}

/// Algorithm used when a resolver is not configured otherwise.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

impl HashAlgorithm {
    /// Label prefixed to rendered digests.
    const fn label(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }

    /// Digests `bytes` into a lowercase hex string.
    fn digest_hex(self, bytes: &[u8]) -> String {
        let raw = match self {
            Self::Sha256 => Sha256::digest(bytes),
        };
        raw.iter().fold(String::with_capacity(raw.len() * 2), |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        })
    }
}

// ============================================================================
// SECTION: Digests
// ============================================================================

/// Fingerprint of a canonicalized value.
///
/// Renders as `<algorithm>:<hex>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashDigest {
    /// Algorithm that produced `value`.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex digest.
    pub value: String,
}

impl fmt::Display for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm.label(), self.value)
    }
}

/// Fingerprint failure.
#[derive(Debug, Error)]
pub enum HashError {
    /// The value could not be written as canonical JSON.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Hashing
// ============================================================================

/// Fingerprints `value` over its RFC 8785 canonical JSON encoding.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when `value` cannot be serialized.
pub fn hash_canonical_json<T: Serialize + ?Sized>(
    algorithm: HashAlgorithm,
    value: &T,
) -> Result<HashDigest, HashError> {
    let canonical =
        serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))?;
    Ok(HashDigest {
        algorithm,
        value: algorithm.digest_hex(&canonical),
    })
}
