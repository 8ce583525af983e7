// crates/viewstate-core/tests/support/mod.rs
// ============================================================================
// Module: Test Support
// Description: Shared result helpers and resolver fixtures for integration tests.
// ============================================================================
//! ## Overview
//! Shared test helpers for consistent Result-based assertions and resolver setup.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]
#![allow(dead_code, reason = "Each test binary uses a subset of the helpers.")]

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use viewstate_core::FixedClock;
use viewstate_core::FixedPointMode;
use viewstate_core::MemoryResolutionSink;
use viewstate_core::RawInput;
use viewstate_core::ResolverConfig;
use viewstate_core::Schema;
use viewstate_core::StateResolver;
use viewstate_core::schemas::explorer;
use viewstate_core::schemas::ranking;

// ========================================================================
// Test Result Helpers
// ========================================================================

/// Standard result type used across resolver integration tests.
pub type TestResult<T = ()> = Result<T, Box<dyn Error>>;

/// Lightweight error type for test assertions.
#[derive(Debug)]
struct TestError {
    /// Human-readable failure message.
    message: String,
}

impl TestError {
    /// Creates a new test error with the provided message.
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TestError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.message)
    }
}

impl Error for TestError {}

/// Returns an error when a test condition fails.
///
/// # Errors
/// Returns a `TestError` when the condition is false.
pub fn ensure(condition: bool, message: impl Into<String>) -> TestResult {
    if condition { Ok(()) } else { Err(Box::new(TestError::new(message))) }
}

// ========================================================================
// Resolver Fixtures
// ========================================================================

/// Resolver type used by fixtures.
pub type TestResolver = StateResolver<FixedClock, Arc<MemoryResolutionSink>>;

/// Strict configuration so any constraint conflict fails the test.
pub fn strict_config() -> ResolverConfig {
    ResolverConfig {
        fixed_point: FixedPointMode::Strict,
        ..ResolverConfig::default()
    }
}

/// Builds a strict resolver for `schema` with a shared memory sink.
pub fn resolver_for(schema: Schema) -> TestResult<(TestResolver, Arc<MemoryResolutionSink>)> {
    let sink = Arc::new(MemoryResolutionSink::new());
    let resolver = StateResolver::new(schema, FixedClock::default(), Arc::clone(&sink), strict_config())?;
    Ok((resolver, sink))
}

/// Builds a strict explorer resolver.
pub fn explorer_resolver() -> TestResult<TestResolver> {
    Ok(resolver_for(explorer::schema())?.0)
}

/// Builds a strict ranking resolver.
pub fn ranking_resolver() -> TestResult<TestResolver> {
    Ok(resolver_for(ranking::schema())?.0)
}

/// Parses a query string into raw input.
pub fn raw(query: &str) -> RawInput {
    RawInput::parse_query(query)
}
