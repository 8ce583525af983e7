// crates/viewstate-core/src/runtime/clock.rs
// ============================================================================
// Module: Deterministic Clocks
// Description: Clock implementations that never read the wall clock.
// Purpose: Stamp resolution logs reproducibly in tests and replays.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`FixedClock`] always returns the same timestamp. [`LogicalClock`] hands
//! out increasing logical ticks. Hosts that want wall time implement
//! [`Clock`] themselves.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crate::core::time::Timestamp;
use crate::interfaces::Clock;

// ============================================================================
// SECTION: Clocks
// ============================================================================

/// Clock returning a constant timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub Timestamp);

impl Default for FixedClock {
    fn default() -> Self {
        Self(Timestamp::Logical(0))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// Clock producing monotonically increasing logical timestamps.
#[derive(Debug, Default)]
pub struct LogicalClock {
    /// Next tick to hand out.
    next: AtomicU64,
}

impl LogicalClock {
    /// Creates a clock whose first tick is `start`.
    #[must_use]
    pub const fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }
}

impl Clock for LogicalClock {
    fn now(&self) -> Timestamp {
        Timestamp::Logical(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
