//! Time management for the flight core
//!
//! Provides a clock abstraction so the managers never touch a hardware timer
//! directly:
//! - Monotonic milliseconds from boot on real targets
//! - Host clock when running with `std` (SITL, integration tests)
//! - A settable fixed clock for deterministic tests
//!
//! Every timestamp in the core - telemetry events, dwell timers, link
//! staleness - is a millisecond count from this source. Wall-clock time is
//! deliberately absent: the vehicle only cares about elapsed time.
//!
//! Managers hold a shared borrow of their clock, so [`FixedTime`] uses
//! interior mutability: a test can advance the clock between ticks while a
//! manager under test still holds its reference.

use core::cell::Cell;

/// Timestamp in milliseconds since boot (monotonic)
pub type Timestamp = u64;

/// Source of monotonic time for the managers
pub trait TimeSource {
    /// Current timestamp in milliseconds
    fn now(&self) -> Timestamp;

    /// Timer precision in milliseconds
    fn precision_ms(&self) -> u32;
}

/// Host-clock time source (requires `std`)
///
/// Milliseconds since construction, so timestamps start near zero like a
/// real boot counter.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct MonotonicTime {
    epoch: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicTime {
    /// Start the clock at "boot"
    pub fn new() -> Self {
        Self {
            epoch: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for MonotonicTime {
    fn now(&self) -> Timestamp {
        self.epoch.elapsed().as_millis() as Timestamp
    }

    fn precision_ms(&self) -> u32 {
        1
    }
}

/// Fixed time source for testing
///
/// Ticks only when told to, which makes dwell and timeout behavior exactly
/// reproducible. Mutators take `&self` so a test can hold the clock while a
/// manager borrows it.
#[derive(Debug)]
pub struct FixedTime {
    timestamp: Cell<Timestamp>,
}

impl FixedTime {
    /// Create a clock frozen at `timestamp`
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp: Cell::new(timestamp),
        }
    }

    /// Jump to an absolute timestamp
    pub fn set(&self, timestamp: Timestamp) {
        self.timestamp.set(timestamp);
    }

    /// Advance the clock by `ms` milliseconds
    pub fn advance(&self, ms: u64) {
        self.timestamp.set(self.timestamp.get() + ms);
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.timestamp.get()
    }

    fn precision_ms(&self) -> u32 {
        1
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn precision_ms(&self) -> u32 {
        (**self).precision_ms()
    }
}
