//! Error Types for the Flight-Control Core
//!
//! ## Design Philosophy
//!
//! The error system is built for a hard-real-time control loop:
//!
//! 1. **Small Size**: the whole enum is a single byte. Errors travel through
//!    hot paths every tick and may be stored alongside per-axis results.
//!
//! 2. **No Heap Allocation**: no `String`, no boxed sources. Context that
//!    matters (which axis, which queue) lives at the call site, not in the
//!    error value.
//!
//! 3. **Copy Semantics**: errors are returned from driver calls thousands of
//!    times per second; they must be trivially copyable.
//!
//! 4. **Driver-Boundary Taxonomy**: every variant maps to a condition a
//!    driver or queue can actually report. Managers translate these into
//!    behavior (retry next tick, enter failsafe, drop the frame) rather than
//!    inspecting payloads.
//!
//! ## Propagation Policy
//!
//! Driver failures are returned as typed results up through manager methods.
//! A manager tick that hits a failure on one axis or sensor still completes
//! processing for independent axes and sensors in the same tick; the next
//! tick retries anyway. Parse failures on incoming radio bytes are expected
//! on a noisy link and are dropped without escalation. The one fatal case is
//! a watchdog refresh failure, which the caller above this core must treat
//! as unrecoverable.

use thiserror_no_std::Error;

/// Result type for flight-core operations
pub type FlightResult<T> = Result<T, FlightError>;

/// Flight-core errors - kept to one byte for hot-path returns
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightError {
    /// Operation did not complete within its deadline
    #[error("operation timed out")]
    Timeout,

    /// Resource is transiently occupied; retry next tick
    #[error("resource busy")]
    Busy,

    /// Argument outside the accepted domain
    #[error("invalid parameter")]
    InvalidParam,

    /// Peripheral has not finished initialization
    #[error("not ready")]
    NotReady,

    /// Bounded queue is full (push) or empty (pop)
    #[error("resource unavailable")]
    ResourceUnavailable,

    /// Malformed frame or field on the wire
    #[error("parse failure")]
    Parse,

    /// Generic driver failure
    #[error("driver failure")]
    Fail,
}

impl FlightError {
    /// Short static name, useful for log lines on targets without `Display`
    pub const fn name(&self) -> &'static str {
        match self {
            FlightError::Timeout => "timeout",
            FlightError::Busy => "busy",
            FlightError::InvalidParam => "invalid_param",
            FlightError::NotReady => "not_ready",
            FlightError::ResourceUnavailable => "resource_unavailable",
            FlightError::Parse => "parse",
            FlightError::Fail => "fail",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for FlightError {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.name());
    }
}
