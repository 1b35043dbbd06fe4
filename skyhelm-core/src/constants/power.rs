//! Battery thresholds and debounce dwell times
//!
//! Thresholds fit a 3S LiPo pack (nominal 11.1 V): 3.5 V/cell is the usual
//! "land soon" level and 3.27 V/cell is approaching damage territory under
//! load. Dwell times debounce the sag from throttle transients so a punch-out
//! does not fake a dying pack.

/// Bus voltage below which the low-battery dwell runs (V).
pub const BATTERY_LOW_VOLTS: f32 = 10.5;

/// Bus voltage below which the critical-battery dwell runs (V).
pub const BATTERY_CRITICAL_VOLTS: f32 = 9.8;

/// Continuous time below the low threshold before promoting to LOW (ms).
///
/// The dwell must strictly exceed this value.
pub const BATTERY_LOW_DWELL_MS: u64 = 10_000;

/// Continuous time below the critical threshold before promoting to
/// CRITICAL (ms). Strictly-greater, like the low dwell.
pub const BATTERY_CRITICAL_DWELL_MS: u64 = 3_000;

/// Most battery instances the system manager will monitor.
pub const MAX_BATTERIES: usize = 4;
