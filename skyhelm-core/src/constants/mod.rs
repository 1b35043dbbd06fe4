//! Constants for the Skyhelm flight core
//!
//! Centralized numeric values with their rationale. Nothing in the managers
//! or codecs should carry a magic number; if a value shows up twice, it
//! belongs here.
//!
//! ## Organization
//!
//! - **Scheduling**: manager tick rates and telemetry sub-rates
//! - **Control**: control-loop limits, failsafe and link timeouts
//! - **Power**: battery thresholds and dwell durations
//! - **Link**: radio budget, wire identifiers, frame sizing
//! - **Queues**: inter-manager queue depths and line lengths

/// Manager tick rates and telemetry sub-rates.
pub mod scheduling;

/// Control-loop limits, angle ranges, failsafe and RC timeouts.
pub mod control;

/// Battery voltage thresholds and debounce dwell times.
pub mod power;

/// Radio link budget, wire identifiers, and frame sizing.
pub mod link;

/// Inter-manager queue depths and bounded string sizes.
pub mod queues;

pub use scheduling::{
    ATTITUDE_RATE_HZ, ATTITUDE_TICK_MS, SYSTEM_RATE_HZ, SYSTEM_TICK_MS,
    TELEMETRY_RATE_HZ, TELEMETRY_TICK_MS,
};

pub use control::{AXIS_CENTER, AXIS_MAX, AXIS_MIN, FAILSAFE_TIMEOUT_MS, RC_LINK_TIMEOUT_MS};

pub use power::{
    BATTERY_CRITICAL_DWELL_MS, BATTERY_CRITICAL_VOLTS, BATTERY_LOW_DWELL_MS, BATTERY_LOW_VOLTS,
};

pub use link::{COMPONENT_ID, MAX_TX_BYTES, SYSTEM_ID};
