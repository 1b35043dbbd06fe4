//! Scheduling rates for the three managers and their telemetry sub-rates
//!
//! The managers are invoked by an external periodic caller (RTOS task or
//! test loop). These constants describe the rates that caller is expected
//! to honor; the managers themselves only count ticks.

/// Milliseconds per second, for rate/period conversions.
pub const MS_PER_SECOND: u64 = 1000;

// ===== MANAGER TICK RATES =====

/// Attitude manager tick rate (Hz).
///
/// The control loop runs at 100 Hz; the Mahony filter's sample period and
/// the PID loop period both derive from this.
pub const ATTITUDE_RATE_HZ: u32 = 100;

/// Attitude manager tick period (ms).
pub const ATTITUDE_TICK_MS: u64 = MS_PER_SECOND / ATTITUDE_RATE_HZ as u64;

/// System manager tick rate (Hz).
pub const SYSTEM_RATE_HZ: u32 = 20;

/// System manager tick period (ms).
pub const SYSTEM_TICK_MS: u64 = MS_PER_SECOND / SYSTEM_RATE_HZ as u64;

/// Telemetry manager tick rate (Hz).
///
/// Shares the 20 Hz rate with the system manager; the transmit byte budget
/// in [`crate::constants::link`] is derived from it.
pub const TELEMETRY_RATE_HZ: u32 = 20;

/// Telemetry manager tick period (ms).
pub const TELEMETRY_TICK_MS: u64 = MS_PER_SECOND / TELEMETRY_RATE_HZ as u64;

// ===== TELEMETRY SUB-RATES =====
//
// Sub-rates divide the owning manager's tick counter; each must divide its
// manager rate evenly. The system manager checks before incrementing, so
// its sub-rates fire on the first tick; the attitude manager increments
// first, so its sub-rates first fire one divisor period in.

/// GPS fix event rate out of the attitude manager (Hz).
pub const GPS_EVENT_RATE_HZ: u32 = 5;

/// Raw IMU event rate out of the attitude manager (Hz).
pub const RAW_IMU_EVENT_RATE_HZ: u32 = 10;

/// Attitude event rate out of the attitude manager (Hz).
pub const ATTITUDE_EVENT_RATE_HZ: u32 = 20;

/// Heartbeat event rate out of the system manager (Hz).
pub const HEARTBEAT_RATE_HZ: u32 = 1;

/// RC-echo event rate out of the system manager (Hz).
pub const RC_ECHO_RATE_HZ: u32 = 5;

const _: () = {
    assert!(ATTITUDE_RATE_HZ % GPS_EVENT_RATE_HZ == 0);
    assert!(ATTITUDE_RATE_HZ % RAW_IMU_EVENT_RATE_HZ == 0);
    assert!(ATTITUDE_RATE_HZ % ATTITUDE_EVENT_RATE_HZ == 0);
    assert!(SYSTEM_RATE_HZ % HEARTBEAT_RATE_HZ == 0);
    assert!(SYSTEM_RATE_HZ % RC_ECHO_RATE_HZ == 0);
};
