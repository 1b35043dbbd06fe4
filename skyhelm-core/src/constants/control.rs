//! Control-loop limits, angle ranges, and safety timeouts

// ===== AXIS RANGE =====

/// Minimum command value on any control axis (percent).
pub const AXIS_MIN: f32 = 0.0;

/// Maximum command value on any control axis (percent).
pub const AXIS_MAX: f32 = 100.0;

/// Centered command value - level stick, neutral surface (percent).
pub const AXIS_CENTER: f32 = 50.0;

// ===== SAFETY TIMEOUTS =====

/// Default time without a dequeued control command before the attitude
/// manager enters failsafe (ms).
///
/// Counted as consecutive empty ticks multiplied by the tick period, and the
/// product must strictly exceed this value: at a 10 ms tick the 101st empty
/// tick (1010 ms) trips, the 100th (1000 ms) does not.
pub const FAILSAFE_TIMEOUT_MS: u64 = 1000;

/// Default time without fresh RC data before the system manager declares the
/// control link down (ms). Strictly-greater comparison, like the failsafe.
pub const RC_LINK_TIMEOUT_MS: u64 = 500;

// ===== FLY-BY-WIRE-A =====

/// Full-deflection roll setpoint magnitude (rad). 45 degrees.
pub const FBWA_ROLL_LIMIT_RAD: f32 = 0.785;

/// Full-deflection pitch setpoint magnitude (rad). 20 degrees.
pub const FBWA_PITCH_LIMIT_RAD: f32 = 0.349;

/// PID output clamp magnitude for both FBWA axes (percent around center).
pub const FBWA_OUTPUT_LIMIT: f32 = 50.0;

/// PID integrator clamp magnitude for both FBWA axes.
pub const FBWA_INTEGRAL_LIMIT: f32 = 50.0;

/// Shift applied to re-center a symmetric PID output into [0, 100].
pub const FBWA_OUTPUT_SHIFT: f32 = 50.0;

// ===== MOTOR MIXING =====

/// Most negative motor trim accepted by a binding (percent).
pub const TRIM_MIN: i8 = -50;

/// Most positive motor trim accepted by a binding (percent).
pub const TRIM_MAX: i8 = 50;

/// Bindings one axis group can carry. Covers a flying wing's paired
/// surfaces with room for a redundant channel.
pub const MAX_GROUP_MOTORS: usize = 4;

// ===== ATTITUDE ESTIMATION =====

/// Default Mahony proportional gain.
pub const MAHONY_KP_DEFAULT: f32 = 0.5;

/// Default Mahony integral gain. Zero disables integral feedback and its
/// windup path entirely.
pub const MAHONY_KI_DEFAULT: f32 = 0.0;

/// Radians to degrees.
pub const RAD_TO_DEG: f32 = 57.29578;

/// Offset added to yaw in the degree accessor only, aligning the heading
/// readout with magnetic-north convention.
pub const YAW_DEGREE_OFFSET: f32 = 180.0;
