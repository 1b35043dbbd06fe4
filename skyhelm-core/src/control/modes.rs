//! Flight-Mode Strategies
//!
//! ## Overview
//!
//! A flight mode turns stick demands plus the current attitude estimate
//! into per-axis output demands. The set of modes is closed and known at
//! build time, dispatched through [`FlightMode`] with a plain `match`:
//!
//! - [`FlightMode::Direct`] passes stick percents straight through. The
//!   pilot flies the surfaces.
//! - [`FlightMode::Fbwa`] (fly-by-wire A) reinterprets roll and pitch
//!   sticks as bank and pitch angle setpoints and closes the loop with
//!   one PID per axis. Full stick is a fixed angle, never more.
//!
//! Mode selection happens at configuration time. Mid-flight switching is
//! a matter of assigning a new value; each mode owns all of its state.

use crate::command::{ControlCommand, DroneState};
use crate::constants::control::{
    AXIS_CENTER, AXIS_MAX, AXIS_MIN, FBWA_INTEGRAL_LIMIT, FBWA_OUTPUT_LIMIT, FBWA_OUTPUT_SHIFT,
    FBWA_PITCH_LIMIT_RAD, FBWA_ROLL_LIMIT_RAD,
};
use crate::constants::scheduling::ATTITUDE_TICK_MS;
use crate::control::pid::{PidConfig, PidController};

/// Per-axis output demands produced by a mode, percent
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisDemands {
    /// Roll surface demand
    pub roll: f32,
    /// Pitch surface demand
    pub pitch: f32,
    /// Yaw surface demand; also drives steering
    pub yaw: f32,
    /// Throttle demand
    pub throttle: f32,
    /// Flap demand
    pub flap: f32,
}

/// Angle-hold mode closing roll and pitch loops around the estimator
///
/// Gains start at zero, so a freshly constructed FBWA holds every surface
/// at center until the parameter store pushes real gains down.
#[derive(Debug, Clone)]
pub struct FbwaMode {
    roll_pid: PidController,
    pitch_pid: PidController,
    yaw_mix: f32,
}

impl FbwaMode {
    /// FBWA with zero gains and standard clamps
    pub fn new() -> Self {
        let axis_config = PidConfig {
            kp: 0.0,
            ki: 0.0,
            kd: 0.0,
            tau: 0.0,
            output_min: -FBWA_OUTPUT_LIMIT,
            output_max: FBWA_OUTPUT_LIMIT,
            integral_min: -FBWA_INTEGRAL_LIMIT,
            integral_max: FBWA_INTEGRAL_LIMIT,
            sample_time_s: ATTITUDE_TICK_MS as f32 / 1000.0,
        };
        Self {
            roll_pid: PidController::new(axis_config),
            pitch_pid: PidController::new(axis_config),
            yaw_mix: 0.0,
        }
    }

    /// Roll-loop gains
    pub fn set_roll_gains(&mut self, kp: f32, ki: f32, kd: f32, tau: f32) {
        self.roll_pid.set_gains(kp, ki, kd, tau);
    }

    /// Pitch-loop gains
    pub fn set_pitch_gains(&mut self, kp: f32, ki: f32, kd: f32, tau: f32) {
        self.pitch_pid.set_gains(kp, ki, kd, tau);
    }

    /// Proportional gain on both axes
    pub fn set_kp(&mut self, kp: f32) {
        self.roll_pid.set_kp(kp);
        self.pitch_pid.set_kp(kp);
    }

    /// Integral gain on both axes
    pub fn set_ki(&mut self, ki: f32) {
        self.roll_pid.set_ki(ki);
        self.pitch_pid.set_ki(ki);
    }

    /// Derivative gain on both axes
    pub fn set_kd(&mut self, kd: f32) {
        self.roll_pid.set_kd(kd);
        self.pitch_pid.set_kd(kd);
    }

    /// Coordinated-turn mixing factor; values outside [0, 1] are ignored
    pub fn set_yaw_mix(&mut self, mix: f32) {
        if (0.0..=1.0).contains(&mix) {
            self.yaw_mix = mix;
        }
    }

    /// Current mixing factor
    pub fn yaw_mix(&self) -> f32 {
        self.yaw_mix
    }

    /// Stick percent to angle setpoint across [-limit, +limit]
    fn setpoint(percent: f32, limit_rad: f32) -> f32 {
        (percent / AXIS_MAX) * (2.0 * limit_rad) - limit_rad
    }

    fn run(&mut self, command: &ControlCommand, state: &DroneState) -> AxisDemands {
        let roll_sp = Self::setpoint(command.roll, FBWA_ROLL_LIMIT_RAD);
        let pitch_sp = Self::setpoint(command.pitch, FBWA_PITCH_LIMIT_RAD);

        let roll = self.roll_pid.output(roll_sp, state.roll) + FBWA_OUTPUT_SHIFT;
        let pitch = self.pitch_pid.output(pitch_sp, state.pitch) + FBWA_OUTPUT_SHIFT;

        // Feed a slice of the roll correction into yaw to coordinate turns
        let yaw = (command.yaw + self.yaw_mix * (roll - AXIS_CENTER)).clamp(AXIS_MIN, AXIS_MAX);

        AxisDemands {
            roll,
            pitch,
            yaw,
            throttle: command.throttle,
            flap: command.flap,
        }
    }
}

impl Default for FbwaMode {
    fn default() -> Self {
        Self::new()
    }
}

/// Active control strategy
#[derive(Debug, Clone)]
pub enum FlightMode {
    /// Stick percents pass through untouched
    Direct,
    /// Angle hold with per-axis PIDs
    Fbwa(FbwaMode),
}

impl FlightMode {
    /// Map one command through the active strategy
    pub fn run(&mut self, command: &ControlCommand, state: &DroneState) -> AxisDemands {
        match self {
            FlightMode::Direct => AxisDemands {
                roll: command.roll,
                pitch: command.pitch,
                yaw: command.yaw,
                throttle: command.throttle,
                flap: command.flap,
            },
            FlightMode::Fbwa(fbwa) => fbwa.run(command, state),
        }
    }

    /// Mode name for log lines
    pub const fn name(&self) -> &'static str {
        match self {
            FlightMode::Direct => "direct",
            FlightMode::Fbwa(_) => "fbwa",
        }
    }

    /// FBWA state when active
    pub fn fbwa_mut(&mut self) -> Option<&mut FbwaMode> {
        match self {
            FlightMode::Fbwa(fbwa) => Some(fbwa),
            FlightMode::Direct => None,
        }
    }
}
