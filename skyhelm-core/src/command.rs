//! Control commands and vehicle state shared across the managers
//!
//! [`ControlCommand`] is pilot (or autopilot) intent: six axes in percent.
//! [`DroneState`] is the estimator's view of the vehicle. The attitude
//! manager is the only writer of `DroneState`; flight-mode strategies read
//! it when closing the loop.

use crate::constants::control::{AXIS_CENTER, AXIS_MAX, AXIS_MIN};

/// Logical motor output axes.
///
/// Steering is a real output group (tail/nose wheel) even though no command
/// field carries it: it is driven with the yaw percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ControlAxis {
    /// Ailerons
    Roll = 0,
    /// Elevator
    Pitch = 1,
    /// Rudder
    Yaw = 2,
    /// Motor/ESC
    Throttle = 3,
    /// Flaps or other auxiliary surface
    Flap = 4,
    /// Ground steering, slaved to yaw
    Steering = 5,
}

impl ControlAxis {
    /// All axes, in the order the attitude manager drives them.
    pub const ALL: [ControlAxis; 6] = [
        ControlAxis::Yaw,
        ControlAxis::Pitch,
        ControlAxis::Roll,
        ControlAxis::Throttle,
        ControlAxis::Flap,
        ControlAxis::Steering,
    ];

    /// Short name for log lines
    pub const fn name(&self) -> &'static str {
        match self {
            ControlAxis::Roll => "roll",
            ControlAxis::Pitch => "pitch",
            ControlAxis::Yaw => "yaw",
            ControlAxis::Throttle => "throttle",
            ControlAxis::Flap => "flap",
            ControlAxis::Steering => "steering",
        }
    }
}

/// One frame of control intent, each axis nominally in [0, 100] percent
///
/// `arm` is a gate, not an axis: zero means disarmed, anything else armed.
/// There is no validity window on a command; the consumer tracks staleness
/// by counting empty dequeues.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlCommand {
    /// Roll demand (0 = full left, 50 = centered, 100 = full right)
    pub roll: f32,
    /// Pitch demand
    pub pitch: f32,
    /// Yaw demand
    pub yaw: f32,
    /// Throttle demand (0 = idle)
    pub throttle: f32,
    /// Auxiliary/flap demand
    pub flap: f32,
    /// Arm gate: 0 = disarmed, nonzero = armed
    pub arm: f32,
}

impl ControlCommand {
    /// Centered surfaces, idle throttle, disarmed.
    ///
    /// This is what the attitude manager holds before the first command
    /// ever arrives.
    pub const fn neutral() -> Self {
        Self {
            roll: AXIS_CENTER,
            pitch: AXIS_CENTER,
            yaw: AXIS_CENTER,
            throttle: AXIS_MIN,
            flap: AXIS_MIN,
            arm: 0.0,
        }
    }

    /// Whether the arm gate is set
    pub fn is_armed(&self) -> bool {
        self.arm != 0.0
    }

    /// Percent demand for a motor axis. Steering mirrors yaw.
    pub fn axis_percent(&self, axis: ControlAxis) -> f32 {
        match axis {
            ControlAxis::Roll => self.roll,
            ControlAxis::Pitch => self.pitch,
            ControlAxis::Yaw | ControlAxis::Steering => self.yaw,
            ControlAxis::Throttle => self.throttle,
            ControlAxis::Flap => self.flap,
        }
    }

    /// Clamp every axis into [0, 100], leaving `arm` untouched
    pub fn clamped(mut self) -> Self {
        self.roll = self.roll.clamp(AXIS_MIN, AXIS_MAX);
        self.pitch = self.pitch.clamp(AXIS_MIN, AXIS_MAX);
        self.yaw = self.yaw.clamp(AXIS_MIN, AXIS_MAX);
        self.throttle = self.throttle.clamp(AXIS_MIN, AXIS_MAX);
        self.flap = self.flap.clamp(AXIS_MIN, AXIS_MAX);
        self
    }
}

impl Default for ControlCommand {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Estimator output: attitude plus the slower nav quantities
///
/// Angles are radians in the body frame. Altitude is meters above the
/// arming reference, airspeed meters per second. Written once per attitude
/// tick; strategies get a shared borrow.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DroneState {
    /// Roll angle (rad), right-wing-down positive
    pub roll: f32,
    /// Pitch angle (rad), nose-up positive
    pub pitch: f32,
    /// Yaw angle (rad)
    pub yaw: f32,
    /// Altitude above the arming reference (m)
    pub altitude: f32,
    /// Airspeed (m/s); ground speed stands in without a pitot sensor
    pub airspeed: f32,
}
