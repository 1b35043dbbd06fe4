//! Motor Bindings and Axis Groups
//!
//! ## Overview
//!
//! The airframe wiring layer. Each control axis owns a [`MotorGroup`]: an
//! ordered list of bindings, each pairing an output channel with an
//! inversion flag and a trim offset. Driving an axis fans one percent
//! demand out to every binding:
//!
//! ```text
//! demand ─► + trim ─► clamp [0,100] ─► invert? (100 - x) ─► Actuator::set
//! ```
//!
//! Trim is applied before inversion: a +5 trim on an inverted surface
//! drives 45 from a centered demand, not 55. Both halves of a V-tail get
//! the same trim sign convention that way.
//!
//! Groups are wired once at startup and never change in flight. A binding
//! whose channel fails does not stop the rest of its group; the first
//! error is reported after every channel has been driven.

use heapless::Vec;

use crate::command::ControlAxis;
use crate::constants::control::{AXIS_MAX, AXIS_MIN, MAX_GROUP_MOTORS, TRIM_MAX, TRIM_MIN};
use crate::drivers::Actuator;
use crate::errors::{FlightError, FlightResult};

/// One output channel with its mounting corrections
#[derive(Debug)]
pub struct MotorBinding<A: Actuator> {
    actuator: A,
    inverted: bool,
    trim: i8,
}

impl<A: Actuator> MotorBinding<A> {
    /// Bind a channel; trim is clamped into its legal range
    pub fn new(actuator: A, inverted: bool, trim: i8) -> Self {
        Self {
            actuator,
            inverted,
            trim: trim.clamp(TRIM_MIN, TRIM_MAX),
        }
    }

    /// Straight-through binding with no corrections
    pub fn plain(actuator: A) -> Self {
        Self::new(actuator, false, 0)
    }

    fn drive(&mut self, percent: f32) -> FlightResult<()> {
        let mut command = (percent + self.trim as f32).clamp(AXIS_MIN, AXIS_MAX);
        if self.inverted {
            command = AXIS_MAX - command;
        }
        self.actuator.set(command)
    }

    fn drive_raw(&mut self, percent: f32) -> FlightResult<()> {
        self.actuator.set(percent)
    }
}

/// Ordered bindings for one control axis
#[derive(Debug)]
pub struct MotorGroup<A: Actuator> {
    bindings: Vec<MotorBinding<A>, MAX_GROUP_MOTORS>,
}

impl<A: Actuator> Default for MotorGroup<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Actuator> MotorGroup<A> {
    /// Empty group
    pub const fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Group with a single binding
    pub fn single(binding: MotorBinding<A>) -> Self {
        let mut group = Self::new();
        // Capacity is MAX_GROUP_MOTORS >= 1
        let _ = group.bindings.push(binding);
        group
    }

    /// Append a binding; fails once the group is at capacity
    pub fn push(&mut self, binding: MotorBinding<A>) -> FlightResult<()> {
        self.bindings
            .push(binding)
            .map_err(|_| FlightError::ResourceUnavailable)
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// `true` when no channel is bound
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Drive every binding with trim and inversion applied
    ///
    /// All channels are attempted; the first failure is returned after
    /// the loop completes.
    pub fn drive(&mut self, percent: f32) -> FlightResult<()> {
        let mut first_error = None;
        for binding in &mut self.bindings {
            if let Err(e) = binding.drive(percent) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Drive every binding with the raw value, skipping trim and inversion
    ///
    /// Disarm uses this: a zeroed throttle must mean zero at the ESC no
    /// matter how the channel is mounted or trimmed.
    pub fn drive_raw(&mut self, percent: f32) -> FlightResult<()> {
        let mut first_error = None;
        for binding in &mut self.bindings {
            if let Err(e) = binding.drive_raw(percent) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// All six axis groups of one airframe
#[derive(Debug)]
pub struct MotorOutputs<A: Actuator> {
    /// Rudder and any yaw-coupled surface
    pub yaw: MotorGroup<A>,
    /// Elevator
    pub pitch: MotorGroup<A>,
    /// Ailerons
    pub roll: MotorGroup<A>,
    /// ESC channels
    pub throttle: MotorGroup<A>,
    /// Flap servos
    pub flap: MotorGroup<A>,
    /// Ground steering; driven with the yaw demand
    pub steering: MotorGroup<A>,
}

impl<A: Actuator> Default for MotorOutputs<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Actuator> MotorOutputs<A> {
    /// Outputs with every group empty
    pub const fn new() -> Self {
        Self {
            yaw: MotorGroup::new(),
            pitch: MotorGroup::new(),
            roll: MotorGroup::new(),
            throttle: MotorGroup::new(),
            flap: MotorGroup::new(),
            steering: MotorGroup::new(),
        }
    }

    /// Group for one axis
    pub fn group_mut(&mut self, axis: ControlAxis) -> &mut MotorGroup<A> {
        match axis {
            ControlAxis::Yaw => &mut self.yaw,
            ControlAxis::Pitch => &mut self.pitch,
            ControlAxis::Roll => &mut self.roll,
            ControlAxis::Throttle => &mut self.throttle,
            ControlAxis::Flap => &mut self.flap,
            ControlAxis::Steering => &mut self.steering,
        }
    }
}
