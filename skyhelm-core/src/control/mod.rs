//! Control primitives: PID, flight-mode strategies, and motor mixing
//!
//! The attitude manager composes these three layers every tick:
//!
//! ```text
//! ControlCommand ─► FlightMode (Direct / FBWA+PID) ─► AxisDemands
//!                                                        │
//!                    MotorOutputs (trim, inversion) ◄────┘
//! ```
//!
//! Everything here is pure computation over plain values. Hardware enters
//! only at the bottom through the [`Actuator`](crate::drivers::Actuator)
//! trait.

pub mod mixer;
pub mod modes;
pub mod pid;

pub use mixer::{MotorBinding, MotorGroup, MotorOutputs};
pub use modes::{AxisDemands, FbwaMode, FlightMode};
pub use pid::{PidConfig, PidController};
