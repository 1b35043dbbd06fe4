//! Flight-control core for SkyHelm
//!
//! Estimation, stabilization, failsafe, and MAVLink telemetry for a small
//! fixed-wing autopilot, split across three cooperating managers: a 100 Hz
//! attitude loop, a 20 Hz system health loop, and a 20 Hz telemetry
//! multiplexer. Hardware stays behind driver traits; the core never touches
//! a register.
//!
//! Key constraints:
//! - `no_std` by default, no heap allocation anywhere
//! - Every cross-manager path is a bounded lock-free queue
//! - One tick never blocks on a driver
//!
//! ```
//! use skyhelm_core::ahrs::MahonyAhrs;
//!
//! // 100 Hz filter, level airframe: gravity alone holds the estimate
//! let mut ahrs = MahonyAhrs::new(0.01);
//! ahrs.update([0.0, 0.0, 0.0], [0.0, 0.0, -9.81]);
//! assert!(ahrs.attitude().roll.abs() < 0.01);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod ahrs;
pub mod command;
pub mod constants;
pub mod control;
pub mod drivers;
pub mod errors;
pub mod events;
pub mod link;
pub mod managers;
pub mod params;
pub mod queue;
pub mod time;

// Public API
pub use command::{ControlAxis, ControlCommand, DroneState};
pub use errors::{FlightError, FlightResult};
pub use events::{ChargeState, LogLine, ParamKey, TelemetryEvent};
pub use managers::{AttitudeManager, CoreQueues, SystemManager, TelemetryManager};
pub use queue::MessageQueue;
pub use time::{TimeSource, Timestamp};

/// Crate version, as baked in at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
