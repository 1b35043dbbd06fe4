//! The Three Cooperating Managers
//!
//! ## Overview
//!
//! The flight core is a triad of periodically ticked managers wired
//! together by bounded queues:
//!
//! ```text
//!          commands                    events
//!   ┌──────────────────► Attitude ───────────────┐
//!   │                      │  ▲                  ▼
//! System ◄────logs─────────┘  └──config──── Telemetry ◄──radio──► GCS
//!   │                                            │
//!   └────────────────── events ──────────────────┘
//!                   ◄── requests ────────────────┘
//! ```
//!
//! - [`AttitudeManager`] (100 Hz): estimator, flight mode, mixing,
//!   failsafe, GPS reporting.
//! - [`SystemManager`] (20 Hz): watchdog, RC bridging, battery health,
//!   parameter store, log sink.
//! - [`TelemetryManager`] (20 Hz): wire protocol both directions under a
//!   per-tick byte budget.
//!
//! Ticks never run concurrently with each other; an external scheduler
//! (RTOS tasks, a test loop) provides the periods in
//! [`scheduling`](crate::constants::scheduling).
//!
//! ## Wiring
//!
//! [`CoreQueues`] owns one of every inter-manager queue and hands out
//! per-manager borrow bundles, so construction reads as three lines and
//! no manager can reach a queue it does not own an end of.

// Macro for optional host-side logging; flight logging always goes
// through the FlightLogger driver regardless
#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

pub mod attitude;
pub mod system;
pub mod telemetry;

pub use attitude::{AttitudeLinks, AttitudeManager};
pub use system::{BatteryMonitor, SystemLinks, SystemManager};
pub use telemetry::{TelemetryLinks, TelemetryManager};

use crate::command::ControlCommand;
use crate::constants::queues::{
    COMMAND_QUEUE_DEPTH, CONFIG_QUEUE_DEPTH, LOG_QUEUE_DEPTH, REQUEST_QUEUE_DEPTH,
    TELEMETRY_QUEUE_DEPTH,
};
use crate::events::{ConfigUpdate, LogLine, ManagerRequest, TelemetryEvent};
use crate::queue::MessageQueue;

/// Every queue between the three managers
///
/// Can live in a `static` for RTOS deployments or on a test harness
/// stack; managers borrow their ends from it.
pub struct CoreQueues {
    /// RC commands, system to attitude
    pub commands: MessageQueue<ControlCommand, COMMAND_QUEUE_DEPTH>,
    /// Downlink events, attitude and system to telemetry
    pub events: MessageQueue<TelemetryEvent, TELEMETRY_QUEUE_DEPTH>,
    /// Ground-station requests, telemetry to system
    pub requests: MessageQueue<ManagerRequest, REQUEST_QUEUE_DEPTH>,
    /// Live parameter changes, system to attitude
    pub attitude_config: MessageQueue<ConfigUpdate, CONFIG_QUEUE_DEPTH>,
    /// Log lines, attitude to system
    pub logs: MessageQueue<LogLine, LOG_QUEUE_DEPTH>,
}

impl CoreQueues {
    /// All queues empty
    pub const fn new() -> Self {
        Self {
            commands: MessageQueue::new(),
            events: MessageQueue::new(),
            requests: MessageQueue::new(),
            attitude_config: MessageQueue::new(),
            logs: MessageQueue::new(),
        }
    }

    /// The attitude manager's ends
    pub fn attitude_links(&self) -> AttitudeLinks<'_> {
        AttitudeLinks {
            commands: &self.commands,
            events: &self.events,
            config: &self.attitude_config,
            logs: &self.logs,
        }
    }

    /// The system manager's ends
    pub fn system_links(&self) -> SystemLinks<'_> {
        SystemLinks {
            commands: &self.commands,
            events: &self.events,
            requests: &self.requests,
            attitude_config: &self.attitude_config,
            logs: &self.logs,
        }
    }

    /// The telemetry manager's ends
    pub fn telemetry_links(&self) -> TelemetryLinks<'_> {
        TelemetryLinks {
            events: &self.events,
            requests: &self.requests,
        }
    }
}

impl Default for CoreQueues {
    fn default() -> Self {
        Self::new()
    }
}
