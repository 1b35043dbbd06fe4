//! Inter-manager queue depths and bounded string sizes
//!
//! Every queue is a fixed-capacity SPSC ring ([`crate::queue::MessageQueue`]);
//! one slot stays empty to distinguish full from empty, so a depth of N holds
//! N − 1 messages. Depths must be powers of two.

/// RC-bridge queue, system manager → attitude manager (control commands).
///
/// RC arrives at 20 Hz and drains at 100 Hz; depth is pure burst margin.
pub const COMMAND_QUEUE_DEPTH: usize = 8;

/// Telemetry event queue, attitude/system manager → telemetry manager.
///
/// Worst case per 50 ms telemetry tick: 5 attitude ticks of sub-rate events
/// plus a heartbeat, RC echo, and battery promotions.
pub const TELEMETRY_QUEUE_DEPTH: usize = 32;

/// Ground-station request queue, telemetry manager → system manager.
pub const REQUEST_QUEUE_DEPTH: usize = 8;

/// Config-update queue, system manager → owning manager.
pub const CONFIG_QUEUE_DEPTH: usize = 8;

/// Log-line queue, attitude manager → system manager.
///
/// Also caps the batch handed to the logger driver in one system tick.
pub const LOG_QUEUE_DEPTH: usize = 16;

/// Packed-frame queue internal to the telemetry manager.
pub const FRAME_QUEUE_DEPTH: usize = 16;

/// Longest log line carried between managers (bytes).
pub const LOG_LINE_BYTES: usize = 96;

/// Longest parameter key, matching the wire field (bytes).
pub const PARAM_KEY_BYTES: usize = 16;
