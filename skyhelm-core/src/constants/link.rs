//! Radio link budget, wire identifiers, and frame sizing
//!
//! The transmit budget keeps one tick's worth of frames inside what the
//! radio can actually clock out before the next tick starts. Going over
//! means frames queue up inside the radio and every downstream timestamp
//! drifts late.

use super::scheduling::TELEMETRY_RATE_HZ;

/// Radio UART baud rate (bits/s). Matches the usual 57k6 telemetry modem.
pub const RADIO_BAUD: u32 = 57_600;

/// Fraction of the theoretical per-tick byte capacity we allow ourselves.
///
/// Leaves headroom for start bits, modem overhead, and retransmits on the
/// half-duplex link.
pub const TX_LOADING_FACTOR: f32 = 0.8;

/// Transmit byte budget per telemetry tick.
///
/// `loading × baud / (8 bits × tick rate)` - 288 bytes at 57600 baud, 20 Hz.
pub const MAX_TX_BYTES: usize =
    (TX_LOADING_FACTOR * (RADIO_BAUD / (8 * TELEMETRY_RATE_HZ)) as f32) as usize;

/// Bytes pulled from the radio receive buffer per tick.
///
/// Uplink traffic is a trickle (parameter writes, list requests); this is
/// sized for a worst-case burst of those, not for symmetric bandwidth.
pub const RX_BUFFER_BYTES: usize = 512;

/// Our MAVLink system id on the wire.
pub const SYSTEM_ID: u8 = 1;

/// Our MAVLink component id on the wire.
pub const COMPONENT_ID: u8 = 1;

/// Upper bound on a single packed frame, header and checksum included.
///
/// The largest message we emit is RC_CHANNELS at 50 bytes; 64 leaves slack
/// without inflating the frame queue.
pub const MAX_FRAME_BYTES: usize = 64;

const _: () = assert!(MAX_TX_BYTES >= MAX_FRAME_BYTES);
