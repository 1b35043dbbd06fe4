//! Telemetry wire protocol: framing, checksums, and the receive parser
//!
//! The ground link speaks MAVLink v1 framing: a magic byte, a one-byte
//! payload length, sequence and address bytes, then the payload and a
//! seeded CRC-16. This module owns every byte-level concern so the
//! telemetry manager deals only in events and frames:
//!
//! - [`crc`] — the checksum both directions share
//! - [`wire`] — message ids, payload layouts, and the frame encoder
//! - [`parser`] — incremental receive state machine for uplink frames

pub mod crc;
pub mod parser;
pub mod wire;

pub use parser::{FrameParser, RxMessage};
pub use wire::{Frame, FrameEncoder, ParamSetRequest};
