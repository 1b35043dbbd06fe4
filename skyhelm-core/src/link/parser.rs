//! Incremental Receive Parser
//!
//! ## Overview
//!
//! The radio hands the telemetry manager arbitrary byte runs: half a
//! frame now, two and a half frames later. This parser consumes one byte
//! at a time and carries its state across calls, so frame boundaries and
//! read boundaries are unrelated.
//!
//! ```text
//! Idle ─0xFE─► Len ─► Seq ─► SysId ─► CompId ─► MsgId ─► Payload ─► CrcLo ─► CrcHi
//!   ▲                                   │(unknown id / wrong len)      │(bad sum)
//!   └───────────────────────────────────┴────────────────────────────--┘
//! ```
//!
//! Anything malformed - unknown message id, length that does not match
//! the id, checksum failure - silently returns the machine to `Idle`. A
//! payload byte that happens to be 0xFE never restarts the machine; only
//! `Idle` hunts for the magic.
//!
//! Only the two uplink messages decode into [`RxMessage`]; the tables in
//! [`wire`](crate::link::wire) validate everything else far enough to
//! discard it cleanly.

use crate::link::crc;
use crate::link::wire::{
    self, ParamSetRequest, MAX_PAYLOAD_BYTES, MSG_PARAM_REQUEST_LIST, MSG_PARAM_SET, STX,
};

/// Decoded uplink message
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RxMessage {
    /// Ground station writes one parameter
    ParamSet(ParamSetRequest),
    /// Ground station wants the whole table streamed back
    ParamRequestList {
        /// Addressed system
        target_system: u8,
        /// Addressed component
        target_component: u8,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ParseState {
    Idle,
    Len,
    Seq,
    SysId,
    CompId,
    MsgId,
    Payload,
    CrcLo,
    CrcHi,
}

/// Receive-side counters
#[derive(Debug, Default, Clone, Copy)]
pub struct ParserStats {
    /// Frames that passed checksum and decoded
    pub accepted: u32,
    /// Frames dropped for any reason
    pub rejected: u32,
}

/// Byte-at-a-time frame parser
#[derive(Debug)]
pub struct FrameParser {
    state: ParseState,
    len: u8,
    msg_id: u8,
    payload: [u8; MAX_PAYLOAD_BYTES],
    payload_at: usize,
    crc: u16,
    crc_lo: u8,
    stats: ParserStats,
}

impl FrameParser {
    /// Parser hunting for a frame start
    pub const fn new() -> Self {
        Self {
            state: ParseState::Idle,
            len: 0,
            msg_id: 0,
            payload: [0u8; MAX_PAYLOAD_BYTES],
            payload_at: 0,
            crc: crc::CRC_INIT,
            crc_lo: 0,
            stats: ParserStats {
                accepted: 0,
                rejected: 0,
            },
        }
    }

    /// Receive-side counters
    pub fn stats(&self) -> ParserStats {
        self.stats
    }

    fn restart(&mut self) {
        self.state = ParseState::Idle;
        self.payload_at = 0;
    }

    fn reject(&mut self) {
        self.stats.rejected = self.stats.rejected.wrapping_add(1);
        self.restart();
    }

    /// Consume one byte; `Some` when it completes a valid uplink frame
    pub fn push(&mut self, byte: u8) -> Option<RxMessage> {
        match self.state {
            ParseState::Idle => {
                if byte == STX {
                    self.crc = crc::CRC_INIT;
                    self.payload_at = 0;
                    self.state = ParseState::Len;
                }
                None
            }

            ParseState::Len => {
                self.len = byte;
                self.crc = crc::accumulate(byte, self.crc);
                self.state = ParseState::Seq;
                None
            }

            ParseState::Seq => {
                // Sequence gaps are the radio's problem, not ours
                self.crc = crc::accumulate(byte, self.crc);
                self.state = ParseState::SysId;
                None
            }

            ParseState::SysId => {
                self.crc = crc::accumulate(byte, self.crc);
                self.state = ParseState::CompId;
                None
            }

            ParseState::CompId => {
                self.crc = crc::accumulate(byte, self.crc);
                self.state = ParseState::MsgId;
                None
            }

            ParseState::MsgId => {
                self.msg_id = byte;
                self.crc = crc::accumulate(byte, self.crc);
                match wire::payload_len_for(byte) {
                    Some(expected) if expected == self.len => {
                        self.state = if self.len == 0 {
                            ParseState::CrcLo
                        } else {
                            ParseState::Payload
                        };
                    }
                    _ => self.reject(),
                }
                None
            }

            ParseState::Payload => {
                self.payload[self.payload_at] = byte;
                self.payload_at += 1;
                self.crc = crc::accumulate(byte, self.crc);
                if self.payload_at == self.len as usize {
                    self.state = ParseState::CrcLo;
                }
                None
            }

            ParseState::CrcLo => {
                self.crc_lo = byte;
                self.state = ParseState::CrcHi;
                None
            }

            ParseState::CrcHi => {
                let seed = wire::seed_for(self.msg_id).unwrap_or(0);
                let expected = crc::accumulate(seed, self.crc);
                let received = u16::from_le_bytes([self.crc_lo, byte]);
                if expected != received {
                    self.reject();
                    return None;
                }

                let message = self.decode();
                match message {
                    Some(_) => self.stats.accepted = self.stats.accepted.wrapping_add(1),
                    // Valid frame carrying a message we have no handler for
                    None => self.stats.rejected = self.stats.rejected.wrapping_add(1),
                }
                self.restart();
                message
            }
        }
    }

    fn decode(&self) -> Option<RxMessage> {
        let payload = &self.payload[..self.len as usize];
        match self.msg_id {
            MSG_PARAM_SET => wire::decode_param_set(payload).map(RxMessage::ParamSet),
            MSG_PARAM_REQUEST_LIST => {
                let (target_system, target_component) =
                    wire::decode_param_request_list(payload)?;
                Some(RxMessage::ParamRequestList {
                    target_system,
                    target_component,
                })
            }
            _ => None,
        }
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}
