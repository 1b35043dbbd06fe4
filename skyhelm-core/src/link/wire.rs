//! Downlink Message Layouts and Frame Encoding
//!
//! ## Frame format
//!
//! Every frame on the radio, both directions, is:
//!
//! ```text
//! ┌──────┬─────┬─────┬───────┬────────┬───────┬─────────┬────────┬────────┐
//! │ 0xFE │ len │ seq │ sysid │ compid │ msgid │ payload │ crc_lo │ crc_hi │
//! └──────┴─────┴─────┴───────┴────────┴───────┴─────────┴────────┴────────┘
//! ```
//!
//! `len` counts payload bytes only; a frame occupies `len + 8` bytes. The
//! checksum covers `len` through the payload plus the per-message seed
//! byte from [`seed_for`].
//!
//! ## Payload layouts
//!
//! Fields are little-endian and ordered largest-type-first within each
//! message (ties keep declaration order), so the layouts here look
//! shuffled relative to the field lists in ground-station documentation.
//! That reordering is part of the wire format.
//!
//! Payload sizes are fixed per message id. The receive side uses the same
//! tables to validate incoming length before buffering.

use crate::constants::link::{COMPONENT_ID, MAX_FRAME_BYTES, SYSTEM_ID};
use crate::events::{ParamKey, TelemetryEvent};
use crate::link::crc;

/// Frame start marker
pub const STX: u8 = 0xFE;

/// Bytes before the payload
pub const HEADER_BYTES: usize = 6;

/// Header plus trailing checksum
pub const FRAME_OVERHEAD_BYTES: usize = 8;

/// Largest payload in the downlink set (RC channels)
pub const MAX_PAYLOAD_BYTES: usize = 42;

// ===== MESSAGE IDS =====

/// Liveness and mode summary
pub const MSG_HEARTBEAT: u8 = 0;
/// Ground station asks for the whole parameter table
pub const MSG_PARAM_REQUEST_LIST: u8 = 21;
/// One parameter table entry
pub const MSG_PARAM_VALUE: u8 = 22;
/// Ground station writes one parameter
pub const MSG_PARAM_SET: u8 = 23;
/// Raw GNSS fix
pub const MSG_GPS_RAW_INT: u8 = 24;
/// Unscaled inertial sample
pub const MSG_RAW_IMU: u8 = 27;
/// Fused attitude estimate
pub const MSG_ATTITUDE: u8 = 30;
/// RC channel echo
pub const MSG_RC_CHANNELS: u8 = 65;
/// Battery health
pub const MSG_BATTERY_STATUS: u8 = 147;

// ===== ENUM VALUES CARRIED IN PAYLOADS =====

/// Airframe class reported in heartbeats
pub const MAV_TYPE_FIXED_WING: u8 = 1;
/// Autopilot family code for stacks outside the well-known list
pub const MAV_AUTOPILOT_INVALID: u8 = 8;
/// Powered, disarmed
pub const MAV_STATE_STANDBY: u8 = 3;
/// Armed and flying
pub const MAV_STATE_ACTIVE: u8 = 4;
/// A failure condition is active
pub const MAV_STATE_CRITICAL: u8 = 5;
/// Pilot inputs are live
pub const MAV_MODE_FLAG_MANUAL_INPUT_ENABLED: u8 = 64;
/// Motors are armed
pub const MAV_MODE_FLAG_SAFETY_ARMED: u8 = 128;
/// Parameter values are 32-bit floats
pub const MAV_PARAM_TYPE_REAL32: u8 = 9;
/// Battery role not reported
pub const MAV_BATTERY_FUNCTION_UNKNOWN: u8 = 0;
/// Lithium polymer chemistry
pub const MAV_BATTERY_TYPE_LIPO: u8 = 1;

/// Protocol minor version byte in heartbeats
const MAVLINK_VERSION: u8 = 3;

/// Checksum seed byte per message id
pub(crate) const fn seed_for(msg_id: u8) -> Option<u8> {
    match msg_id {
        MSG_HEARTBEAT => Some(50),
        MSG_PARAM_REQUEST_LIST => Some(159),
        MSG_PARAM_VALUE => Some(220),
        MSG_PARAM_SET => Some(168),
        MSG_GPS_RAW_INT => Some(24),
        MSG_RAW_IMU => Some(144),
        MSG_ATTITUDE => Some(39),
        MSG_RC_CHANNELS => Some(118),
        MSG_BATTERY_STATUS => Some(154),
        _ => None,
    }
}

/// Fixed payload size per message id
pub(crate) const fn payload_len_for(msg_id: u8) -> Option<u8> {
    match msg_id {
        MSG_HEARTBEAT => Some(9),
        MSG_PARAM_REQUEST_LIST => Some(2),
        MSG_PARAM_VALUE => Some(25),
        MSG_PARAM_SET => Some(23),
        MSG_GPS_RAW_INT => Some(30),
        MSG_RAW_IMU => Some(26),
        MSG_ATTITUDE => Some(28),
        MSG_RC_CHANNELS => Some(42),
        MSG_BATTERY_STATUS => Some(36),
        _ => None,
    }
}

/// One packed frame, stored by value
///
/// Frames sit in the transmit queue and the deferred-overflow slot
/// between ticks; holding the packed bytes means a deferred frame goes
/// out byte-identical, sequence number included.
#[derive(Clone, Copy)]
pub struct Frame {
    len: u8,
    bytes: [u8; MAX_FRAME_BYTES],
}

impl Frame {
    const fn empty() -> Self {
        Self {
            len: 0,
            bytes: [0u8; MAX_FRAME_BYTES],
        }
    }

    fn push(&mut self, byte: u8) {
        self.bytes[self.len as usize] = byte;
        self.len += 1;
    }

    fn extend(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.push(byte);
        }
    }

    /// Packed frame bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// Total frame size on the wire
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// `true` only for a default-constructed frame
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Frame {}

impl core::fmt::Debug for Frame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Frame[{}]", self.len)?;
        f.debug_list().entries(self.as_bytes()).finish()
    }
}

/// Little-endian payload builder
struct Cursor {
    buf: [u8; MAX_PAYLOAD_BYTES],
    at: usize,
}

impl Cursor {
    fn new() -> Self {
        Self {
            buf: [0u8; MAX_PAYLOAD_BYTES],
            at: 0,
        }
    }

    fn put(&mut self, bytes: &[u8]) {
        self.buf[self.at..self.at + bytes.len()].copy_from_slice(bytes);
        self.at += bytes.len();
    }

    fn put_u8(&mut self, v: u8) {
        self.put(&[v]);
    }

    fn put_i8(&mut self, v: i8) {
        self.put(&v.to_le_bytes());
    }

    fn put_u16(&mut self, v: u16) {
        self.put(&v.to_le_bytes());
    }

    fn put_i16(&mut self, v: i16) {
        self.put(&v.to_le_bytes());
    }

    fn put_u32(&mut self, v: u32) {
        self.put(&v.to_le_bytes());
    }

    fn put_i32(&mut self, v: i32) {
        self.put(&v.to_le_bytes());
    }

    fn put_u64(&mut self, v: u64) {
        self.put(&v.to_le_bytes());
    }

    fn put_f32(&mut self, v: f32) {
        self.put(&v.to_le_bytes());
    }

    fn bytes(&self) -> &[u8] {
        &self.buf[..self.at]
    }
}

/// Stateful frame encoder for one link
///
/// Owns the sequence counter; every frame built through one encoder gets
/// the next sequence byte, wrapping 255 to 0.
#[derive(Debug, Default)]
pub struct FrameEncoder {
    seq: u8,
}

impl FrameEncoder {
    /// Encoder starting at sequence zero
    pub const fn new() -> Self {
        Self { seq: 0 }
    }

    /// Pack one telemetry event into a frame
    pub fn encode(&mut self, event: &TelemetryEvent) -> Frame {
        let mut cur = Cursor::new();
        let msg_id = match *event {
            TelemetryEvent::Heartbeat {
                base_mode,
                custom_mode,
                system_status,
                ..
            } => {
                cur.put_u32(custom_mode);
                cur.put_u8(MAV_TYPE_FIXED_WING);
                cur.put_u8(MAV_AUTOPILOT_INVALID);
                cur.put_u8(base_mode);
                cur.put_u8(system_status);
                cur.put_u8(MAVLINK_VERSION);
                MSG_HEARTBEAT
            }

            TelemetryEvent::GpsFix {
                fix_type,
                lat_e7,
                lon_e7,
                alt_mm,
                vel_cm_s,
                cog_cdeg,
                satellites,
                timestamp,
            } => {
                cur.put_u64(timestamp.wrapping_mul(1000));
                cur.put_i32(lat_e7);
                cur.put_i32(lon_e7);
                cur.put_i32(alt_mm);
                // Dilution estimates are not available from the driver
                cur.put_u16(u16::MAX);
                cur.put_u16(u16::MAX);
                cur.put_u16(vel_cm_s);
                cur.put_u16(cog_cdeg);
                cur.put_u8(fix_type);
                cur.put_u8(satellites);
                MSG_GPS_RAW_INT
            }

            TelemetryEvent::RcEcho {
                channels_ppm,
                timestamp,
            } => {
                cur.put_u32(timestamp as u32);
                // Wire order swaps throttle/yaw and arm/flap relative to
                // the command struct
                cur.put_u16(channels_ppm[0]); // roll
                cur.put_u16(channels_ppm[1]); // pitch
                cur.put_u16(channels_ppm[3]); // throttle
                cur.put_u16(channels_ppm[2]); // yaw
                cur.put_u16(channels_ppm[5]); // arm
                cur.put_u16(channels_ppm[4]); // flap
                for _ in 6..18 {
                    cur.put_u16(u16::MAX);
                }
                cur.put_u8(6); // channels in use
                cur.put_u8(255); // rssi unknown
                MSG_RC_CHANNELS
            }

            TelemetryEvent::Battery {
                id,
                voltages_mv,
                current_ca,
                temperature_cdeg,
                current_consumed_mah,
                energy_consumed_hj,
                remaining_pct,
                ..
            } => {
                cur.put_i32(current_consumed_mah);
                cur.put_i32(energy_consumed_hj);
                cur.put_i16(temperature_cdeg);
                for mv in voltages_mv {
                    cur.put_u16(mv);
                }
                cur.put_i16(current_ca);
                cur.put_u8(id);
                cur.put_u8(MAV_BATTERY_FUNCTION_UNKNOWN);
                cur.put_u8(MAV_BATTERY_TYPE_LIPO);
                cur.put_i8(remaining_pct);
                MSG_BATTERY_STATUS
            }

            TelemetryEvent::RawImu {
                acc,
                gyro,
                timestamp,
            } => {
                cur.put_u64(timestamp.wrapping_mul(1000));
                for a in acc {
                    cur.put_i16(a);
                }
                for g in gyro {
                    cur.put_i16(g);
                }
                // No magnetometer on the bus
                for _ in 0..3 {
                    cur.put_i16(0);
                }
                MSG_RAW_IMU
            }

            TelemetryEvent::Attitude {
                roll,
                pitch,
                yaw,
                rollspeed,
                pitchspeed,
                yawspeed,
                timestamp,
            } => {
                cur.put_u32(timestamp as u32);
                cur.put_f32(roll);
                cur.put_f32(pitch);
                cur.put_f32(yaw);
                cur.put_f32(rollspeed);
                cur.put_f32(pitchspeed);
                cur.put_f32(yawspeed);
                MSG_ATTITUDE
            }

            TelemetryEvent::ParamValue {
                key,
                value,
                index,
                count,
                ..
            } => {
                cur.put_f32(value);
                cur.put_u16(count);
                cur.put_u16(index);
                cur.put(&key.as_wire());
                cur.put_u8(MAV_PARAM_TYPE_REAL32);
                MSG_PARAM_VALUE
            }
        };

        self.frame(msg_id, cur.bytes())
    }

    /// Build a parameter-write frame
    ///
    /// The ground station's half of the protocol; here for test harnesses
    /// and bench tooling that exercise the receive parser.
    pub fn param_set(
        &mut self,
        key: &ParamKey,
        value: f32,
        target_system: u8,
        target_component: u8,
    ) -> Frame {
        let mut cur = Cursor::new();
        cur.put_f32(value);
        cur.put_u8(target_system);
        cur.put_u8(target_component);
        cur.put(&key.as_wire());
        cur.put_u8(MAV_PARAM_TYPE_REAL32);
        self.frame(MSG_PARAM_SET, cur.bytes())
    }

    /// Build a parameter-table request frame
    ///
    /// Ground-side helper, like [`param_set`](Self::param_set).
    pub fn param_request_list(&mut self, target_system: u8, target_component: u8) -> Frame {
        let mut cur = Cursor::new();
        cur.put_u8(target_system);
        cur.put_u8(target_component);
        self.frame(MSG_PARAM_REQUEST_LIST, cur.bytes())
    }

    fn frame(&mut self, msg_id: u8, payload: &[u8]) -> Frame {
        let mut frame = Frame::empty();
        frame.push(STX);
        frame.push(payload.len() as u8);
        frame.push(self.seq);
        self.seq = self.seq.wrapping_add(1);
        frame.push(SYSTEM_ID);
        frame.push(COMPONENT_ID);
        frame.push(msg_id);
        frame.extend(payload);

        // Internal callers only pass ids from the tables above
        let seed = seed_for(msg_id).unwrap_or(0);
        let sum = crc::checksum(&frame.bytes[1..frame.len as usize], seed);
        frame.push((sum & 0xFF) as u8);
        frame.push((sum >> 8) as u8);
        frame
    }
}

/// Decoded parameter-write request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSetRequest {
    /// Key named on the wire
    pub key: ParamKey,
    /// Requested value
    pub value: f32,
    /// Addressed system
    pub target_system: u8,
    /// Addressed component
    pub target_component: u8,
}

/// Decode a parameter-write payload
pub fn decode_param_set(payload: &[u8]) -> Option<ParamSetRequest> {
    if payload.len() != payload_len_for(MSG_PARAM_SET)? as usize {
        return None;
    }

    let value = f32::from_le_bytes(payload[0..4].try_into().ok()?);
    let target_system = payload[4];
    let target_component = payload[5];
    let mut id = [0u8; 16];
    id.copy_from_slice(&payload[6..22]);

    Some(ParamSetRequest {
        key: ParamKey::from_wire(&id),
        value,
        target_system,
        target_component,
    })
}

/// Decode a parameter-table request payload into (system, component)
pub fn decode_param_request_list(payload: &[u8]) -> Option<(u8, u8)> {
    if payload.len() != payload_len_for(MSG_PARAM_REQUEST_LIST)? as usize {
        return None;
    }
    Some((payload[0], payload[1]))
}
