//! Event and Request Types Carried Between Managers
//!
//! ## Overview
//!
//! Everything the managers say to each other travels as one of the small
//! Copy types in this module, over bounded SPSC queues:
//!
//! ```text
//! Attitude ──TelemetryEvent──►┐
//! System   ──TelemetryEvent──►├── Telemetry ──bytes──► radio
//! System   ◄──ManagerRequest──┘
//! System   ──ConfigUpdate───► Attitude / Telemetry
//! Attitude ──LogLine─────────► System ──batch──► logger driver
//! ```
//!
//! ## Design Notes
//!
//! Payloads are tagged variants, not reinterpreted unions: the wire encoder
//! pattern-matches on the tag, and a battery event owns its cell-voltage
//! array by value rather than pointing at a stack frame that is long gone.
//!
//! Each variant carries the monotonic timestamp of its creation. Events are
//! created by a producer tick, consumed and discarded by the telemetry
//! manager within the same or a later tick, and never retained after
//! encoding.
//!
//! Values are stored the way the producer knows them (percent, millivolts,
//! centidegrees); unit quirks demanded by the wire format live in the link
//! codec, not here.

use core::fmt;
use core::fmt::Write as _;

use crate::constants::queues::{LOG_LINE_BYTES, PARAM_KEY_BYTES};
use crate::time::Timestamp;

/// Inline parameter key, bounded to the wire field width
///
/// Keys are plain ASCII in practice; anything longer than the wire allows is
/// rejected at construction so it can never fail later in the encoder.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ParamKey {
    len: u8,
    data: [u8; PARAM_KEY_BYTES],
}

impl ParamKey {
    /// Create from a string slice; `None` if it exceeds the wire width
    pub fn new(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() > PARAM_KEY_BYTES {
            return None;
        }

        let mut data = [0u8; PARAM_KEY_BYTES];
        data[..bytes.len()].copy_from_slice(bytes);

        Some(Self {
            len: bytes.len() as u8,
            data,
        })
    }

    /// Create from a literal; compile-time error past the wire width
    pub const fn from_static(s: &str) -> Self {
        let bytes = s.as_bytes();
        assert!(bytes.len() <= PARAM_KEY_BYTES, "parameter key too long");

        let mut data = [0u8; PARAM_KEY_BYTES];
        let mut i = 0;
        while i < bytes.len() {
            data[i] = bytes[i];
            i += 1;
        }

        Self {
            len: bytes.len() as u8,
            data,
        }
    }

    /// Construct from the raw wire field (NUL-padded, possibly full-width)
    pub fn from_wire(field: &[u8; PARAM_KEY_BYTES]) -> Self {
        let len = field.iter().position(|&b| b == 0).unwrap_or(PARAM_KEY_BYTES);
        let mut data = [0u8; PARAM_KEY_BYTES];
        data[..len].copy_from_slice(&field[..len]);
        Self {
            len: len as u8,
            data,
        }
    }

    /// Key as a string slice
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.data[..self.len as usize]).unwrap_or("")
    }

    /// NUL-padded wire representation
    pub fn as_wire(&self) -> [u8; PARAM_KEY_BYTES] {
        self.data
    }
}

impl fmt::Debug for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

/// Inline log line carried from a producer manager to the system manager
///
/// Formatting that does not fit is truncated at a character boundary; a
/// clipped line beats a dropped one.
#[derive(Clone, Copy)]
pub struct LogLine {
    len: u8,
    data: [u8; LOG_LINE_BYTES],
}

impl LogLine {
    /// Create from a string slice, truncating past the capacity
    pub fn new(s: &str) -> Self {
        let mut line = Self {
            len: 0,
            data: [0u8; LOG_LINE_BYTES],
        };
        line.append(s);
        line
    }

    /// Create from format arguments, truncating past the capacity
    pub fn format(args: fmt::Arguments<'_>) -> Self {
        let mut line = Self {
            len: 0,
            data: [0u8; LOG_LINE_BYTES],
        };
        // Write errors only signal truncation here
        let _ = line.write_fmt(args);
        line
    }

    fn append(&mut self, s: &str) {
        let remaining = LOG_LINE_BYTES - self.len as usize;
        let take = if s.len() <= remaining {
            s.len()
        } else {
            // Back off to a character boundary
            let mut cut = remaining;
            while cut > 0 && !s.is_char_boundary(cut) {
                cut -= 1;
            }
            cut
        };
        self.data[self.len as usize..self.len as usize + take]
            .copy_from_slice(&s.as_bytes()[..take]);
        self.len += take as u8;
    }

    /// Line as a string slice
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.data[..self.len as usize]).unwrap_or("")
    }
}

impl fmt::Write for LogLine {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let before = self.len as usize;
        self.append(s);
        if self.len as usize - before < s.len() {
            Err(fmt::Error)
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

/// Battery charge state as tracked by the system manager
///
/// `wire_code` matches the ground-station convention (1 = normal, 2 = low,
/// 3 = critical); `Undefined` is the pre-first-sample state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChargeState {
    /// No valid sample yet
    Undefined = 0,
    /// Voltage at or above the low threshold
    Ok = 1,
    /// Low dwell exceeded
    Low = 2,
    /// Critical dwell exceeded
    Critical = 3,
}

impl ChargeState {
    /// Ground-station charge-state code
    pub const fn wire_code(&self) -> u8 {
        *self as u8
    }

    /// Short name for log lines
    pub const fn name(&self) -> &'static str {
        match self {
            ChargeState::Undefined => "undefined",
            ChargeState::Ok => "ok",
            ChargeState::Low => "low",
            ChargeState::Critical => "critical",
        }
    }
}

/// Telemetry payloads flowing toward the ground station
///
/// One variant per downlink message type. Producers use the constructors
/// below; the telemetry manager consumes and encodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TelemetryEvent {
    /// Liveness plus arm/link status, 1 Hz from the system manager
    Heartbeat {
        /// Mode flag bits (manual input, safety armed)
        base_mode: u8,
        /// Autopilot-specific mode word, unused
        custom_mode: u32,
        /// Overall system status code
        system_status: u8,
        /// Creation time (ms)
        timestamp: Timestamp,
    },

    /// GPS fix from the attitude manager, gated on receiver freshness
    GpsFix {
        /// 2 = 2D, 3 = 3D
        fix_type: u8,
        /// Latitude, degrees × 1e7
        lat_e7: i32,
        /// Longitude, degrees × 1e7
        lon_e7: i32,
        /// Altitude above the arming reference, millimeters
        alt_mm: i32,
        /// Ground speed, cm/s
        vel_cm_s: u16,
        /// Course over ground, centidegrees; `u16::MAX` when invalid
        cog_cdeg: u16,
        /// Satellites used in the fix
        satellites: u8,
        /// Creation time (ms)
        timestamp: Timestamp,
    },

    /// Echo of the last RC frame, for ground-side stick display
    RcEcho {
        /// PPM microseconds, ordered roll/pitch/yaw/throttle/flap/arm
        channels_ppm: [u16; 6],
        /// Creation time (ms)
        timestamp: Timestamp,
    },

    /// Battery promotion from the system manager's health machine
    Battery {
        /// Configured battery instance id
        id: u8,
        /// Per-cell or bus voltages, millivolts; unused slots `u16::MAX`
        voltages_mv: [u16; 10],
        /// Pack current, centiamps; -1 unknown
        current_ca: i16,
        /// Pack temperature, centidegrees C; `i16::MAX` unknown
        temperature_cdeg: i16,
        /// Consumed charge, mAh; -1 unknown
        current_consumed_mah: i32,
        /// Consumed energy, hJ; -1 unknown
        energy_consumed_hj: i32,
        /// Remaining capacity percent; -1 unknown
        remaining_pct: i8,
        /// Health-machine state that triggered the event
        charge_state: ChargeState,
        /// Creation time (ms)
        timestamp: Timestamp,
    },

    /// Unscaled IMU sample from the attitude manager's sub-rate counter
    RawImu {
        /// Accelerometer x/y/z in sensor units
        acc: [i16; 3],
        /// Gyro x/y/z in sensor units
        gyro: [i16; 3],
        /// Creation time (ms)
        timestamp: Timestamp,
    },

    /// Fused attitude estimate
    Attitude {
        /// Roll (rad)
        roll: f32,
        /// Pitch (rad)
        pitch: f32,
        /// Yaw (rad)
        yaw: f32,
        /// Body roll rate (rad/s); zero without a rate estimate
        rollspeed: f32,
        /// Body pitch rate (rad/s)
        pitchspeed: f32,
        /// Body yaw rate (rad/s)
        yawspeed: f32,
        /// Creation time (ms)
        timestamp: Timestamp,
    },

    /// One parameter-store entry, confirming a write or streaming the table
    ParamValue {
        /// Parameter key
        key: ParamKey,
        /// Current value
        value: f32,
        /// Index of this entry in the table
        index: u16,
        /// Total entries in the table
        count: u16,
        /// Creation time (ms)
        timestamp: Timestamp,
    },
}

impl TelemetryEvent {
    /// Heartbeat constructor
    pub fn heartbeat(
        timestamp: Timestamp,
        base_mode: u8,
        custom_mode: u32,
        system_status: u8,
    ) -> Self {
        TelemetryEvent::Heartbeat {
            base_mode,
            custom_mode,
            system_status,
            timestamp,
        }
    }

    /// RC echo constructor; converts percent demands to PPM microseconds
    ///
    /// `1000 + percent × 10` maps [0, 100] onto the usual 1000-2000 µs
    /// servo range.
    pub fn rc_echo(timestamp: Timestamp, percents: [f32; 6]) -> Self {
        let mut channels_ppm = [0u16; 6];
        for (ppm, pct) in channels_ppm.iter_mut().zip(percents.iter()) {
            *ppm = (1000.0 + pct * 10.0) as u16;
        }
        TelemetryEvent::RcEcho {
            channels_ppm,
            timestamp,
        }
    }

    /// Raw IMU constructor
    pub fn raw_imu(timestamp: Timestamp, acc: [i16; 3], gyro: [i16; 3]) -> Self {
        TelemetryEvent::RawImu {
            acc,
            gyro,
            timestamp,
        }
    }

    /// Attitude constructor; rates default to zero without an estimate
    pub fn attitude(timestamp: Timestamp, roll: f32, pitch: f32, yaw: f32) -> Self {
        TelemetryEvent::Attitude {
            roll,
            pitch,
            yaw,
            rollspeed: 0.0,
            pitchspeed: 0.0,
            yawspeed: 0.0,
            timestamp,
        }
    }

    /// Parameter value constructor
    pub fn param_value(
        timestamp: Timestamp,
        key: ParamKey,
        value: f32,
        index: u16,
        count: u16,
    ) -> Self {
        TelemetryEvent::ParamValue {
            key,
            value,
            index,
            count,
            timestamp,
        }
    }

    /// Creation timestamp of any variant
    pub fn timestamp(&self) -> Timestamp {
        match self {
            TelemetryEvent::Heartbeat { timestamp, .. }
            | TelemetryEvent::GpsFix { timestamp, .. }
            | TelemetryEvent::RcEcho { timestamp, .. }
            | TelemetryEvent::Battery { timestamp, .. }
            | TelemetryEvent::RawImu { timestamp, .. }
            | TelemetryEvent::Attitude { timestamp, .. }
            | TelemetryEvent::ParamValue { timestamp, .. } => *timestamp,
        }
    }

    /// Short name for diagnostics
    pub const fn name(&self) -> &'static str {
        match self {
            TelemetryEvent::Heartbeat { .. } => "heartbeat",
            TelemetryEvent::GpsFix { .. } => "gps_fix",
            TelemetryEvent::RcEcho { .. } => "rc_echo",
            TelemetryEvent::Battery { .. } => "battery",
            TelemetryEvent::RawImu { .. } => "raw_imu",
            TelemetryEvent::Attitude { .. } => "attitude",
            TelemetryEvent::ParamValue { .. } => "param_value",
        }
    }
}

/// Requests from the ground station, relayed by the telemetry manager to
/// the system manager
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ManagerRequest {
    /// Write `value` to the parameter named `key`
    ParamChange {
        /// Parameter key as received on the wire
        key: ParamKey,
        /// Requested value
        value: f32,
    },
    /// Stream the whole parameter table back, one entry per tick
    ParamDump,
}

/// Notification that a parameter owned by the receiving manager changed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigUpdate {
    /// Key that changed
    pub key: ParamKey,
    /// New value already committed to the store
    pub value: f32,
}
