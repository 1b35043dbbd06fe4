//! Hardware driver traits the managers are generic over
//!
//! These traits are the only boundary between the control core and a
//! board. Keep them simple - one method per hardware action, plain sample
//! structs, no callbacks. Flight code never touches registers; boards
//! never touch control logic.
//!
//! Managers take their drivers by value at construction and dispatch
//! statically, so a release build monomorphizes straight through to the
//! HAL with no vtables.

use crate::command::ControlCommand;
use crate::errors::FlightResult;
use crate::events::LogLine;

/// One inertial sample in sensor counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImuRaw {
    /// Accelerometer x/y/z counts
    pub acc: [i16; 3],
    /// Gyro x/y/z counts
    pub gyro: [i16; 3],
}

/// One inertial sample in SI units
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImuSample {
    /// Acceleration x/y/z, m/s²
    pub acc_mss: [f32; 3],
    /// Angular rate x/y/z, rad/s
    pub gyro_rad_s: [f32; 3],
}

/// Inertial measurement unit
///
/// Raw counts and scaling are separate so the telemetry path can report
/// exactly what the sensor said while the estimator consumes SI units.
/// Only the driver knows its configured full-scale ranges.
pub trait Imu {
    /// Bring the sensor up; called once before the first tick
    fn init(&mut self) -> FlightResult<()>;

    /// Read the latest sample in sensor counts
    fn read_raw(&mut self) -> FlightResult<ImuRaw>;

    /// Convert counts to SI units
    fn scale(&self, raw: ImuRaw) -> ImuSample;
}

/// One position fix
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpsSample {
    /// Latitude, degrees
    pub latitude_deg: f64,
    /// Longitude, degrees
    pub longitude_deg: f64,
    /// Altitude above mean sea level, meters
    pub altitude_m: f32,
    /// Ground speed, m/s
    pub ground_speed_m_s: f32,
    /// Track angle over ground, degrees; non-finite when the receiver
    /// has no track
    pub track_angle_deg: f32,
    /// North/east/down velocity, m/s
    pub velocity_m_s: [f32; 3],
    /// Satellites used in the solution
    pub satellites: u8,
    /// `true` when this sample is newer than the last read
    pub is_new: bool,
}

/// GNSS receiver
pub trait Gps {
    /// Read the current fix; `is_new` stays false until the next update
    fn read(&mut self) -> FlightResult<GpsSample>;
}

/// One decoded RC frame
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RcSample {
    /// Stick and switch demands as percent axes
    pub command: ControlCommand,
    /// `true` when a frame arrived since the last read
    pub is_new: bool,
}

/// RC receiver link
pub trait RcReceiver {
    /// Read the most recent frame
    fn read(&mut self) -> FlightResult<RcSample>;
}

/// One motor or servo output channel
pub trait Actuator {
    /// Drive the channel to `percent` in [0, 100]
    fn set(&mut self, percent: f32) -> FlightResult<()>;
}

/// One power module sample
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PowerSample {
    /// Bus voltage, volts
    pub voltage_v: f32,
    /// Bus current, amps
    pub current_a: f32,
    /// Instantaneous power, watts
    pub power_w: f32,
    /// Charge drawn since power-up, mAh
    pub charge_mah: f32,
    /// Energy drawn since power-up, joules
    pub energy_j: f32,
}

/// Battery voltage and current sensing
pub trait PowerMonitor {
    /// Read the current sample
    fn read(&mut self) -> FlightResult<PowerSample>;
}

/// Hardware watchdog
pub trait Watchdog {
    /// Pet the watchdog; the system manager calls this first every tick
    /// and treats failure as fatal
    fn refresh(&mut self) -> FlightResult<()>;
}

/// Persistent flight log sink
pub trait FlightLogger {
    /// Write one line
    fn log(&mut self, line: &LogLine) -> FlightResult<()>;

    /// Write a batch of lines; stops at the first failure
    fn log_batch(&mut self, lines: &[LogLine]) -> FlightResult<()> {
        for line in lines {
            self.log(line)?;
        }
        Ok(())
    }
}

/// Ground-facing radio link
pub trait Radio {
    /// Pull received bytes into `buf`, returning how many were written
    fn receive(&mut self, buf: &mut [u8]) -> FlightResult<usize>;

    /// Queue bytes for transmission
    fn transmit(&mut self, bytes: &[u8]) -> FlightResult<()>;
}
