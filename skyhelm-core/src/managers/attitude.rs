//! Attitude Manager
//!
//! ## Overview
//!
//! The 100 Hz control loop. Each tick it advances the estimator from one
//! IMU sample, turns the most recent RC command into surface and throttle
//! demands through the active flight mode, and drives every motor group.
//! Sensor events leave toward the telemetry manager at fixed sub-rates of
//! the tick counter.
//!
//! ## Failsafe
//!
//! The command queue doubles as the link-liveness signal. Every tick
//! dequeues at most one command; consecutive empty ticks accumulate, and
//! once `empty_ticks × tick_period` strictly exceeds the timeout the
//! manager latches into failsafe: level surfaces, idle throttle, driven
//! through the normal mixing path so trim and inversion still apply. One
//! log line marks entry, one marks recovery; the first dequeued command
//! recovers immediately.
//!
//! While in failsafe the strategy and the disarm override are skipped.
//! GPS reporting and config draining continue.
//!
//! ## Arming
//!
//! A zero arm field on the last command zeroes the throttle group with a
//! raw write after mixing, so no trim or inversion can keep a motor
//! spinning on a disarmed airframe. The false-to-true arm transition
//! re-references relative altitude to the current GPS reading.

use crate::ahrs::MahonyAhrs;
use crate::command::{ControlAxis, ControlCommand, DroneState};
use crate::constants::control::{AXIS_CENTER, AXIS_MIN, FAILSAFE_TIMEOUT_MS};
use crate::constants::queues::{
    COMMAND_QUEUE_DEPTH, CONFIG_QUEUE_DEPTH, LOG_QUEUE_DEPTH, TELEMETRY_QUEUE_DEPTH,
};
use crate::constants::scheduling::{
    ATTITUDE_EVENT_RATE_HZ, ATTITUDE_RATE_HZ, ATTITUDE_TICK_MS, GPS_EVENT_RATE_HZ,
    RAW_IMU_EVENT_RATE_HZ,
};
use crate::control::{AxisDemands, FlightMode, MotorOutputs};
use crate::drivers::{Actuator, Gps, GpsSample, Imu};
use crate::errors::{FlightError, FlightResult};
use crate::events::{ConfigUpdate, LogLine, TelemetryEvent};
use crate::queue::MessageQueue;
use crate::time::TimeSource;

/// Link-loss latch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailsafeState {
    /// Commands are flowing
    Normal,
    /// Command starvation exceeded the timeout
    Failsafe,
}

/// The attitude manager's queue ends
pub struct AttitudeLinks<'q> {
    /// Commands in, from the system manager
    pub commands: &'q MessageQueue<ControlCommand, COMMAND_QUEUE_DEPTH>,
    /// Sensor events out, to the telemetry manager
    pub events: &'q MessageQueue<TelemetryEvent, TELEMETRY_QUEUE_DEPTH>,
    /// Parameter changes in, from the system manager
    pub config: &'q MessageQueue<ConfigUpdate, CONFIG_QUEUE_DEPTH>,
    /// Log lines out, to the system manager
    pub logs: &'q MessageQueue<LogLine, LOG_QUEUE_DEPTH>,
}

/// 100 Hz estimator + control + mixing loop
pub struct AttitudeManager<'q, I, G, A: Actuator, T> {
    imu: I,
    gps: G,
    time: T,
    outputs: MotorOutputs<A>,
    mode: FlightMode,
    ahrs: MahonyAhrs,
    state: DroneState,
    links: AttitudeLinks<'q>,

    counter: u32,
    last_command: ControlCommand,
    empty_ticks: u32,
    failsafe: FailsafeState,
    failsafe_timeout_ms: u64,

    last_gps: GpsSample,
    altitude_ref_m: f32,
    was_armed: bool,
}

impl<'q, I, G, A, T> AttitudeManager<'q, I, G, A, T>
where
    I: Imu,
    G: Gps,
    A: Actuator,
    T: TimeSource,
{
    /// Manager holding neutral commands, level estimate, default timeout
    pub fn new(
        imu: I,
        gps: G,
        outputs: MotorOutputs<A>,
        mode: FlightMode,
        time: T,
        links: AttitudeLinks<'q>,
    ) -> Self {
        Self {
            imu,
            gps,
            time,
            outputs,
            mode,
            ahrs: MahonyAhrs::new(ATTITUDE_TICK_MS as f32 / 1000.0),
            state: DroneState::default(),
            links,
            counter: 0,
            last_command: ControlCommand::neutral(),
            empty_ticks: 0,
            failsafe: FailsafeState::Normal,
            failsafe_timeout_ms: FAILSAFE_TIMEOUT_MS,
            last_gps: GpsSample::default(),
            altitude_ref_m: 0.0,
            was_armed: false,
        }
    }

    /// Bring up the IMU; call once before ticking
    pub fn init(&mut self) -> FlightResult<()> {
        self.imu.init()
    }

    /// Override the command-starvation timeout
    pub fn set_failsafe_timeout_ms(&mut self, timeout_ms: u64) {
        self.failsafe_timeout_ms = timeout_ms;
    }

    /// `true` while the failsafe latch is engaged
    pub fn failsafe_active(&self) -> bool {
        self.failsafe == FailsafeState::Failsafe
    }

    /// Current fused state estimate
    pub fn drone_state(&self) -> &DroneState {
        &self.state
    }

    /// One 10 ms control tick
    ///
    /// Every stage runs even when an earlier one fails; the first error
    /// is returned after the tick completes.
    pub fn tick(&mut self) -> FlightResult<()> {
        self.counter = (self.counter + 1) % ATTITUDE_RATE_HZ;
        let mut first_error: Option<FlightError> = None;

        // Estimator plus sensor events at their sub-rates. A failed read
        // holds the previous estimate; control keeps running.
        match self.imu.read_raw() {
            Ok(raw) => {
                let scaled = self.imu.scale(raw);
                self.ahrs.update(scaled.gyro_rad_s, scaled.acc_mss);
                let att = self.ahrs.attitude();
                self.state.roll = att.roll;
                self.state.pitch = att.pitch;
                self.state.yaw = att.yaw;

                if self.counter % (ATTITUDE_RATE_HZ / RAW_IMU_EVENT_RATE_HZ) == 0 {
                    self.links
                        .events
                        .push(TelemetryEvent::raw_imu(self.time.now(), raw.acc, raw.gyro));
                }
                if self.counter % (ATTITUDE_RATE_HZ / ATTITUDE_EVENT_RATE_HZ) == 0 {
                    self.links.events.push(TelemetryEvent::attitude(
                        self.time.now(),
                        att.roll,
                        att.pitch,
                        att.yaw,
                    ));
                }
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }

        // Command dequeue and the failsafe latch
        match self.links.commands.pop() {
            Some(command) => {
                self.last_command = command;
                self.empty_ticks = 0;
                if self.failsafe == FailsafeState::Failsafe {
                    self.failsafe = FailsafeState::Normal;
                    self.links.logs.push(LogLine::new("control link restored"));
                }
            }
            None => {
                self.empty_ticks += 1;
                if self.failsafe == FailsafeState::Normal
                    && self.empty_ticks as u64 * ATTITUDE_TICK_MS > self.failsafe_timeout_ms
                {
                    self.failsafe = FailsafeState::Failsafe;
                    self.links.logs.push(LogLine::new("failsafe engaged"));
                    log_warn!("failsafe engaged after {} empty ticks", self.empty_ticks);
                }
            }
        }

        // Outputs: failsafe overrides the strategy and the disarm check
        if self.failsafe == FailsafeState::Failsafe {
            let safe = AxisDemands {
                roll: AXIS_CENTER,
                pitch: AXIS_CENTER,
                yaw: AXIS_CENTER,
                throttle: AXIS_MIN,
                flap: AXIS_MIN,
            };
            if let Err(e) = self.drive(&safe) {
                first_error.get_or_insert(e);
            }
        } else {
            let demands = self.mode.run(&self.last_command, &self.state);
            if let Err(e) = self.drive(&demands) {
                first_error.get_or_insert(e);
            }

            // Raw write after mixing: disarmed means stopped, trim and
            // inversion notwithstanding
            if !self.last_command.is_armed() {
                if let Err(e) = self.outputs.throttle.drive_raw(AXIS_MIN) {
                    first_error.get_or_insert(e);
                }
            }
        }

        // GPS housekeeping and the 5 Hz fix event
        match self.gps.read() {
            Ok(sample) => self.last_gps = sample,
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
        let armed = self.last_command.is_armed();
        if armed && !self.was_armed {
            self.altitude_ref_m = self.last_gps.altitude_m;
        }
        self.was_armed = armed;
        if self.counter % (ATTITUDE_RATE_HZ / GPS_EVENT_RATE_HZ) == 0 && self.last_gps.is_new {
            let event = self.gps_event();
            self.links.events.push(event);
        }

        // Live parameter changes from the system manager
        while let Some(update) = self.links.config.pop() {
            if let Some(fbwa) = self.mode.fbwa_mut() {
                match update.key.as_str() {
                    "p" => fbwa.set_kp(update.value),
                    "i" => fbwa.set_ki(update.value),
                    "d" => fbwa.set_kd(update.value),
                    "yaw_mix" => fbwa.set_yaw_mix(update.value),
                    _ => {}
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Fan demands out to the axis groups; steering follows yaw
    fn drive(&mut self, demands: &AxisDemands) -> FlightResult<()> {
        let mut first_error = None;
        for axis in ControlAxis::ALL {
            let percent = match axis {
                ControlAxis::Roll => demands.roll,
                ControlAxis::Pitch => demands.pitch,
                ControlAxis::Yaw | ControlAxis::Steering => demands.yaw,
                ControlAxis::Throttle => demands.throttle,
                ControlAxis::Flap => demands.flap,
            };
            if let Err(e) = self.outputs.group_mut(axis).drive(percent) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn gps_event(&self) -> TelemetryEvent {
        let s = &self.last_gps;

        let cog_cdeg = if s.track_angle_deg.is_finite() {
            let mut deg = s.track_angle_deg % 360.0;
            if deg < 0.0 {
                deg += 360.0;
            }
            (deg * 100.0) as u16
        } else {
            u16::MAX
        };

        TelemetryEvent::GpsFix {
            fix_type: if s.satellites >= 4 { 3 } else { 2 },
            lat_e7: (s.latitude_deg * 1e7) as i32,
            lon_e7: (s.longitude_deg * 1e7) as i32,
            alt_mm: ((s.altitude_m - self.altitude_ref_m) * 1000.0) as i32,
            vel_cm_s: (s.ground_speed_m_s * 100.0) as u16,
            cog_cdeg,
            satellites: s.satellites,
            timestamp: self.time.now(),
        }
    }
}
