//! Shared fixtures for wiring the full manager triad in integration tests
//!
//! [`FlightRig`] plays the hardware around one simulated flight computer:
//! scripted sensors and a loopback radio on one side, recorded servo and
//! log activity on the other. Everything scriptable sits behind interior
//! mutability so a test keeps its handles while the managers own the
//! driver ends.

#![allow(dead_code)]

use core::cell::{Cell, RefCell};
use std::collections::VecDeque;

use skyhelm_core::control::{FlightMode, MotorBinding, MotorOutputs};
use skyhelm_core::drivers::{
    Actuator, FlightLogger, Gps, GpsSample, Imu, ImuRaw, ImuSample, PowerMonitor, PowerSample,
    Radio, RcReceiver, RcSample, Watchdog,
};
use skyhelm_core::link::wire::STX;
use skyhelm_core::managers::BatteryMonitor;
use skyhelm_core::time::FixedTime;
use skyhelm_core::{
    AttitudeManager, ControlCommand, CoreQueues, FlightResult, LogLine, SystemManager,
    TelemetryManager,
};

/// Accelerometer counts for straight and level (1 g on -z)
pub const LEVEL_ACC: [i16; 3] = [0, 0, -981];

/// Scripted hardware surrounding one flight computer
pub struct FlightRig {
    /// Clock all three managers tick against
    pub time: FixedTime,
    /// Current inertial sample in counts; acc scales /100, gyro /1000
    pub imu: Cell<ImuRaw>,
    /// Current GNSS fix; `is_new` clears on read
    pub gps: Cell<GpsSample>,
    /// Current RC frame; `is_new` clears on read
    pub rc: Cell<RcSample>,
    /// Battery bus voltage
    pub volts: Cell<f32>,
    servos: RefCell<Vec<(&'static str, f32)>>,
    flight_log: RefCell<Vec<String>>,
    uplink: RefCell<VecDeque<u8>>,
    downlink: RefCell<Vec<u8>>,
    pets: Cell<u32>,
}

impl FlightRig {
    /// Rig at rest: level IMU, no fix, centered sticks, healthy battery
    pub fn new() -> Self {
        Self {
            time: FixedTime::new(0),
            imu: Cell::new(ImuRaw {
                acc: LEVEL_ACC,
                gyro: [0, 0, 0],
            }),
            gps: Cell::new(GpsSample::default()),
            rc: Cell::new(RcSample {
                command: ControlCommand::neutral(),
                is_new: false,
            }),
            volts: Cell::new(12.6),
            servos: RefCell::new(Vec::new()),
            flight_log: RefCell::new(Vec::new()),
            uplink: RefCell::new(VecDeque::new()),
            downlink: RefCell::new(Vec::new()),
            pets: Cell::new(0),
        }
    }

    // Driver ends handed to the managers

    pub fn imu(&self) -> RigImu<'_> {
        RigImu { rig: self }
    }

    pub fn gps(&self) -> RigGps<'_> {
        RigGps { rig: self }
    }

    pub fn rc(&self) -> RigRc<'_> {
        RigRc { rig: self }
    }

    pub fn power(&self) -> RigPower<'_> {
        RigPower { rig: self }
    }

    pub fn servo(&self, tag: &'static str) -> RigServo<'_> {
        RigServo { rig: self, tag }
    }

    pub fn radio(&self) -> RigRadio<'_> {
        RigRadio { rig: self }
    }

    pub fn logger(&self) -> RigLogger<'_> {
        RigLogger { rig: self }
    }

    pub fn watchdog(&self) -> RigWatchdog<'_> {
        RigWatchdog { rig: self }
    }

    // Scripting and inspection

    /// Deliver one fresh RC frame
    pub fn feed_rc(&self, command: ControlCommand) {
        self.rc.set(RcSample {
            command,
            is_new: true,
        });
    }

    /// Queue ground-station bytes on the uplink
    pub fn uplink(&self, bytes: &[u8]) {
        self.uplink.borrow_mut().extend(bytes.iter().copied());
    }

    /// Every value a tagged servo channel has been driven to
    pub fn servo_history(&self, tag: &str) -> Vec<f32> {
        self.servos
            .borrow()
            .iter()
            .filter(|(t, _)| *t == tag)
            .map(|&(_, v)| v)
            .collect()
    }

    /// Most recent value on a tagged servo channel
    pub fn last_servo(&self, tag: &str) -> Option<f32> {
        self.servo_history(tag).last().copied()
    }

    /// Number of flight-log lines containing `needle`
    pub fn logged(&self, needle: &str) -> usize {
        self.flight_log
            .borrow()
            .iter()
            .filter(|line| line.contains(needle))
            .count()
    }

    /// Watchdog refresh count
    pub fn pets(&self) -> u32 {
        self.pets.get()
    }

    /// Transmitted bytes split into whole frames
    ///
    /// Panics if the downlink is not frame-aligned; partial frames on the
    /// wire are a transmit-path bug.
    pub fn downlink_frames(&self) -> Vec<Vec<u8>> {
        let bytes = self.downlink.borrow();
        let mut frames = Vec::new();
        let mut at = 0;
        while at < bytes.len() {
            assert_eq!(bytes[at], STX, "downlink out of frame sync at byte {at}");
            let len = bytes[at + 1] as usize + 8;
            assert!(at + len <= bytes.len(), "truncated frame at byte {at}");
            frames.push(bytes[at..at + len].to_vec());
            at += len;
        }
        frames
    }

    /// Message id of every transmitted frame, in wire order
    pub fn downlink_ids(&self) -> Vec<u8> {
        self.downlink_frames().iter().map(|f| f[5]).collect()
    }
}

impl Default for FlightRig {
    fn default() -> Self {
        Self::new()
    }
}

pub struct RigImu<'a> {
    rig: &'a FlightRig,
}

impl Imu for RigImu<'_> {
    fn init(&mut self) -> FlightResult<()> {
        Ok(())
    }

    fn read_raw(&mut self) -> FlightResult<ImuRaw> {
        Ok(self.rig.imu.get())
    }

    fn scale(&self, raw: ImuRaw) -> ImuSample {
        ImuSample {
            acc_mss: [
                raw.acc[0] as f32 / 100.0,
                raw.acc[1] as f32 / 100.0,
                raw.acc[2] as f32 / 100.0,
            ],
            gyro_rad_s: [
                raw.gyro[0] as f32 / 1000.0,
                raw.gyro[1] as f32 / 1000.0,
                raw.gyro[2] as f32 / 1000.0,
            ],
        }
    }
}

pub struct RigGps<'a> {
    rig: &'a FlightRig,
}

impl Gps for RigGps<'_> {
    fn read(&mut self) -> FlightResult<GpsSample> {
        let sample = self.rig.gps.get();
        self.rig.gps.set(GpsSample {
            is_new: false,
            ..sample
        });
        Ok(sample)
    }
}

pub struct RigRc<'a> {
    rig: &'a FlightRig,
}

impl RcReceiver for RigRc<'_> {
    fn read(&mut self) -> FlightResult<RcSample> {
        let sample = self.rig.rc.get();
        self.rig.rc.set(RcSample {
            is_new: false,
            ..sample
        });
        Ok(sample)
    }
}

pub struct RigPower<'a> {
    rig: &'a FlightRig,
}

impl PowerMonitor for RigPower<'_> {
    fn read(&mut self) -> FlightResult<PowerSample> {
        let voltage_v = self.rig.volts.get();
        Ok(PowerSample {
            voltage_v,
            current_a: 8.0,
            power_w: voltage_v * 8.0,
            charge_mah: 320.0,
            energy_j: 14_000.0,
        })
    }
}

pub struct RigServo<'a> {
    rig: &'a FlightRig,
    tag: &'static str,
}

impl Actuator for RigServo<'_> {
    fn set(&mut self, percent: f32) -> FlightResult<()> {
        self.rig.servos.borrow_mut().push((self.tag, percent));
        Ok(())
    }
}

pub struct RigRadio<'a> {
    rig: &'a FlightRig,
}

impl Radio for RigRadio<'_> {
    fn receive(&mut self, buf: &mut [u8]) -> FlightResult<usize> {
        let mut uplink = self.rig.uplink.borrow_mut();
        let n = uplink.len().min(buf.len());
        for slot in buf.iter_mut().take(n) {
            // Length checked above
            *slot = uplink.pop_front().unwrap();
        }
        Ok(n)
    }

    fn transmit(&mut self, bytes: &[u8]) -> FlightResult<()> {
        self.rig.downlink.borrow_mut().extend_from_slice(bytes);
        Ok(())
    }
}

pub struct RigLogger<'a> {
    rig: &'a FlightRig,
}

impl FlightLogger for RigLogger<'_> {
    fn log(&mut self, line: &LogLine) -> FlightResult<()> {
        self.rig.flight_log.borrow_mut().push(line.as_str().into());
        Ok(())
    }
}

pub struct RigWatchdog<'a> {
    rig: &'a FlightRig,
}

impl Watchdog for RigWatchdog<'_> {
    fn refresh(&mut self) -> FlightResult<()> {
        self.rig.pets.set(self.rig.pets.get() + 1);
        Ok(())
    }
}

pub type RigAttitude<'a> = AttitudeManager<'a, RigImu<'a>, RigGps<'a>, RigServo<'a>, &'a FixedTime>;
pub type RigSystem<'a> =
    SystemManager<'a, RigWatchdog<'a>, RigRc<'a>, RigPower<'a>, RigLogger<'a>, &'a FixedTime>;
pub type RigTelemetry<'a> = TelemetryManager<'a, RigRadio<'a>>;

/// Wire the full triad over one queue block, one tagged servo per axis
pub fn wire_triad<'a>(
    rig: &'a FlightRig,
    queues: &'a CoreQueues,
) -> (RigAttitude<'a>, RigSystem<'a>, RigTelemetry<'a>) {
    let mut outputs = MotorOutputs::new();
    for tag in ["roll", "pitch", "yaw", "throttle", "flap", "steering"] {
        outputs
            .group_mut(axis_for(tag))
            .push(MotorBinding::plain(rig.servo(tag)))
            .unwrap();
    }

    let am = AttitudeManager::new(
        rig.imu(),
        rig.gps(),
        outputs,
        FlightMode::Direct,
        &rig.time,
        queues.attitude_links(),
    );

    let mut sm = SystemManager::new(
        rig.watchdog(),
        rig.rc(),
        rig.logger(),
        &rig.time,
        queues.system_links(),
    );
    sm.add_battery(BatteryMonitor::new(rig.power(), 0)).unwrap();

    let tm = TelemetryManager::new(rig.radio(), queues.telemetry_links());

    (am, sm, tm)
}

fn axis_for(tag: &str) -> skyhelm_core::ControlAxis {
    use skyhelm_core::ControlAxis;
    match tag {
        "roll" => ControlAxis::Roll,
        "pitch" => ControlAxis::Pitch,
        "yaw" => ControlAxis::Yaw,
        "throttle" => ControlAxis::Throttle,
        "flap" => ControlAxis::Flap,
        "steering" => ControlAxis::Steering,
        other => panic!("unknown servo tag {other}"),
    }
}

/// Advance the vehicle one 50 ms system frame
///
/// Five 10 ms attitude ticks, then the 20 Hz system and telemetry pair,
/// matching the rate ratio a real scheduler runs the triad at.
pub fn run_frame(
    rig: &FlightRig,
    am: &mut RigAttitude<'_>,
    sm: &mut RigSystem<'_>,
    tm: &mut RigTelemetry<'_>,
) {
    for _ in 0..5 {
        am.tick().unwrap();
        rig.time.advance(10);
    }
    sm.tick().unwrap();
    tm.tick().unwrap();
}

/// Xorshift RNG for deterministic noise in scripted sensor data
pub struct TestRng {
    state: u32,
}

impl TestRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 17;
        self.state ^= self.state << 5;
        self.state
    }

    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / 16_777_216.0
    }

    pub fn gen_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }
}
