//! Single-Axis PID Controller
//!
//! ## Overview
//!
//! Discrete PID with two refinements over the textbook form:
//!
//! 1. **Derivative on measurement.** The D term differentiates the
//!    measurement, not the error, so a setpoint step does not kick the
//!    output. A rising measurement produces a negative derivative term.
//! 2. **Band-limited derivative.** A first-order low-pass with time
//!    constant `tau` sits on the differentiator, taming sensor noise that
//!    raw differentiation would amplify.
//!
//! The integrator has its own clamp, separate from the output clamp, so
//! a long saturation does not wind up state the plant then has to unwind.
//!
//! All state advances in [`output`](PidController::output), which the
//! caller invokes at the fixed `sample_time_s` the controller was
//! configured with.

/// Gains, clamps, and timing for one controller
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PidConfig {
    /// Proportional gain
    pub kp: f32,
    /// Integral gain
    pub ki: f32,
    /// Derivative gain
    pub kd: f32,
    /// Derivative low-pass time constant (s); zero disables filtering
    pub tau: f32,
    /// Lower output clamp
    pub output_min: f32,
    /// Upper output clamp
    pub output_max: f32,
    /// Lower integrator clamp
    pub integral_min: f32,
    /// Upper integrator clamp
    pub integral_max: f32,
    /// Seconds between `output` calls
    pub sample_time_s: f32,
}

/// Discrete PID controller for one axis
#[derive(Debug, Clone)]
pub struct PidController {
    config: PidConfig,
    integrator: f32,
    differentiator: f32,
    prev_measurement: f32,
}

impl PidController {
    /// Controller at rest with the given configuration
    pub fn new(config: PidConfig) -> Self {
        Self {
            config,
            integrator: 0.0,
            differentiator: 0.0,
            prev_measurement: 0.0,
        }
    }

    /// Replace all gains and the derivative filter constant at once
    pub fn set_gains(&mut self, kp: f32, ki: f32, kd: f32, tau: f32) {
        self.config.kp = kp;
        self.config.ki = ki;
        self.config.kd = kd;
        self.config.tau = tau;
    }

    /// Proportional gain
    pub fn set_kp(&mut self, kp: f32) {
        self.config.kp = kp;
    }

    /// Integral gain
    pub fn set_ki(&mut self, ki: f32) {
        self.config.ki = ki;
    }

    /// Derivative gain
    pub fn set_kd(&mut self, kd: f32) {
        self.config.kd = kd;
    }

    /// Clear integrator, differentiator, and measurement history
    pub fn reset(&mut self) {
        self.integrator = 0.0;
        self.differentiator = 0.0;
        self.prev_measurement = 0.0;
    }

    /// Advance one sample period and return the clamped control output
    pub fn output(&mut self, setpoint: f32, measurement: f32) -> f32 {
        let cfg = &self.config;
        let error = setpoint - measurement;

        let proportional = cfg.kp * error;

        self.integrator = (self.integrator + cfg.ki * error * cfg.sample_time_s)
            .clamp(cfg.integral_min, cfg.integral_max);

        // Derivative on measurement through the low-pass
        self.differentiator = (2.0 * cfg.kd * (self.prev_measurement - measurement)
            + (2.0 * cfg.tau - cfg.sample_time_s) * self.differentiator)
            / (2.0 * cfg.tau + cfg.sample_time_s);

        self.prev_measurement = measurement;

        (proportional + self.integrator + self.differentiator)
            .clamp(cfg.output_min, cfg.output_max)
    }
}
