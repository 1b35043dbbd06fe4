//! Mahony Attitude Estimator
//!
//! ## Overview
//!
//! Complementary filter fusing gyro rates with an accelerometer gravity
//! reference into a unit quaternion. The gyro gives the short-term answer,
//! the accelerometer pulls the long-term drift back toward level through a
//! proportional (and optionally integral) feedback term.
//!
//! ## Algorithm
//!
//! Per update at a fixed sample period:
//!
//! 1. Normalize the accelerometer vector. A zero vector (free fall, sensor
//!    dropout) skips the correction entirely; the gyro still integrates.
//! 2. Estimate the gravity direction from the quaternion and take the
//!    cross product with the measured direction as the orientation error.
//! 3. Feed the error into the gyro rates through `2·Kp`, and into a
//!    persistent integral term through `2·Ki` when Ki is nonzero.
//! 4. First-order quaternion integration at half the sample period, then
//!    renormalize.
//!
//! The filter never fails and needs no calibration data; the quaternion
//! seeds to identity and converges from there.

use libm::{asinf, atan2f, sqrtf};

use crate::constants::control::{
    MAHONY_KI_DEFAULT, MAHONY_KP_DEFAULT, RAD_TO_DEG, YAW_DEGREE_OFFSET,
};

/// Roll/pitch/yaw triple in the unit of the accessor that produced it
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EulerAngles {
    /// Rotation about the body x axis
    pub roll: f32,
    /// Rotation about the body y axis
    pub pitch: f32,
    /// Rotation about the body z axis
    pub yaw: f32,
}

/// Mahony complementary filter
#[derive(Debug, Clone)]
pub struct MahonyAhrs {
    /// Orientation quaternion, w/x/y/z
    q: [f32; 4],
    /// Doubled proportional gain
    two_kp: f32,
    /// Doubled integral gain
    two_ki: f32,
    /// Integral feedback accumulator, per axis
    integral_fb: [f32; 3],
    /// Seconds between updates
    sample_period_s: f32,
}

impl MahonyAhrs {
    /// Filter with default gains at the given sample period
    pub fn new(sample_period_s: f32) -> Self {
        Self::with_gains(sample_period_s, MAHONY_KP_DEFAULT, MAHONY_KI_DEFAULT)
    }

    /// Filter with explicit proportional and integral gains
    pub fn with_gains(sample_period_s: f32, kp: f32, ki: f32) -> Self {
        Self {
            q: [1.0, 0.0, 0.0, 0.0],
            two_kp: 2.0 * kp,
            two_ki: 2.0 * ki,
            integral_fb: [0.0; 3],
            sample_period_s,
        }
    }

    /// Back to identity with a cleared integral term
    pub fn reset(&mut self) {
        self.q = [1.0, 0.0, 0.0, 0.0];
        self.integral_fb = [0.0; 3];
    }

    /// Fuse one gyro (rad/s) and accelerometer sample
    ///
    /// Accelerometer units cancel in the normalization; only the direction
    /// is used.
    pub fn update(&mut self, gyro_rad_s: [f32; 3], accel: [f32; 3]) {
        let [mut gx, mut gy, mut gz] = gyro_rad_s;
        let [mut ax, mut ay, mut az] = accel;
        let [q0, q1, q2, q3] = self.q;
        let dt = self.sample_period_s;

        // Valid accelerometer sample: apply the feedback correction
        if !(ax == 0.0 && ay == 0.0 && az == 0.0) {
            let recip_norm = 1.0 / sqrtf(ax * ax + ay * ay + az * az);
            ax *= recip_norm;
            ay *= recip_norm;
            az *= recip_norm;

            // Estimated gravity direction (halved) from the quaternion
            let halfvx = q1 * q3 - q0 * q2;
            let halfvy = q0 * q1 + q2 * q3;
            let halfvz = q0 * q0 - 0.5 + q3 * q3;

            // Orientation error: measured x estimated
            let halfex = ay * halfvz - az * halfvy;
            let halfey = az * halfvx - ax * halfvz;
            let halfez = ax * halfvy - ay * halfvx;

            if self.two_ki > 0.0 {
                self.integral_fb[0] += self.two_ki * halfex * dt;
                self.integral_fb[1] += self.two_ki * halfey * dt;
                self.integral_fb[2] += self.two_ki * halfez * dt;
                gx += self.integral_fb[0];
                gy += self.integral_fb[1];
                gz += self.integral_fb[2];
            } else {
                self.integral_fb = [0.0; 3];
            }

            gx += self.two_kp * halfex;
            gy += self.two_kp * halfey;
            gz += self.two_kp * halfez;
        }

        // Integrate quaternion rate of change
        gx *= 0.5 * dt;
        gy *= 0.5 * dt;
        gz *= 0.5 * dt;
        let qa = q0;
        let qb = q1;
        let qc = q2;
        self.q[0] += -qb * gx - qc * gy - q3 * gz;
        self.q[1] += qa * gx + qc * gz - q3 * gy;
        self.q[2] += qa * gy - qb * gz + q3 * gx;
        self.q[3] += qa * gz + qb * gy - qc * gx;

        let [r0, r1, r2, r3] = self.q;
        let recip_norm = 1.0 / sqrtf(r0 * r0 + r1 * r1 + r2 * r2 + r3 * r3);
        for component in &mut self.q {
            *component *= recip_norm;
        }
    }

    /// Current orientation quaternion, w/x/y/z
    pub fn quaternion(&self) -> [f32; 4] {
        self.q
    }

    /// Euler angles in radians
    pub fn attitude(&self) -> EulerAngles {
        let [q0, q1, q2, q3] = self.q;
        EulerAngles {
            roll: atan2f(
                2.0 * (q0 * q1 + q2 * q3),
                1.0 - 2.0 * (q1 * q1 + q2 * q2),
            ),
            pitch: asinf(-2.0 * (q1 * q3 - q0 * q2)),
            yaw: atan2f(
                2.0 * (q0 * q3 + q1 * q2),
                1.0 - 2.0 * (q2 * q2 + q3 * q3),
            ),
        }
    }

    /// Euler angles in degrees, yaw shifted into [0, 360)
    pub fn attitude_degrees(&self) -> EulerAngles {
        let rad = self.attitude();
        EulerAngles {
            roll: rad.roll * RAD_TO_DEG,
            pitch: rad.pitch * RAD_TO_DEG,
            yaw: rad.yaw * RAD_TO_DEG + YAW_DEGREE_OFFSET,
        }
    }
}
