//! # Attitude Decoder
//!
//! Decodes the IMU attitude log record (id 2048). Only the windows below are
//! read; the rest of the record is firmware padding.
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 20      12    acceleration x/y/z (f32 LE)
//! 32      12    gyro x/y/z (f32 LE)
//! 48      16    quaternion q0..q3 (f32 LE)
//! 76      12    ground velocity x/y/z (f32 LE)
//! ```

use serde::Serialize;
use std::fmt;
use tracing::debug;

use super::types::{read_f32_le, read_vector3, require_len, Quaternion, Vector3};
use crate::error::{hex_string, Result};

/// Minimum payload size for an attitude record
pub const IMU_ATTI_SIZE: usize = 88;

const ACC_OFFSET: usize = 20;
const GYRO_OFFSET: usize = 32;
const QUAT_OFFSET: usize = 48;
const VG_OFFSET: usize = 76;

/// One decoded attitude sample
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AttitudeSample {
    pub acceleration: Vector3,
    pub gyro: Vector3,
    pub quaternion: Quaternion,
    pub ground_velocity: Vector3,
}

impl AttitudeSample {
    /// Decode a de-obfuscated attitude payload
    ///
    /// # Arguments
    ///
    /// * `payload` - At least `IMU_ATTI_SIZE` bytes of f32 fields
    ///
    /// # Returns
    ///
    /// * `Result<AttitudeSample>` - Decoded sample, or `OutOfRange` if the payload is short
    pub fn decode(payload: &[u8]) -> Result<Self> {
        require_len("attitude payload", payload, IMU_ATTI_SIZE)?;

        Ok(Self {
            acceleration: read_vector3(payload, ACC_OFFSET),
            gyro: read_vector3(payload, GYRO_OFFSET),
            quaternion: Quaternion {
                q0: read_f32_le(payload, QUAT_OFFSET),
                q1: read_f32_le(payload, QUAT_OFFSET + 4),
                q2: read_f32_le(payload, QUAT_OFFSET + 8),
                q3: read_f32_le(payload, QUAT_OFFSET + 12),
            },
            ground_velocity: read_vector3(payload, VG_OFFSET),
        })
    }

    pub fn csv_header() -> &'static str {
        "imu.acc_x,imu.acc_y,imu.acc_z,\
         imu.gyro_x,imu.gyro_y,imu.gyro_z,\
         imu.q0,imu.q1,imu.q2,imu.q3,\
         imu.vg_x,imu.vg_y,imu.vg_z"
    }

    pub fn to_csv(&self) -> String {
        format!(
            "{},{},{},{}",
            self.acceleration.to_csv(),
            self.gyro.to_csv(),
            self.quaternion.to_csv(),
            self.ground_velocity.to_csv()
        )
    }
}

impl fmt::Display for AttitudeSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ACC: {} GYRO: {} QUATERNION: {} VG: {}",
            self.acceleration, self.gyro, self.quaternion, self.ground_velocity
        )
    }
}

/// Last attitude sample seen by a session
#[derive(Debug, Clone, Default)]
pub struct ImuAtti {
    /// Update counter of the stream when this sample was written
    pub count: u64,
    pub last: AttitudeSample,
}

impl ImuAtti {
    /// Decode `payload` and store it as the latest sample
    pub fn update(&mut self, payload: &[u8], count: u64) -> Result<AttitudeSample> {
        debug!("ImuAtti: length={} {}", payload.len(), hex_string(payload));
        let sample = AttitudeSample::decode(payload)?;
        self.count = count;
        self.last = sample;
        debug!("ImuAtti: {}", sample);
        Ok(sample)
    }
}
