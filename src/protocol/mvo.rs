//! # Motion Feedback Decoder
//!
//! Decodes the visual-odometry feedback log record (id 29).
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 2       6     velocity x/y/z (i16 LE, cm/s)
//! 8       12    position x/y/z (f32 LE)
//! ```

use serde::Serialize;
use std::fmt;
use tracing::debug;

use super::types::{read_i16_le, read_vector3, require_len, Vector3};
use crate::error::{hex_string, Result};

/// Minimum payload size for a motion feedback record
pub const MVO_FEEDBACK_SIZE: usize = 20;

/// Velocity fields are transmitted in hundredths of a unit
const VELOCITY_SCALE: f32 = 100.0;

/// One decoded motion feedback sample
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MotionFeedback {
    pub velocity: Vector3,
    pub position: Vector3,
}

impl MotionFeedback {
    /// Decode a de-obfuscated motion feedback payload
    ///
    /// # Arguments
    ///
    /// * `payload` - At least 20 bytes: velocity as three i16 at offset 2, position as three f32 at offset 8
    ///
    /// # Returns
    ///
    /// * `Result<MotionFeedback>` - Velocity scaled by 1/100, or `OutOfRange` if the payload is short
    pub fn decode(payload: &[u8]) -> Result<Self> {
        require_len("motion feedback payload", payload, MVO_FEEDBACK_SIZE)?;

        let velocity = Vector3::new(
            read_i16_le(payload, 2) as f32 / VELOCITY_SCALE,
            read_i16_le(payload, 4) as f32 / VELOCITY_SCALE,
            read_i16_le(payload, 6) as f32 / VELOCITY_SCALE,
        );

        Ok(Self {
            velocity,
            position: read_vector3(payload, 8),
        })
    }

    pub fn csv_header() -> &'static str {
        "mvo.vel_x,mvo.vel_y,mvo.vel_z,mvo.pos_x,mvo.pos_y,mvo.pos_z"
    }

    pub fn to_csv(&self) -> String {
        format!("{},{}", self.velocity.to_csv(), self.position.to_csv())
    }
}

impl fmt::Display for MotionFeedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VEL: {} POS: {}", self.velocity, self.position)
    }
}

/// Last motion feedback seen by a session
#[derive(Debug, Clone, Default)]
pub struct MvoFeedback {
    /// Update counter of the stream when this sample was written
    pub count: u64,
    pub last: MotionFeedback,
}

impl MvoFeedback {
    /// Decode `payload` and store it as the latest sample
    pub fn update(&mut self, payload: &[u8], count: u64) -> Result<MotionFeedback> {
        debug!("MvoFeedback: length={} {}", payload.len(), hex_string(payload));
        let sample = MotionFeedback::decode(payload)?;
        self.count = count;
        self.last = sample;
        debug!("MvoFeedback: {}", sample);
        Ok(sample)
    }
}
