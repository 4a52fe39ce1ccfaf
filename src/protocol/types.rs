//! # Shared Telemetry Types
//!
//! Vector types used by the log record decoders, plus little-endian readers
//! over fixed offsets.

use serde::Serialize;
use std::fmt;

use crate::error::{Result, TelloLinkError};

/// Three-axis vector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Comma separated components, full precision
    pub fn to_csv(&self) -> String {
        format!("{:.6},{:.6},{:.6}", self.x, self.y, self.z)
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:5.2} {:5.2} {:5.2}", self.x, self.y, self.z)
    }
}

/// Orientation quaternion as reported by the IMU (q0 is the scalar part)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Quaternion {
    pub q0: f32,
    pub q1: f32,
    pub q2: f32,
    pub q3: f32,
}

impl Quaternion {
    pub fn to_csv(&self) -> String {
        format!("{:.6},{:.6},{:.6},{:.6}", self.q0, self.q1, self.q2, self.q3)
    }
}

impl fmt::Display for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:5.2} {:5.2} {:5.2} {:5.2}", self.q0, self.q1, self.q2, self.q3)
    }
}

/// Fail with `OutOfRange` unless `data` holds at least `needed` bytes
pub(crate) fn require_len(what: &'static str, data: &[u8], needed: usize) -> Result<()> {
    if data.len() < needed {
        return Err(TelloLinkError::OutOfRange {
            what,
            needed,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Read a little-endian i16; caller guarantees bounds
pub(crate) fn read_i16_le(data: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Read a little-endian u16; caller guarantees bounds
pub(crate) fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Read a little-endian f32; caller guarantees bounds
pub(crate) fn read_f32_le(data: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Read three consecutive little-endian f32 values
pub(crate) fn read_vector3(data: &[u8], offset: usize) -> Vector3 {
    Vector3 {
        x: read_f32_le(data, offset),
        y: read_f32_le(data, offset + 4),
        z: read_f32_le(data, offset + 8),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_signed_and_unsigned() {
        let data = [0xFF, 0xFF, 0x34, 0x12];
        assert_eq!(read_i16_le(&data, 0), -1);
        assert_eq!(read_u16_le(&data, 0), 0xFFFF);
        assert_eq!(read_u16_le(&data, 2), 0x1234);
    }

    #[test]
    fn test_read_vector3() {
        let mut data = vec![0u8; 2];
        for v in [1.5f32, -2.0, 0.25] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        assert_eq!(read_vector3(&data, 2), Vector3::new(1.5, -2.0, 0.25));
    }

    #[test]
    fn test_require_len() {
        assert!(require_len("x", &[0u8; 4], 4).is_ok());
        let err = require_len("x", &[0u8; 3], 4).unwrap_err();
        assert!(matches!(err, TelloLinkError::OutOfRange { needed: 4, actual: 3, .. }));
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(Vector3::new(1.0, -0.5, 10.25).to_string(), " 1.00 -0.50 10.25");
        assert_eq!(Vector3::new(1.0, 2.0, 3.0).to_csv(), "1.000000,2.000000,3.000000");
    }
}
