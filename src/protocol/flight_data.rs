//! # Flight Status Decoder
//!
//! Decodes the bit-packed status record carried by `FLIGHT_MSG`.
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       2     height (i16 LE)
//! 2       2     north_speed (i16 LE)
//! 4       2     east_speed (i16 LE)
//! 6       2     vertical_speed (i16 LE)
//! 8       2     fly_time (i16 LE)
//! 10      1     flags: imu(0) pressure(1) down_visual(2) power(3) battery(4) gravity(5) wind(7)
//! 11      1     imu_calibration_state
//! 12      1     battery_percentage
//! 13      2     drone_fly_time_left (u16 LE)
//! 15      2     drone_battery_left (u16 LE)
//! 17      1     flags: em_sky(0) em_ground(1) em_open(2) drone_hover(3)
//!                      outage_recording(4) battery_low(5) battery_lower(6) factory_mode(7)
//! 18      1     fly_mode
//! 19      1     throw_fly_timer
//! 20      1     camera_state
//! 21      1     electrical_machinery_state
//! 22      1     flags: front_in(0) front_out(1) front_lsc(2)
//! 23      1     flags: temperature_height(0)
//! ```

use serde::Serialize;
use std::fmt;

use super::types::{read_i16_le, read_u16_le};

/// Minimum size of a decodable status record
pub const FLIGHT_DATA_SIZE: usize = 24;

/// Decoded flight status
///
/// A record decoded from fewer than [`FLIGHT_DATA_SIZE`] bytes has every
/// field at its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FlightStatusRecord {
    pub height: i16,
    pub north_speed: i16,
    pub east_speed: i16,
    pub vertical_speed: i16,
    pub fly_time: i16,

    pub imu_state: bool,
    pub pressure_state: bool,
    pub down_visual_state: bool,
    pub power_state: bool,
    pub battery_state: bool,
    pub gravity_state: bool,
    pub wind_state: bool,

    pub imu_calibration_state: u8,
    pub battery_percentage: u8,
    pub drone_fly_time_left: u16,
    pub drone_battery_left: u16,

    pub em_sky: bool,
    pub em_ground: bool,
    pub em_open: bool,
    pub drone_hover: bool,
    pub outage_recording: bool,
    pub battery_low: bool,
    pub battery_lower: bool,
    pub factory_mode: bool,

    pub fly_mode: u8,
    pub throw_fly_timer: u8,
    pub camera_state: u8,
    pub electrical_machinery_state: u8,

    pub front_in: bool,
    pub front_out: bool,
    pub front_lsc: bool,

    pub temperature_height: bool,
}

#[inline]
fn bit(byte: u8, n: u8) -> bool {
    (byte >> n) & 0x1 == 1
}

impl FlightStatusRecord {
    /// Decode a status record
    ///
    /// # Arguments
    ///
    /// * `data` - `FLIGHT_MSG` payload; only the first 24 bytes are read
    ///
    /// # Returns
    ///
    /// * `FlightStatusRecord` - Never fails: short input yields [`FlightStatusRecord::default`]
    ///
    /// # Examples
    ///
    /// ```
    /// use tello_link::protocol::flight_data::FlightStatusRecord;
    ///
    /// let status = FlightStatusRecord::decode(&[0u8; 4]);
    /// assert_eq!(status, FlightStatusRecord::default());
    /// ```
    pub fn decode(data: &[u8]) -> Self {
        if data.len() < FLIGHT_DATA_SIZE {
            return Self::default();
        }

        Self {
            height: read_i16_le(data, 0),
            north_speed: read_i16_le(data, 2),
            east_speed: read_i16_le(data, 4),
            vertical_speed: read_i16_le(data, 6),
            fly_time: read_i16_le(data, 8),

            imu_state: bit(data[10], 0),
            pressure_state: bit(data[10], 1),
            down_visual_state: bit(data[10], 2),
            power_state: bit(data[10], 3),
            battery_state: bit(data[10], 4),
            gravity_state: bit(data[10], 5),
            wind_state: bit(data[10], 7),

            imu_calibration_state: data[11],
            battery_percentage: data[12],
            drone_fly_time_left: read_u16_le(data, 13),
            drone_battery_left: read_u16_le(data, 15),

            em_sky: bit(data[17], 0),
            em_ground: bit(data[17], 1),
            em_open: bit(data[17], 2),
            drone_hover: bit(data[17], 3),
            outage_recording: bit(data[17], 4),
            battery_low: bit(data[17], 5),
            battery_lower: bit(data[17], 6),
            factory_mode: bit(data[17], 7),

            fly_mode: data[18],
            throw_fly_timer: data[19],
            camera_state: data[20],
            electrical_machinery_state: data[21],

            front_in: bit(data[22], 0),
            front_out: bit(data[22], 1),
            front_lsc: bit(data[22], 2),

            temperature_height: bit(data[23], 0),
        }
    }
}

impl fmt::Display for FlightStatusRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "height={:2}, fly_mode=0x{:02x}, battery_percentage={:2}, drone_battery_left=0x{:04x}",
            self.height, self.fly_mode, self.battery_percentage, self.drone_battery_left
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_status() -> [u8; 24] {
        [
            0x0A, 0x00, // height
            0x05, 0x00, // north_speed
            0x00, 0x00, // east_speed
            0x00, 0x00, // vertical_speed
            0x64, 0x00, // fly_time
            0b0001_0001, // imu_state, battery_state
            0x05, // imu_calibration_state
            0x32, // battery_percentage
            0x00, 0x00, // drone_fly_time_left
            0x00, 0x00, // drone_battery_left
            0b0000_0101, // em_sky, em_open
            0x02, 0x03, 0x07, 0x01,
            0b0000_0011, // front_in, front_out
            0b0000_0001, // temperature_height
        ]
    }

    #[test]
    fn test_short_input_is_default() {
        for len in [0usize, 1, 10, 23] {
            let data = vec![0xFFu8; len];
            assert_eq!(FlightStatusRecord::decode(&data), FlightStatusRecord::default());
        }
    }

    #[test]
    fn test_decode_sample_record() {
        let status = FlightStatusRecord::decode(&sample_status());

        assert_eq!(status.height, 10);
        assert_eq!(status.north_speed, 5);
        assert_eq!(status.east_speed, 0);
        assert_eq!(status.fly_time, 100);
        assert!(status.imu_state);
        assert!(!status.pressure_state);
        assert!(status.battery_state);
        assert_eq!(status.imu_calibration_state, 5);
        assert_eq!(status.battery_percentage, 50);
        assert!(status.em_sky);
        assert!(!status.em_ground);
        assert!(status.em_open);
        assert_eq!(status.fly_mode, 2);
        assert_eq!(status.throw_fly_timer, 3);
        assert_eq!(status.camera_state, 7);
        assert_eq!(status.electrical_machinery_state, 1);
        assert!(status.front_in);
        assert!(status.front_out);
        assert!(!status.front_lsc);
        assert!(status.temperature_height);
    }

    #[test]
    fn test_byte_ten_bit_six_is_unused() {
        let mut data = [0u8; 24];
        data[10] = 0b0100_0000;
        assert_eq!(FlightStatusRecord::decode(&data), FlightStatusRecord::default());

        data[10] = 0b1000_0000;
        let status = FlightStatusRecord::decode(&data);
        assert!(status.wind_state);
        assert!(!status.gravity_state);
    }

    #[test]
    fn test_all_flags_byte_seventeen() {
        let mut data = [0u8; 24];
        data[17] = 0xFF;
        let s = FlightStatusRecord::decode(&data);
        assert!(
            s.em_sky && s.em_ground && s.em_open && s.drone_hover
                && s.outage_recording && s.battery_low && s.battery_lower && s.factory_mode
        );
    }

    #[test]
    fn test_signed_and_unsigned_words() {
        let mut data = [0u8; 24];
        data[0] = 0xFE;
        data[1] = 0xFF;
        data[15] = 0x10;
        data[16] = 0x27;
        let status = FlightStatusRecord::decode(&data);
        assert_eq!(status.height, -2);
        assert_eq!(status.drone_battery_left, 10_000);
    }

    #[test]
    fn test_extra_trailing_bytes_ignored() {
        let mut data = sample_status().to_vec();
        data.extend_from_slice(&[0xFF; 8]);
        assert_eq!(FlightStatusRecord::decode(&data), FlightStatusRecord::decode(&sample_status()));
    }

    #[test]
    fn test_display() {
        let status = FlightStatusRecord::decode(&sample_status());
        assert_eq!(
            status.to_string(),
            "height=10, fly_mode=0x02, battery_percentage=50, drone_battery_left=0x0000"
        );
    }
}
