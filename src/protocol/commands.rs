//! # Tello Protocol Constants
//!
//! Command and message identifiers plus the small enumerations carried in
//! command payloads.

/// Packet sync byte (always 0xCC)
pub const START_OF_PACKET: u8 = 0xCC;

/// Default packet type byte for commands
pub const DEFAULT_PACKET_TYPE: u8 = 0x68;

/// Size of the packet header: sync(1) + length(2) + crc8(1) + type(1) + command(2) + sequence(2)
pub const PACKET_HEADER_SIZE: usize = 9;

/// Size of the trailing frame crc16
pub const PACKET_CRC_SIZE: usize = 2;

/// Smallest well-formed packet (header plus crc16, no payload)
pub const MIN_PACKET_SIZE: usize = PACKET_HEADER_SIZE + PACKET_CRC_SIZE;

/// Largest packet whose length survives the 3-bit shift of the length field.
///
/// `fixup` shifts only the low byte of the length, so any length above 31
/// loses its upper bits on the wire.
pub const MAX_FRAMED_LENGTH: usize = 0x1F;

// Messages sent by the vehicle
pub const WIFI_MSG: u16 = 0x1A;
pub const VIDEO_RATE_QUERY: u16 = 40;
pub const LIGHT_MSG: u16 = 53;
pub const FLIGHT_MSG: u16 = 0x56;
pub const LOG_MSG: u16 = 0x1050;
pub const LOG_DATA_MSG: u16 = 0x1051;
pub const LOG_CONFIG_MSG: u16 = 0x1052;

// Commands sent to the vehicle
pub const VIDEO_ENCODER_RATE_CMD: u16 = 32;
/// Requests H.264 sequence/picture parameter sets
pub const VIDEO_REQ_SPS_PPS_CMD: u16 = 37;
pub const EXPOSURE_CMD: u16 = 52;
pub const TIME_CMD: u16 = 70;
pub const STICK_CMD: u16 = 80;
pub const TAKEOFF_CMD: u16 = 84;
pub const LAND_CMD: u16 = 85;
pub const FLIP_CMD: u16 = 92;
pub const THROW_TAKEOFF_CMD: u16 = 93;
pub const PALM_LAND_CMD: u16 = 94;
pub const FLATTRIM_CMD: u16 = 4180;

/// Flip direction carried as the single payload byte of `FLIP_CMD`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FlipDirection {
    Front = 0,
    Left = 1,
    Back = 2,
    Right = 3,
    FrontLeft = 4,
    BackLeft = 5,
    BackRight = 6,
    FrontRight = 7,
}

impl TryFrom<u8> for FlipDirection {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Front),
            1 => Ok(Self::Left),
            2 => Ok(Self::Back),
            3 => Ok(Self::Right),
            4 => Ok(Self::FrontLeft),
            5 => Ok(Self::BackLeft),
            6 => Ok(Self::BackRight),
            7 => Ok(Self::FrontRight),
            other => Err(other),
        }
    }
}

/// Video encoder bitrate carried in `VIDEO_ENCODER_RATE_CMD`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum VideoRate {
    Auto = 0,
    Kbps1000 = 1,
    Kbps1500 = 2,
    Kbps2000 = 3,
    Kbps2500 = 4,
}

impl TryFrom<u8> for VideoRate {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Auto),
            1 => Ok(Self::Kbps1000),
            2 => Ok(Self::Kbps1500),
            3 => Ok(Self::Kbps2000),
            4 => Ok(Self::Kbps2500),
            other => Err(other),
        }
    }
}
