//! # Tello Checksums
//!
//! The two checksums carried on the Tello link:
//!
//! - **crc8**: reflected polynomial 0x8C (CRC-8/MAXIM table), initial value 0x77.
//!   Covers the first three bytes of every packet header.
//! - **crc16**: reflected polynomial 0x8408 (CRC-16/KERMIT table), initial value 0x3692.
//!   Covers every byte of a packet before the trailing checksum.

/// Reflected CRC8 polynomial (0x31 bit-reversed)
const CRC8_POLY: u8 = 0x8C;

/// Reflected CRC16 polynomial (0x1021 bit-reversed)
const CRC16_POLY: u16 = 0x8408;

/// Seed used by the vehicle for crc8
pub const CRC8_SEED: u8 = 0x77;

/// Seed used by the vehicle for crc16
pub const CRC16_SEED: u16 = 0x3692;

/// Precomputed CRC8 lookup table
const CRC8_TABLE: [u8; 256] = generate_crc8_table();

/// Precomputed CRC16 lookup table
const CRC16_TABLE: [u16; 256] = generate_crc16_table();

/// Generate CRC8 lookup table at compile time
const fn generate_crc8_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = i as u8;
        let mut j = 0;

        while j < 8 {
            if (crc & 0x01) != 0 {
                crc = (crc >> 1) ^ CRC8_POLY;
            } else {
                crc >>= 1;
            }
            j += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

/// Generate CRC16 lookup table at compile time
const fn generate_crc16_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = i as u16;
        let mut j = 0;

        while j < 8 {
            if (crc & 0x0001) != 0 {
                crc = (crc >> 1) ^ CRC16_POLY;
            } else {
                crc >>= 1;
            }
            j += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

/// Calculate crc8 from an arbitrary seed
pub fn crc8_seeded(seed: u8, data: &[u8]) -> u8 {
    let mut crc = seed;

    for &byte in data {
        crc = CRC8_TABLE[(crc ^ byte) as usize];
    }

    crc
}

/// Calculate crc16 from an arbitrary seed
pub fn crc16_seeded(seed: u16, data: &[u8]) -> u16 {
    let mut crc = seed;

    for &byte in data {
        crc = CRC16_TABLE[((crc ^ byte as u16) & 0xFF) as usize] ^ (crc >> 8);
    }

    crc
}

/// Calculate the packet header checksum
///
/// # Examples
///
/// ```
/// use tello_link::protocol::crc::crc8;
///
/// let header = [0xCC, 0x58, 0x00];
/// let crc = crc8(&header);
/// ```
pub fn crc8(data: &[u8]) -> u8 {
    crc8_seeded(CRC8_SEED, data)
}

/// Calculate the packet frame checksum
pub fn crc16(data: &[u8]) -> u16 {
    crc16_seeded(CRC16_SEED, data)
}

/// Checksum provider used when framing packets and verifying log records
#[cfg_attr(test, mockall::automock)]
pub trait Checksum {
    /// 8-bit checksum over `data`
    fn crc8(&self, data: &[u8]) -> u8;

    /// 16-bit checksum over `data`
    fn crc16(&self, data: &[u8]) -> u16;
}

/// The checksums implemented by the vehicle firmware
#[derive(Debug, Clone, Copy, Default)]
pub struct TelloChecksum;

impl Checksum for TelloChecksum {
    fn crc8(&self, data: &[u8]) -> u8 {
        crc8(data)
    }

    fn crc16(&self, data: &[u8]) -> u16 {
        crc16(data)
    }
}

/// Bitwise crc8, used to verify the lookup table
#[allow(dead_code)]
fn crc8_slow(seed: u8, data: &[u8]) -> u8 {
    let mut crc = seed;

    for &byte in data {
        crc ^= byte;

        for _ in 0..8 {
            if (crc & 0x01) != 0 {
                crc = (crc >> 1) ^ CRC8_POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}

/// Bitwise crc16, used to verify the lookup table
#[allow(dead_code)]
fn crc16_slow(seed: u16, data: &[u8]) -> u16 {
    let mut crc = seed;

    for &byte in data {
        crc ^= byte as u16;

        for _ in 0..8 {
            if (crc & 0x0001) != 0 {
                crc = (crc >> 1) ^ CRC16_POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}
