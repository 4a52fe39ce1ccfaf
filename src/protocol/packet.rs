//! # Tello Packet
//!
//! Builds outbound command packets and exposes the fields of inbound ones.
//!
//! ```text
//! [0xCC][len_lo][len_hi][crc8][type][cmd_lo][cmd_hi][seq_lo][seq_hi][payload...][crc16_lo][crc16_hi]
//! ```
//!
//! The length field holds the total packet length shifted left by 3 bits.
//! Only the low byte is shifted, so lengths above [`MAX_FRAMED_LENGTH`]
//! are truncated on the wire. The vehicle expects exactly this encoding.

use bytes::{BufMut, Bytes, BytesMut};
use chrono::{NaiveTime, Timelike};
use tracing::{debug, warn};

use super::commands::*;
use super::crc::{Checksum, TelloChecksum};
use super::types::{read_u16_le, require_len};
use crate::error::Result;

/// Byte length of a time block written by [`Packet::append_time`]
pub const TIME_BLOCK_SIZE: usize = 10;

/// Bytes read by [`Packet::decode_time_from`]
const TIME_DECODE_SIZE: usize = 9;

/// One framed message on the command link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    buf: BytesMut,
}

/// Time of day as decoded from a time payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireTime {
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
    pub millisecond: u16,
}

impl WireTime {
    /// Convert to a `NaiveTime`, `None` if any field is out of range
    pub fn to_naive_time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_milli_opt(
            self.hour as u32,
            self.minute as u32,
            self.second as u32,
            self.millisecond as u32,
        )
    }
}

impl Packet {
    /// Start a command packet with an empty payload
    ///
    /// Length, header crc and sequence number are placeholders until
    /// [`Packet::fixup`] is called.
    ///
    /// # Examples
    ///
    /// ```
    /// use tello_link::protocol::commands::TAKEOFF_CMD;
    /// use tello_link::protocol::packet::Packet;
    ///
    /// let mut pkt = Packet::new_command(TAKEOFF_CMD);
    /// pkt.fixup(0x01E4);
    /// assert_eq!(pkt.buffer()[0], 0xCC);
    /// assert_eq!(pkt.len(), 11);
    /// ```
    pub fn new_command(command_id: u16) -> Self {
        Self::with_type(command_id, DEFAULT_PACKET_TYPE)
    }

    /// Start a command packet with an explicit packet type byte
    pub fn with_type(command_id: u16, packet_type: u8) -> Self {
        let mut buf = BytesMut::with_capacity(PACKET_HEADER_SIZE + 16);
        buf.put_u8(START_OF_PACKET);
        buf.put_u16_le(0); // length
        buf.put_u8(0); // crc8
        buf.put_u8(packet_type);
        buf.put_u16_le(command_id);
        buf.put_u16_le(0); // sequence
        Self { buf }
    }

    /// Wrap bytes verbatim, without validation
    pub fn from_raw(bytes: &[u8]) -> Self {
        Self {
            buf: BytesMut::from(bytes),
        }
    }

    /// Wrap a text command (e.g. the connection request) verbatim
    pub fn from_text(text: &str) -> Self {
        Self::from_raw(text.as_bytes())
    }

    /// Append one payload byte
    pub fn append_byte(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    /// Append a 16-bit payload value, little-endian
    pub fn append_int16(&mut self, value: u16) {
        self.buf.put_u16_le(value);
    }

    /// Append hour, minute, second and milliseconds as 16-bit fields
    ///
    /// The millisecond value is split into its low and high byte and each
    /// byte is written as a full 16-bit field, giving a 10-byte block.
    pub fn append_time<T: Timelike>(&mut self, time: &T) {
        let millis = time.nanosecond() / 1_000_000;
        self.append_int16(time.hour() as u16);
        self.append_int16(time.minute() as u16);
        self.append_int16(time.second() as u16);
        self.append_int16((millis & 0xFF) as u16);
        self.append_int16(((millis >> 8) & 0xFF) as u16);
    }

    /// Stamp length, header crc and sequence number, then append the frame crc16
    ///
    /// # Arguments
    ///
    /// * `sequence_number` - Written little-endian at offsets 7-8
    ///
    /// The length field becomes `(len + 2) << 3`, computed on the low byte
    /// only, so lengths above `MAX_FRAMED_LENGTH` do not survive. The header
    /// crc8 covers bytes 0-2 and the trailing crc16 covers every byte before it.
    ///
    /// Has no effect unless the first byte is the sync byte and the header is
    /// complete. Must be called exactly once per packet: a second call
    /// appends another crc16 over the already framed bytes.
    pub fn fixup(&mut self, sequence_number: u16) {
        self.fixup_with(&TelloChecksum, sequence_number);
    }

    /// [`Packet::fixup`] with an explicit checksum provider
    pub fn fixup_with<C: Checksum + ?Sized>(&mut self, checksum: &C, sequence_number: u16) {
        if self.buf.first() != Some(&START_OF_PACKET) || self.buf.len() < PACKET_HEADER_SIZE {
            return;
        }

        let length = self.buf.len() + PACKET_CRC_SIZE;
        if length > MAX_FRAMED_LENGTH {
            warn!(
                "Packet length {} exceeds {} and will be truncated in the length field",
                length, MAX_FRAMED_LENGTH
            );
        }

        let [len_lo, len_hi] = (length as u16).to_le_bytes();
        self.buf[1] = len_lo << 3;
        self.buf[2] = len_hi;
        let header_crc = checksum.crc8(&self.buf[0..3]);
        self.buf[3] = header_crc;

        let [seq_lo, seq_hi] = sequence_number.to_le_bytes();
        self.buf[7] = seq_lo;
        self.buf[8] = seq_hi;

        let crc = checksum.crc16(&self.buf);
        self.buf.put_u16_le(crc);

        debug!("Framed packet: cmd={} seq={} len={}", self.command_id(), sequence_number, length);
    }

    /// Raw packet bytes
    pub fn buffer(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the packet, returning its bytes for the transport
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Payload between the 9-byte header and the trailing crc16
    ///
    /// Empty when the buffer is too short to hold a header and crc.
    pub fn payload_bytes(&self) -> &[u8] {
        let end = self.buf.len().saturating_sub(PACKET_CRC_SIZE);
        self.buf.get(PACKET_HEADER_SIZE..end).unwrap_or(&[])
    }

    /// Packet type byte (offset 4)
    pub fn packet_type(&self) -> u8 {
        self.buf.get(4).copied().unwrap_or(0)
    }

    /// Command / message id (offsets 5-6)
    pub fn command_id(&self) -> u16 {
        self.u16_at(5)
    }

    /// Sequence number (offsets 7-8)
    pub fn sequence_number(&self) -> u16 {
        self.u16_at(7)
    }

    /// Total packet length as carried in the length field
    pub fn declared_length(&self) -> usize {
        (self.u16_at(1) >> 3) as usize
    }

    fn u16_at(&self, offset: usize) -> u16 {
        if self.buf.len() < offset + 2 {
            return 0;
        }
        read_u16_le(&self.buf, offset)
    }

    /// Decode a time block from this packet's payload (skipping its first byte)
    pub fn decode_time(&self) -> Result<WireTime> {
        let payload = self.payload_bytes();
        Self::decode_time_from(payload.get(1..).unwrap_or(&[]))
    }

    /// Decode a time block from `buf`
    ///
    /// Hour, minute and second are little-endian 16-bit values at offsets
    /// 0, 2 and 4. The millisecond value is assembled from the bytes at
    /// offsets 6 (low) and 8 (high); offset 7 is not read.
    ///
    /// # Arguments
    ///
    /// * `buf` - Time block, at least 9 bytes
    ///
    /// # Returns
    ///
    /// * `Result<WireTime>` - Decoded fields, or `OutOfRange` if `buf` is too short
    pub fn decode_time_from(buf: &[u8]) -> Result<WireTime> {
        require_len("time payload", buf, TIME_DECODE_SIZE)?;

        Ok(WireTime {
            hour: read_u16_le(buf, 0),
            minute: read_u16_le(buf, 2),
            second: read_u16_le(buf, 4),
            millisecond: u16::from_le_bytes([buf[6], buf[8]]),
        })
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}
