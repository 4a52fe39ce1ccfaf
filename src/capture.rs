//! # Capture Replay
//!
//! Replays a file of inbound datagrams recorded from the vehicle.
//!
//! A capture is the raw bytes of consecutive inbound packets. Each packet
//! starts with the sync byte and carries its own length (length field >> 3),
//! which is how packets are split apart again.

use std::path::Path;
use tracing::{debug, info};

use crate::error::{Result, TelloLinkError};
use crate::protocol::commands::{
    FLIGHT_MSG, LOG_DATA_MSG, MIN_PACKET_SIZE, PACKET_HEADER_SIZE, START_OF_PACKET,
};
use crate::protocol::flight_data::FlightStatusRecord;
use crate::protocol::log_data::{LogData, LogSample};
use crate::protocol::packet::Packet;
use crate::protocol::types::read_u16_le;

/// Offset of the log stream inside a `LOG_DATA_MSG` packet (header plus one status byte)
pub const LOG_DATA_OFFSET: usize = PACKET_HEADER_SIZE + 1;

/// Read a capture file
pub async fn read_capture<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let data = tokio::fs::read(path.as_ref()).await?;
    info!("Loaded capture {} ({} bytes)", path.as_ref().display(), data.len());
    Ok(data)
}

/// Split concatenated inbound packets
///
/// # Errors
///
/// Returns `CorruptStream` if a packet does not start with the sync byte,
/// declares a length shorter than an empty packet, or runs past the end.
pub fn split_datagrams(data: &[u8]) -> Result<Vec<Packet>> {
    let mut packets = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        if data[pos] != START_OF_PACKET || pos + 3 > data.len() {
            return Err(TelloLinkError::corrupt(data, pos));
        }

        let length = (read_u16_le(data, pos + 1) >> 3) as usize;
        if length < MIN_PACKET_SIZE || pos + length > data.len() {
            debug!("Capture: bad packet length {} at pos={}", length, pos);
            return Err(TelloLinkError::corrupt(data, pos));
        }

        packets.push(Packet::from_raw(&data[pos..pos + length]));
        pos += length;
    }

    Ok(packets)
}

/// What a replayed packet turned into
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayEvent {
    Flight(FlightStatusRecord),
    Log(Vec<LogSample>),
    Ignored(u16),
}

/// Packet counters for one replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub packets: u64,
    pub flight: u64,
    pub log_data: u64,
    pub ignored: u64,
}

/// Routes inbound packets to the flight status decoder and the log demultiplexer
#[derive(Debug, Default)]
pub struct Replay {
    log: LogData,
    last_status: Option<FlightStatusRecord>,
    stats: ReplayStats,
}

impl Replay {
    pub fn new(log: LogData) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    /// Decode one inbound packet
    pub fn handle(&mut self, packet: &Packet) -> Result<ReplayEvent> {
        self.stats.packets += 1;
        let buf = packet.buffer();

        match packet.command_id() {
            FLIGHT_MSG => {
                let status = FlightStatusRecord::decode(buf.get(PACKET_HEADER_SIZE..).unwrap_or(&[]));
                debug!("Flight status: {}", status);
                self.stats.flight += 1;
                self.last_status = Some(status);
                Ok(ReplayEvent::Flight(status))
            }
            LOG_DATA_MSG => {
                let samples = self.log.update(buf.get(LOG_DATA_OFFSET..).unwrap_or(&[]))?;
                self.stats.log_data += 1;
                Ok(ReplayEvent::Log(samples))
            }
            other => {
                debug!("Ignoring packet cmd=0x{:04x} len={}", other, packet.len());
                self.stats.ignored += 1;
                Ok(ReplayEvent::Ignored(other))
            }
        }
    }

    pub fn log(&self) -> &LogData {
        &self.log
    }

    pub fn last_status(&self) -> Option<&FlightStatusRecord> {
        self.last_status.as_ref()
    }

    pub fn stats(&self) -> ReplayStats {
        self.stats
    }
}
