//! # Telemetry Stream Demultiplexer
//!
//! Splits the body of a `LOG_DATA_MSG` packet into log records and routes
//! each one to its decoder.
//!
//! ## Record Format
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       1     sync (0x55)
//! 1       2     length (i16 LE, whole record including 12 bytes of overhead)
//! 3       1     header crc8
//! 4       2     record id (u16 LE)
//! 6       4     tick (byte 6 doubles as the XOR key)
//! 10      N     payload, every byte XOR'd with the key
//! 10+N    2     record crc16
//! ```
//!
//! Records are packed back to back. The stream ends with two bytes that are
//! not part of any record (the enclosing packet's crc16).

use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info};

use super::crc::{Checksum, TelloChecksum};
use super::imu::{AttitudeSample, ImuAtti};
use super::mvo::{MotionFeedback, MvoFeedback};
use super::types::{read_i16_le, read_u16_le};
use crate::error::{Result, TelloLinkError};

/// Log record sync byte
pub const LOG_RECORD_SYNC: u8 = 0x55;

/// Bytes before the payload
pub const LOG_RECORD_HEADER_SIZE: usize = 10;

/// Header plus trailing crc16
pub const LOG_RECORD_OVERHEAD: usize = 12;

/// Bytes after the last record that belong to the enclosing packet
pub const STREAM_TRAILER_SIZE: usize = 2;

pub const ID_NEW_MVO_FEEDBACK: u16 = 29;
pub const ID_IMU_ATTI: u16 = 2048;

/// Log record types understood by this decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogRecordKind {
    MvoFeedback,
    ImuAtti,
    Unknown(u16),
}

impl From<u16> for LogRecordKind {
    fn from(id: u16) -> Self {
        match id {
            ID_NEW_MVO_FEEDBACK => Self::MvoFeedback,
            ID_IMU_ATTI => Self::ImuAtti,
            other => Self::Unknown(other),
        }
    }
}

impl LogRecordKind {
    pub fn id(&self) -> u16 {
        match self {
            Self::MvoFeedback => ID_NEW_MVO_FEEDBACK,
            Self::ImuAtti => ID_IMU_ATTI,
            Self::Unknown(id) => *id,
        }
    }
}

/// One log record with its payload already de-obfuscated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryRecord {
    /// Offset of the record's sync byte in the stream
    pub offset: usize,
    /// Declared record length, overhead included
    pub length: usize,
    pub id: u16,
    pub tick: [u8; 4],
    pub payload: Vec<u8>,
}

impl TelemetryRecord {
    pub fn kind(&self) -> LogRecordKind {
        LogRecordKind::from(self.id)
    }
}

/// XOR every byte with `key`. Applying it twice restores the input.
pub fn xor_payload(data: &[u8], key: u8) -> Vec<u8> {
    data.iter().map(|&b| b ^ key).collect()
}

/// Walks a stream one record at a time
///
/// Yields `Err(CorruptStream)` at most once and then stops.
pub struct RecordScanner<'a> {
    data: &'a [u8],
    pos: usize,
    verify: Option<&'a dyn Checksum>,
    finished: bool,
}

impl<'a> RecordScanner<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            verify: None,
            finished: false,
        }
    }

    /// Also check each record's header crc8 and trailing crc16
    pub fn verify_with(mut self, checksum: &'a dyn Checksum) -> Self {
        self.verify = Some(checksum);
        self
    }

    /// Current scan position
    pub fn position(&self) -> usize {
        self.pos
    }

    fn corrupt(&self) -> TelloLinkError {
        TelloLinkError::corrupt(self.data, self.pos)
    }

    fn read_record(&self) -> Result<TelemetryRecord> {
        let data = self.data;
        let pos = self.pos;

        if data[pos] != LOG_RECORD_SYNC {
            return Err(self.corrupt());
        }
        if pos + LOG_RECORD_HEADER_SIZE > data.len() {
            debug!("LogData: truncated record header at pos={}", pos);
            return Err(self.corrupt());
        }

        let length = read_i16_le(data, pos + 1);
        if length < LOG_RECORD_OVERHEAD as i16 {
            debug!("LogData: invalid record length {} at pos={}", length, pos);
            return Err(self.corrupt());
        }
        let length = length as usize;

        let payload_end = pos + length - 2;
        if payload_end > data.len() {
            debug!("LogData: record length {} overruns stream at pos={}", length, pos);
            return Err(self.corrupt());
        }

        if let Some(checksum) = self.verify {
            let record_end = pos + length;
            if record_end > data.len()
                || data[pos + 3] != checksum.crc8(&data[pos..pos + 3])
                || read_u16_le(data, payload_end) != checksum.crc16(&data[pos..payload_end])
            {
                debug!("LogData: checksum mismatch at pos={}", pos);
                return Err(self.corrupt());
            }
        }

        let key = data[pos + 6];
        Ok(TelemetryRecord {
            offset: pos,
            length,
            id: read_u16_le(data, pos + 4),
            tick: [data[pos + 6], data[pos + 7], data[pos + 8], data[pos + 9]],
            payload: xor_payload(&data[pos + LOG_RECORD_HEADER_SIZE..payload_end], key),
        })
    }
}

impl Iterator for RecordScanner<'_> {
    type Item = Result<TelemetryRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if self.pos + STREAM_TRAILER_SIZE < self.data.len() {
            match self.read_record() {
                Ok(record) => {
                    self.pos += record.length;
                    Some(Ok(record))
                }
                Err(e) => {
                    self.finished = true;
                    Some(Err(e))
                }
            }
        } else {
            self.finished = true;
            if self.pos + STREAM_TRAILER_SIZE != self.data.len() {
                Some(Err(self.corrupt()))
            } else {
                None
            }
        }
    }
}

/// Split a stream into records without dispatching them
pub fn split_records(data: &[u8]) -> Result<Vec<TelemetryRecord>> {
    RecordScanner::new(data).collect()
}

/// Record ids that were seen but have no decoder
///
/// Owned by one session so every session reports each unknown id once.
#[derive(Debug, Clone, Default)]
pub struct UnknownIds {
    seen: HashSet<u16>,
}

impl UnknownIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `id`, returning true the first time it is seen
    pub fn insert(&mut self, id: u16) -> bool {
        self.seen.insert(id)
    }

    pub fn contains(&self, id: u16) -> bool {
        self.seen.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// A sample produced by one `update` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogSample {
    Mvo(MotionFeedback),
    Imu(AttitudeSample),
}

/// Telemetry session: demultiplexer plus the last decoded values
#[derive(Debug, Default)]
pub struct LogData {
    count: u64,
    mvo: MvoFeedback,
    imu: ImuAtti,
    unknown_ids: UnknownIds,
    verify_checksums: bool,
}

impl LogData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session with an existing set of already reported unknown ids
    pub fn with_unknown_ids(unknown_ids: UnknownIds) -> Self {
        Self {
            unknown_ids,
            ..Self::default()
        }
    }

    /// Enable header crc8 / record crc16 checks (off by default)
    pub fn verify_checksums(mut self, enabled: bool) -> Self {
        self.verify_checksums = enabled;
        self
    }

    /// Decode every record in `data`
    ///
    /// # Arguments
    ///
    /// * `data` - Log stream from a `LOG_DATA_MSG` packet, including its 2 trailing bytes
    ///
    /// # Returns
    ///
    /// * `Result<Vec<LogSample>>` - One sample per known record, in stream order
    ///
    /// Records are dispatched as they are scanned, so on error the decoders
    /// keep whatever the records before the corrupt one produced.
    ///
    /// # Errors
    ///
    /// Returns `CorruptStream` if:
    /// - A record does not start with the sync byte
    /// - A record length is too small or runs past the end of the stream
    /// - The records do not end exactly two bytes before the end of the stream
    /// - A known record's payload is too short for its decoder
    /// - Checksum verification is enabled and a checksum does not match
    pub fn update(&mut self, data: &[u8]) -> Result<Vec<LogSample>> {
        debug!("LogData: data length={}", data.len());
        self.count += 1;

        let checksum = TelloChecksum;
        let mut scanner = RecordScanner::new(data);
        if self.verify_checksums {
            scanner = scanner.verify_with(&checksum);
        }

        let mut samples = Vec::new();
        for record in scanner {
            let record = record?;
            if let Some(sample) = self.dispatch(&record, data)? {
                samples.push(sample);
            }
        }

        Ok(samples)
    }

    fn dispatch(&mut self, record: &TelemetryRecord, data: &[u8]) -> Result<Option<LogSample>> {
        let into_corrupt = |e: TelloLinkError| {
            debug!("LogData: record id={} at pos={}: {}", record.id, record.offset, e);
            TelloLinkError::corrupt(data, record.offset)
        };

        match record.kind() {
            LogRecordKind::MvoFeedback => {
                let sample = self.mvo.update(&record.payload, self.count).map_err(into_corrupt)?;
                Ok(Some(LogSample::Mvo(sample)))
            }
            LogRecordKind::ImuAtti => {
                let sample = self.imu.update(&record.payload, self.count).map_err(into_corrupt)?;
                Ok(Some(LogSample::Imu(sample)))
            }
            LogRecordKind::Unknown(id) => {
                if self.unknown_ids.insert(id) {
                    info!("LogData: UNHANDLED LOG DATA: id={:5}, length={:4}", id, record.payload.len());
                }
                Ok(None)
            }
        }
    }

    /// Number of `update` calls so far
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mvo(&self) -> &MvoFeedback {
        &self.mvo
    }

    pub fn imu(&self) -> &ImuAtti {
        &self.imu
    }

    pub fn unknown_ids(&self) -> &UnknownIds {
        &self.unknown_ids
    }

    pub fn csv_header() -> String {
        format!("{},{}", MotionFeedback::csv_header(), AttitudeSample::csv_header())
    }

    /// Latest motion and attitude values as one CSV row
    pub fn to_csv(&self) -> String {
        format!("{},{}", self.mvo.last.to_csv(), self.imu.last.to_csv())
    }
}

impl fmt::Display for LogData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MVO: {}|IMU: {}", self.mvo.last, self.imu.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::crc::{crc16, crc8};
    use crate::protocol::imu::IMU_ATTI_SIZE;

    const TRAILER: [u8; 2] = [0xAB, 0xCD];

    fn build_record(id: u16, key: u8, plain: &[u8]) -> Vec<u8> {
        let length = (plain.len() + LOG_RECORD_OVERHEAD) as i16;
        let mut rec = vec![LOG_RECORD_SYNC];
        rec.extend_from_slice(&length.to_le_bytes());
        rec.push(crc8(&rec[0..3]));
        rec.extend_from_slice(&id.to_le_bytes());
        rec.extend_from_slice(&[key, 0x10, 0x20, 0x30]);
        rec.extend_from_slice(&xor_payload(plain, key));
        let crc = crc16(&rec);
        rec.extend_from_slice(&crc.to_le_bytes());
        rec
    }

    fn build_stream(records: &[Vec<u8>]) -> Vec<u8> {
        let mut stream: Vec<u8> = records.concat();
        stream.extend_from_slice(&TRAILER);
        stream
    }

    fn mvo_plain() -> Vec<u8> {
        let mut plain = vec![0u8, 0];
        for v in [120i16, -40, 5] {
            plain.extend_from_slice(&v.to_le_bytes());
        }
        for p in [0.5f32, 1.5, -2.0] {
            plain.extend_from_slice(&p.to_le_bytes());
        }
        plain
    }

    fn imu_plain() -> Vec<u8> {
        let mut plain = vec![0u8; IMU_ATTI_SIZE];
        plain[48..52].copy_from_slice(&1.0f32.to_le_bytes());
        plain[76..80].copy_from_slice(&2.5f32.to_le_bytes());
        plain
    }

    fn assert_corrupt(result: Result<Vec<LogSample>>, expected_offset: usize) {
        match result {
            Err(TelloLinkError::CorruptStream { offset, .. }) => assert_eq!(offset, expected_offset),
            other => panic!("expected CorruptStream, got {:?}", other),
        }
    }

    #[test]
    fn test_record_kind_dispatch_table() {
        assert_eq!(LogRecordKind::from(29), LogRecordKind::MvoFeedback);
        assert_eq!(LogRecordKind::from(2048), LogRecordKind::ImuAtti);
        assert_eq!(LogRecordKind::from(7), LogRecordKind::Unknown(7));
        assert_eq!(LogRecordKind::Unknown(7).id(), 7);
        assert_eq!(LogRecordKind::ImuAtti.id(), ID_IMU_ATTI);
    }

    #[test]
    fn test_xor_is_its_own_inverse() {
        let original = mvo_plain();
        for key in [0x00u8, 0x5A, 0xFF] {
            let obfuscated = xor_payload(&original, key);
            assert_eq!(xor_payload(&obfuscated, key), original);
        }
    }

    #[test]
    fn test_single_mvo_record() {
        let stream = build_stream(&[build_record(ID_NEW_MVO_FEEDBACK, 0x3C, &mvo_plain())]);
        let mut log = LogData::new();

        let samples = log.update(&stream).unwrap();
        assert_eq!(samples.len(), 1);
        assert!(matches!(samples[0], LogSample::Mvo(_)));

        let mvo = log.mvo();
        assert_eq!(mvo.count, 1);
        assert!((mvo.last.velocity.x - 1.2).abs() < 1e-6);
        assert!((mvo.last.velocity.y + 0.4).abs() < 1e-6);
        assert!((mvo.last.velocity.z - 0.05).abs() < 1e-6);
        assert_eq!(mvo.last.position.z, -2.0);
    }

    #[test]
    fn test_scanner_ends_two_bytes_before_end() {
        let stream = build_stream(&[build_record(ID_NEW_MVO_FEEDBACK, 0x3C, &mvo_plain())]);
        let mut scanner = RecordScanner::new(&stream);

        let record = scanner.next().unwrap().unwrap();
        assert_eq!(record.offset, 0);
        assert_eq!(record.tick, [0x3C, 0x10, 0x20, 0x30]);
        assert_eq!(record.payload, mvo_plain());
        assert!(scanner.next().is_none());
        assert_eq!(scanner.position(), stream.len() - 2);
    }

    #[test]
    fn test_corrupt_sync_byte() {
        let mut stream = build_stream(&[build_record(ID_NEW_MVO_FEEDBACK, 0x3C, &mvo_plain())]);
        stream[0] = 0x54;
        assert_corrupt(LogData::new().update(&stream), 0);
    }

    #[test]
    fn test_mixed_records_and_unknown() {
        let stream = build_stream(&[
            build_record(ID_NEW_MVO_FEEDBACK, 0x11, &mvo_plain()),
            build_record(0x0800 + 1, 0x22, &[1, 2, 3]),
            build_record(ID_IMU_ATTI, 0x33, &imu_plain()),
        ]);
        let mut log = LogData::new();

        let samples = log.update(&stream).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(log.imu().last.quaternion.q0, 1.0);
        assert_eq!(log.imu().last.ground_velocity.x, 2.5);
        assert!(log.unknown_ids().contains(0x0801));
    }

    #[test]
    fn test_records_not_summing_to_stream_length() {
        // One extra byte between the last record and the trailer
        let mut stream = build_record(ID_NEW_MVO_FEEDBACK, 0x3C, &mvo_plain());
        let record_len = stream.len();
        stream.push(0x00);
        stream.extend_from_slice(&TRAILER);
        assert_corrupt(LogData::new().update(&stream), record_len);

        // Declared length one byte longer than the record
        let mut stream = build_stream(&[build_record(ID_NEW_MVO_FEEDBACK, 0x3C, &mvo_plain())]);
        let declared = (record_len + 1) as i16;
        stream[1..3].copy_from_slice(&declared.to_le_bytes());
        assert!(matches!(
            LogData::new().update(&stream),
            Err(TelloLinkError::CorruptStream { .. })
        ));
    }

    #[test]
    fn test_length_overrunning_stream() {
        let mut stream = build_stream(&[build_record(7, 0x00, &[0u8; 4])]);
        stream[1..3].copy_from_slice(&500i16.to_le_bytes());
        assert_corrupt(LogData::new().update(&stream), 0);
    }

    #[test]
    fn test_length_below_overhead_is_rejected() {
        for bad in [0i16, -12, 11] {
            let mut stream = build_stream(&[build_record(7, 0x00, &[0u8; 4])]);
            stream[1..3].copy_from_slice(&bad.to_le_bytes());
            assert_corrupt(LogData::new().update(&stream), 0);
        }
    }

    #[test]
    fn test_truncated_header() {
        let stream = [LOG_RECORD_SYNC, 0x10, 0x00, 0x00, 0x1D, 0x00];
        assert_corrupt(LogData::new().update(&stream), 0);
    }

    #[test]
    fn test_empty_and_trailer_only_streams() {
        assert_corrupt(LogData::new().update(&[]), 0);
        assert_corrupt(LogData::new().update(&[0x00]), 0);
        assert!(LogData::new().update(&TRAILER).unwrap().is_empty());
    }

    #[test]
    fn test_short_known_payload_is_corrupt() {
        let stream = build_stream(&[
            build_record(9, 0x01, &[0u8; 3]),
            build_record(ID_NEW_MVO_FEEDBACK, 0x3C, &[0u8; 10]),
        ]);
        assert_corrupt(LogData::new().update(&stream), 15);
    }

    #[test]
    fn test_records_before_corruption_are_kept() {
        let mut stream = build_stream(&[
            build_record(ID_NEW_MVO_FEEDBACK, 0x3C, &mvo_plain()),
            build_record(ID_NEW_MVO_FEEDBACK, 0x3C, &mvo_plain()),
        ]);
        let second = stream.len() / 2 - 1;
        stream[second] = 0x00;

        let mut log = LogData::new();
        assert_corrupt(log.update(&stream), second);
        assert_eq!(log.mvo().count, 1);
    }

    #[test]
    fn test_unknown_id_reported_once_per_session() {
        let stream = build_stream(&[build_record(1234, 0x42, &[9, 9, 9])]);
        let mut log = LogData::new();

        log.update(&stream).unwrap();
        log.update(&stream).unwrap();
        assert_eq!(log.count(), 2);
        assert_eq!(log.unknown_ids().len(), 1);

        let mut ids = UnknownIds::new();
        assert!(ids.insert(1234));
        assert!(!ids.insert(1234));

        // A separate session starts with its own empty set
        assert!(LogData::new().unknown_ids().is_empty());
    }

    #[test]
    fn test_injected_unknown_ids() {
        let mut ids = UnknownIds::new();
        ids.insert(1234);
        let log = LogData::with_unknown_ids(ids);
        assert!(log.unknown_ids().contains(1234));
    }

    #[test]
    fn test_checksum_verification_is_opt_in() {
        let mut stream = build_stream(&[build_record(1234, 0x42, &[9, 9, 9])]);
        stream[LOG_RECORD_HEADER_SIZE] ^= 0xFF;

        assert!(LogData::new().update(&stream).is_ok());
        assert_corrupt(LogData::new().verify_checksums(true).update(&stream), 0);
    }

    #[test]
    fn test_checksum_verification_accepts_valid_stream() {
        let stream = build_stream(&[
            build_record(ID_NEW_MVO_FEEDBACK, 0x3C, &mvo_plain()),
            build_record(ID_IMU_ATTI, 0x7E, &imu_plain()),
        ]);
        let samples = LogData::new().verify_checksums(true).update(&stream).unwrap();
        assert_eq!(samples.len(), 2);
    }

    #[test]
    fn test_split_records() {
        let stream = build_stream(&[
            build_record(1, 0x01, &[0xAA]),
            build_record(2, 0x02, &[0xBB, 0xCC]),
        ]);
        let records = split_records(&stream).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].payload, vec![0xAA]);
        assert_eq!(records[1].offset, 13);
        assert_eq!(records[1].kind(), LogRecordKind::Unknown(2));
    }

    #[test]
    fn test_csv_and_display() {
        let log = LogData::new();
        assert_eq!(LogData::csv_header().split(',').count(), 19);
        assert_eq!(log.to_csv().split(',').count(), 19);
        assert!(log.to_string().starts_with("MVO: VEL:"));
    }
}
