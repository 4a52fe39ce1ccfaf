//! # Telemetry Writer
//!
//! Serializes decoded samples in the configured output format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use tracing::debug;

use crate::error::Result;
use crate::protocol::flight_data::FlightStatusRecord;
use crate::protocol::log_data::{LogData, LogSample};

/// Output encoding for decoded telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One row per log data update with the latest motion and attitude values
    #[default]
    Csv,
    /// One JSON object per line, timestamped
    Jsonl,
    /// Human readable lines
    Text,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Csv => "csv",
            Self::Jsonl => "jsonl",
            Self::Text => "text",
        };
        f.write_str(name)
    }
}

/// A single JSONL entry
#[derive(Serialize)]
struct JsonLine<'a, T: Serialize> {
    timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    kind: &'static str,
    data: &'a T,
}

/// Writes decoded telemetry to `W`
pub struct TelemetryWriter<W: Write> {
    out: W,
    format: OutputFormat,
    header_written: bool,
    records_written: u64,
}

impl<W: Write> TelemetryWriter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            header_written: false,
            records_written: 0,
        }
    }

    /// Write the outcome of one `LogData::update` call
    ///
    /// # Arguments
    ///
    /// * `log` - The session that produced `samples`, after the update
    /// * `samples` - Samples returned by that update
    ///
    /// # Returns
    ///
    /// * `Result<()>` - I/O or serialization failure
    ///
    /// CSV output gets a single row with the session's latest motion and
    /// attitude values, however many records the update carried. JSONL and
    /// text output get one line per sample.
    pub fn write_log_update(&mut self, log: &LogData, samples: &[LogSample]) -> Result<()> {
        match self.format {
            OutputFormat::Csv => {
                if !self.header_written {
                    writeln!(self.out, "{}", LogData::csv_header())?;
                    self.header_written = true;
                }
                writeln!(self.out, "{}", log.to_csv())?;
                self.records_written += 1;
            }
            OutputFormat::Jsonl | OutputFormat::Text => {
                for sample in samples {
                    self.write_log_sample(sample)?;
                }
            }
        }

        Ok(())
    }

    fn write_log_sample(&mut self, sample: &LogSample) -> Result<()> {
        match (self.format, sample) {
            (OutputFormat::Jsonl, LogSample::Mvo(mvo)) => self.write_json("mvo", mvo)?,
            (OutputFormat::Jsonl, LogSample::Imu(imu)) => self.write_json("imu", imu)?,
            (_, LogSample::Mvo(mvo)) => writeln!(self.out, "MVO: {}", mvo)?,
            (_, LogSample::Imu(imu)) => writeln!(self.out, "IMU: {}", imu)?,
        }

        self.records_written += 1;
        Ok(())
    }

    /// Write a flight status record (skipped in CSV output)
    pub fn write_flight_status(&mut self, status: &FlightStatusRecord) -> Result<()> {
        match self.format {
            OutputFormat::Csv => {
                debug!("Flight status not written in csv output: {}", status);
                return Ok(());
            }
            OutputFormat::Jsonl => self.write_json("flight", status)?,
            OutputFormat::Text => writeln!(self.out, "FLIGHT: {}", status)?,
        }

        self.records_written += 1;
        Ok(())
    }

    fn write_json<T: Serialize>(&mut self, kind: &'static str, data: &T) -> Result<()> {
        let line = JsonLine {
            timestamp: Utc::now(),
            kind,
            data,
        };
        serde_json::to_writer(&mut self.out, &line)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
