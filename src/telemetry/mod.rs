//! # Telemetry Module
//!
//! Writes decoded telemetry to a file or any other `Write` sink.
//!
//! This module handles:
//! - Formatting motion/attitude samples as CSV rows (one column per axis)
//! - Formatting samples and flight status as JSONL (JSON Lines)
//! - Plain text output using each record's `Display` form

pub mod writer;

pub use writer::{OutputFormat, TelemetryWriter};
