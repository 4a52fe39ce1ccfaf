//! # Tello Protocol Module
//!
//! Binary packet layer of the Tello command/telemetry link.
//!
//! This module handles:
//! - Command packet framing (length, sequence number, crc8/crc16)
//! - Flight status decoding (bit-packed 24-byte record)
//! - Log stream demultiplexing (XOR'd records dispatched by id)
//! - Motion feedback and attitude decoding

pub mod commands;
pub mod crc;
pub mod flight_data;
pub mod imu;
pub mod log_data;
pub mod mvo;
pub mod packet;
pub mod types;
