//! # Tello Link Library
//!
//! Wire-protocol codec for the Tello quadcopter command and telemetry link.
//!
//! This library frames outbound command packets and decodes inbound flight
//! status and log telemetry. Transport is left to the caller: every function
//! here works on byte slices handed to it.

pub mod capture;
pub mod config;
pub mod error;
pub mod protocol;
pub mod telemetry;
