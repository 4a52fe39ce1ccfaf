//! # Error Types
//!
//! Custom error types for Tello Link using `thiserror`.

use thiserror::Error;

/// Main error type for Tello Link
#[derive(Debug, Error)]
pub enum TelloLinkError {
    /// Telemetry stream is malformed (bad sync byte, bad record length,
    /// or a record that runs past the end of the buffer)
    #[error("corrupted data at pos={offset}, data={}", hex_string(.remaining))]
    CorruptStream {
        /// Offset into the stream where decoding stopped
        offset: usize,
        /// Raw bytes from `offset` to the end of the stream
        remaining: Vec<u8>,
    },

    /// Buffer too short for the fixed layout being read
    #[error("{what} too short: need {needed} bytes, got {actual}")]
    OutOfRange {
        /// Name of the structure being decoded
        what: &'static str,
        /// Minimum number of bytes required
        needed: usize,
        /// Number of bytes available
        actual: usize,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Telemetry serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TelloLinkError {
    /// Build a `CorruptStream` error capturing everything from `offset` onwards
    pub fn corrupt(data: &[u8], offset: usize) -> Self {
        Self::CorruptStream {
            offset,
            remaining: data.get(offset..).unwrap_or(&[]).to_vec(),
        }
    }
}

/// Render bytes as space separated hex, e.g. `55 1c 00`
pub fn hex_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Result type alias for Tello Link
pub type Result<T> = std::result::Result<T, TelloLinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_captures_remaining_bytes() {
        let data = [0x55, 0x10, 0x00, 0xAA, 0xBB];
        match TelloLinkError::corrupt(&data, 3) {
            TelloLinkError::CorruptStream { offset, remaining } => {
                assert_eq!(offset, 3);
                assert_eq!(remaining, vec![0xAA, 0xBB]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_corrupt_past_end_is_empty() {
        let err = TelloLinkError::corrupt(&[0x01], 7);
        assert_eq!(err.to_string(), "corrupted data at pos=7, data=");
    }

    #[test]
    fn test_corrupt_display_is_hex() {
        let err = TelloLinkError::corrupt(&[0x00, 0x0F, 0xA0], 1);
        assert_eq!(err.to_string(), "corrupted data at pos=1, data=0f a0");
    }

    #[test]
    fn test_out_of_range_display() {
        let err = TelloLinkError::OutOfRange { what: "time", needed: 9, actual: 4 };
        assert_eq!(err.to_string(), "time too short: need 9 bytes, got 4");
    }
}
