//! Error types for wire parsing.
//!
//! All errors are structured, testable, and provide actionable information.

use thiserror::Error;

/// Errors raised while parsing a frame layer by layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer is shorter than the layer being parsed
    #[error("{layer} too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        /// Layer that failed to parse
        layer: &'static str,
        /// Expected minimum size in bytes
        expected: usize,
        /// Actual size available
        actual: usize,
    },

    /// Ethernet frame does not carry IPv4
    #[error("unsupported ethertype: {0:#06x}")]
    UnsupportedEtherType(u16),

    /// IP version nibble is not 4
    #[error("unsupported IP version: {0}")]
    UnsupportedIpVersion(u8),

    /// IHL is below the 5-word minimum
    #[error("invalid IPv4 header length: {0} words")]
    InvalidHeaderLength(u8),

    /// IPv4 packet does not carry UDP
    #[error("not a UDP datagram: IP protocol {0}")]
    NotUdp(u8),
}

/// Convenient Result type alias for wire operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
