//! Protocol-level error types.

use thiserror::Error;

/// Errors raised while reading or writing binary protocol payloads.
///
/// Every variant signals that the byte stream no longer matches what the
/// protocol allows at this point. Callers treat the connection as desynced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The buffer ended before a complete value could be read.
    #[error("unexpected end of buffer: need {needed} bytes, have {available}")]
    UnexpectedEof {
        /// Bytes needed.
        needed: usize,
        /// Bytes available.
        available: usize,
    },

    /// Unknown field type tag.
    #[error("unknown field type 0x{0:02X}")]
    UnknownFieldType(u8),

    /// A packet did not start with the expected header byte.
    #[error("unexpected packet header 0x{actual:02X} (expected 0x{expected:02X})")]
    UnexpectedHeader {
        /// Expected header byte.
        expected: u8,
        /// Header byte found.
        actual: u8,
    },

    /// First byte of a length-encoded integer is not a valid prefix.
    #[error("invalid length-encoded integer prefix 0x{0:02X}")]
    InvalidLengthPrefix(u8),

    /// A length-encoded field held the NULL marker where a length was required.
    #[error("unexpected NULL length marker")]
    UnexpectedNull,

    /// Column definition packet was malformed.
    #[error("malformed column definition: {0}")]
    MalformedColumn(&'static str),

    /// Number of values in a row does not match the declared parameter count.
    #[error("parameter count mismatch: expected {expected}, got {actual}")]
    ParameterCount {
        /// Declared parameter count.
        expected: usize,
        /// Values supplied.
        actual: usize,
    },

    /// Bytes were left over after the last value of a row.
    #[error("{0} trailing bytes after the last column")]
    TrailingBytes(usize),

    /// One row of a bulk request is larger than the maximum packet size.
    #[error("row of {size} bytes exceeds max_allowed_packet ({max})")]
    PacketTooLarge {
        /// Encoded row size.
        size: usize,
        /// Maximum allowed packet size.
        max: usize,
    },
}
