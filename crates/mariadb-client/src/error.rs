//! Client error types.

use mariadb_protocol::ProtocolError;
use mariadb_types::TypeError;
use thiserror::Error;

use crate::transport::{TransportError, TransportErrorKind};

/// DB-API style error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The driver and server disagree about the byte stream.
    Interface,
    /// A value cannot be represented or was truncated.
    Data,
    /// The API was used incorrectly.
    Programming,
    /// Connection or resource failure.
    Operational,
    /// Constraint violation.
    Integrity,
    /// Server-internal failure.
    Internal,
}

/// Errors that can occur during client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or unexpected protocol payload.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A parameter or fetched value could not be converted.
    #[error("type error: {0}")]
    Type(#[from] TypeError),

    /// A result row could not be decoded.
    #[error("row decoding failed: {0}")]
    Decode(#[source] TypeError),

    /// The API was called in the wrong state or with the wrong arguments.
    #[error("{0}")]
    Programming(String),

    /// Failure reported by the transport.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A bulk row does not fit into one packet.
    #[error("row of {size} bytes exceeds max_allowed_packet ({max})")]
    PacketTooLarge {
        /// Encoded row size.
        size: usize,
        /// Maximum allowed packet size.
        max: usize,
    },

    /// The cursor was closed.
    #[error("cursor is closed")]
    CursorClosed,
}

impl Error {
    /// Shorthand for a programming error.
    pub fn programming(message: impl Into<String>) -> Self {
        Self::Programming(message.into())
    }

    /// DB-API category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Protocol(ProtocolError::ParameterCount { .. }) => ErrorKind::Programming,
            Self::Protocol(ProtocolError::PacketTooLarge { .. }) | Self::PacketTooLarge { .. } => {
                ErrorKind::Operational
            }
            Self::Protocol(_) | Self::Decode(_) => ErrorKind::Interface,
            Self::Type(err) => match err.root() {
                TypeError::IncompatibleColumn { .. } => ErrorKind::Programming,
                err if err.is_malformed_input() => ErrorKind::Interface,
                _ => ErrorKind::Data,
            },
            Self::Programming(_) | Self::CursorClosed | Self::Config(_) => ErrorKind::Programming,
            Self::Transport(err) => match err.kind {
                TransportErrorKind::Operational => ErrorKind::Operational,
                TransportErrorKind::Integrity => ErrorKind::Integrity,
                TransportErrorKind::Internal => ErrorKind::Internal,
            },
        }
    }

    /// Whether the connection no longer matches the server's state.
    ///
    /// After such an error the remaining rows of the result set cannot be
    /// read and the connection should be discarded.
    #[must_use]
    pub fn is_desync(&self) -> bool {
        match self {
            Self::Decode(_) => true,
            Self::Protocol(err) => !matches!(
                err,
                ProtocolError::ParameterCount { .. } | ProtocolError::PacketTooLarge { .. }
            ),
            Self::Transport(err) => err.is_connection_lost(),
            _ => false,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
