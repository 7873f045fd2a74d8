//! Type conversion error types.

use mariadb_protocol::ProtocolError;
use thiserror::Error;

/// Errors that can occur during type inference, encoding and decoding.
#[derive(Debug, Error)]
pub enum TypeError {
    /// Value is null when non-null was expected.
    #[error("unexpected null value")]
    UnexpectedNull,

    /// Type mismatch during conversion.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type name.
        expected: &'static str,
        /// Actual type name.
        actual: String,
    },

    /// Value is out of range for target type.
    #[error("value out of range for {target_type}")]
    OutOfRange {
        /// Target type name.
        target_type: &'static str,
    },

    /// Invalid encoding in string data.
    #[error("invalid string encoding: {0}")]
    InvalidEncoding(String),

    /// Invalid date/time value.
    #[error("invalid date/time: {0}")]
    InvalidDateTime(String),

    /// Invalid decimal value.
    #[error("invalid decimal: {0}")]
    InvalidDecimal(String),

    /// A value was truncated by the server, or a truncation marker was bound.
    #[error("value truncated: {0}")]
    Truncation(String),

    /// Unsupported type conversion.
    #[error("unsupported conversion from {from} to {to}")]
    UnsupportedConversion {
        /// Source type.
        from: String,
        /// Target type.
        to: &'static str,
    },

    /// Buffer too small for value.
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes needed.
        needed: usize,
        /// Bytes available.
        available: usize,
    },

    /// Values of one bulk column cannot share a wire type.
    #[error(
        "parameter {column}: row {row} holds {actual}, which cannot be combined with {expected}"
    )]
    IncompatibleColumn {
        /// Zero-based parameter index.
        column: usize,
        /// Zero-based row index of the offending value.
        row: usize,
        /// Type inferred from the preceding rows.
        expected: &'static str,
        /// Type of the offending value.
        actual: &'static str,
    },

    /// A single parameter value could not be bound.
    #[error("parameter {column} of row {row}: {source}")]
    Parameter {
        /// Zero-based parameter index.
        column: usize,
        /// Zero-based row index.
        row: usize,
        /// Underlying failure.
        #[source]
        source: Box<TypeError>,
    },

    /// The row buffer did not follow the binary protocol.
    #[error(transparent)]
    Protocol(ProtocolError),
}

impl TypeError {
    /// Attach the parameter position to an error.
    #[must_use]
    pub fn at(self, column: usize, row: usize) -> Self {
        match self {
            Self::Parameter { .. } | Self::IncompatibleColumn { .. } => self,
            other => Self::Parameter {
                column,
                row,
                source: Box::new(other),
            },
        }
    }

    /// The error with any parameter position stripped.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Parameter { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the error means the received bytes are not a valid value.
    ///
    /// Such errors leave the connection out of sync with the server.
    #[must_use]
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self.root(),
            Self::BufferTooSmall { .. } | Self::Protocol(_)
        )
    }
}

impl From<ProtocolError> for TypeError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::UnexpectedEof { needed, available } => {
                Self::BufferTooSmall { needed, available }
            }
            other => Self::Protocol(other),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_eof_maps_to_buffer_too_small() {
        let err: TypeError = ProtocolError::UnexpectedEof {
            needed: 8,
            available: 3,
        }
        .into();
        assert!(matches!(
            err,
            TypeError::BufferTooSmall {
                needed: 8,
                available: 3
            }
        ));
        assert!(err.is_malformed_input());
    }

    #[test]
    fn test_position_is_attached_once() {
        let err = TypeError::InvalidDecimal("1.2.3".into()).at(2, 5).at(0, 0);
        assert_eq!(err.to_string(), "parameter 2 of row 5: invalid decimal: 1.2.3");
        assert!(matches!(err.root(), TypeError::InvalidDecimal(_)));
    }
}
