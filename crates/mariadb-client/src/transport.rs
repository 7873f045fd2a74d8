//! The transport collaborator.
//!
//! Everything that touches the network lives behind [`Transport`]: packet
//! framing, authentication, the socket and the server's response parsing for
//! OK/ERR packets. The client hands it complete command payloads and reads
//! back binary row payloads.

use bytes::Bytes;
use mariadb_protocol::FieldDescriptor;
use thiserror::Error;

/// Metadata returned by `COM_STMT_PREPARE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedMeta {
    /// Server-assigned statement id.
    pub statement_id: u32,
    /// Number of `?` placeholders.
    pub param_count: usize,
    /// Result columns, empty for statements without a result set.
    pub fields: Vec<FieldDescriptor>,
}

/// Outcome of an execute or bulk execute command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecuteOutcome {
    /// Rows changed by the statement.
    pub affected_rows: u64,
    /// Value generated for an `AUTO_INCREMENT` column.
    pub last_insert_id: u64,
    /// Whether binary rows follow.
    pub has_result_set: bool,
}

/// Category of a server or network failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// Connection loss, timeouts, resource limits.
    Operational,
    /// Constraint violations.
    Integrity,
    /// Server-internal failures.
    Internal,
}

/// A failure reported by the transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} (errno {code})")]
pub struct TransportError {
    /// Failure category.
    pub kind: TransportErrorKind,
    /// Server error number, 0 for client-side failures.
    pub code: u16,
    /// Server or client message.
    pub message: String,
}

impl TransportError {
    /// Create a transport error.
    pub fn new(kind: TransportErrorKind, code: u16, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }

    /// Whether the connection is gone.
    #[must_use]
    pub fn is_connection_lost(&self) -> bool {
        // CR_SERVER_GONE_ERROR, CR_SERVER_LOST
        matches!(self.code, 2006 | 2013)
    }
}

/// Synchronous request/response channel to one server session.
pub trait Transport {
    /// Send `COM_STMT_PREPARE` and read the statement metadata.
    fn prepare(&mut self, sql: &str) -> Result<PreparedMeta, TransportError>;

    /// Send an encoded execute or bulk execute payload.
    fn execute(&mut self, payload: Bytes) -> Result<ExecuteOutcome, TransportError>;

    /// Send a `COM_STMT_SEND_LONG_DATA` payload. The server does not answer.
    fn send_long_data(&mut self, payload: Bytes) -> Result<(), TransportError>;

    /// Read the next binary row payload of the current result set.
    fn fetch_row(&mut self) -> Result<Option<Bytes>, TransportError>;

    /// Run a text protocol statement, returning the affected row count.
    fn query(&mut self, sql: &str) -> Result<u64, TransportError>;

    /// Send `COM_STMT_CLOSE`.
    fn close_statement(&mut self, statement_id: u32) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn prepare(&mut self, sql: &str) -> Result<PreparedMeta, TransportError> {
        (**self).prepare(sql)
    }

    fn execute(&mut self, payload: Bytes) -> Result<ExecuteOutcome, TransportError> {
        (**self).execute(payload)
    }

    fn send_long_data(&mut self, payload: Bytes) -> Result<(), TransportError> {
        (**self).send_long_data(payload)
    }

    fn fetch_row(&mut self) -> Result<Option<Bytes>, TransportError> {
        (**self).fetch_row()
    }

    fn query(&mut self, sql: &str) -> Result<u64, TransportError> {
        (**self).query(sql)
    }

    fn close_statement(&mut self, statement_id: u32) -> Result<(), TransportError> {
        (**self).close_statement(statement_id)
    }
}
