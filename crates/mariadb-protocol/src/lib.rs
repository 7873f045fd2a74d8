//! # mariadb-protocol
//!
//! IO-agnostic primitives of the MariaDB/MySQL binary (prepared statement)
//! protocol.
//!
//! This crate contains no networking logic. Packet framing, authentication
//! and the socket itself belong to the transport that hands payloads to and
//! from this crate.
//!
//! ## Contents
//!
//! - [`codec`]: little-endian wire codec for fixed and odd width integers,
//!   IEEE floats and length-encoded integers/strings
//! - [`types`]: field type tags, column flags and the parameter wire type
//! - [`column`]: column definition and `COM_STMT_PREPARE` response parsing
//! - [`execute`]: `COM_STMT_EXECUTE` payload encoding
//! - [`bulk`]: `COM_STMT_BULK_EXECUTE` payload encoding with packet splitting
//! - [`long_data`]: `COM_STMT_SEND_LONG_DATA` payloads for oversized values
//! - [`row`]: binary result row framing (NULL bitmap and value area)
//!
//! ## Example
//!
//! ```rust
//! use mariadb_protocol::codec::ByteOrder;
//!
//! let bytes = ByteOrder::WIRE.encode_int(-2, 2);
//! assert_eq!(&bytes[..], &[0xFE, 0xFF]);
//! assert_eq!(ByteOrder::WIRE.decode_int(&bytes), -2);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod bulk;
pub mod codec;
pub mod column;
pub mod error;
pub mod execute;
pub mod long_data;
pub mod row;
pub mod types;

pub use bulk::{BulkExecute, BulkRow, BulkValue};
pub use codec::ByteOrder;
pub use column::{FieldDescriptor, PrepareOk};
pub use error::ProtocolError;
pub use execute::{ExecuteParam, StmtExecute};
pub use long_data::SendLongData;
pub use row::BinaryRow;
pub use types::{CharsetId, ColumnFlags, FieldType, IndicatorCode, WireType};
