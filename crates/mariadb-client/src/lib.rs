//! # mariadb-client
//!
//! Synchronous cursor/connection layer of a MariaDB driver speaking the binary
//! (prepared statement) protocol.
//!
//! The network is abstracted behind the [`Transport`] trait; this crate
//! prepares statements, binds parameters into execute and bulk execute
//! payloads, decodes binary result rows and tracks two-phase commit state.
//!
//! ## Features
//!
//! - **Type inference**: parameter wire types are inferred from the values,
//!   using the narrowest integer width that holds every row of a batch
//! - **Bulk execution**: `executemany` sends `COM_STMT_BULK_EXECUTE` packets
//!   split at `max_allowed_packet`, with `DEFAULT`/`IGNORE` indicators
//! - **Long data**: oversized text and binary parameters of a single
//!   execution go ahead of it as `COM_STMT_SEND_LONG_DATA`
//! - **Prepared statements**: automatic caching with LRU eviction
//! - **Two-phase commit**: XA transactions guarded by a state machine
//!
//! ## Example
//!
//! ```rust,ignore
//! use mariadb_client::{Config, Connection, SqlValue};
//!
//! let mut conn = Connection::new(transport, Config::from_connection_string("bulk=1")?);
//! let mut cursor = conn.cursor();
//!
//! cursor.executemany(
//!     "INSERT INTO t (id, name) VALUES (?, ?)",
//!     &[
//!         vec![SqlValue::from(1), SqlValue::from("one")],
//!         vec![SqlValue::from(300), SqlValue::from("three hundred")],
//!     ],
//! )?;
//!
//! cursor.execute("SELECT id, name FROM t WHERE id > ?", &[SqlValue::from(0)])?;
//! for row in cursor.fetchall()? {
//!     let name: String = row.get_by_name("name")?;
//!     println!("{name}");
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod bind;
pub mod config;
pub mod connection;
pub mod cursor;
pub mod error;
pub mod row;
pub mod statement_cache;
pub mod tpc;
pub mod transport;

pub use bind::{
    BindBuffer, ExecuteRequest, ParameterInfo, ParameterValue, StatementBindings, bind,
    bind_single,
};
pub use config::Config;
pub use connection::Connection;
pub use cursor::Cursor;
pub use error::{Error, ErrorKind, Result};
pub use mariadb_types::{FromSql, Indicator, SqlTime, SqlValue, ToSql};
pub use row::{ColMetaData, Row};
pub use statement_cache::{PreparedStatement, StatementCache};
pub use tpc::{TpcCompletion, TpcState, TpcTracker, Xid};
pub use transport::{ExecuteOutcome, PreparedMeta, Transport, TransportError, TransportErrorKind};
