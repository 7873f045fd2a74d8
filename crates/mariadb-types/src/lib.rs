//! # mariadb-types
//!
//! MariaDB value model and binary value codec.
//!
//! This crate sits between host values and the binary protocol. It infers a
//! wire type for every bound parameter, encodes values at that type, and
//! decodes binary result rows back into [`SqlValue`]s.
//!
//! ## Features
//!
//! - `chrono` (default): conversions between [`SqlTime`] and chrono types
//! - `decimal` (default): `rust_decimal::Decimal` conversions
//! - `encoding` (default): charset-aware decoding of non UTF-8 text columns
//!
//! ## Type Mappings
//!
//! | Host value | Wire type |
//! |------------|-----------|
//! | `Bool` | `TINYINT` (0/1) |
//! | `Int` / `UInt` | smallest of `TINYINT`, `SMALLINT`, `INT`, `BIGINT` |
//! | `Float` / `Double` | `DOUBLE` |
//! | `Text` | `VAR_STRING` |
//! | `Binary` | `BLOB` |
//! | `Decimal` | `NEWDECIMAL` |
//! | `Date` / `Time` / `DateTime` | `DATE` / `TIME` / `DATETIME` |
//! | `Null`, indicators | sent without a value |
//!
//! ## Example
//!
//! ```rust
//! use mariadb_types::{SqlValue, infer_column};
//! use mariadb_protocol::FieldType;
//!
//! let column = [SqlValue::Int(1), SqlValue::Int(300), SqlValue::Int(70000)];
//! let ty = infer_column(0, &column).unwrap();
//! assert_eq!(ty.wire_type.field_type, FieldType::Long);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod decode;
pub mod encode;
pub mod error;
pub mod from_sql;
pub mod indicator;
pub mod infer;
pub mod time;
pub mod to_sql;
pub mod value;

pub use decode::{DecodeOptions, decode_field, decode_row};
pub use encode::{ParamData, encode_value};
pub use error::TypeError;
pub use from_sql::FromSql;
pub use indicator::{Indicator, classify};
pub use infer::{ColumnType, IntWidth, ValueKind, infer, infer_column};
pub use time::{SqlTime, TemporalKind};
pub use to_sql::ToSql;
pub use value::SqlValue;
