//! SQL value representation.

use bytes::Bytes;

use crate::indicator::Indicator;
use crate::time::SqlTime;

/// A SQL value as bound to a statement or read from a result row.
///
/// This is the closed set of host values the driver accepts. Anything else
/// is converted into one of these variants through [`crate::ToSql`] first.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean, bound as `TINYINT` 0/1.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// 32-bit floating point (FLOAT).
    Float(f32),
    /// 64-bit floating point (DOUBLE).
    Double(f64),
    /// Character data (CHAR, VARCHAR, TEXT, ENUM, SET, JSON).
    Text(String),
    /// Binary data (BINARY, VARBINARY, BLOB, BIT).
    Binary(Bytes),
    /// Exact decimal kept as its digit string (DECIMAL).
    Decimal(String),
    /// Date value (DATE).
    Date(SqlTime),
    /// Time of day or duration (TIME).
    Time(SqlTime),
    /// Date and time (DATETIME, TIMESTAMP).
    DateTime(SqlTime),
    /// A slot carrying an indicator instead of data.
    Indicator(Indicator),
}

impl SqlValue {
    /// Check if the value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null | Self::Indicator(Indicator::Null))
    }

    /// Get the value as a bool, if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as an i64, if it is an integer in range.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::UInt(v) => i64::try_from(*v).ok(),
            Self::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Get the value as a u64, if it is a non-negative integer.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt(v) => Some(*v),
            Self::Int(v) => u64::try_from(*v).ok(),
            Self::Bool(v) => Some(u64::from(*v)),
            _ => None,
        }
    }

    /// Get the value as an f64, if it is one.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            Self::Float(v) => Some(f64::from(*v)),
            _ => None,
        }
    }

    /// Get the value as a string slice, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) | Self::Decimal(v) => Some(v),
            _ => None,
        }
    }

    /// Get the value as bytes, if it is binary.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(v) => Some(v),
            _ => None,
        }
    }

    /// Get the temporal components, if the value is a date or time.
    #[must_use]
    pub fn as_sql_time(&self) -> Option<&SqlTime> {
        match self {
            Self::Date(v) | Self::Time(v) | Self::DateTime(v) => Some(v),
            _ => None,
        }
    }

    /// Get the type name as a string.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "BOOLEAN",
            Self::Int(_) => "BIGINT",
            Self::UInt(_) => "BIGINT UNSIGNED",
            Self::Float(_) => "FLOAT",
            Self::Double(_) => "DOUBLE",
            Self::Text(_) => "VARCHAR",
            Self::Binary(_) => "BLOB",
            Self::Decimal(_) => "DECIMAL",
            Self::Date(_) => "DATE",
            Self::Time(_) => "TIME",
            Self::DateTime(_) => "DATETIME",
            Self::Indicator(tag) => tag.name(),
        }
    }
}

impl Default for SqlValue {
    fn default() -> Self {
        Self::Null
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for SqlValue {
            fn from(v: $t) -> Self {
                Self::Int(i64::from(v))
            }
        }
    )*};
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for SqlValue {
            fn from(v: $t) -> Self {
                Self::UInt(u64::from(v))
            }
        }
    )*};
}

from_signed!(i8, i16, i32, i64);
from_unsigned!(u8, u16, u32, u64);

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Binary(Bytes::from(v))
    }
}

impl From<&[u8]> for SqlValue {
    fn from(v: &[u8]) -> Self {
        Self::Binary(Bytes::copy_from_slice(v))
    }
}

impl From<Bytes> for SqlValue {
    fn from(v: Bytes) -> Self {
        Self::Binary(v)
    }
}

impl From<Indicator> for SqlValue {
    fn from(v: Indicator) -> Self {
        Self::Indicator(v)
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

#[cfg(feature = "decimal")]
impl From<rust_decimal::Decimal> for SqlValue {
    fn from(v: rust_decimal::Decimal) -> Self {
        Self::Decimal(v.to_string())
    }
}

#[cfg(feature = "chrono")]
impl From<chrono::NaiveDate> for SqlValue {
    fn from(v: chrono::NaiveDate) -> Self {
        Self::Date(v.into())
    }
}

#[cfg(feature = "chrono")]
impl From<chrono::NaiveTime> for SqlValue {
    fn from(v: chrono::NaiveTime) -> Self {
        Self::Time(v.into())
    }
}

#[cfg(feature = "chrono")]
impl From<chrono::NaiveDateTime> for SqlValue {
    fn from(v: chrono::NaiveDateTime) -> Self {
        Self::DateTime(v.into())
    }
}

#[cfg(feature = "chrono")]
impl From<chrono::TimeDelta> for SqlValue {
    fn from(v: chrono::TimeDelta) -> Self {
        Self::Time(v.into())
    }
}
