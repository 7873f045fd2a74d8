//! Trait for converting from SQL values to Rust types.

use bytes::Bytes;

use crate::error::TypeError;
use crate::indicator::Indicator;
use crate::time::SqlTime;
use crate::value::SqlValue;

/// Trait for types that can be converted from SQL values.
///
/// This trait is implemented for common Rust types to enable
/// type-safe extraction of values from query results.
pub trait FromSql: Sized {
    /// Convert from a SQL value to this type.
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError>;

    /// Convert from an optional SQL value.
    ///
    /// Returns `None` if the value is NULL.
    fn from_sql_nullable(value: &SqlValue) -> Result<Option<Self>, TypeError> {
        if value.is_null() {
            Ok(None)
        } else {
            Self::from_sql(value).map(Some)
        }
    }
}

fn mismatch(expected: &'static str, value: &SqlValue) -> TypeError {
    match value {
        SqlValue::Null => TypeError::UnexpectedNull,
        SqlValue::Indicator(Indicator::Truncated) => {
            TypeError::Truncation(format!("{expected} value exceeded the field length limit"))
        }
        _ => TypeError::TypeMismatch {
            expected,
            actual: value.type_name().to_string(),
        },
    }
}

impl FromSql for bool {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Bool(v) => Ok(*v),
            SqlValue::Int(v) => Ok(*v != 0),
            SqlValue::UInt(v) => Ok(*v != 0),
            _ => Err(mismatch("bool", value)),
        }
    }
}

macro_rules! from_sql_int {
    ($($t:ty),*) => {$(
        impl FromSql for $t {
            fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
                let out_of_range = || TypeError::OutOfRange {
                    target_type: stringify!($t),
                };
                match value {
                    SqlValue::Int(v) => <$t>::try_from(*v).map_err(|_| out_of_range()),
                    SqlValue::UInt(v) => <$t>::try_from(*v).map_err(|_| out_of_range()),
                    SqlValue::Bool(v) => Ok(<$t>::from(*v)),
                    _ => Err(mismatch(stringify!($t), value)),
                }
            }
        }
    )*};
}

from_sql_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl FromSql for f32 {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Float(v) => Ok(*v),
            _ => Err(mismatch("f32", value)),
        }
    }
}

impl FromSql for f64 {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Double(v) => Ok(*v),
            SqlValue::Float(v) => Ok(f64::from(*v)),
            _ => Err(mismatch("f64", value)),
        }
    }
}

impl FromSql for String {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Text(v) | SqlValue::Decimal(v) => Ok(v.clone()),
            _ => Err(mismatch("String", value)),
        }
    }
}

impl FromSql for Vec<u8> {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Binary(v) => Ok(v.to_vec()),
            SqlValue::Text(v) => Ok(v.as_bytes().to_vec()),
            _ => Err(mismatch("Vec<u8>", value)),
        }
    }
}

impl FromSql for Bytes {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Binary(v) => Ok(v.clone()),
            _ => Err(mismatch("Bytes", value)),
        }
    }
}

impl FromSql for SqlTime {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        value
            .as_sql_time()
            .copied()
            .ok_or_else(|| mismatch("SqlTime", value))
    }
}

impl FromSql for SqlValue {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        Ok(value.clone())
    }
}

impl<T: FromSql> FromSql for Option<T> {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        T::from_sql_nullable(value)
    }
}

#[cfg(feature = "decimal")]
impl FromSql for rust_decimal::Decimal {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Decimal(s) | SqlValue::Text(s) => s
                .parse()
                .map_err(|e| TypeError::InvalidDecimal(format!("{e}"))),
            SqlValue::Int(v) => Ok(rust_decimal::Decimal::from(*v)),
            SqlValue::UInt(v) => Ok(rust_decimal::Decimal::from(*v)),
            _ => Err(mismatch("Decimal", value)),
        }
    }
}

#[cfg(feature = "chrono")]
impl FromSql for chrono::NaiveDate {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Date(v) | SqlValue::DateTime(v) => chrono::NaiveDate::try_from(*v),
            _ => Err(mismatch("NaiveDate", value)),
        }
    }
}

#[cfg(feature = "chrono")]
impl FromSql for chrono::NaiveTime {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Time(v) | SqlValue::DateTime(v) => chrono::NaiveTime::try_from(*v),
            _ => Err(mismatch("NaiveTime", value)),
        }
    }
}

#[cfg(feature = "chrono")]
impl FromSql for chrono::NaiveDateTime {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::DateTime(v) | SqlValue::Date(v) => chrono::NaiveDateTime::try_from(*v),
            _ => Err(mismatch("NaiveDateTime", value)),
        }
    }
}

#[cfg(feature = "chrono")]
impl FromSql for chrono::TimeDelta {
    fn from_sql(value: &SqlValue) -> Result<Self, TypeError> {
        match value {
            SqlValue::Time(v) => Ok(chrono::TimeDelta::from(*v)),
            _ => Err(mismatch("TimeDelta", value)),
        }
    }
}
