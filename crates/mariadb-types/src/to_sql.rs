//! Trait for converting Rust types to SQL values.

use bytes::Bytes;

use crate::error::TypeError;
use crate::indicator::Indicator;
use crate::value::SqlValue;

/// Trait for types that can be converted to SQL values.
///
/// This trait is implemented for common Rust types to enable
/// type-safe parameter binding in queries.
pub trait ToSql {
    /// Convert this value to a SQL value.
    fn to_sql(&self) -> Result<SqlValue, TypeError>;

    /// Get the SQL type name for this value.
    fn sql_type(&self) -> &'static str;
}

impl ToSql for bool {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(SqlValue::Bool(*self))
    }

    fn sql_type(&self) -> &'static str {
        "BOOLEAN"
    }
}

macro_rules! to_sql_int {
    ($($t:ty => $name:literal),* $(,)?) => {$(
        impl ToSql for $t {
            fn to_sql(&self) -> Result<SqlValue, TypeError> {
                Ok(SqlValue::from(*self))
            }

            fn sql_type(&self) -> &'static str {
                $name
            }
        }
    )*};
}

to_sql_int!(
    i8 => "TINYINT",
    i16 => "SMALLINT",
    i32 => "INT",
    i64 => "BIGINT",
    u8 => "TINYINT UNSIGNED",
    u16 => "SMALLINT UNSIGNED",
    u32 => "INT UNSIGNED",
    u64 => "BIGINT UNSIGNED",
);

impl ToSql for f32 {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(SqlValue::Float(*self))
    }

    fn sql_type(&self) -> &'static str {
        "FLOAT"
    }
}

impl ToSql for f64 {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(SqlValue::Double(*self))
    }

    fn sql_type(&self) -> &'static str {
        "DOUBLE"
    }
}

impl ToSql for str {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(SqlValue::Text(self.to_owned()))
    }

    fn sql_type(&self) -> &'static str {
        "VARCHAR"
    }
}

impl ToSql for String {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(SqlValue::Text(self.clone()))
    }

    fn sql_type(&self) -> &'static str {
        "VARCHAR"
    }
}

impl ToSql for [u8] {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(SqlValue::Binary(Bytes::copy_from_slice(self)))
    }

    fn sql_type(&self) -> &'static str {
        "BLOB"
    }
}

impl ToSql for Vec<u8> {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(SqlValue::Binary(Bytes::copy_from_slice(self)))
    }

    fn sql_type(&self) -> &'static str {
        "BLOB"
    }
}

impl ToSql for Bytes {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(SqlValue::Binary(self.clone()))
    }

    fn sql_type(&self) -> &'static str {
        "BLOB"
    }
}

impl ToSql for Indicator {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        if !self.is_bindable() {
            return Err(TypeError::Truncation(
                "a TRUNCATED indicator cannot be bound".into(),
            ));
        }
        Ok(SqlValue::Indicator(*self))
    }

    fn sql_type(&self) -> &'static str {
        self.name()
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(self.clone())
    }

    fn sql_type(&self) -> &'static str {
        self.type_name()
    }
}

impl<T: ToSql> ToSql for Option<T> {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        match self {
            Some(v) => v.to_sql(),
            None => Ok(SqlValue::Null),
        }
    }

    fn sql_type(&self) -> &'static str {
        match self {
            Some(v) => v.sql_type(),
            None => "NULL",
        }
    }
}

impl<T: ToSql + ?Sized> ToSql for &T {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        (*self).to_sql()
    }

    fn sql_type(&self) -> &'static str {
        (*self).sql_type()
    }
}

#[cfg(feature = "decimal")]
impl ToSql for rust_decimal::Decimal {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(SqlValue::from(*self))
    }

    fn sql_type(&self) -> &'static str {
        "DECIMAL"
    }
}

#[cfg(feature = "chrono")]
impl ToSql for chrono::NaiveDate {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(SqlValue::from(*self))
    }

    fn sql_type(&self) -> &'static str {
        "DATE"
    }
}

#[cfg(feature = "chrono")]
impl ToSql for chrono::NaiveTime {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(SqlValue::from(*self))
    }

    fn sql_type(&self) -> &'static str {
        "TIME"
    }
}

#[cfg(feature = "chrono")]
impl ToSql for chrono::NaiveDateTime {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(SqlValue::from(*self))
    }

    fn sql_type(&self) -> &'static str {
        "DATETIME"
    }
}

#[cfg(feature = "chrono")]
impl ToSql for chrono::TimeDelta {
    fn to_sql(&self) -> Result<SqlValue, TypeError> {
        Ok(SqlValue::from(*self))
    }

    fn sql_type(&self) -> &'static str {
        "TIME"
    }
}
