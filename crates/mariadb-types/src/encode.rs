//! Binary encoding of parameter values.
//!
//! Values are encoded at the wire type inferred for their column, so every
//! row of a bulk column has the same width. The output is the value body
//! only; the length prefix of variable-length types is added by the
//! message writer.

use bytes::Bytes;
use mariadb_protocol::codec::{ByteOrder, ScalarBytes};
use mariadb_protocol::FieldType;

use crate::error::TypeError;
use crate::infer::{ColumnType, ValueKind};
use crate::time::SqlTime;
use crate::value::SqlValue;

/// Encoded body of one parameter value.
///
/// Scalars live inline; strings and blobs keep a shared buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamData {
    /// Fixed-size or temporal value.
    Inline(ScalarBytes),
    /// Variable-length value.
    Shared(Bytes),
}

impl ParamData {
    /// The encoded bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Self::Inline(v) => v,
            Self::Shared(v) => v,
        }
    }

    /// Encoded length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Whether the body is empty (e.g. an empty string or a zero date).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

impl AsRef<[u8]> for ParamData {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

/// Encode `value` as a member of `column`.
///
/// Returns `None` for slots that carry an indicator instead of data.
pub fn encode_value(value: &SqlValue, column: &ColumnType) -> Result<Option<ParamData>, TypeError> {
    if matches!(value, SqlValue::Null | SqlValue::Indicator(_)) {
        return Ok(None);
    }

    let mismatch = || TypeError::TypeMismatch {
        expected: column.kind.name(),
        actual: value.type_name().to_string(),
    };

    let data = match column.kind {
        ValueKind::Bool | ValueKind::Int => {
            let width = column.int_width.ok_or_else(mismatch)?;
            let v = match value {
                SqlValue::Bool(v) => i128::from(*v),
                SqlValue::Int(v) => i128::from(*v),
                SqlValue::UInt(v) => i128::from(*v),
                _ => return Err(mismatch()),
            };
            if !width.fits(v, column.wire_type.unsigned) {
                return Err(TypeError::OutOfRange {
                    target_type: column.wire_type.field_type.name(),
                });
            }
            ParamData::Inline(ByteOrder::WIRE.encode_uint(v as u64, width.bytes()))
        }
        ValueKind::Double => {
            let v = match value {
                SqlValue::Double(v) => *v,
                SqlValue::Float(v) => f64::from(*v),
                SqlValue::Int(v) => exact_f64(i128::from(*v))?,
                SqlValue::UInt(v) => exact_f64(i128::from(*v))?,
                SqlValue::Bool(v) => f64::from(u8::from(*v)),
                _ => return Err(mismatch()),
            };
            ParamData::Inline(ScalarBytes::from_slice(&ByteOrder::WIRE.encode_f64(v)))
        }
        ValueKind::Text => match value {
            SqlValue::Text(s) => ParamData::Shared(Bytes::copy_from_slice(s.as_bytes())),
            _ => return Err(mismatch()),
        },
        ValueKind::Binary => match value {
            SqlValue::Binary(b) => ParamData::Shared(b.clone()),
            _ => return Err(mismatch()),
        },
        ValueKind::Decimal => match value {
            SqlValue::Decimal(s) => ParamData::Shared(Bytes::copy_from_slice(s.as_bytes())),
            _ => return Err(mismatch()),
        },
        ValueKind::Date => match value {
            SqlValue::Date(t) => ParamData::Inline(encode_date(t)),
            _ => return Err(mismatch()),
        },
        ValueKind::DateTime => match value {
            SqlValue::Date(t) | SqlValue::DateTime(t) => ParamData::Inline(encode_datetime(t)),
            _ => return Err(mismatch()),
        },
        ValueKind::Time => match value {
            SqlValue::Time(t) => ParamData::Inline(encode_time(t)),
            _ => return Err(mismatch()),
        },
        ValueKind::Null => return Err(mismatch()),
    };
    Ok(Some(data))
}

/// Convert an integer sent in a `DOUBLE` column, rejecting values the
/// conversion would round.
fn exact_f64(v: i128) -> Result<f64, TypeError> {
    let f = v as f64;
    if f as i128 != v {
        return Err(TypeError::OutOfRange {
            target_type: FieldType::Double.name(),
        });
    }
    Ok(f)
}

/// Encode a `DATE` body: empty for a zero date, otherwise 4 bytes.
#[must_use]
pub fn encode_date(t: &SqlTime) -> ScalarBytes {
    let mut out = ScalarBytes::new();
    if !t.is_zero_date() {
        out.extend_from_slice(&t.year.to_le_bytes());
        out.push(t.month);
        out.push(t.day);
    }
    out
}

/// Encode a `DATETIME` body of 0, 4, 7 or 11 bytes.
///
/// Trailing zero components are omitted.
#[must_use]
pub fn encode_datetime(t: &SqlTime) -> ScalarBytes {
    if t.is_zero_date() && t.is_midnight() {
        return ScalarBytes::new();
    }
    let mut out = ScalarBytes::new();
    out.extend_from_slice(&t.year.to_le_bytes());
    out.push(t.month);
    out.push(t.day);
    if !t.is_midnight() {
        // hour is validated to < 24 for datetimes
        out.push(t.hour as u8);
        out.push(t.minute);
        out.push(t.second);
        if t.microsecond != 0 {
            out.extend_from_slice(&t.microsecond.to_le_bytes());
        }
    }
    out
}

/// Encode a `TIME` body of 0, 8 or 12 bytes.
///
/// Hours beyond a day are split into a day count.
#[must_use]
pub fn encode_time(t: &SqlTime) -> ScalarBytes {
    if t.is_midnight() {
        return ScalarBytes::new();
    }
    let mut out = ScalarBytes::new();
    out.push(u8::from(t.negative));
    out.extend_from_slice(&(t.hour / 24).to_le_bytes());
    out.push((t.hour % 24) as u8);
    out.push(t.minute);
    out.push(t.second);
    if t.microsecond != 0 {
        out.extend_from_slice(&t.microsecond.to_le_bytes());
    }
    out
}
