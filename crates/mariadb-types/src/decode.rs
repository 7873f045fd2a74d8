//! Binary row value decoding.
//!
//! Each non-NULL column of a binary row is decoded according to its
//! [`FieldDescriptor`]. A declared length running past the end of the buffer
//! fails with [`TypeError::BufferTooSmall`] and no partial value is
//! returned.

use bytes::{Buf, Bytes};
use mariadb_protocol::codec::{get_f32, get_f64, get_int, get_lenenc_bytes, get_uint};
use mariadb_protocol::{BinaryRow, CharsetId, FieldDescriptor, FieldType, ProtocolError};

use crate::error::TypeError;
use crate::indicator::Indicator;
use crate::time::SqlTime;
use crate::value::SqlValue;

/// Settings that affect decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeOptions {
    /// Connection charset, used when a column's charset is not recognised.
    pub charset: CharsetId,
    /// Text and blob values longer than this decode as
    /// [`Indicator::Truncated`].
    pub max_field_length: Option<usize>,
}

impl DecodeOptions {
    /// Options for the given connection charset.
    #[must_use]
    pub fn new(charset: CharsetId) -> Self {
        Self {
            charset,
            max_field_length: None,
        }
    }

    /// Set the field length limit.
    #[must_use]
    pub fn with_max_field_length(mut self, limit: Option<usize>) -> Self {
        self.max_field_length = limit;
        self
    }
}

/// Decode every column of a framed binary row.
pub fn decode_row(
    row: &BinaryRow,
    fields: &[FieldDescriptor],
    options: &DecodeOptions,
) -> Result<Vec<SqlValue>, TypeError> {
    let mut values = row.values();
    let mut out = Vec::with_capacity(fields.len());
    for (i, field) in fields.iter().enumerate() {
        if row.is_null(i) {
            out.push(SqlValue::Null);
        } else {
            out.push(decode_field(&mut values, field, options)?);
        }
    }
    if values.has_remaining() {
        return Err(ProtocolError::TrailingBytes(values.remaining()).into());
    }
    Ok(out)
}

/// Decode one non-NULL field, advancing `buf` past it.
pub fn decode_field(
    buf: &mut Bytes,
    field: &FieldDescriptor,
    options: &DecodeOptions,
) -> Result<SqlValue, TypeError> {
    let unsigned = field.is_unsigned();
    match field.field_type {
        FieldType::Null => Ok(SqlValue::Null),
        FieldType::Tiny => decode_integer(buf, 1, unsigned),
        FieldType::Short | FieldType::Year => decode_integer(buf, 2, unsigned),
        FieldType::Int24 | FieldType::Long => decode_integer(buf, 4, unsigned),
        FieldType::LongLong => decode_integer(buf, 8, unsigned),
        FieldType::Float => Ok(SqlValue::Float(get_f32(buf)?)),
        FieldType::Double => Ok(SqlValue::Double(get_f64(buf)?)),
        FieldType::Date | FieldType::NewDate => decode_date(buf),
        FieldType::DateTime | FieldType::Timestamp => decode_datetime(buf),
        FieldType::Time => decode_time(buf),
        FieldType::Decimal | FieldType::NewDecimal => {
            let raw = read_length_encoded(buf)?;
            let digits = String::from_utf8(raw.to_vec())
                .map_err(|e| TypeError::InvalidDecimal(e.to_string()))?;
            Ok(SqlValue::Decimal(digits))
        }
        FieldType::Bit | FieldType::Geometry => {
            let raw = read_length_encoded(buf)?;
            Ok(limit(raw, options).map_or(SqlValue::Indicator(Indicator::Truncated), SqlValue::Binary))
        }
        FieldType::VarChar
        | FieldType::VarString
        | FieldType::String
        | FieldType::Json
        | FieldType::Enum
        | FieldType::Set
        | FieldType::TinyBlob
        | FieldType::MediumBlob
        | FieldType::LongBlob
        | FieldType::Blob => {
            let raw = read_length_encoded(buf)?;
            let Some(raw) = limit(raw, options) else {
                return Ok(SqlValue::Indicator(Indicator::Truncated));
            };
            if field.is_binary() {
                Ok(SqlValue::Binary(raw))
            } else {
                decode_text(raw, field.charset, options.charset).map(SqlValue::Text)
            }
        }
    }
}

fn decode_integer(buf: &mut Bytes, width: usize, unsigned: bool) -> Result<SqlValue, TypeError> {
    if unsigned {
        Ok(SqlValue::UInt(get_uint(buf, width)?))
    } else {
        Ok(SqlValue::Int(get_int(buf, width)?))
    }
}

fn read_length_encoded(buf: &mut Bytes) -> Result<Bytes, TypeError> {
    get_lenenc_bytes(buf)?.ok_or(TypeError::UnexpectedNull)
}

fn limit(raw: Bytes, options: &DecodeOptions) -> Option<Bytes> {
    match options.max_field_length {
        Some(max) if raw.len() > max => None,
        _ => Some(raw),
    }
}

/// Read the length byte of a temporal value and take that many bytes.
fn temporal_body(buf: &mut Bytes, allowed: &[usize]) -> Result<Bytes, TypeError> {
    let len = get_uint(buf, 1)? as usize;
    if !allowed.contains(&len) {
        return Err(TypeError::InvalidDateTime(format!(
            "invalid temporal length {len}"
        )));
    }
    if buf.remaining() < len {
        return Err(TypeError::BufferTooSmall {
            needed: len,
            available: buf.remaining(),
        });
    }
    Ok(buf.split_to(len))
}

fn decode_date(buf: &mut Bytes) -> Result<SqlValue, TypeError> {
    let mut body = temporal_body(buf, &[0, 4, 7, 11])?;
    if body.is_empty() {
        return Ok(SqlValue::Null);
    }
    let date = SqlTime::date(body.get_u16_le(), body.get_u8(), body.get_u8());
    if date.is_zero_date() {
        return Ok(SqlValue::Null);
    }
    Ok(SqlValue::Date(date))
}

fn decode_datetime(buf: &mut Bytes) -> Result<SqlValue, TypeError> {
    let mut body = temporal_body(buf, &[0, 4, 7, 11])?;
    if body.is_empty() {
        return Ok(SqlValue::Null);
    }
    let mut t = SqlTime::date(body.get_u16_le(), body.get_u8(), body.get_u8());
    if body.remaining() >= 3 {
        t.hour = u32::from(body.get_u8());
        t.minute = body.get_u8();
        t.second = body.get_u8();
    }
    if body.remaining() >= 4 {
        t.microsecond = body.get_u32_le();
    }
    if t.is_zero_date() {
        return Ok(SqlValue::Null);
    }
    Ok(SqlValue::DateTime(t))
}

fn decode_time(buf: &mut Bytes) -> Result<SqlValue, TypeError> {
    let mut body = temporal_body(buf, &[0, 8, 12])?;
    if body.is_empty() {
        return Ok(SqlValue::Time(SqlTime::default()));
    }
    let negative = body.get_u8() != 0;
    let days = body.get_u32_le();
    let mut t = SqlTime::time(
        days.saturating_mul(24).saturating_add(u32::from(body.get_u8())),
        body.get_u8(),
        body.get_u8(),
        0,
    );
    if body.remaining() >= 4 {
        t.microsecond = body.get_u32_le();
    }
    t.negative = negative;
    Ok(SqlValue::Time(t))
}

/// Decode text bytes in the column's charset.
///
/// UTF-8 is tried first. Without the `encoding` feature, or for an unknown
/// charset, invalid sequences are replaced.
fn decode_text(raw: Bytes, charset: CharsetId, fallback: CharsetId) -> Result<String, TypeError> {
    let raw = match String::from_utf8(raw.to_vec()) {
        Ok(s) => return Ok(s),
        Err(e) => e.into_bytes(),
    };

    #[cfg(feature = "encoding")]
    if let Some(encoding) = encoding_for_charset(charset).or_else(|| encoding_for_charset(fallback)) {
        if encoding != encoding_rs::UTF_8 {
            let (decoded, _, had_errors) = encoding.decode(&raw);
            if !had_errors {
                return Ok(decoded.into_owned());
            }
            return Err(TypeError::InvalidEncoding(format!(
                "invalid {} sequence",
                encoding.name()
            )));
        }
    }

    #[cfg(not(feature = "encoding"))]
    let _ = (charset, fallback);

    Ok(String::from_utf8_lossy(&raw).into_owned())
}

/// Map a MariaDB collation id to its character encoding.
#[cfg(feature = "encoding")]
#[must_use]
pub fn encoding_for_charset(charset: CharsetId) -> Option<&'static encoding_rs::Encoding> {
    Some(match charset.0 {
        1 | 84 => encoding_rs::BIG5,
        7 | 74 => encoding_rs::KOI8_R,
        5 | 8 | 15 | 31 | 47 | 48 | 49 | 94 => encoding_rs::WINDOWS_1252,
        12 | 91 => encoding_rs::EUC_JP,
        13 | 88 | 95 | 96 => encoding_rs::SHIFT_JIS,
        19 | 85 => encoding_rs::EUC_KR,
        24 | 28 | 86 | 87 => encoding_rs::GBK,
        26 | 34 | 44 | 66 | 99 => encoding_rs::WINDOWS_1250,
        14 | 23 | 50 | 51 | 52 => encoding_rs::WINDOWS_1251,
        57 | 67 => encoding_rs::WINDOWS_1256,
        59 | 29 => encoding_rs::WINDOWS_1257,
        248..=250 => encoding_rs::GB18030,
        33 | 45 | 46 | 76 | 83 | 192..=247 | 255 | 256..=309 => encoding_rs::UTF_8,
        _ => return None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mariadb_protocol::ColumnFlags;

    fn field(field_type: FieldType) -> FieldDescriptor {
        FieldDescriptor::new("c", field_type)
    }

    fn decode(bytes: &'static [u8], field: &FieldDescriptor) -> Result<SqlValue, TypeError> {
        decode_field(&mut Bytes::from_static(bytes), field, &DecodeOptions::default())
    }

    #[test]
    fn test_integers_by_sign_flag() {
        let tiny = field(FieldType::Tiny);
        assert_eq!(decode(&[0xFF], &tiny).unwrap(), SqlValue::Int(-1));
        let utiny = tiny.clone().with_flags(ColumnFlags::UNSIGNED);
        assert_eq!(decode(&[0xFF], &utiny).unwrap(), SqlValue::UInt(255));
        let int24 = field(FieldType::Int24);
        assert_eq!(decode(&[0, 0, 0x80, 0xFF], &int24).unwrap(), SqlValue::Int(-0x80_0000));
    }

    #[test]
    fn test_double_one() {
        let value = decode(&[0, 0, 0, 0, 0, 0, 0xF0, 0x3F], &field(FieldType::Double)).unwrap();
        assert_eq!(value, SqlValue::Double(1.0));
    }

    #[test]
    fn test_text_and_binary() {
        let text = field(FieldType::VarString);
        assert_eq!(
            decode(b"\x05hello", &text).unwrap(),
            SqlValue::Text("hello".into())
        );
        let blob = field(FieldType::Blob).with_charset(CharsetId::BINARY);
        assert_eq!(
            decode(b"\x02\x00\xFF", &blob).unwrap(),
            SqlValue::Binary(Bytes::from_static(&[0x00, 0xFF]))
        );
    }

    #[cfg(feature = "encoding")]
    #[test]
    fn test_latin1_text() {
        let latin1 = field(FieldType::VarString).with_charset(CharsetId::LATIN1);
        assert_eq!(
            decode(b"\x04caf\xE9", &latin1).unwrap(),
            SqlValue::Text("café".into())
        );
    }

    #[test]
    fn test_declared_length_past_buffer() {
        let text = field(FieldType::VarString);
        let err = decode(b"\x0Ashort", &text).unwrap_err();
        assert!(matches!(
            err,
            TypeError::BufferTooSmall {
                needed: 10,
                available: 5
            }
        ));
        assert!(err.is_malformed_input());

        let long = field(FieldType::LongLong);
        assert!(matches!(
            decode(&[1, 2, 3], &long),
            Err(TypeError::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn test_truncated_field() {
        let text = field(FieldType::VarString);
        let options = DecodeOptions::default().with_max_field_length(Some(3));
        let mut buf = Bytes::from_static(b"\x05hello\x02ok");
        assert_eq!(
            decode_field(&mut buf, &text, &options).unwrap(),
            SqlValue::Indicator(Indicator::Truncated)
        );
        assert_eq!(
            decode_field(&mut buf, &text, &options).unwrap(),
            SqlValue::Text("ok".into())
        );
    }

    #[test]
    fn test_temporal() {
        let date = field(FieldType::Date);
        assert_eq!(
            decode(&[4, 0xE8, 0x07, 2, 29], &date).unwrap(),
            SqlValue::Date(SqlTime::date(2024, 2, 29))
        );
        assert_eq!(decode(&[0], &date).unwrap(), SqlValue::Null);
        assert_eq!(decode(&[4, 0, 0, 0, 0], &date).unwrap(), SqlValue::Null);

        let datetime = field(FieldType::DateTime);
        assert_eq!(
            decode(&[11, 0xE8, 0x07, 2, 29, 13, 14, 15, 0x40, 0xE2, 0x01, 0x00], &datetime).unwrap(),
            SqlValue::DateTime(SqlTime::datetime(2024, 2, 29, 13, 14, 15, 123_456))
        );

        let time = field(FieldType::Time);
        let value = decode(&[8, 1, 2, 0, 0, 0, 1, 30, 0], &time).unwrap();
        assert_eq!(value, SqlValue::Time(SqlTime::time(49, 30, 0, 0).negated()));
        assert!(matches!(
            decode(&[5, 0, 0, 0, 0, 0], &time),
            Err(TypeError::InvalidDateTime(_))
        ));
    }

    #[test]
    fn test_decode_row_with_nulls() {
        let fields = [
            field(FieldType::Tiny),
            field(FieldType::VarString),
            field(FieldType::Long),
        ];
        let packet = BinaryRow::encode(&[false, true, false], &[42, 7, 0, 0, 0]);
        let row = BinaryRow::parse(packet, 3).unwrap();
        let values = decode_row(&row, &fields, &DecodeOptions::default()).unwrap();
        assert_eq!(values, vec![SqlValue::Int(42), SqlValue::Null, SqlValue::Int(7)]);
    }

    #[test]
    fn test_decode_row_rejects_trailing_bytes() {
        let fields = [field(FieldType::Tiny)];
        let packet = BinaryRow::encode(&[false], &[42, 0xAA, 0xBB]);
        let row = BinaryRow::parse(packet, 1).unwrap();
        let err = decode_row(&row, &fields, &DecodeOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            TypeError::Protocol(ProtocolError::TrailingBytes(2))
        ));
    }

    #[test]
    fn test_decimal_digits() {
        assert_eq!(
            decode(b"\x05-1.50", &field(FieldType::NewDecimal)).unwrap(),
            SqlValue::Decimal("-1.50".into())
        );
    }
}
