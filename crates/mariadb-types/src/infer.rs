//! Wire type inference.
//!
//! Every bound value needs a wire type. For a single row that is a direct
//! mapping from the host value; for a bulk column all rows must share one
//! type, so the per-row types are merged along a widening lattice:
//!
//! - integers widen to the smallest width holding every row,
//! - integers and floats together widen to `DOUBLE`,
//! - `DATE` widens to `DATETIME`.
//!
//! Any other mix is rejected. Slots carrying an indicator do not take part.

use mariadb_protocol::{FieldType, WireType};

use crate::error::TypeError;
use crate::indicator::{Indicator, classify};
use crate::time::TemporalKind;
use crate::value::SqlValue;

/// Host type of a parameter column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Only indicators (or no rows at all).
    Null,
    /// Booleans.
    Bool,
    /// Integers, signed or unsigned.
    Int,
    /// Floating point, possibly mixed with integers.
    Double,
    /// Character data.
    Text,
    /// Binary data.
    Binary,
    /// Exact decimal digit string.
    Decimal,
    /// Dates.
    Date,
    /// Times or durations.
    Time,
    /// Dates with time of day.
    DateTime,
}

impl ValueKind {
    /// Name used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool => "BOOLEAN",
            Self::Int => "INTEGER",
            Self::Double => "DOUBLE",
            Self::Text => "VARCHAR",
            Self::Binary => "BLOB",
            Self::Decimal => "DECIMAL",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::DateTime => "DATETIME",
        }
    }

    /// Temporal kind, for date and time columns.
    #[must_use]
    pub const fn temporal(self) -> Option<TemporalKind> {
        match self {
            Self::Date => Some(TemporalKind::Date),
            Self::Time => Some(TemporalKind::Time),
            Self::DateTime => Some(TemporalKind::DateTime),
            _ => None,
        }
    }
}

/// Width of an integer parameter in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntWidth {
    /// `TINYINT`.
    One = 1,
    /// `SMALLINT`.
    Two = 2,
    /// `INT`.
    Four = 4,
    /// `BIGINT`.
    Eight = 8,
}

impl IntWidth {
    /// All widths, narrowest first.
    pub const ALL: [Self; 4] = [Self::One, Self::Two, Self::Four, Self::Eight];

    /// Number of bytes on the wire.
    #[must_use]
    pub const fn bytes(self) -> usize {
        self as usize
    }

    /// Field type sent for this width.
    #[must_use]
    pub const fn field_type(self) -> FieldType {
        match self {
            Self::One => FieldType::Tiny,
            Self::Two => FieldType::Short,
            Self::Four => FieldType::Long,
            Self::Eight => FieldType::LongLong,
        }
    }

    /// Whether `value` can be stored at this width.
    #[must_use]
    pub fn fits(self, value: i128, unsigned: bool) -> bool {
        let bits = self.bytes() as u32 * 8;
        if unsigned {
            value >= 0 && value < (1i128 << bits)
        } else {
            let half = 1i128 << (bits - 1);
            value >= -half && value < half
        }
    }

    /// Smallest width (and signedness) holding every value in `min..=max`.
    ///
    /// Signed widths are tried first; unsigned ones only when no value is
    /// negative. Returns `None` when no 8-byte type covers the range.
    #[must_use]
    pub fn smallest(min: i128, max: i128) -> Option<(Self, bool)> {
        let covers = |width: Self, unsigned: bool| width.fits(min, unsigned) && width.fits(max, unsigned);
        Self::ALL.into_iter().find_map(|width| {
            if covers(width, false) {
                Some((width, false))
            } else if min >= 0 && covers(width, true) {
                Some((width, true))
            } else {
                None
            }
        })
    }
}

/// Inferred type of one parameter column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnType {
    /// Wire type announced to the server.
    pub wire_type: WireType,
    /// Integer width, for integer and boolean columns.
    pub int_width: Option<IntWidth>,
    /// Host type of the column.
    pub kind: ValueKind,
    /// Whether any value is negative.
    pub negative: bool,
    /// Whether any slot carries an indicator.
    pub has_indicator: bool,
}

impl ColumnType {
    /// Column made only of indicators.
    pub const NULL: Self = Self {
        wire_type: WireType::NULL,
        int_width: None,
        kind: ValueKind::Null,
        negative: false,
        has_indicator: true,
    };

    /// Whether values of this column carry no data.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.kind == ValueKind::Null
    }
}

/// Merge state of one column while scanning its rows.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Acc {
    Empty,
    Int { min: i128, max: i128, all_bool: bool },
    Double,
    Text,
    Binary,
    Decimal,
    Date,
    Time,
    DateTime,
}

impl Acc {
    fn kind(self) -> ValueKind {
        match self {
            Self::Empty => ValueKind::Null,
            Self::Int { all_bool: true, .. } => ValueKind::Bool,
            Self::Int { .. } => ValueKind::Int,
            Self::Double => ValueKind::Double,
            Self::Text => ValueKind::Text,
            Self::Binary => ValueKind::Binary,
            Self::Decimal => ValueKind::Decimal,
            Self::Date => ValueKind::Date,
            Self::Time => ValueKind::Time,
            Self::DateTime => ValueKind::DateTime,
        }
    }

    fn of(value: &SqlValue) -> Result<Self, TypeError> {
        Ok(match value {
            SqlValue::Bool(v) => {
                let v = i128::from(*v);
                Self::Int { min: v, max: v, all_bool: true }
            }
            SqlValue::Int(v) => {
                let v = i128::from(*v);
                Self::Int { min: v, max: v, all_bool: false }
            }
            SqlValue::UInt(v) => {
                let v = i128::from(*v);
                Self::Int { min: v, max: v, all_bool: false }
            }
            SqlValue::Float(_) | SqlValue::Double(_) => Self::Double,
            SqlValue::Text(_) => Self::Text,
            SqlValue::Binary(_) => Self::Binary,
            SqlValue::Decimal(digits) => {
                validate_decimal(digits)?;
                Self::Decimal
            }
            SqlValue::Date(t) => {
                t.validate(TemporalKind::Date)?;
                Self::Date
            }
            SqlValue::Time(t) => {
                t.validate(TemporalKind::Time)?;
                Self::Time
            }
            SqlValue::DateTime(t) => {
                t.validate(TemporalKind::DateTime)?;
                Self::DateTime
            }
            SqlValue::Null | SqlValue::Indicator(_) => Self::Empty,
        })
    }

    fn merge(self, other: Self) -> Option<Self> {
        use Acc::*;
        Some(match (self, other) {
            (Empty, x) | (x, Empty) => x,
            (
                Int { min: a_min, max: a_max, all_bool: a_bool },
                Int { min: b_min, max: b_max, all_bool: b_bool },
            ) => Int {
                min: a_min.min(b_min),
                max: a_max.max(b_max),
                all_bool: a_bool && b_bool,
            },
            (Int { .. } | Double, Int { .. } | Double) => Double,
            (Date | DateTime, Date | DateTime) if self != other => DateTime,
            (a, b) if a == b => a,
            _ => return None,
        })
    }
}

/// Check that a decimal string is `[+-]digits[.digits]`.
pub fn validate_decimal(digits: &str) -> Result<(), TypeError> {
    let body = digits.strip_prefix(['-', '+']).unwrap_or(digits);
    let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part) {
        return Err(TypeError::InvalidDecimal(digits.to_owned()));
    }
    Ok(())
}

/// Infer the type of one column from its values in row order.
///
/// `column` is only used to position errors.
pub fn infer_column<'a, I>(column: usize, values: I) -> Result<ColumnType, TypeError>
where
    I: IntoIterator<Item = &'a SqlValue>,
{
    let mut acc = Acc::Empty;
    let mut has_indicator = false;
    let mut last_row = 0;

    for (row, value) in values.into_iter().enumerate() {
        last_row = row;
        match classify(value) {
            Indicator::None => {}
            Indicator::Truncated => {
                return Err(TypeError::Truncation(
                    "a TRUNCATED indicator cannot be bound".into(),
                )
                .at(column, row));
            }
            _ => {
                has_indicator = true;
                continue;
            }
        }

        let next = Acc::of(value).map_err(|e| e.at(column, row))?;
        acc = acc.merge(next).ok_or_else(|| TypeError::IncompatibleColumn {
            column,
            row,
            expected: acc.kind().name(),
            actual: value.type_name(),
        })?;
        if let Acc::Int { min, max, .. } = acc {
            if IntWidth::smallest(min, max).is_none() {
                return Err(TypeError::OutOfRange {
                    target_type: "BIGINT",
                }
                .at(column, row));
            }
        }
    }

    let kind = acc.kind();
    let (wire_type, int_width, negative) = match acc {
        Acc::Empty => return Ok(ColumnType { has_indicator, ..ColumnType::NULL }),
        Acc::Int { min, max, .. } => {
            let (width, unsigned) = IntWidth::smallest(min, max).ok_or_else(|| {
                TypeError::OutOfRange {
                    target_type: "BIGINT",
                }
                .at(column, last_row)
            })?;
            let wire_type = if unsigned {
                WireType::unsigned(width.field_type())
            } else {
                WireType::new(width.field_type())
            };
            (wire_type, Some(width), min < 0)
        }
        Acc::Double => (WireType::new(FieldType::Double), None, false),
        Acc::Text => (WireType::new(FieldType::VarString), None, false),
        Acc::Binary => (WireType::new(FieldType::Blob), None, false),
        Acc::Decimal => (WireType::new(FieldType::NewDecimal), None, false),
        Acc::Date => (WireType::new(FieldType::Date), None, false),
        Acc::Time => (WireType::new(FieldType::Time), None, false),
        Acc::DateTime => (WireType::new(FieldType::DateTime), None, false),
    };

    Ok(ColumnType {
        wire_type,
        int_width,
        kind,
        negative,
        has_indicator,
    })
}

/// Infer the wire type of a single value.
///
/// Returns `None` for values sent through the indicator path (NULL and
/// special indicators).
pub fn infer(value: &SqlValue) -> Result<Option<WireType>, TypeError> {
    let column = infer_column(0, std::iter::once(value))?;
    Ok((!column.is_null()).then_some(column.wire_type))
}
