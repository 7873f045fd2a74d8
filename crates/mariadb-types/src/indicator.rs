//! Per-value indicators.
//!
//! An indicator tells the server to do something other than store a
//! supplied value: store NULL, use the column default, leave the column
//! alone, skip the row or (on the way back) that a value was truncated.

use mariadb_protocol::IndicatorCode;

use crate::value::SqlValue;

/// Special meaning attached to a parameter slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Indicator {
    /// A value is present.
    #[default]
    None,
    /// Store NULL.
    Null,
    /// Use the column default.
    Default,
    /// Leave the column untouched (the default on INSERT).
    Ignore,
    /// Skip the whole row of a bulk operation.
    IgnoreRow,
    /// Start a new bulk batch at this row. The slot itself is ignored.
    Restart,
    /// The server cut the value to fit the client buffer. Never bound.
    Truncated,
}

impl Indicator {
    /// Every indicator, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::None,
        Self::Null,
        Self::Default,
        Self::Ignore,
        Self::IgnoreRow,
        Self::Restart,
        Self::Truncated,
    ];

    /// Whether the slot carries something other than a plain value.
    #[must_use]
    pub const fn is_special(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Whether the slot is sent as a value-less indicator by the bulk writer.
    #[must_use]
    pub const fn is_bindable(self) -> bool {
        !matches!(self, Self::Truncated)
    }

    /// Indicator byte for `COM_STMT_BULK_EXECUTE`.
    ///
    /// `IgnoreRow` rows are never written and `Truncated` is never bound, so
    /// neither has a code. `Restart` slots are sent as `Ignore`.
    #[must_use]
    pub const fn wire_code(self) -> Option<IndicatorCode> {
        match self {
            Self::None => Some(IndicatorCode::None),
            Self::Null => Some(IndicatorCode::Null),
            Self::Default => Some(IndicatorCode::Default),
            Self::Ignore | Self::Restart => Some(IndicatorCode::Ignore),
            Self::IgnoreRow | Self::Truncated => None,
        }
    }

    /// Name used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Null => "NULL",
            Self::Default => "DEFAULT",
            Self::Ignore => "IGNORE",
            Self::IgnoreRow => "IGNORE_ROW",
            Self::Restart => "RESTART",
            Self::Truncated => "TRUNCATED",
        }
    }
}

/// Classify a host value.
///
/// `Null` maps to [`Indicator::Null`], an explicit indicator maps to itself,
/// and every other value to [`Indicator::None`].
#[must_use]
pub fn classify(value: &SqlValue) -> Indicator {
    match value {
        SqlValue::Null => Indicator::Null,
        SqlValue::Indicator(tag) => *tag,
        _ => Indicator::None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_is_exclusive() {
        assert_eq!(classify(&SqlValue::Null), Indicator::Null);
        assert_eq!(classify(&SqlValue::Int(0)), Indicator::None);
        assert_eq!(classify(&SqlValue::Text(String::new())), Indicator::None);
        for tag in Indicator::ALL {
            let value = SqlValue::Indicator(tag);
            assert_eq!(classify(&value), tag);
            assert_eq!(value.is_null(), tag == Indicator::Null);
        }
    }

    #[test]
    fn test_wire_codes() {
        assert_eq!(Indicator::None.wire_code(), Some(IndicatorCode::None));
        assert_eq!(Indicator::Default.wire_code().map(|c| c as u8), Some(2));
        assert_eq!(Indicator::Restart.wire_code(), Some(IndicatorCode::Ignore));
        assert_eq!(Indicator::IgnoreRow.wire_code(), None);
        assert_eq!(Indicator::Truncated.wire_code(), None);
        assert!(!Indicator::Truncated.is_bindable());
    }
}
