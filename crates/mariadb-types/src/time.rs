//! Decomposed temporal values.
//!
//! The binary protocol sends dates and times as separate calendar and clock
//! components rather than as a count of ticks, so [`SqlTime`] keeps them
//! split. Zero dates (`0000-00-00`) are representable here even though no
//! calendar type accepts them.
//!
//! With the `chrono` feature, conversions to and from `NaiveDate`,
//! `NaiveTime`, `NaiveDateTime` and `TimeDelta` are provided.

use crate::error::TypeError;

/// Which components of a [`SqlTime`] are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalKind {
    /// Calendar date only.
    Date,
    /// Time of day or signed duration.
    Time,
    /// Date and time of day.
    DateTime,
}

/// Calendar and clock components of a temporal value.
///
/// For durations (`TIME`), `hour` may exceed 23: day counts are folded into
/// hours, and `negative` carries the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SqlTime {
    /// Year, 0..=9999.
    pub year: u16,
    /// Month, 1..=12 (0 for zero dates).
    pub month: u8,
    /// Day of month, 1..=31 (0 for zero dates).
    pub day: u8,
    /// Hour; may exceed 23 for durations.
    pub hour: u32,
    /// Minute, 0..=59.
    pub minute: u8,
    /// Second, 0..=59.
    pub second: u8,
    /// Microsecond, 0..=999_999.
    pub microsecond: u32,
    /// Sign of a duration.
    pub negative: bool,
}

/// Largest hour count a `TIME` value can carry (`838:59:59`).
pub const MAX_TIME_HOURS: u32 = 838;

impl SqlTime {
    /// A calendar date.
    #[must_use]
    pub const fn date(year: u16, month: u8, day: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour: 0,
            minute: 0,
            second: 0,
            microsecond: 0,
            negative: false,
        }
    }

    /// A time of day or positive duration.
    #[must_use]
    pub const fn time(hour: u32, minute: u8, second: u8, microsecond: u32) -> Self {
        Self {
            year: 0,
            month: 0,
            day: 0,
            hour,
            minute,
            second,
            microsecond,
            negative: false,
        }
    }

    /// A date with time of day.
    #[must_use]
    pub const fn datetime(
        year: u16,
        month: u8,
        day: u8,
        hour: u32,
        minute: u8,
        second: u8,
        microsecond: u32,
    ) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            microsecond,
            negative: false,
        }
    }

    /// The same value with the opposite sign.
    #[must_use]
    pub const fn negated(mut self) -> Self {
        self.negative = !self.negative;
        self
    }

    /// Whether the date part is `0000-00-00`.
    #[must_use]
    pub const fn is_zero_date(&self) -> bool {
        self.year == 0 && self.month == 0 && self.day == 0
    }

    /// Whether the clock part is `00:00:00.000000`.
    #[must_use]
    pub const fn is_midnight(&self) -> bool {
        self.hour == 0 && self.minute == 0 && self.second == 0 && self.microsecond == 0
    }

    /// Check component ranges for the given kind.
    pub fn validate(&self, kind: TemporalKind) -> Result<(), TypeError> {
        let bad_date = self.year > 9999
            || !(1..=12).contains(&self.month)
            || !(1..=31).contains(&self.day);
        if kind != TemporalKind::Time && !self.is_zero_date() && bad_date {
            return Err(TypeError::InvalidDateTime(format!(
                "date {:04}-{:02}-{:02} out of range",
                self.year, self.month, self.day
            )));
        }
        let max_hour = if kind == TemporalKind::Time {
            MAX_TIME_HOURS
        } else {
            23
        };
        if self.hour > max_hour
            || self.minute > 59
            || self.second > 59
            || self.microsecond > 999_999
        {
            return Err(TypeError::InvalidDateTime(format!(
                "time {}:{:02}:{:02}.{:06} out of range",
                self.hour, self.minute, self.second, self.microsecond
            )));
        }
        if self.negative && kind != TemporalKind::Time {
            return Err(TypeError::InvalidDateTime(
                "only durations may be negative".into(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Display for SqlTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}-{:02} ", self.year, self.month, self.day)?;
        if self.negative {
            f.write_str("-")?;
        }
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)?;
        if self.microsecond != 0 {
            write!(f, ".{:06}", self.microsecond)?;
        }
        Ok(())
    }
}

#[cfg(feature = "chrono")]
mod chrono_impls {
    use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};

    use super::SqlTime;
    use crate::error::TypeError;

    impl From<NaiveDate> for SqlTime {
        fn from(v: NaiveDate) -> Self {
            Self::date(v.year() as u16, v.month() as u8, v.day() as u8)
        }
    }

    impl From<NaiveTime> for SqlTime {
        fn from(v: NaiveTime) -> Self {
            // leap seconds are reported as nanosecond >= 1e9
            let micros = (v.nanosecond() / 1_000).min(999_999);
            Self::time(v.hour(), v.minute() as u8, v.second() as u8, micros)
        }
    }

    impl From<NaiveDateTime> for SqlTime {
        fn from(v: NaiveDateTime) -> Self {
            let date = Self::from(v.date());
            let time = Self::from(v.time());
            Self { year: date.year, month: date.month, day: date.day, ..time }
        }
    }

    impl TryFrom<SqlTime> for NaiveDate {
        type Error = TypeError;

        fn try_from(v: SqlTime) -> Result<Self, Self::Error> {
            NaiveDate::from_ymd_opt(i32::from(v.year), u32::from(v.month), u32::from(v.day))
                .ok_or_else(|| TypeError::InvalidDateTime(format!("invalid date {v}")))
        }
    }

    impl TryFrom<SqlTime> for NaiveTime {
        type Error = TypeError;

        fn try_from(v: SqlTime) -> Result<Self, Self::Error> {
            if v.negative {
                return Err(TypeError::OutOfRange {
                    target_type: "NaiveTime",
                });
            }
            NaiveTime::from_hms_micro_opt(
                v.hour,
                u32::from(v.minute),
                u32::from(v.second),
                v.microsecond,
            )
            .ok_or(TypeError::OutOfRange {
                target_type: "NaiveTime",
            })
        }
    }

    impl TryFrom<SqlTime> for NaiveDateTime {
        type Error = TypeError;

        fn try_from(v: SqlTime) -> Result<Self, Self::Error> {
            let date = NaiveDate::try_from(v)?;
            let time = NaiveTime::try_from(v)?;
            Ok(date.and_time(time))
        }
    }

    impl From<TimeDelta> for SqlTime {
        fn from(v: TimeDelta) -> Self {
            let negative = v < TimeDelta::zero();
            let abs = v.abs();
            let total_seconds = abs.num_seconds();
            let micros = abs.subsec_nanos() / 1_000;
            let mut time = Self::time(
                u32::try_from(total_seconds / 3600).unwrap_or(u32::MAX),
                ((total_seconds / 60) % 60) as u8,
                (total_seconds % 60) as u8,
                micros as u32,
            );
            time.negative = negative;
            time
        }
    }

    impl From<SqlTime> for TimeDelta {
        fn from(v: SqlTime) -> Self {
            let delta = TimeDelta::hours(i64::from(v.hour))
                + TimeDelta::minutes(i64::from(v.minute))
                + TimeDelta::seconds(i64::from(v.second))
                + TimeDelta::microseconds(i64::from(v.microsecond));
            if v.negative { -delta } else { delta }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ranges() {
        assert!(SqlTime::date(2024, 2, 29).validate(TemporalKind::Date).is_ok());
        assert!(SqlTime::date(0, 0, 0).validate(TemporalKind::Date).is_ok());
        assert!(SqlTime::date(2024, 13, 1).validate(TemporalKind::Date).is_err());
        assert!(SqlTime::time(838, 59, 59, 0).validate(TemporalKind::Time).is_ok());
        assert!(SqlTime::time(839, 0, 0, 0).validate(TemporalKind::Time).is_err());
        assert!(
            SqlTime::datetime(2024, 1, 1, 24, 0, 0, 0)
                .validate(TemporalKind::DateTime)
                .is_err()
        );
        assert!(
            SqlTime::date(2024, 1, 1)
                .negated()
                .validate(TemporalKind::Date)
                .is_err()
        );
    }

    #[test]
    fn test_display() {
        let t = SqlTime::datetime(2024, 3, 9, 7, 5, 1, 250);
        assert_eq!(t.to_string(), "2024-03-09 07:05:01.000250");
        assert_eq!(
            SqlTime::time(100, 0, 0, 0).negated().to_string(),
            "0000-00-00 -100:00:00"
        );
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn test_chrono_roundtrip() {
        use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

        let dt = NaiveDate::from_ymd_opt(2023, 12, 31)
            .unwrap()
            .and_hms_micro_opt(23, 59, 58, 123_456)
            .unwrap();
        let parts = SqlTime::from(dt);
        assert_eq!(parts.microsecond, 123_456);
        assert_eq!(NaiveDateTime::try_from(parts).unwrap(), dt);

        let delta = -(TimeDelta::hours(30) + TimeDelta::seconds(5));
        let parts = SqlTime::from(delta);
        assert!(parts.negative);
        assert_eq!(parts.hour, 30);
        assert_eq!(TimeDelta::from(parts), delta);

        assert!(NaiveDate::try_from(SqlTime::date(0, 0, 0)).is_err());
    }
}
