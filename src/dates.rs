//! Parsing of the touchpoint date column.
//!
//! Layouts are tried in a fixed order and the first successful parse wins.
//! `YYYY/MM/DD` is tried before `MM/DD/YYYY`, which is how ambiguous slash
//! dates are resolved.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::DateError;

#[derive(Debug, Clone, Copy)]
enum Layout {
    Date(&'static str),
    DateTime(&'static str),
    Rfc3339,
}

const LAYOUTS: [Layout; 7] = [
    Layout::Date("%Y-%m-%d"),
    Layout::Date("%Y/%m/%d"),
    Layout::Date("%m/%d/%Y"),
    Layout::Date("%m-%d-%Y"),
    Layout::DateTime("%Y-%m-%d %H:%M:%S"),
    Layout::DateTime("%Y-%m-%dT%H:%M:%S"),
    Layout::Rfc3339,
];

impl Layout {
    /// chrono accepts any digit count for `%Y`, `%m`, `%d` and friends, so a
    /// parse only counts when it formats back to the exact input. That pins
    /// every field to its zero-padded width.
    fn parse(self, value: &str) -> Option<NaiveDateTime> {
        match self {
            Layout::Date(fmt) => NaiveDate::parse_from_str(value, fmt)
                .ok()
                .filter(|date| date.format(fmt).to_string() == value)
                .and_then(|date| date.and_hms_opt(0, 0, 0)),
            Layout::DateTime(fmt) => NaiveDateTime::parse_from_str(value, fmt)
                .ok()
                .filter(|timestamp| timestamp.format(fmt).to_string() == value),
            // Keep the wall-clock time of the stated offset so the calendar
            // day is the one the source wrote down.
            Layout::Rfc3339 => DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|parsed| parsed.naive_local()),
        }
    }
}

/// Parses a timestamp, keeping any time-of-day component.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, DateError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DateError::InvalidDate);
    }

    LAYOUTS
        .iter()
        .find_map(|layout| layout.parse(value))
        .ok_or_else(|| DateError::UnsupportedDateFormat(value.to_string()))
}

/// Parses a date and truncates it to the calendar day.
pub fn parse_date(value: &str) -> Result<NaiveDate, DateError> {
    parse_timestamp(value).map(|timestamp| timestamp.date())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn accepts_every_supported_layout() {
        let expected = ymd(2026, 1, 15);
        for value in [
            "2026-01-15",
            "2026/01/15",
            "01/15/2026",
            "01-15-2026",
            "2026-01-15 08:30:00",
            "2026-01-15T08:30:00",
            "2026-01-15T08:30:00-05:00",
            "2026-01-15T23:30:00Z",
        ] {
            assert_eq!(parse_date(value), Ok(expected), "layout {value}");
        }
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(parse_date("  2026-02-01\t"), Ok(ymd(2026, 2, 1)));
    }

    #[test]
    fn keeps_time_of_day_until_truncated() {
        let parsed = parse_timestamp("2026-01-15 08:30:00").unwrap();
        assert_eq!(parsed.format("%H:%M").to_string(), "08:30");
        assert_eq!(parsed.date(), ymd(2026, 1, 15));
    }

    #[test]
    fn offset_timestamps_stay_on_their_own_calendar_day() {
        // 23:30 at -05:00 is already the next day in UTC.
        assert_eq!(parse_date("2026-01-15T23:30:00-05:00"), Ok(ymd(2026, 1, 15)));
    }

    #[test]
    fn year_first_slash_dates_win_over_month_first() {
        assert_eq!(parse_date("2026/03/04"), Ok(ymd(2026, 3, 4)));
        assert_eq!(parse_date("03/04/2026"), Ok(ymd(2026, 3, 4)));
    }

    #[test]
    fn rejects_empty_and_unknown_values() {
        assert_eq!(parse_date("   "), Err(DateError::InvalidDate));
        assert_eq!(
            parse_date("15.01.2026"),
            Err(DateError::UnsupportedDateFormat("15.01.2026".to_string()))
        );
        assert!(parse_date("2026-02-30").is_err());
    }

    #[test]
    fn fields_must_use_their_full_width() {
        for value in [
            "1/5/26",
            "26-01-05",
            "2026-1-5",
            "+2026-01-05",
            "1/15/2026",
            "2026-01-05 8:3:0",
            "2026-01-05T8:30:00",
        ] {
            assert_eq!(
                parse_date(value),
                Err(DateError::UnsupportedDateFormat(value.to_string())),
                "value {value}"
            );
        }
    }
}
