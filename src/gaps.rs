use chrono::{Duration, NaiveDate};

use crate::models::Tier;

/// Whole days since the last contact. Zero when there is no contact or the
/// contact lies after `as_of`.
pub fn gap_days(as_of: NaiveDate, last_contact: Option<NaiveDate>) -> i64 {
    match last_contact {
        Some(last) if last <= as_of => (as_of - last).num_days(),
        _ => 0,
    }
}

pub fn classify(gap_days: i64, cadence_days: i64, due_window_days: i64) -> Tier {
    if gap_days <= cadence_days {
        Tier::OnTrack
    } else if gap_days <= cadence_days.saturating_add(due_window_days) {
        Tier::DueSoon
    } else if gap_days <= cadence_days.saturating_mul(2) {
        Tier::Overdue
    } else {
        Tier::Critical
    }
}

/// Cadence periods missed beyond the first, rounded up.
pub fn missed_cadences(gap_days: i64, cadence_days: i64) -> i64 {
    if cadence_days <= 0 || gap_days <= cadence_days {
        return 0;
    }
    (gap_days - cadence_days + cadence_days - 1) / cadence_days
}

pub fn days_past_due(gap_days: i64, cadence_days: i64) -> i64 {
    (gap_days - cadence_days).max(0)
}

pub fn next_due_date(last_contact: Option<NaiveDate>, cadence_days: i64) -> Option<NaiveDate> {
    let cadence = Duration::try_days(cadence_days)?;
    last_contact.and_then(|last| last.checked_add_signed(cadence))
}

/// Half the cadence, rounded up.
pub fn default_due_window(cadence_days: i64) -> i64 {
    (cadence_days + 1) / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn tiers_follow_cadence_boundaries() {
        assert_eq!(classify(0, 30, 15), Tier::OnTrack);
        assert_eq!(classify(30, 30, 15), Tier::OnTrack);
        assert_eq!(classify(31, 30, 15), Tier::DueSoon);
        assert_eq!(classify(45, 30, 15), Tier::DueSoon);
        assert_eq!(classify(46, 30, 15), Tier::Overdue);
        assert_eq!(classify(60, 30, 15), Tier::Overdue);
        assert_eq!(classify(61, 30, 15), Tier::Critical);
    }

    #[test]
    fn wide_due_window_skips_overdue() {
        // cadence + window reaches past twice the cadence
        assert_eq!(classify(70, 30, 40), Tier::DueSoon);
        assert_eq!(classify(71, 30, 40), Tier::Critical);
    }

    #[test]
    fn huge_windows_saturate_instead_of_wrapping() {
        assert_eq!(classify(31, 1, i64::MAX), Tier::DueSoon);
        assert_eq!(classify(i64::MAX, i64::MAX, 1), Tier::OnTrack);
        assert_eq!(classify(i64::MAX, i64::MAX / 2 + 1, 1), Tier::Overdue);
    }

    #[test]
    fn missed_cadences_round_up() {
        assert_eq!(missed_cadences(30, 30), 0);
        assert_eq!(missed_cadences(31, 30), 1);
        assert_eq!(missed_cadences(60, 30), 1);
        assert_eq!(missed_cadences(61, 30), 2);
        assert_eq!(missed_cadences(10, 0), 0);
    }

    #[test]
    fn gap_days_ignore_missing_and_future_contacts() {
        let as_of = ymd(2026, 2, 1);
        assert_eq!(gap_days(as_of, Some(ymd(2025, 11, 6))), 87);
        assert_eq!(gap_days(as_of, Some(ymd(2025, 10, 1))), 123);
        assert_eq!(gap_days(as_of, Some(as_of)), 0);
        assert_eq!(gap_days(as_of, Some(ymd(2026, 2, 3))), 0);
        assert_eq!(gap_days(as_of, None), 0);
    }

    #[test]
    fn next_due_adds_cadence() {
        assert_eq!(
            next_due_date(Some(ymd(2025, 11, 6)), 90),
            Some(ymd(2026, 2, 4))
        );
        assert_eq!(
            next_due_date(Some(ymd(2025, 10, 1)), 90),
            Some(ymd(2025, 12, 30))
        );
        assert_eq!(next_due_date(None, 90), None);
    }

    #[test]
    fn next_due_is_absent_when_out_of_calendar_range() {
        let last = Some(ymd(2026, 1, 1));
        assert_eq!(next_due_date(last, 200_000_000_000_000), None);
        assert_eq!(next_due_date(last, i64::MAX), None);
        assert_eq!(next_due_date(last, 400_000_000), None);
    }

    #[test]
    fn days_past_due_never_negative() {
        assert_eq!(days_past_due(12, 30), 0);
        assert_eq!(days_past_due(42, 30), 12);
    }

    #[test]
    fn default_window_is_half_cadence() {
        assert_eq!(default_due_window(90), 45);
        assert_eq!(default_due_window(7), 4);
        assert_eq!(default_due_window(1), 1);
    }
}
