use chrono::NaiveDate;

/// Rounds to one decimal place, halves away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Mean whole-day gap between consecutive contacts, in date order.
///
/// Every recorded contact takes part, so two rows on the same day add a
/// zero-day interval unless they were collapsed by day-level dedup first.
pub fn average_interval_days(contacts: &[NaiveDate]) -> f64 {
    if contacts.len() < 2 {
        return 0.0;
    }

    let mut sorted = contacts.to_vec();
    sorted.sort();

    let total_days: i64 = sorted
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_days())
        .sum();
    let intervals = (sorted.len() - 1) as f64;

    round1(total_days as f64 / intervals)
}

pub fn contacts_per_month(contact_count: usize, days_since_first: i64) -> f64 {
    if contact_count == 0 || days_since_first <= 0 {
        return 0.0;
    }
    round1(contact_count as f64 / days_since_first as f64 * 30.0)
}
