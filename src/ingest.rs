//! Folds the raw touchpoint stream into one accumulator per scholar.
//!
//! Rows are applied strictly in input order: later rows can replace the
//! last-contact channel and status, and ties are settled by whichever row
//! arrived last.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use tracing::debug;

use crate::dates;
use crate::error::DateError;
use crate::models::TouchpointRow;

/// A validated touchpoint, borrowed from its source row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact<'a> {
    pub date: NaiveDate,
    pub channel: &'a str,
    pub program: &'a str,
    pub status: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityAccumulator {
    pub scholar_id: String,
    pub program: String,
    pub contact_count: usize,
    pub first_contact: Option<NaiveDate>,
    pub last_contact: Option<NaiveDate>,
    pub last_channel: String,
    pub last_status: String,
    pub channels: BTreeMap<String, usize>,
    pub contacts: Vec<NaiveDate>,
    seen_days: HashSet<NaiveDate>,
}

impl EntityAccumulator {
    pub fn new(scholar_id: impl Into<String>) -> Self {
        Self {
            scholar_id: scholar_id.into(),
            program: String::new(),
            contact_count: 0,
            first_contact: None,
            last_contact: None,
            last_channel: String::new(),
            last_status: String::new(),
            channels: BTreeMap::new(),
            contacts: Vec::new(),
            seen_days: HashSet::new(),
        }
    }

    /// Folds one contact into the running state.
    ///
    /// With `dedupe_by_day`, a second contact on an already-seen day is not
    /// counted, but it still refreshes the last channel and status when it is
    /// not older than the current last contact.
    pub fn apply(&mut self, contact: &Contact<'_>, dedupe_by_day: bool) {
        if self.program.is_empty() && !contact.program.is_empty() {
            self.program = contact.program.to_string();
        }

        if dedupe_by_day && !self.seen_days.insert(contact.date) {
            if self.last_contact.map_or(true, |last| contact.date >= last) {
                self.set_last(contact);
            }
            return;
        }

        self.contact_count += 1;
        self.contacts.push(contact.date);
        self.first_contact = Some(match self.first_contact {
            Some(first) => first.min(contact.date),
            None => contact.date,
        });
        if !contact.channel.is_empty() {
            *self.channels.entry(contact.channel.to_string()).or_insert(0) += 1;
        }
        if self.last_contact.map_or(true, |last| contact.date > last) {
            self.set_last(contact);
        }
    }

    fn set_last(&mut self, contact: &Contact<'_>) {
        self.last_contact = Some(contact.date);
        self.last_channel = contact.channel.to_string();
        self.last_status = contact.status.to_string();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RowRejection {
    MissingScholarId,
    InvalidDate(DateError),
    Future(NaiveDate),
}

fn validate_row(row: &TouchpointRow, as_of: NaiveDate) -> Result<NaiveDate, RowRejection> {
    if row.scholar_id.trim().is_empty() {
        return Err(RowRejection::MissingScholarId);
    }
    let date = dates::parse_date(&row.contact_date).map_err(RowRejection::InvalidDate)?;
    if date > as_of {
        return Err(RowRejection::Future(date));
    }
    Ok(date)
}

/// Accumulators in first-seen order plus the counts of skipped rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ingested {
    pub scholars: Vec<EntityAccumulator>,
    pub invalid_rows: usize,
    pub future_rows: usize,
}

pub fn ingest(rows: &[TouchpointRow], as_of: NaiveDate, dedupe_by_day: bool) -> Ingested {
    let mut ingested = Ingested::default();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (position, row) in rows.iter().enumerate() {
        let date = match validate_row(row, as_of) {
            Ok(date) => date,
            Err(RowRejection::Future(date)) => {
                debug!(row = position + 1, %date, "skipping future-dated touchpoint");
                ingested.future_rows += 1;
                continue;
            }
            Err(RowRejection::InvalidDate(err)) => {
                debug!(row = position + 1, %err, "skipping touchpoint with bad date");
                ingested.invalid_rows += 1;
                continue;
            }
            Err(RowRejection::MissingScholarId) => {
                debug!(row = position + 1, "skipping touchpoint without scholar id");
                ingested.invalid_rows += 1;
                continue;
            }
        };

        let scholar_id = row.scholar_id.trim();
        let slot = match index.get(scholar_id) {
            Some(slot) => *slot,
            None => {
                ingested.scholars.push(EntityAccumulator::new(scholar_id));
                index.insert(scholar_id.to_string(), ingested.scholars.len() - 1);
                ingested.scholars.len() - 1
            }
        };

        let contact = Contact {
            date,
            channel: row.channel.trim(),
            program: row.program.trim(),
            status: row.status.trim(),
        };
        ingested.scholars[slot].apply(&contact, dedupe_by_day);
    }

    ingested
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn row(id: &str, date: &str, channel: &str, program: &str, status: &str) -> TouchpointRow {
        TouchpointRow {
            scholar_id: id.to_string(),
            contact_date: date.to_string(),
            channel: channel.to_string(),
            program: program.to_string(),
            status: status.to_string(),
        }
    }

    fn contact<'a>(date: NaiveDate, channel: &'a str, status: &'a str) -> Contact<'a> {
        Contact {
            date,
            channel,
            program: "",
            status,
        }
    }

    #[test]
    fn same_day_duplicate_is_not_counted_but_refreshes_status() {
        let mut acc = EntityAccumulator::new("S-1");
        acc.apply(&contact(ymd(2026, 1, 1), "Email", "Attempted"), true);
        acc.apply(&contact(ymd(2026, 1, 1), "SMS", "Reached"), true);

        assert_eq!(acc.contact_count, 1);
        assert_eq!(acc.contacts, vec![ymd(2026, 1, 1)]);
        assert_eq!(acc.last_channel, "SMS");
        assert_eq!(acc.last_status, "Reached");
        assert_eq!(acc.channels.get("Email"), Some(&1));
        assert_eq!(acc.channels.get("SMS"), None);
    }

    #[test]
    fn older_duplicate_leaves_latest_contact_alone() {
        let mut acc = EntityAccumulator::new("S-1");
        acc.apply(&contact(ymd(2026, 1, 1), "Email", "Attempted"), true);
        acc.apply(&contact(ymd(2026, 1, 9), "Call", "Reached"), true);
        acc.apply(&contact(ymd(2026, 1, 1), "SMS", "No answer"), true);

        assert_eq!(acc.contact_count, 2);
        assert_eq!(acc.last_contact, Some(ymd(2026, 1, 9)));
        assert_eq!(acc.last_channel, "Call");
        assert_eq!(acc.last_status, "Reached");
    }

    #[test]
    fn without_dedup_same_day_rows_keep_the_first_status() {
        let mut acc = EntityAccumulator::new("S-1");
        acc.apply(&contact(ymd(2026, 1, 1), "Email", "Attempted"), false);
        acc.apply(&contact(ymd(2026, 1, 1), "SMS", "Reached"), false);

        assert_eq!(acc.contact_count, 2);
        assert_eq!(acc.last_channel, "Email");
        assert_eq!(acc.last_status, "Attempted");
        assert_eq!(acc.channels.len(), 2);
    }

    #[test]
    fn out_of_order_rows_track_first_and_last() {
        let mut acc = EntityAccumulator::new("S-1");
        acc.apply(&contact(ymd(2026, 1, 10), "Call", "Reached"), false);
        acc.apply(&contact(ymd(2025, 12, 2), "Email", "Sent"), false);

        assert_eq!(acc.first_contact, Some(ymd(2025, 12, 2)));
        assert_eq!(acc.last_contact, Some(ymd(2026, 1, 10)));
        assert_eq!(acc.last_channel, "Call");
    }

    #[test]
    fn first_non_empty_program_sticks() {
        let rows = vec![
            row("S-1", "2026-01-01", "Email", "", ""),
            row("S-1", "2026-01-02", "Email", "Alpha", ""),
            row("S-1", "2026-01-03", "Email", "Beta", ""),
        ];
        let ingested = ingest(&rows, ymd(2026, 2, 1), false);
        assert_eq!(ingested.scholars[0].program, "Alpha");
    }

    #[test]
    fn invalid_and_future_rows_are_counted_separately() {
        let rows = vec![
            row("", "2026-01-01", "Email", "Alpha", "Reached"),
            row("S-1", "not a date", "Email", "Alpha", "Reached"),
            row("S-1", "", "Email", "Alpha", "Reached"),
            row("S-1", "2026-03-01", "Email", "Alpha", "Reached"),
            row("S-1", "2026-01-15", "Email", "Alpha", "Reached"),
        ];
        let ingested = ingest(&rows, ymd(2026, 2, 1), false);

        assert_eq!(ingested.invalid_rows, 3);
        assert_eq!(ingested.future_rows, 1);
        assert_eq!(ingested.scholars.len(), 1);
        assert_eq!(ingested.scholars[0].contact_count, 1);
        assert_eq!(ingested.scholars[0].last_contact, Some(ymd(2026, 1, 15)));
    }

    #[test]
    fn short_form_dates_count_as_invalid() {
        let rows = vec![
            row("S-1", "1/5/26", "Email", "Alpha", "Reached"),
            row("S-1", "2026-1-5", "Email", "Alpha", "Reached"),
            row("S-1", "2026-01-20", "Call", "Alpha", "Reached"),
        ];
        let ingested = ingest(&rows, ymd(2026, 2, 1), false);

        assert_eq!(ingested.invalid_rows, 2);
        assert_eq!(ingested.future_rows, 0);
        assert_eq!(ingested.scholars[0].contact_count, 1);
        assert_eq!(ingested.scholars[0].first_contact, Some(ymd(2026, 1, 20)));
    }

    #[test]
    fn timestamps_on_the_as_of_day_are_not_future() {
        let rows = vec![row("S-1", "2026-02-01T18:45:00", "Email", "", "")];
        let ingested = ingest(&rows, ymd(2026, 2, 1), false);
        assert_eq!(ingested.future_rows, 0);
        assert_eq!(ingested.scholars.len(), 1);
    }

    #[test]
    fn scholars_keep_first_seen_order() {
        let rows = vec![
            row("S-2", "2026-01-01", "", "", ""),
            row("S-1", "2026-01-02", "", "", ""),
            row("S-2", "2026-01-03", "", "", ""),
        ];
        let ingested = ingest(&rows, ymd(2026, 2, 1), false);
        let ids: Vec<&str> = ingested
            .scholars
            .iter()
            .map(|acc| acc.scholar_id.as_str())
            .collect();
        assert_eq!(ids, vec!["S-2", "S-1"]);
    }
}
