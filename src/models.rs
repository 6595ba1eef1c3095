use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::PolicyError;

pub const UNASSIGNED_PROGRAM: &str = "Unassigned";
pub const UNKNOWN_STATUS: &str = "Unknown";

/// One raw touchpoint as handed over by the row source. Optional columns
/// arrive as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TouchpointRow {
    pub scholar_id: String,
    pub contact_date: String,
    pub channel: String,
    pub program: String,
    pub status: String,
}

/// Variants are declared from least to most severe; the derived `Ord`
/// is the severity order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    OnTrack,
    DueSoon,
    Overdue,
    Critical,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::OnTrack => "on_track",
            Tier::DueSoon => "due_soon",
            Tier::Overdue => "overdue",
            Tier::Critical => "critical",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = PolicyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "on_track" => Ok(Tier::OnTrack),
            "due_soon" => Ok(Tier::DueSoon),
            "overdue" => Ok(Tier::Overdue),
            "critical" => Ok(Tier::Critical),
            _ => Err(PolicyError::UnknownTier(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    #[serde(rename = "on_track_count")]
    pub on_track: usize,
    #[serde(rename = "due_soon_count")]
    pub due_soon: usize,
    #[serde(rename = "overdue_count")]
    pub overdue: usize,
    #[serde(rename = "critical_count")]
    pub critical: usize,
}

impl TierCounts {
    pub fn record(&mut self, tier: Tier) {
        match tier {
            Tier::OnTrack => self.on_track += 1,
            Tier::DueSoon => self.due_soon += 1,
            Tier::Overdue => self.overdue += 1,
            Tier::Critical => self.critical += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.on_track + self.due_soon + self.overdue + self.critical
    }

    /// Scholars past the due window.
    pub fn escalated(&self) -> usize {
        self.overdue + self.critical
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScholarSummary {
    pub scholar_id: String,
    pub program: String,
    pub last_channel: String,
    pub last_status: String,
    pub last_contact: Option<NaiveDate>,
    pub first_contact: Option<NaiveDate>,
    pub next_due_date: Option<NaiveDate>,
    pub contact_count: usize,
    pub gap_days: i64,
    pub days_past_due: i64,
    pub missed_cadences: i64,
    #[serde(rename = "days_since_first_contact")]
    pub days_since_first: i64,
    pub avg_interval_days: f64,
    pub contacts_per_month: f64,
    pub tier: Tier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramSummary {
    pub program: String,
    pub scholars: usize,
    pub avg_gap_days: f64,
    pub avg_missed_cadences: f64,
    #[serde(flatten)]
    pub tiers: TierCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub as_of: NaiveDate,
    pub cadence_days: i64,
    pub due_window_days: i64,
    pub total_scholars: usize,
    pub avg_gap_days: f64,
    pub median_gap_days: f64,
    pub max_gap_days: i64,
    pub avg_missed_cadences: f64,
    pub max_missed_cadences: i64,
    #[serde(flatten)]
    pub tiers: TierCounts,
    pub invalid_rows: usize,
    pub future_rows: usize,
}

/// Count of scholars falling in one due-date or recency bucket. Bounds are
/// inclusive; a bucket with neither bound is the "unknown" catch-all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketSummary {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_days: Option<i64>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub summary: ReportSummary,
    pub program_summary: Vec<ProgramSummary>,
    #[serde(rename = "last_channel_summary")]
    pub channel_summary: BTreeMap<String, usize>,
    #[serde(rename = "last_status_summary")]
    pub status_summary: BTreeMap<String, usize>,
    pub channel_touchpoints: BTreeMap<String, usize>,
    pub due_summary: Vec<BucketSummary>,
    pub recency_summary: Vec<BucketSummary>,
    pub top_gaps: Vec<ScholarSummary>,
    pub scholars: Vec<ScholarSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_parse_case_insensitively() {
        assert_eq!(" Overdue ".parse::<Tier>(), Ok(Tier::Overdue));
        assert_eq!("due_soon".parse::<Tier>(), Ok(Tier::DueSoon));
        assert_eq!(
            "late".parse::<Tier>(),
            Err(PolicyError::UnknownTier("late".to_string()))
        );
    }

    #[test]
    fn tier_order_follows_severity() {
        let mut tiers = vec![Tier::Critical, Tier::OnTrack, Tier::Overdue, Tier::DueSoon];
        tiers.sort();
        assert_eq!(
            tiers,
            vec![Tier::OnTrack, Tier::DueSoon, Tier::Overdue, Tier::Critical]
        );
        assert!(Tier::DueSoon < Tier::Overdue);
    }

    #[test]
    fn tier_counts_serialize_with_count_suffix() {
        let mut counts = TierCounts::default();
        counts.record(Tier::Critical);
        counts.record(Tier::OnTrack);
        let value = serde_json::to_value(counts).unwrap();
        assert_eq!(value["critical_count"], 1);
        assert_eq!(value["on_track_count"], 1);
        assert_eq!(counts.total(), 2);
        assert_eq!(counts.escalated(), 1);
    }
}
