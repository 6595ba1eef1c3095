use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::gaps;
use crate::ingest::EntityAccumulator;
use crate::models::{
    BucketSummary, ProgramSummary, ReportSummary, ScholarSummary, TierCounts,
    UNASSIGNED_PROGRAM, UNKNOWN_STATUS,
};
use crate::policy::AuditPolicy;
use crate::tempo::{self, round1};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GapStats {
    pub avg: f64,
    pub median: f64,
    pub max: i64,
}

pub fn summarize_gaps(gaps: &[i64]) -> GapStats {
    if gaps.is_empty() {
        return GapStats::default();
    }

    let mut sorted = gaps.to_vec();
    sorted.sort_unstable();

    let sum: i64 = sorted.iter().sum();
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    };

    GapStats {
        avg: round1(sum as f64 / sorted.len() as f64),
        median: round1(median),
        max: sorted[sorted.len() - 1],
    }
}

fn average(total: i64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        round1(total as f64 / count as f64)
    }
}

/// Derives the immutable per-scholar summary from its finished accumulator.
pub fn summarize_scholar(acc: &EntityAccumulator, policy: &AuditPolicy) -> ScholarSummary {
    let gap_days = gaps::gap_days(policy.as_of, acc.last_contact);
    let days_since_first = gaps::gap_days(policy.as_of, acc.first_contact);
    let (avg_interval_days, contacts_per_month) = match acc.first_contact {
        Some(_) => (
            tempo::average_interval_days(&acc.contacts),
            tempo::contacts_per_month(acc.contact_count, days_since_first),
        ),
        None => (0.0, 0.0),
    };
    let days_past_due = match acc.last_contact {
        Some(_) => gaps::days_past_due(gap_days, policy.cadence_days),
        None => 0,
    };

    ScholarSummary {
        scholar_id: acc.scholar_id.clone(),
        program: acc.program.clone(),
        last_channel: acc.last_channel.clone(),
        last_status: acc.last_status.clone(),
        last_contact: acc.last_contact,
        first_contact: acc.first_contact,
        next_due_date: gaps::next_due_date(acc.last_contact, policy.cadence_days),
        contact_count: acc.contact_count,
        gap_days,
        days_past_due,
        missed_cadences: gaps::missed_cadences(gap_days, policy.cadence_days),
        days_since_first,
        avg_interval_days,
        contacts_per_month,
        tier: gaps::classify(gap_days, policy.cadence_days, policy.due_window_days),
    }
}

pub fn report_summary(
    scholars: &[ScholarSummary],
    policy: &AuditPolicy,
    invalid_rows: usize,
    future_rows: usize,
) -> ReportSummary {
    let gap_values: Vec<i64> = scholars.iter().map(|s| s.gap_days).collect();
    let stats = summarize_gaps(&gap_values);
    let missed_total: i64 = scholars.iter().map(|s| s.missed_cadences).sum();
    let max_missed_cadences = scholars
        .iter()
        .map(|s| s.missed_cadences)
        .max()
        .unwrap_or(0);

    let mut tiers = TierCounts::default();
    for scholar in scholars {
        tiers.record(scholar.tier);
    }
    debug_assert_eq!(tiers.total(), scholars.len());

    ReportSummary {
        as_of: policy.as_of,
        cadence_days: policy.cadence_days,
        due_window_days: policy.due_window_days,
        total_scholars: scholars.len(),
        avg_gap_days: stats.avg,
        median_gap_days: stats.median,
        max_gap_days: stats.max,
        avg_missed_cadences: average(missed_total, scholars.len()),
        max_missed_cadences,
        tiers,
        invalid_rows,
        future_rows,
    }
}

pub fn program_key(program: &str) -> &str {
    if program.is_empty() {
        UNASSIGNED_PROGRAM
    } else {
        program
    }
}

/// Rolls scholars up by program. Programs appear in first-seen order, then
/// are stably sorted so the most overdue plus critical scholars come first.
pub fn program_summary(scholars: &[ScholarSummary]) -> Vec<ProgramSummary> {
    let mut order: Vec<&str> = Vec::new();
    let mut buckets: HashMap<&str, Vec<&ScholarSummary>> = HashMap::new();

    for scholar in scholars {
        let key = program_key(&scholar.program);
        buckets
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(scholar);
    }

    let mut result: Vec<ProgramSummary> = order
        .into_iter()
        .map(|program| {
            let entries = buckets.remove(program).unwrap_or_default();
            let gaps: Vec<i64> = entries.iter().map(|s| s.gap_days).collect();
            let missed_total: i64 = entries.iter().map(|s| s.missed_cadences).sum();
            let mut tiers = TierCounts::default();
            for entry in &entries {
                tiers.record(entry.tier);
            }
            ProgramSummary {
                program: program.to_string(),
                scholars: entries.len(),
                avg_gap_days: summarize_gaps(&gaps).avg,
                avg_missed_cadences: average(missed_total, entries.len()),
                tiers,
            }
        })
        .collect();

    if result.len() > 1 {
        result.sort_by(|a, b| b.tiers.escalated().cmp(&a.tiers.escalated()));
    }
    result
}

/// Scholars per last-contact channel. Blank channels are left out.
pub fn last_channel_counts(scholars: &[ScholarSummary]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for scholar in scholars.iter().filter(|s| !s.last_channel.is_empty()) {
        *counts.entry(scholar.last_channel.clone()).or_insert(0) += 1;
    }
    counts
}

/// Scholars per last-contact status, blank statuses grouped as "Unknown".
pub fn last_status_counts(scholars: &[ScholarSummary]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for scholar in scholars {
        let key = match scholar.last_status.trim() {
            "" => UNKNOWN_STATUS,
            status => status,
        };
        *counts.entry(key.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Counted touchpoints per channel across every scholar.
pub fn channel_touchpoints(accumulators: &[EntityAccumulator]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for acc in accumulators {
        for (channel, count) in &acc.channels {
            *counts.entry(channel.clone()).or_insert(0) += count;
        }
    }
    counts
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketDefinition {
    pub label: &'static str,
    pub min_days: Option<i64>,
    pub max_days: Option<i64>,
}

impl BucketDefinition {
    const fn new(label: &'static str, min_days: Option<i64>, max_days: Option<i64>) -> Self {
        Self {
            label,
            min_days,
            max_days,
        }
    }

    fn is_catch_all(&self) -> bool {
        self.min_days.is_none() && self.max_days.is_none()
    }

    fn contains(&self, days: i64) -> bool {
        !self.is_catch_all()
            && self.min_days.map_or(true, |min| days >= min)
            && self.max_days.map_or(true, |max| days <= max)
    }
}

/// Days from `as_of` until the next due date.
pub const DUE_BUCKETS: [BucketDefinition; 7] = [
    BucketDefinition::new("overdue", None, Some(-1)),
    BucketDefinition::new("due_0_7", Some(0), Some(7)),
    BucketDefinition::new("due_8_14", Some(8), Some(14)),
    BucketDefinition::new("due_15_30", Some(15), Some(30)),
    BucketDefinition::new("due_31_60", Some(31), Some(60)),
    BucketDefinition::new("due_61_plus", Some(61), None),
    BucketDefinition::new("unknown", None, None),
];

/// Gap days since the last contact.
pub const RECENCY_BUCKETS: [BucketDefinition; 7] = [
    BucketDefinition::new("0_7", Some(0), Some(7)),
    BucketDefinition::new("8_30", Some(8), Some(30)),
    BucketDefinition::new("31_60", Some(31), Some(60)),
    BucketDefinition::new("61_90", Some(61), Some(90)),
    BucketDefinition::new("91_180", Some(91), Some(180)),
    BucketDefinition::new("181_plus", Some(181), None),
    BucketDefinition::new("unknown", None, None),
];

/// Index of the bucket holding `days`; values that are absent or fall
/// outside every bounded bucket land in the catch-all.
pub fn bucket_index(definitions: &[BucketDefinition], days: Option<i64>) -> Option<usize> {
    days.and_then(|days| definitions.iter().position(|def| def.contains(days)))
        .or_else(|| definitions.iter().position(BucketDefinition::is_catch_all))
}

fn bucket_counts(
    definitions: &[BucketDefinition],
    values: impl Iterator<Item = Option<i64>>,
) -> Vec<BucketSummary> {
    let mut result: Vec<BucketSummary> = definitions
        .iter()
        .map(|def| BucketSummary {
            label: def.label.to_string(),
            min_days: def.min_days,
            max_days: def.max_days,
            count: 0,
        })
        .collect();

    for value in values {
        if let Some(idx) = bucket_index(definitions, value) {
            result[idx].count += 1;
        }
    }
    result
}

pub fn due_summary(scholars: &[ScholarSummary], as_of: NaiveDate) -> Vec<BucketSummary> {
    bucket_counts(
        &DUE_BUCKETS,
        scholars
            .iter()
            .map(|s| s.next_due_date.map(|due| (due - as_of).num_days())),
    )
}

pub fn recency_summary(scholars: &[ScholarSummary]) -> Vec<BucketSummary> {
    bucket_counts(
        &RECENCY_BUCKETS,
        scholars
            .iter()
            .map(|s| s.last_contact.map(|_| s.gap_days)),
    )
}
