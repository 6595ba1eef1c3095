use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use csv::Writer;

use crate::models::{BucketSummary, Report, Tier};

fn format_date(value: Option<NaiveDate>) -> String {
    value.map(|date| date.to_string()).unwrap_or_default()
}

fn format_optional(value: Option<i64>) -> String {
    value.map(|days| days.to_string()).unwrap_or_default()
}

fn create(path: &Path) -> anyhow::Result<File> {
    File::create(path).with_context(|| format!("unable to create {}", path.display()))
}

pub fn write_json<W: io::Write>(report: &Report, out: W) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(out, report).context("unable to encode report as JSON")
}

/// Scholars at or above `min_tier`, in ranked order.
pub fn write_alerts<W: io::Write>(report: &Report, min_tier: Tier, out: W) -> anyhow::Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record([
        "scholar_id",
        "program",
        "last_contact",
        "first_contact",
        "next_due_date",
        "gap_days",
        "days_past_due",
        "missed_cadences",
        "days_since_first_contact",
        "avg_interval_days",
        "contacts_per_month",
        "tier",
        "last_channel",
        "last_status",
        "contact_count",
    ])?;

    for entry in report
        .scholars
        .iter()
        .filter(|entry| entry.tier >= min_tier)
    {
        writer.write_record([
            entry.scholar_id.clone(),
            entry.program.clone(),
            format_date(entry.last_contact),
            format_date(entry.first_contact),
            format_date(entry.next_due_date),
            entry.gap_days.to_string(),
            entry.days_past_due.to_string(),
            entry.missed_cadences.to_string(),
            entry.days_since_first.to_string(),
            format!("{:.1}", entry.avg_interval_days),
            format!("{:.1}", entry.contacts_per_month),
            entry.tier.to_string(),
            entry.last_channel.clone(),
            entry.last_status.clone(),
            entry.contact_count.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_programs<W: io::Write>(report: &Report, out: W) -> anyhow::Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record([
        "program",
        "scholars",
        "avg_gap_days",
        "avg_missed_cadences",
        "on_track",
        "due_soon",
        "overdue",
        "critical",
    ])?;

    for entry in &report.program_summary {
        writer.write_record([
            entry.program.clone(),
            entry.scholars.to_string(),
            format!("{:.1}", entry.avg_gap_days),
            format!("{:.1}", entry.avg_missed_cadences),
            entry.tiers.on_track.to_string(),
            entry.tiers.due_soon.to_string(),
            entry.tiers.overdue.to_string(),
            entry.tiers.critical.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn write_counts<W: io::Write>(
    key_header: &str,
    counts: &BTreeMap<String, usize>,
    out: W,
) -> anyhow::Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record([key_header, "touchpoint_count"])?;
    for (key, count) in counts {
        writer.write_record([key.clone(), count.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_channels<W: io::Write>(report: &Report, out: W) -> anyhow::Result<()> {
    write_counts("channel", &report.channel_summary, out)
}

pub fn write_statuses<W: io::Write>(report: &Report, out: W) -> anyhow::Result<()> {
    write_counts("status", &report.status_summary, out)
}

fn write_buckets<W: io::Write>(buckets: &[BucketSummary], out: W) -> anyhow::Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(["label", "min_days", "max_days", "count"])?;
    for bucket in buckets {
        writer.write_record([
            bucket.label.clone(),
            format_optional(bucket.min_days),
            format_optional(bucket.max_days),
            bucket.count.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_due<W: io::Write>(report: &Report, out: W) -> anyhow::Result<()> {
    write_buckets(&report.due_summary, out)
}

pub fn write_recency<W: io::Write>(report: &Report, out: W) -> anyhow::Result<()> {
    write_buckets(&report.recency_summary, out)
}

/// Which artifact to write; each maps to one of the writers above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Json,
    Alerts(Tier),
    Programs,
    Channels,
    Statuses,
    Due,
    Recency,
}

impl Artifact {
    pub fn label(self) -> &'static str {
        match self {
            Artifact::Json => "JSON report",
            Artifact::Alerts(_) => "Alert CSV",
            Artifact::Programs => "Program summary CSV",
            Artifact::Channels => "Channel summary CSV",
            Artifact::Statuses => "Status summary CSV",
            Artifact::Due => "Due summary CSV",
            Artifact::Recency => "Recency summary CSV",
        }
    }
}

pub fn write_to_path(report: &Report, artifact: Artifact, path: &Path) -> anyhow::Result<()> {
    let file = create(path)?;
    match artifact {
        Artifact::Json => write_json(report, file),
        Artifact::Alerts(min_tier) => write_alerts(report, min_tier, file),
        Artifact::Programs => write_programs(report, file),
        Artifact::Channels => write_channels(report, file),
        Artifact::Statuses => write_statuses(report, file),
        Artifact::Due => write_due(report, file),
        Artifact::Recency => write_recency(report, file),
    }
    .with_context(|| format!("unable to write {}", path.display()))
}
