use std::collections::BTreeMap;
use std::fmt::Write;

use crate::models::{BucketSummary, Report, UNASSIGNED_PROGRAM};

const RULE_WIDTH: usize = 38;

fn format_buckets(buckets: &[BucketSummary]) -> String {
    let parts: Vec<String> = buckets
        .iter()
        .filter(|bucket| bucket.count > 0)
        .map(|bucket| format!("{} {}", bucket.label, bucket.count))
        .collect();
    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(" | ")
    }
}

fn write_section(output: &mut String, title: &str) {
    let _ = writeln!(output);
    let _ = writeln!(output, "{title}");
    let _ = writeln!(output, "{}", "-".repeat(RULE_WIDTH));
}

fn write_counts(output: &mut String, title: &str, counts: &BTreeMap<String, usize>) {
    if counts.is_empty() {
        return;
    }
    write_section(output, title);
    for (key, count) in counts {
        let _ = writeln!(output, "{key}: {count}");
    }
}

/// Console rendering of a finished report.
pub fn render_text(report: &Report, input_name: &str) -> String {
    let summary = &report.summary;
    let mut output = String::new();

    let _ = writeln!(output, "Group Scholar Touchpoint Gap Audit");
    let _ = writeln!(output, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(output, "Input: {input_name}");
    let _ = writeln!(output, "As of: {}", summary.as_of);
    let _ = writeln!(
        output,
        "Cadence: {} days (due window {} days)",
        summary.cadence_days, summary.due_window_days
    );
    let _ = writeln!(output, "Total scholars: {}", summary.total_scholars);
    let _ = writeln!(
        output,
        "Gap avg/median/max: {:.1} / {:.1} / {} days",
        summary.avg_gap_days, summary.median_gap_days, summary.max_gap_days
    );
    let _ = writeln!(
        output,
        "Missed cadences avg/max: {:.1} / {}",
        summary.avg_missed_cadences, summary.max_missed_cadences
    );
    let _ = writeln!(
        output,
        "On track: {} | Due soon: {} | Overdue: {} | Critical: {}",
        summary.tiers.on_track, summary.tiers.due_soon, summary.tiers.overdue, summary.tiers.critical
    );
    if summary.invalid_rows > 0 {
        let _ = writeln!(output, "Invalid rows skipped: {}", summary.invalid_rows);
    }
    if summary.future_rows > 0 {
        let _ = writeln!(output, "Future-dated rows ignored: {}", summary.future_rows);
    }
    if !report.due_summary.is_empty() {
        let _ = writeln!(output, "Due buckets: {}", format_buckets(&report.due_summary));
    }
    if !report.recency_summary.is_empty() {
        let _ = writeln!(
            output,
            "Recency buckets: {}",
            format_buckets(&report.recency_summary)
        );
    }

    write_section(&mut output, "Top gaps");
    if report.top_gaps.is_empty() {
        let _ = writeln!(output, "No scholars found.");
    } else {
        for entry in &report.top_gaps {
            let program = if entry.program.is_empty() {
                UNASSIGNED_PROGRAM
            } else {
                entry.program.as_str()
            };
            let channel = if entry.last_channel.is_empty() {
                "Unknown"
            } else {
                entry.last_channel.as_str()
            };
            let last_contact = entry
                .last_contact
                .map(|date| date.to_string())
                .unwrap_or_default();
            let _ = writeln!(
                output,
                "{} | {} | gap {} days | {} | last {} via {}",
                entry.scholar_id, program, entry.gap_days, entry.tier, last_contact, channel
            );
        }
    }

    if !report.program_summary.is_empty() {
        write_section(&mut output, "Program summary");
        for entry in &report.program_summary {
            let _ = writeln!(
                output,
                "{} | scholars {} | avg gap {:.1} | avg missed {:.1} | on track {} | due soon {} | overdue {} | critical {}",
                entry.program,
                entry.scholars,
                entry.avg_gap_days,
                entry.avg_missed_cadences,
                entry.tiers.on_track,
                entry.tiers.due_soon,
                entry.tiers.overdue,
                entry.tiers.critical
            );
        }
    }

    write_counts(&mut output, "Last channel summary", &report.channel_summary);
    write_counts(&mut output, "Last status summary", &report.status_summary);
    write_counts(&mut output, "Channel touchpoints", &report.channel_touchpoints);

    output
}
