use tracing::info;

use crate::ingest;
use crate::models::{Report, ScholarSummary, TouchpointRow};
use crate::policy::AuditPolicy;
use crate::ranking;
use crate::summary;

/// Runs the full cadence-gap audit over an ordered batch of touchpoints.
///
/// Pure apart from logging: the same rows and policy always produce the same
/// report.
pub fn build_report(rows: &[TouchpointRow], policy: &AuditPolicy) -> Report {
    let ingested = ingest::ingest(rows, policy.as_of, policy.dedupe_by_day);
    let channel_touchpoints = summary::channel_touchpoints(&ingested.scholars);

    let scholars: Vec<ScholarSummary> = ingested
        .scholars
        .iter()
        .map(|acc| summary::summarize_scholar(acc, policy))
        .collect();

    let program_summary = summary::program_summary(&scholars);
    let report_summary = summary::report_summary(
        &scholars,
        policy,
        ingested.invalid_rows,
        ingested.future_rows,
    );
    let channel_summary = summary::last_channel_counts(&scholars);
    let status_summary = summary::last_status_counts(&scholars);
    let due_summary = summary::due_summary(&scholars, policy.as_of);
    let recency_summary = summary::recency_summary(&scholars);

    let scholars = ranking::rank_by_gap(scholars);
    let top_gaps = ranking::top_gaps(&scholars, policy.top_n);

    info!(
        scholars = report_summary.total_scholars,
        invalid_rows = report_summary.invalid_rows,
        future_rows = report_summary.future_rows,
        "built touchpoint gap report"
    );

    Report {
        summary: report_summary,
        program_summary,
        channel_summary,
        status_summary,
        channel_touchpoints,
        due_summary,
        recency_summary,
        top_gaps,
        scholars,
    }
}
