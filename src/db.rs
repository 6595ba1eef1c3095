use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::DbConfig;
use crate::models::{BucketSummary, Report};

pub async fn connect(config: &DbConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(12))
        .connect(&config.url)
        .await
        .context("failed to connect to Postgres")
}

fn schema_statements(schema: &str) -> Vec<String> {
    vec![
        format!("CREATE SCHEMA IF NOT EXISTS {schema}"),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {schema}.audit_runs (
                id uuid PRIMARY KEY,
                as_of date NOT NULL,
                cadence_days bigint NOT NULL,
                due_window_days bigint NOT NULL,
                total_scholars bigint NOT NULL,
                avg_gap_days numeric(8,2) NOT NULL,
                median_gap_days numeric(8,2) NOT NULL,
                max_gap_days bigint NOT NULL,
                avg_missed_cadences numeric(8,2) NOT NULL DEFAULT 0,
                max_missed_cadences bigint NOT NULL DEFAULT 0,
                on_track_count bigint NOT NULL,
                due_soon_count bigint NOT NULL,
                overdue_count bigint NOT NULL,
                critical_count bigint NOT NULL,
                invalid_rows bigint NOT NULL,
                future_rows bigint NOT NULL DEFAULT 0,
                run_tag text,
                created_at timestamptz NOT NULL DEFAULT now()
            )
            "#
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {schema}.audit_scholar_gaps (
                id uuid PRIMARY KEY,
                run_id uuid NOT NULL REFERENCES {schema}.audit_runs(id) ON DELETE CASCADE,
                scholar_id text NOT NULL,
                program text,
                last_channel text,
                last_status text,
                last_contact date,
                first_contact date,
                next_due_date date,
                contact_count bigint NOT NULL,
                gap_days bigint NOT NULL,
                days_past_due bigint NOT NULL DEFAULT 0,
                missed_cadences bigint NOT NULL DEFAULT 0,
                days_since_first_contact bigint NOT NULL DEFAULT 0,
                avg_interval_days numeric(8,2) NOT NULL DEFAULT 0,
                contacts_per_month numeric(8,2) NOT NULL DEFAULT 0,
                tier text NOT NULL,
                created_at timestamptz NOT NULL DEFAULT now()
            )
            "#
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {schema}.audit_program_summary (
                id uuid PRIMARY KEY,
                run_id uuid NOT NULL REFERENCES {schema}.audit_runs(id) ON DELETE CASCADE,
                program text NOT NULL,
                scholars bigint NOT NULL,
                avg_gap_days numeric(8,2) NOT NULL,
                avg_missed_cadences numeric(8,2) NOT NULL DEFAULT 0,
                on_track_count bigint NOT NULL,
                due_soon_count bigint NOT NULL,
                overdue_count bigint NOT NULL,
                critical_count bigint NOT NULL,
                created_at timestamptz NOT NULL DEFAULT now()
            )
            "#
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {schema}.audit_channel_summary (
                id uuid PRIMARY KEY,
                run_id uuid NOT NULL REFERENCES {schema}.audit_runs(id) ON DELETE CASCADE,
                channel text NOT NULL,
                touchpoint_count bigint NOT NULL,
                created_at timestamptz NOT NULL DEFAULT now()
            )
            "#
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {schema}.audit_status_summary (
                id uuid PRIMARY KEY,
                run_id uuid NOT NULL REFERENCES {schema}.audit_runs(id) ON DELETE CASCADE,
                status text NOT NULL,
                touchpoint_count bigint NOT NULL,
                created_at timestamptz NOT NULL DEFAULT now()
            )
            "#
        ),
        bucket_table(schema, "audit_due_summary"),
        bucket_table(schema, "audit_recency_summary"),
        index(schema, "audit_scholar_gaps", "run_id"),
        index(schema, "audit_scholar_gaps", "tier"),
        index(schema, "audit_program_summary", "run_id"),
        index(schema, "audit_channel_summary", "run_id"),
        index(schema, "audit_status_summary", "run_id"),
        index(schema, "audit_due_summary", "run_id"),
        index(schema, "audit_recency_summary", "run_id"),
    ]
}

fn bucket_table(schema: &str, table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {schema}.{table} (
            id uuid PRIMARY KEY,
            run_id uuid NOT NULL REFERENCES {schema}.audit_runs(id) ON DELETE CASCADE,
            label text NOT NULL,
            min_days bigint,
            max_days bigint,
            bucket_count bigint NOT NULL,
            created_at timestamptz NOT NULL DEFAULT now()
        )
        "#
    )
}

fn index(schema: &str, table: &str, column: &str) -> String {
    format!("CREATE INDEX IF NOT EXISTS {schema}_{table}_{column}_idx ON {schema}.{table} ({column})")
}

/// Creates the audit schema and tables. Safe to run repeatedly.
pub async fn ensure_schema(pool: &PgPool, schema: &str) -> anyhow::Result<()> {
    for statement in schema_statements(schema) {
        sqlx::query(&statement)
            .execute(pool)
            .await
            .with_context(|| format!("failed to prepare schema {schema}"))?;
    }
    Ok(())
}

fn null_if_blank(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

async fn insert_buckets(
    tx: &mut Transaction<'_, Postgres>,
    schema: &str,
    table: &str,
    run_id: Uuid,
    buckets: &[BucketSummary],
) -> anyhow::Result<()> {
    let sql = format!(
        r#"
        INSERT INTO {schema}.{table} (id, run_id, label, min_days, max_days, bucket_count)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#
    );
    for bucket in buckets {
        sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(run_id)
            .bind(&bucket.label)
            .bind(bucket.min_days)
            .bind(bucket.max_days)
            .bind(bucket.count as i64)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

/// Writes the report as one audit run plus its child rows. Everything lands
/// in a single transaction; a failure leaves nothing behind.
pub async fn store_report(pool: &PgPool, report: &Report, config: &DbConfig) -> anyhow::Result<Uuid> {
    let schema = config.schema.as_str();
    let run_id = Uuid::new_v4();
    let summary = &report.summary;
    let mut tx = pool.begin().await.context("failed to open transaction")?;

    sqlx::query(&format!(
        r#"
        INSERT INTO {schema}.audit_runs (
            id, as_of, cadence_days, due_window_days, total_scholars,
            avg_gap_days, median_gap_days, max_gap_days, avg_missed_cadences,
            max_missed_cadences, on_track_count, due_soon_count, overdue_count,
            critical_count, invalid_rows, future_rows, run_tag
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17
        )
        "#
    ))
    .bind(run_id)
    .bind(summary.as_of)
    .bind(summary.cadence_days)
    .bind(summary.due_window_days)
    .bind(summary.total_scholars as i64)
    .bind(summary.avg_gap_days)
    .bind(summary.median_gap_days)
    .bind(summary.max_gap_days)
    .bind(summary.avg_missed_cadences)
    .bind(summary.max_missed_cadences)
    .bind(summary.tiers.on_track as i64)
    .bind(summary.tiers.due_soon as i64)
    .bind(summary.tiers.overdue as i64)
    .bind(summary.tiers.critical as i64)
    .bind(summary.invalid_rows as i64)
    .bind(summary.future_rows as i64)
    .bind(config.tag.as_deref())
    .execute(&mut *tx)
    .await
    .context("failed to insert audit run")?;

    let insert_scholar = format!(
        r#"
        INSERT INTO {schema}.audit_scholar_gaps (
            id, run_id, scholar_id, program, last_channel, last_status,
            last_contact, first_contact, next_due_date, contact_count, gap_days,
            days_past_due, missed_cadences, days_since_first_contact,
            avg_interval_days, contacts_per_month, tier
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17
        )
        "#
    );
    for entry in &report.scholars {
        sqlx::query(&insert_scholar)
            .bind(Uuid::new_v4())
            .bind(run_id)
            .bind(&entry.scholar_id)
            .bind(null_if_blank(&entry.program))
            .bind(null_if_blank(&entry.last_channel))
            .bind(null_if_blank(&entry.last_status))
            .bind(entry.last_contact)
            .bind(entry.first_contact)
            .bind(entry.next_due_date)
            .bind(entry.contact_count as i64)
            .bind(entry.gap_days)
            .bind(entry.days_past_due)
            .bind(entry.missed_cadences)
            .bind(entry.days_since_first)
            .bind(entry.avg_interval_days)
            .bind(entry.contacts_per_month)
            .bind(entry.tier.as_str())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to insert scholar {}", entry.scholar_id))?;
    }

    let insert_program = format!(
        r#"
        INSERT INTO {schema}.audit_program_summary (
            id, run_id, program, scholars, avg_gap_days, avg_missed_cadences,
            on_track_count, due_soon_count, overdue_count, critical_count
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#
    );
    for entry in &report.program_summary {
        sqlx::query(&insert_program)
            .bind(Uuid::new_v4())
            .bind(run_id)
            .bind(&entry.program)
            .bind(entry.scholars as i64)
            .bind(entry.avg_gap_days)
            .bind(entry.avg_missed_cadences)
            .bind(entry.tiers.on_track as i64)
            .bind(entry.tiers.due_soon as i64)
            .bind(entry.tiers.overdue as i64)
            .bind(entry.tiers.critical as i64)
            .execute(&mut *tx)
            .await
            .context("failed to insert program summary")?;
    }

    let insert_channel = format!(
        "INSERT INTO {schema}.audit_channel_summary (id, run_id, channel, touchpoint_count) \
         VALUES ($1, $2, $3, $4)"
    );
    for (channel, count) in &report.channel_summary {
        sqlx::query(&insert_channel)
            .bind(Uuid::new_v4())
            .bind(run_id)
            .bind(channel)
            .bind(*count as i64)
            .execute(&mut *tx)
            .await
            .context("failed to insert channel summary")?;
    }

    let insert_status = format!(
        "INSERT INTO {schema}.audit_status_summary (id, run_id, status, touchpoint_count) \
         VALUES ($1, $2, $3, $4)"
    );
    for (status, count) in &report.status_summary {
        sqlx::query(&insert_status)
            .bind(Uuid::new_v4())
            .bind(run_id)
            .bind(status)
            .bind(*count as i64)
            .execute(&mut *tx)
            .await
            .context("failed to insert status summary")?;
    }

    insert_buckets(&mut tx, schema, "audit_due_summary", run_id, &report.due_summary)
        .await
        .context("failed to insert due summary")?;
    insert_buckets(&mut tx, schema, "audit_recency_summary", run_id, &report.recency_summary)
        .await
        .context("failed to insert recency summary")?;

    tx.commit().await.context("failed to commit audit run")?;
    info!(%run_id, scholars = report.scholars.len(), "stored audit run");
    Ok(run_id)
}

/// Stores the report only when the store holds no audit runs yet.
pub async fn seed_report(
    pool: &PgPool,
    report: &Report,
    config: &DbConfig,
) -> anyhow::Result<Option<Uuid>> {
    ensure_schema(pool, &config.schema).await?;

    let existing: i64 = sqlx::query(&format!(
        "SELECT COUNT(*) AS runs FROM {}.audit_runs",
        config.schema
    ))
    .fetch_one(pool)
    .await?
    .get("runs");

    if existing > 0 {
        warn!(existing, "audit data already present; skipping seed");
        return Ok(None);
    }

    store_report(pool, report, config).await.map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_statements_are_scoped_to_schema() {
        let statements = schema_statements("gap_audit");
        assert_eq!(statements[0], "CREATE SCHEMA IF NOT EXISTS gap_audit");
        for table in [
            "audit_runs",
            "audit_scholar_gaps",
            "audit_program_summary",
            "audit_channel_summary",
            "audit_status_summary",
            "audit_due_summary",
            "audit_recency_summary",
        ] {
            let qualified = format!("CREATE TABLE IF NOT EXISTS gap_audit.{table} (");
            assert!(
                statements.iter().any(|s| s.contains(&qualified)),
                "missing table {table}"
            );
        }
        assert!(statements
            .iter()
            .skip(1)
            .all(|s| s.contains("gap_audit.")));
    }

    #[test]
    fn child_tables_cascade_from_runs() {
        let statements = schema_statements("gap_audit");
        let cascading = statements
            .iter()
            .filter(|s| s.contains("REFERENCES gap_audit.audit_runs(id) ON DELETE CASCADE"))
            .count();
        assert_eq!(cascading, 6);
    }

    #[test]
    fn index_names_include_schema_table_and_column() {
        assert_eq!(
            index("gap_audit", "audit_scholar_gaps", "tier"),
            "CREATE INDEX IF NOT EXISTS gap_audit_audit_scholar_gaps_tier_idx ON gap_audit.audit_scholar_gaps (tier)"
        );
    }

    #[test]
    fn blank_text_binds_as_null() {
        assert_eq!(null_if_blank("  "), None);
        assert_eq!(null_if_blank("Alpha"), Some("Alpha"));
    }
}
