use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod audit;
mod config;
mod dates;
mod db;
mod error;
mod export;
mod gaps;
mod ingest;
mod models;
mod policy;
mod ranking;
mod report;
mod source;
mod summary;
mod tempo;

use config::{DbConfig, DEFAULT_SCHEMA};
use export::Artifact;
use models::Tier;
use policy::{AuditPolicy, DEFAULT_CADENCE_DAYS, DEFAULT_TOP_N};

#[derive(Parser)]
#[command(name = "touchpoint-gap-audit")]
#[command(about = "Touchpoint cadence gap audit for Group Scholar outreach", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit an outreach touchpoint CSV
    Audit(AuditArgs),
    /// Create or upgrade the database schema
    InitDb {
        #[arg(long, default_value = DEFAULT_SCHEMA)]
        db_schema: String,
    },
}

#[derive(Args)]
struct AuditArgs {
    /// Path to outreach CSV
    #[arg(long)]
    input: PathBuf,
    /// Expected cadence in days
    #[arg(long, default_value_t = DEFAULT_CADENCE_DAYS, allow_negative_numbers = true)]
    cadence: i64,
    /// Report as-of date (defaults to today, UTC)
    #[arg(long)]
    as_of: Option<String>,
    /// Days after cadence before overdue (defaults to half the cadence)
    #[arg(long, allow_negative_numbers = true)]
    due_window: Option<i64>,
    /// Top N largest gaps to show; 0 shows every scholar
    #[arg(long, default_value_t = DEFAULT_TOP_N, allow_negative_numbers = true)]
    top: i64,
    /// Deduplicate multiple contacts on the same day per scholar
    #[arg(long)]
    dedupe_day: bool,
    #[arg(long)]
    json: Option<PathBuf>,
    /// CSV of scholars at or above --min-tier
    #[arg(long)]
    alerts: Option<PathBuf>,
    /// Minimum tier for alerts (on_track, due_soon, overdue, critical)
    #[arg(long, default_value = "overdue")]
    min_tier: String,
    #[arg(long)]
    programs_csv: Option<PathBuf>,
    #[arg(long)]
    channels_csv: Option<PathBuf>,
    #[arg(long)]
    statuses_csv: Option<PathBuf>,
    #[arg(long)]
    due_csv: Option<PathBuf>,
    #[arg(long)]
    recency_csv: Option<PathBuf>,
    /// Store the report in Postgres
    #[arg(long)]
    db: bool,
    /// Create the schema and seed it with this report if it holds no runs
    #[arg(long)]
    init_db: bool,
    #[arg(long, default_value = DEFAULT_SCHEMA)]
    db_schema: String,
    /// Optional label for this audit run
    #[arg(long)]
    db_tag: Option<String>,
}

impl AuditArgs {
    fn artifacts(&self, min_tier: Tier) -> Vec<(Artifact, &PathBuf)> {
        [
            (Artifact::Json, &self.json),
            (Artifact::Alerts(min_tier), &self.alerts),
            (Artifact::Programs, &self.programs_csv),
            (Artifact::Channels, &self.channels_csv),
            (Artifact::Statuses, &self.statuses_csv),
            (Artifact::Due, &self.due_csv),
            (Artifact::Recency, &self.recency_csv),
        ]
        .into_iter()
        .filter_map(|(artifact, path)| path.as_ref().map(|path| (artifact, path)))
        .collect()
    }
}

async fn run_audit(args: AuditArgs) -> anyhow::Result<()> {
    let as_of = match args.as_of.as_deref() {
        Some(value) => dates::parse_date(value).context("invalid --as-of date")?,
        None => Utc::now().date_naive(),
    };
    let policy = AuditPolicy::new(
        as_of,
        args.cadence,
        args.due_window,
        args.top,
        args.dedupe_day,
    )?;
    let min_tier: Tier = args.min_tier.parse()?;
    let db_config = if args.db || args.init_db {
        Some(DbConfig::from_env(&args.db_schema, args.db_tag.clone())?)
    } else {
        None
    };

    let rows = source::read_rows_from_path(&args.input)?;
    let report = audit::build_report(&rows, &policy);

    let input_name = args
        .input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.input.display().to_string());
    print!("{}", report::render_text(&report, &input_name));

    let artifacts = args.artifacts(min_tier);
    if !artifacts.is_empty() {
        println!();
    }
    for (artifact, path) in artifacts {
        export::write_to_path(&report, artifact, path)?;
        println!("{} saved to {}", artifact.label(), path.display());
    }

    if let Some(config) = db_config {
        let pool = db::connect(&config).await?;
        let mut seeded = false;
        if args.init_db {
            if let Some(run_id) = db::seed_report(&pool, &report, &config).await? {
                seeded = true;
                println!("\nSeeded Postgres with initial audit run (run_id={run_id})");
            }
        }
        if args.db {
            if seeded {
                println!("Skipped duplicate insert; current report already used for seed.");
            } else {
                db::ensure_schema(&pool, &config.schema).await?;
                let run_id = db::store_report(&pool, &report, &config).await?;
                println!("\nStored audit run in Postgres (run_id={run_id})");
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Audit(args) => run_audit(args).await?,
        Commands::InitDb { db_schema } => {
            let config = DbConfig::from_env(&db_schema, None)?;
            let pool = db::connect(&config).await?;
            db::ensure_schema(&pool, &config.schema).await?;
            println!("Schema {} ready.", config.schema);
        }
    }

    Ok(())
}
