use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("empty date")]
    InvalidDate,

    #[error("unsupported date format: {0}")]
    UnsupportedDateFormat(String),
}

/// Rejected audit parameters. Raised before any rows are read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("cadence must be positive, got {0}")]
    NonPositiveCadence(i64),

    #[error("due window must be positive, got {0}")]
    NonPositiveDueWindow(i64),

    #[error("cadence must be at most {max} days, got {0}", max = crate::policy::MAX_POLICY_DAYS)]
    CadenceTooLarge(i64),

    #[error("due window must be at most {max} days, got {0}", max = crate::policy::MAX_POLICY_DAYS)]
    DueWindowTooLarge(i64),

    #[error("unknown tier '{0}' (expected on_track, due_soon, overdue or critical)")]
    UnknownTier(String),
}

/// Structural problems with the touchpoint source. These abort the run.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("unable to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing {0} column")]
    MissingColumn(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("database URL missing; set TOUCHPOINT_GAP_AUDIT_DB_URL or DATABASE_URL")]
    MissingDatabaseUrl,

    #[error("db schema is required")]
    EmptySchema,

    #[error("invalid schema name: {0}")]
    InvalidSchema(String),
}
