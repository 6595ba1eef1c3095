use crate::error::ConfigError;

pub const DB_URL_ENV: &str = "TOUCHPOINT_GAP_AUDIT_DB_URL";
pub const FALLBACK_DB_URL_ENV: &str = "DATABASE_URL";
pub const DEFAULT_SCHEMA: &str = "touchpoint_gap_audit";

/// Connection settings for the audit store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub url: String,
    pub schema: String,
    pub tag: Option<String>,
}

impl DbConfig {
    pub fn new(url: Option<String>, schema: &str, tag: Option<String>) -> Result<Self, ConfigError> {
        let url = url
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingDatabaseUrl)?;
        let tag = tag
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Ok(Self {
            url,
            schema: sanitize_schema(schema)?,
            tag,
        })
    }

    /// Reads the database URL from the process environment.
    pub fn from_env(schema: &str, tag: Option<String>) -> Result<Self, ConfigError> {
        let url = [DB_URL_ENV, FALLBACK_DB_URL_ENV]
            .iter()
            .filter_map(|key| std::env::var(key).ok())
            .find(|value| !value.trim().is_empty());
        Self::new(url, schema, tag)
    }
}

/// Schema names are spliced into DDL, so only plain identifiers pass.
pub fn sanitize_schema(value: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return Err(ConfigError::EmptySchema);
    };

    let valid = (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(ConfigError::InvalidSchema(value.to_string()));
    }
    Ok(value.to_string())
}
