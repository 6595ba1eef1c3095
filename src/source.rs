//! Touchpoint CSV reader.
//!
//! Header names are matched loosely: case, surrounding whitespace, spaces,
//! underscores and hyphens are ignored, and each field has a list of
//! accepted synonyms tried in order.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::SourceError;
use crate::models::TouchpointRow;

const SCHOLAR_ID_HEADERS: &[&str] = &["scholar_id", "scholarid", "scholar", "student_id", "studentid"];
const CONTACT_DATE_HEADERS: &[&str] = &[
    "contact_date",
    "contacted_at",
    "date",
    "touchpoint_date",
    "touchpoint",
];
const PROGRAM_HEADERS: &[&str] = &["program", "cohort", "track"];
const CHANNEL_HEADERS: &[&str] = &["channel", "method", "touchpoint_channel"];
const STATUS_HEADERS: &[&str] = &["status", "outcome", "result"];

pub fn normalize_header(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    scholar_id: usize,
    contact_date: usize,
    program: Option<usize>,
    channel: Option<usize>,
    status: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self, SourceError> {
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (idx, header) in headers.iter().enumerate() {
            positions.entry(normalize_header(header)).or_insert(idx);
        }

        let find = |names: &[&str]| {
            names
                .iter()
                .find_map(|name| positions.get(&normalize_header(name)).copied())
        };

        Ok(Self {
            scholar_id: find(SCHOLAR_ID_HEADERS).ok_or(SourceError::MissingColumn("scholar_id"))?,
            contact_date: find(CONTACT_DATE_HEADERS)
                .ok_or(SourceError::MissingColumn("contact_date"))?,
            program: find(PROGRAM_HEADERS),
            channel: find(CHANNEL_HEADERS),
            status: find(STATUS_HEADERS),
        })
    }

    fn row(&self, record: &StringRecord) -> TouchpointRow {
        let value = |idx: Option<usize>| {
            idx.and_then(|idx| record.get(idx))
                .map(|field| field.trim().to_string())
                .unwrap_or_default()
        };

        TouchpointRow {
            scholar_id: value(Some(self.scholar_id)),
            contact_date: value(Some(self.contact_date)),
            channel: value(self.channel),
            program: value(self.program),
            status: value(self.status),
        }
    }
}

/// Reads every touchpoint row in file order.
pub fn read_rows<R: io::Read>(reader: R) -> Result<Vec<TouchpointRow>, SourceError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let columns = ColumnMap::from_headers(reader.headers()?)?;
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        rows.push(columns.row(&record));
    }

    Ok(rows)
}

pub fn read_rows_from_path(path: &Path) -> Result<Vec<TouchpointRow>, SourceError> {
    let file = File::open(path).map_err(|source| SourceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_rows(file)
}
