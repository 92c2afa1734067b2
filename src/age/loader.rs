//! Age CSV Loader
//!
//! Reads the two-column `(structure_id, first_seen)` export into an
//! [`AgeIndex`]. The file is allowed to be messy: an optional header line,
//! blank lines, and rows that do not parse are dropped rather than failing
//! the load.

use super::{AgeError, AgeIndex, AgeResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Row counts from a single parse of the source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Rows that made it into the index
    pub rows: usize,
    /// Rows dropped for a missing or unparseable field
    pub skipped: usize,
    /// Whether the first line was treated as a header
    pub header: bool,
}

/// Naive layouts tried after RFC 3339; all are read as UTC
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a first-seen timestamp into whole Unix seconds (floored)
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp());
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc().timestamp());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}

fn is_numeric(field: &str) -> bool {
    !field.is_empty() && field.bytes().all(|b| b.is_ascii_digit())
}

/// Build an index from CSV text. Malformed rows are counted, never fatal.
pub fn read_index<R: Read>(reader: R) -> AgeResult<(AgeIndex, ParseStats)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut entries = Vec::new();
    let mut stats = ParseStats::default();
    let mut first = true;

    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                if let csv::ErrorKind::Io(_) = e.kind() {
                    return Err(AgeError::SourceUnavailable {
                        path: Default::default(),
                        error: e.to_string(),
                    });
                }
                stats.skipped += 1;
                first = false;
                continue;
            }
        };

        if first {
            first = false;
            if !is_numeric(record.get(0).unwrap_or("")) {
                stats.header = true;
                continue;
            }
        }

        let id = record.get(0).and_then(|s| s.parse::<u64>().ok());
        let ts = record.get(1).and_then(parse_timestamp);

        match (id, ts) {
            (Some(id), Some(ts)) => entries.push((id, ts)),
            _ => stats.skipped += 1,
        }
    }

    stats.rows = entries.len();
    Ok((AgeIndex::from_entries(entries), stats))
}

/// Load the index from a CSV file on disk
pub fn load_path(path: &Path) -> AgeResult<(AgeIndex, ParseStats)> {
    let file = File::open(path).map_err(|e| AgeError::SourceUnavailable {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    read_index(file).map_err(|e| match e {
        AgeError::SourceUnavailable { error, .. } => AgeError::SourceUnavailable {
            path: path.to_path_buf(),
            error,
        },
        other => other,
    })
}
