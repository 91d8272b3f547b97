//! Chapter manifest parsing.
//!
//! One chapter per line as `<start_seconds>,<end_seconds>,<title>`. Only the
//! first two commas delimit fields, so titles may contain commas. Blank lines
//! and lines starting with `#` are ignored.

use std::path::Path;

use tracing::debug;

use crate::error::{FrankError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    pub title: String,
    pub start: f64,
    pub end: f64,
}

/// Read and parse a chapter manifest file.
pub fn parse_chapter_file(path: &Path) -> Result<Vec<ManifestEntry>> {
    let contents = std::fs::read_to_string(path)?;
    let entries = parse_manifest(&contents)?;
    debug!("Parsed {} chapters from {}", entries.len(), path.display());
    Ok(entries)
}

/// Parse manifest text, preserving line order.
pub fn parse_manifest(contents: &str) -> Result<Vec<ManifestEntry>> {
    let mut entries = Vec::new();

    for (index, line) in contents.lines().enumerate() {
        let line_no = index + 1;
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let mut parts = stripped.splitn(3, ',');
        let (Some(start), Some(end), Some(title)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(FrankError::Manifest {
                line: line_no,
                message: format!("expected <start>,<end>,<title>, got '{stripped}'"),
            });
        };

        entries.push(ManifestEntry {
            title: title.trim().to_string(),
            start: parse_seconds(start, line_no)?,
            end: parse_seconds(end, line_no)?,
        });
    }

    Ok(entries)
}

fn parse_seconds(value: &str, line: usize) -> Result<f64> {
    value.trim().parse().map_err(|e| FrankError::Manifest {
        line,
        message: format!("invalid time '{}': {e}", value.trim()),
    })
}
