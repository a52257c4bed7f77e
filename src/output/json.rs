//! JSON output formatter for crawl results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "groups": [
//!     { "digest": "qZk+NkcGgWq6PiVxeFDCbJzQ2J0=", "paths": ["a/x.txt", "b/x.txt"] }
//!   ],
//!   "errors": [
//!     { "path": "a/locked", "message": "Permission denied: a/locked" }
//!   ],
//!   "summary": {
//!     "files_hashed": 3,
//!     "bytes_hashed": 9,
//!     "dirs_visited": 3,
//!     "entries_skipped": 0,
//!     "duplicate_groups": 1,
//!     "exit_code": 3,
//!     "exit_code_name": "DC003"
//!   }
//! }
//! ```
//!
//! Only groups with more than one path are listed, in digest order. Paths
//! are printed as the walker built them, relative roots stay relative.

use std::io::Write;

use serde::Serialize;

use crate::duplicates::WalkReport;
use crate::error::ExitCode;

/// A duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonGroup {
    /// Base64 fingerprint
    pub digest: String,
    /// Sorted member paths
    pub paths: Vec<String>,
}

/// A skipped entry in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonEntryError {
    /// Offending path
    pub path: String,
    /// Human-readable reason
    pub message: String,
}

/// Counters in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    pub files_hashed: usize,
    pub bytes_hashed: u64,
    pub dirs_visited: usize,
    pub entries_skipped: usize,
    pub duplicate_groups: usize,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DC000")
    pub exit_code_name: String,
}

/// Complete JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    pub groups: Vec<JsonGroup>,
    pub errors: Vec<JsonEntryError>,
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the document for a finished crawl.
    #[must_use]
    pub fn new(report: &WalkReport, exit_code: ExitCode) -> Self {
        let groups = report
            .groups
            .duplicates()
            .map(|(digest, paths)| JsonGroup {
                digest: digest.as_str().to_string(),
                paths: paths
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect(),
            })
            .collect::<Vec<_>>();

        let errors = report
            .errors
            .iter()
            .map(|e| JsonEntryError {
                path: e.path().to_string_lossy().into_owned(),
                message: e.to_string(),
            })
            .collect();

        let stats = &report.stats;
        Self {
            summary: JsonSummary {
                files_hashed: stats.files_hashed,
                bytes_hashed: stats.bytes_hashed,
                dirs_visited: stats.dirs_visited,
                entries_skipped: stats.entries_skipped,
                duplicate_groups: groups.len(),
                exit_code: exit_code.as_i32(),
                exit_code_name: exit_code.code_prefix().to_string(),
            },
            groups,
            errors,
        }
    }

    /// Serialize to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the document followed by a newline.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonOutputError> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
