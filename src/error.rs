//! Structured error handling and exit codes.

use serde::Serialize;

use crate::duplicates::WalkReport;
use crate::scanner::WalkError;

/// Exit codes for the dupcrawl binary.
///
/// - 0: Success (completed normally, duplicates found)
/// - 1: General error (unexpected failure, or strict-mode abort)
/// - 2: No duplicates found (completed normally, no duplicates)
/// - 3: Partial success (completed, but some entries were skipped on error)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: Crawl completed and duplicates were found.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// No duplicates: Crawl completed but no duplicates were found.
    NoDuplicates = 2,
    /// Partial success: Crawl completed but some entries failed.
    PartialSuccess = 3,
    /// Interrupted: Crawl was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DC000",
            Self::GeneralError => "DC001",
            Self::NoDuplicates => "DC002",
            Self::PartialSuccess => "DC003",
            Self::Interrupted => "DC130",
        }
    }

    /// Exit code for a finished crawl.
    ///
    /// Skipped entries take precedence over the duplicate count.
    #[must_use]
    pub fn for_report(report: &WalkReport) -> Self {
        if report.is_partial() {
            Self::PartialSuccess
        } else if report.groups.duplicate_groups() > 0 {
            Self::Success
        } else {
            Self::NoDuplicates
        }
    }

    /// Exit code for a failed run.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<WalkError>() {
            Some(WalkError::Interrupted) => Self::Interrupted,
            _ => Self::GeneralError,
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DC001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
