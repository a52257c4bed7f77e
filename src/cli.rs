//! Command-line interface definitions for dupcrawl.
//!
//! This module defines all CLI arguments using the clap derive API. Every
//! walk setting is optional here so that unset flags fall through to the
//! configuration file and `DUPCRAWL_*` environment variables.
//!
//! # Example
//!
//! ```bash
//! # Report duplicate groups below two roots
//! dupcrawl ~/Pictures /mnt/backup/Pictures
//!
//! # Skip VCS metadata, stop three levels down, JSON output
//! dupcrawl -e .git,.hg -d 3 --output json ~/src
//!
//! # Hash every byte of every file, single-threaded
//! dupcrawl --no-sample --no-parallel ~/Downloads
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::scanner::HashAlgorithm;

/// Concurrent duplicate file crawler.
///
/// Walks each PATH, fingerprints every regular file with a chained (and,
/// for large files, sampled) content hash, and prints every group of files
/// sharing a fingerprint.
#[derive(Debug, Parser)]
#[command(name = "dupcrawl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Traversal roots (directories or single files)
    #[arg(value_name = "PATH", required = true, num_args = 1..)]
    pub paths: Vec<PathBuf>,

    /// Path suffixes to exclude, comma separated (e.g. .git,node_modules)
    ///
    /// An entry whose path ends with one of these is skipped together with
    /// everything below it.
    #[arg(short, long, value_name = "SUFFIX", value_delimiter = ',')]
    pub excludes: Vec<String>,

    /// Maximum walk depth (0 = unlimited, 1 = root only)
    #[arg(short, long, value_name = "N")]
    pub depth: Option<usize>,

    /// Follow symbolic links
    ///
    /// Each link target is entered at most once per walk.
    #[arg(short = 'l', long)]
    pub symlinks: bool,

    /// Walk and hash on the calling thread only
    #[arg(long)]
    pub no_parallel: bool,

    /// Read large files in full instead of sampling them
    #[arg(long)]
    pub no_sample: bool,

    /// Read chunk size, also the sampling threshold (e.g. 256KiB, 1MiB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub chunk_size: Option<u64>,

    /// Hash function for each chain step
    #[arg(long, value_enum, value_name = "ALGO")]
    pub algorithm: Option<HashAlgorithm>,

    /// Concurrent hash tasks per available CPU
    #[arg(long, value_name = "N")]
    pub cpu_multiplier: Option<usize>,

    /// Abort on the first unreadable entry instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, value_name = "FILE", env = "DUPCRAWL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print fatal errors as a JSON object on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Output format for crawl results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain groups, one path per line, blank line between groups
    #[default]
    Text,
    /// JSON document for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use dupcrawl::cli::parse_size;
///
/// assert_eq!(parse_size("4096").unwrap(), 4096);
/// assert_eq!(parse_size("256KiB").unwrap(), 262_144);
/// assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
/// ```
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err(format!("Size cannot be negative: '{s}'"));
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
