//! dupcrawl - Concurrent duplicate file crawler
//!
//! Walks one or more directory trees, fingerprints every regular file with a
//! chained content digest (sampled for large files), and groups paths whose
//! digests match.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::duplicates::Crawler;
use crate::error::ExitCode;
use crate::output::{JsonOutput, TextOutput};
use crate::progress::Progress;

/// Run the crawler for parsed command-line arguments.
///
/// Writes the report to stdout and returns the exit code it implies.
///
/// # Errors
///
/// Returns an error for invalid configuration, a missing root, an
/// interrupted crawl, a strict-mode abort, or a failed write to stdout.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    if logging::init_logging(cli.verbose, cli.quiet).is_err() {
        log::debug!("Logger already installed");
    }

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_cli(&cli)?;
    log::debug!("Effective configuration: {:?}", config);

    let handler = signal::install_handler()?;
    let mut crawler = Crawler::new(config.walk_options()).with_shutdown_flag(handler.flag());
    if cli.verbose > 0 {
        crawler = crawler.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let report = crawler.crawl_paths(&cli.paths)?;
    let exit_code = ExitCode::for_report(&report);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.output {
        OutputFormat::Text => TextOutput::new(&report.groups).write_to(&mut out)?,
        OutputFormat::Json => JsonOutput::new(&report, exit_code).write_to(&mut out)?,
    }
    out.flush()?;

    if report.is_partial() {
        log::warn!(
            "{} entries could not be read and were skipped",
            report.errors.len()
        );
    }
    Ok(exit_code)
}
