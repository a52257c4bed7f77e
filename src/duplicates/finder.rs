//! Crawl orchestration over one or more traversal roots.
//!
//! # Overview
//!
//! A [`Crawler`] owns the [`WalkOptions`] for a run and walks each root with
//! a [`Walker`]. The per-root [`WalkReport`]s are merged into one: digest
//! groups are concatenated and re-sorted, and per-entry errors are appended
//! in root order.
//!
//! # Example
//!
//! ```no_run
//! use dupcrawl::duplicates::Crawler;
//! use dupcrawl::scanner::WalkOptions;
//! use std::path::PathBuf;
//!
//! let crawler = Crawler::new(WalkOptions::default().with_max_depth(4));
//! let report = crawler
//!     .crawl_paths(&[PathBuf::from("photos"), PathBuf::from("backup")])
//!     .unwrap();
//!
//! println!("Found {} duplicate groups", report.groups.duplicate_groups());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytesize::ByteSize;

use super::ResultMap;
use crate::progress::ProgressCallback;
use crate::scanner::{EntryError, TraversalRequest, WalkError, WalkOptions, Walker};

/// Counters collected during a walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Regular files fingerprinted successfully
    pub files_hashed: usize,
    /// Sum of the sizes of those files
    pub bytes_hashed: u64,
    /// Directories listed
    pub dirs_visited: usize,
    /// Entries dropped by depth, exclude or symlink policy
    pub entries_skipped: usize,
    /// Entries that could not be walked or hashed
    pub failed_entries: usize,
    /// Most hash tasks seen running at once
    pub peak_hash_tasks: usize,
}

impl WalkStats {
    /// Add another walk's counters to these.
    pub fn absorb(&mut self, other: &WalkStats) {
        self.files_hashed += other.files_hashed;
        self.bytes_hashed += other.bytes_hashed;
        self.dirs_visited += other.dirs_visited;
        self.entries_skipped += other.entries_skipped;
        self.failed_entries += other.failed_entries;
        self.peak_hash_tasks = self.peak_hash_tasks.max(other.peak_hash_tasks);
    }

    /// Hashed volume as human-readable string.
    #[must_use]
    pub fn bytes_display(&self) -> String {
        ByteSize::b(self.bytes_hashed).to_string()
    }
}

/// Everything a finished walk produced.
#[derive(Debug, Default)]
pub struct WalkReport {
    /// Digest → sorted paths
    pub groups: ResultMap,
    /// Entries skipped because of an error, in the order they were hit
    pub errors: Vec<EntryError>,
    /// Counters
    pub stats: WalkStats,
}

impl WalkReport {
    /// Fold another report into this one.
    pub fn merge(&mut self, other: WalkReport) {
        self.groups.merge(other.groups);
        self.errors.extend(other.errors);
        self.stats.absorb(&other.stats);
    }

    /// True if some entries were skipped because of errors.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Runs walks over one or more roots with shared options.
#[derive(Clone)]
pub struct Crawler {
    options: WalkOptions,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Crawler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crawler")
            .field("options", &self.options)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Crawler {
    /// Create a crawler with the given options.
    #[must_use]
    pub fn new(options: WalkOptions) -> Self {
        Self {
            options,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Create a crawler with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(WalkOptions::default())
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Options every walk of this crawler uses.
    #[must_use]
    pub fn options(&self) -> &WalkOptions {
        &self.options
    }

    fn walker(&self) -> Walker {
        let mut walker = Walker::new();
        if let Some(ref flag) = self.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }
        if let Some(ref callback) = self.progress_callback {
            walker = walker.with_progress_callback(Arc::clone(callback));
        }
        walker
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk a single root.
    ///
    /// # Errors
    ///
    /// See [`Walker::walk`].
    pub fn walk(&self, root: &Path) -> Result<WalkReport, WalkError> {
        let request = TraversalRequest::root(root, self.options.clone());
        self.walker().walk(request)
    }

    /// Walk every root in order and merge the results.
    ///
    /// An empty slice yields an empty report. Roots are walked one after
    /// another; the first fatal error ends the crawl.
    ///
    /// # Errors
    ///
    /// Returns the first [`WalkError`] raised by any root.
    pub fn crawl_paths(&self, roots: &[PathBuf]) -> Result<WalkReport, WalkError> {
        let mut report = WalkReport::default();
        if roots.is_empty() {
            log::warn!("No paths provided for crawling");
            return Ok(report);
        }

        log::info!("Crawling {} root(s)", roots.len());
        let walker = self.walker();
        for root in roots {
            if self.is_shutdown_requested() {
                return Err(WalkError::Interrupted);
            }
            let request = TraversalRequest::root(root, self.options.clone());
            report.merge(walker.walk(request)?);
        }

        log::info!(
            "Crawl complete: {} files ({}) in {} duplicate groups, {} errors",
            report.stats.files_hashed,
            report.stats.bytes_display(),
            report.groups.duplicate_groups(),
            report.errors.len()
        );
        Ok(report)
    }
}
