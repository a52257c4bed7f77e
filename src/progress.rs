//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`Progress`] struct which implements [`ProgressCallback`]
//! to display a spinner while a walk is running.
//!
//! Callbacks arrive from many hashing threads at once, so implementations must
//! be cheap and thread-safe.

use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use bytesize::ByteSize;
use indicatif::{ProgressBar, ProgressStyle};

/// Progress callback for a walk.
///
/// Implement this trait to receive progress updates while the crawler
/// traverses and hashes.
pub trait ProgressCallback: Send + Sync {
    /// Called when the walk of a root starts.
    ///
    /// # Arguments
    ///
    /// * `root` - Traversal root, after cleaning
    fn on_walk_start(&self, root: &Path);

    /// Called after each file has been fingerprinted.
    ///
    /// # Arguments
    ///
    /// * `path` - Path of the hashed file
    /// * `bytes` - Size of the file in bytes
    fn on_file_hashed(&self, path: &Path, bytes: u64);

    /// Called when the walk of a root finishes, interrupted or not.
    fn on_walk_end(&self, root: &Path, files_hashed: usize);

    /// Called to update the progress message.
    fn on_message(&self, _message: &str) {}
}

/// Spinner-based progress reporter.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    files: AtomicUsize,
    bytes: AtomicU64,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn; counters are still kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupcrawl::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// assert_eq!(progress.files_hashed(), 0);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            files: AtomicUsize::new(0),
            bytes: AtomicU64::new(0),
            quiet,
        }
    }

    /// Files reported so far, across all roots.
    #[must_use]
    pub fn files_hashed(&self) -> usize {
        self.files.load(Ordering::Relaxed)
    }

    /// Bytes reported so far, across all roots.
    #[must_use]
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Some(ref pb) = *self.bar.lock().unwrap_or_else(PoisonError::into_inner) {
            f(pb);
        }
    }
}

impl ProgressCallback for Progress {
    fn on_walk_start(&self, root: &Path) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::style());
        pb.set_message(format!("Walking {}", truncate_path(&root.to_string_lossy(), 40)));
        pb.enable_steady_tick(Duration::from_millis(100));
        *self.bar.lock().unwrap_or_else(PoisonError::into_inner) = Some(pb);
    }

    fn on_file_hashed(&self, _path: &Path, bytes: u64) {
        self.files.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
        self.with_bar(|pb| pb.inc(1));
    }

    fn on_walk_end(&self, root: &Path, files_hashed: usize) {
        let taken = self.bar.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(pb) = taken {
            pb.finish_with_message(format!(
                "Walked {}: {} files, {}",
                truncate_path(&root.to_string_lossy(), 40),
                files_hashed,
                ByteSize::b(self.bytes_hashed())
            ));
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.with_bar(|pb| pb.set_message(message.to_string()));
    }
}

/// Shorten a path for display, keeping the file name.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len + 4 > max_len {
        let tail: String = file_name
            .chars()
            .skip(name_len.saturating_sub(max_len.saturating_sub(3)))
            .collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
