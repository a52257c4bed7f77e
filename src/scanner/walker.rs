//! Directory walker feeding the fingerprinter.
//!
//! # Overview
//!
//! The [`Walker`] examines one [`TraversalRequest`] at a time:
//!
//! 1. Requests deeper than `max_depth` are dropped.
//! 2. Paths ending with an exclusion suffix are dropped with their subtree.
//! 3. Symlinks are skipped, or resolved and re-examined at the same depth.
//! 4. Directories produce one child request per entry, at `depth + 1`.
//! 5. Regular files are fingerprinted and filed in the shared
//!    [`ResultAggregator`].
//!
//! # Modes
//!
//! - **Sequential**: everything runs depth first on the calling thread.
//! - **Parallel**: a fixed set of walker threads pull requests from a
//!   [`WorkQueue`] and push the children back. Each discovered file becomes
//!   its own task on a rayon pool, admitted through a [`Governor`] so that at
//!   most `CPUs * cpu_multiplier` hashes run at once. The walk returns only
//!   after the queue drains and every hash task has finished.
//!
//! Directory listing order is whatever the filesystem returns; the
//! aggregator's final sort makes the output independent of it.
//!
//! # Failures
//!
//! Entries that cannot be statted, listed, resolved or read are logged and
//! collected in [`WalkReport::errors`] while the walk carries on. With
//! `strict` set, the first failure stops the walk instead.
//!
//! # Example
//!
//! ```no_run
//! use dupcrawl::scanner::{TraversalRequest, WalkOptions, Walker};
//! use std::path::Path;
//!
//! let request = TraversalRequest::root(
//!     Path::new("/home/user/Downloads"),
//!     WalkOptions::default().with_excludes(vec![".git".into()]),
//! );
//!
//! let report = Walker::new().walk(request).unwrap();
//! println!("{} files hashed", report.stats.files_hashed);
//! for err in &report.errors {
//!     eprintln!("Warning: {err}");
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::governor::{available_cpus, Governor};
use super::path_utils::resolve_link_target;
use super::queue::WorkQueue;
use super::{
    EntryError, FileRecord, Fingerprinter, ScanError, TraversalRequest, WalkError,
};
use crate::duplicates::{ResultAggregator, WalkReport, WalkStats};
use crate::progress::ProgressCallback;

/// How long an idle walker thread waits for work before rechecking.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Walk `request` with default settings (no shutdown flag, no progress).
///
/// # Errors
///
/// See [`Walker::walk`].
pub fn walk(request: TraversalRequest) -> Result<WalkReport, WalkError> {
    Walker::new().walk(request)
}

/// Directory walker for duplicate discovery.
#[derive(Clone, Default)]
pub struct Walker {
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

/// Outcome of examining a single request.
enum Visit {
    Skip,
    Descend(Vec<TraversalRequest>),
    Follow(TraversalRequest),
    File(FileRecord),
}

/// State shared by every task of one walk.
struct WalkState {
    fingerprinter: Fingerprinter,
    aggregator: ResultAggregator,
    failures: Mutex<Vec<EntryError>>,
    strict: bool,
    aborted: AtomicBool,
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Canonical targets already entered through a symlink
    followed_links: Mutex<HashSet<PathBuf>>,
    dirs_visited: AtomicUsize,
    entries_skipped: AtomicUsize,
    files_hashed: AtomicUsize,
    bytes_hashed: AtomicU64,
    hash_tasks: AtomicUsize,
    peak_hash_tasks: AtomicUsize,
}

impl WalkState {
    fn new(
        fingerprinter: Fingerprinter,
        strict: bool,
        shutdown_flag: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            fingerprinter,
            aggregator: ResultAggregator::new(),
            failures: Mutex::new(Vec::new()),
            strict,
            aborted: AtomicBool::new(false),
            shutdown_flag,
            followed_links: Mutex::new(HashSet::new()),
            dirs_visited: AtomicUsize::new(0),
            entries_skipped: AtomicUsize::new(0),
            files_hashed: AtomicUsize::new(0),
            bytes_hashed: AtomicU64::new(0),
            hash_tasks: AtomicUsize::new(0),
            peak_hash_tasks: AtomicUsize::new(0),
        }
    }

    fn is_interrupted(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn should_stop(&self) -> bool {
        self.aborted.load(Ordering::SeqCst) || self.is_interrupted()
    }

    fn record_failure(&self, error: EntryError) {
        log::warn!("{}", error);
        if self.strict {
            self.aborted.store(true, Ordering::SeqCst);
        }
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error);
    }

    fn skip(&self) -> Visit {
        self.entries_skipped.fetch_add(1, Ordering::Relaxed);
        Visit::Skip
    }

    /// Returns false if `target` was already entered through another link.
    fn first_visit_through_link(&self, target: &Path) -> bool {
        // Dangling targets are left for the stat to report.
        let Ok(canonical) = fs::canonicalize(target) else {
            return true;
        };
        self.followed_links
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(canonical)
    }

    fn finish(self) -> Result<WalkReport, WalkError> {
        if self.is_interrupted() {
            return Err(WalkError::Interrupted);
        }

        let mut errors = self
            .failures
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        if self.strict && !errors.is_empty() {
            return Err(WalkError::Aborted(errors.swap_remove(0)));
        }

        let stats = WalkStats {
            files_hashed: self.files_hashed.load(Ordering::Relaxed),
            bytes_hashed: self.bytes_hashed.load(Ordering::Relaxed),
            dirs_visited: self.dirs_visited.load(Ordering::Relaxed),
            entries_skipped: self.entries_skipped.load(Ordering::Relaxed),
            failed_entries: errors.len(),
            peak_hash_tasks: self.peak_hash_tasks.load(Ordering::Relaxed),
        };

        Ok(WalkReport {
            groups: self.aggregator.finalize(),
            errors,
            stats,
        })
    }
}

impl Walker {
    /// Create a walker without shutdown flag or progress reporting.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walk stops taking new work and
    /// returns [`WalkError::Interrupted`].
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

    /// Walk the tree below `request.path` and group its files by digest.
    ///
    /// # Errors
    ///
    /// - [`WalkError::PathNotFound`] if the root does not exist
    /// - [`WalkError::Interrupted`] if the shutdown flag was raised
    /// - [`WalkError::Aborted`] in strict mode, on the first failing entry
    /// - [`WalkError::ThreadPool`] if the hashing pool cannot start
    pub fn walk(&self, request: TraversalRequest) -> Result<WalkReport, WalkError> {
        if let Err(e) = fs::symlink_metadata(&request.path) {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(WalkError::PathNotFound(request.path));
            }
        }

        let options = Arc::clone(&request.options);
        let root = request.path.clone();
        let state = WalkState::new(
            options.fingerprinter(),
            options.strict,
            self.shutdown_flag.clone(),
        );

        log::info!(
            "Walking {} ({}, max depth {}, sampling {})",
            root.display(),
            if options.parallel { "parallel" } else { "sequential" },
            options.max_depth,
            if options.sample { "on" } else { "off" }
        );
        if let Some(ref callback) = self.progress_callback {
            callback.on_walk_start(&root);
        }

        if options.parallel {
            self.walk_parallel(request, &state)?;
        } else {
            self.walk_sequential(request, &state);
        }

        if let Some(ref callback) = self.progress_callback {
            callback.on_walk_end(&root, state.files_hashed.load(Ordering::Relaxed));
        }

        let report = state.finish()?;
        log::info!(
            "Walk of {} complete: {} files in {} groups, {} failed",
            root.display(),
            report.stats.files_hashed,
            report.groups.len(),
            report.stats.failed_entries
        );
        Ok(report)
    }

    fn walk_sequential(&self, root: TraversalRequest, state: &WalkState) {
        let mut stack = vec![root];
        while let Some(request) = stack.pop() {
            if state.should_stop() {
                log::debug!("Walker: stop requested, abandoning {} pending", stack.len());
                break;
            }
            match visit(&request, state) {
                // Reversed so entries are taken in listing order
                Visit::Descend(children) => stack.extend(children.into_iter().rev()),
                Visit::Follow(target) => stack.push(target),
                Visit::File(record) => self.hash_into(&record, state),
                Visit::Skip => {}
            }
        }
    }

    fn walk_parallel(&self, root: TraversalRequest, state: &WalkState) -> Result<(), WalkError> {
        let governor = Arc::new(Governor::for_available_parallelism(
            root.options.cpu_multiplier,
        ));
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(governor.ceiling())
            .thread_name(|i| format!("dupcrawl-hash-{i}"))
            .build()?;
        let walkers = available_cpus();
        let queue = WorkQueue::new();
        queue.push(root);

        log::debug!(
            "Parallel walk: {} walker threads, hash ceiling {}",
            walkers,
            governor.ceiling()
        );

        pool.in_place_scope(|scope| {
            std::thread::scope(|threads| {
                for id in 0..walkers {
                    let queue = &queue;
                    let governor = &governor;
                    threads.spawn(move || self.worker_loop(id, queue, scope, governor, state));
                }
            });
        });

        log::debug!(
            "Parallel walk drained: {} requests processed, {} hash permits outstanding",
            queue.stats().dequeued.load(Ordering::Relaxed),
            governor.in_flight()
        );
        Ok(())
    }

    fn worker_loop<'scope>(
        &'scope self,
        id: usize,
        queue: &WorkQueue,
        scope: &rayon::Scope<'scope>,
        governor: &Arc<Governor>,
        state: &'scope WalkState,
    ) {
        log::trace!("walker-{id} starting");
        while !queue.is_complete() {
            if state.should_stop() {
                log::debug!("walker-{id}: stop requested");
                break;
            }
            let Some(request) = queue.next(POLL_INTERVAL) else {
                continue;
            };

            match visit(&request, state) {
                Visit::Descend(children) => {
                    for child in children {
                        queue.push(child);
                    }
                }
                Visit::Follow(target) => queue.push(target),
                Visit::File(record) => {
                    let permit = governor.acquire();
                    scope.spawn(move |_| {
                        let _permit = permit;
                        self.hash_into(&record, state);
                    });
                }
                Visit::Skip => {}
            }
            queue.complete();
        }
        log::trace!("walker-{id} done");
    }

    fn hash_into(&self, record: &FileRecord, state: &WalkState) {
        if state.should_stop() {
            return;
        }
        let running = state.hash_tasks.fetch_add(1, Ordering::SeqCst) + 1;
        state.peak_hash_tasks.fetch_max(running, Ordering::SeqCst);
        let result = state.fingerprinter.digest_file(record);
        state.hash_tasks.fetch_sub(1, Ordering::SeqCst);

        match result {
            Ok(digest) => {
                log::trace!("{} -> {}", record.path.display(), digest);
                state.files_hashed.fetch_add(1, Ordering::Relaxed);
                state.bytes_hashed.fetch_add(record.size, Ordering::Relaxed);
                state.aggregator.insert(digest, record.path.clone());
                if let Some(ref callback) = self.progress_callback {
                    callback.on_file_hashed(&record.path, record.size);
                }
            }
            Err(e) => state.record_failure(e.into()),
        }
    }
}

/// Apply depth, exclude and symlink policy to one request.
fn visit(request: &TraversalRequest, state: &WalkState) -> Visit {
    let options = &request.options;
    let path = &request.path;

    if options.exceeds_depth(request.depth) {
        log::trace!("Beyond max depth: {}", path.display());
        return state.skip();
    }
    if options.is_excluded(path) {
        log::trace!("Excluding: {}", path.display());
        return state.skip();
    }

    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) => {
            state.record_failure(ScanError::from_io(path, e).into());
            return Visit::Skip;
        }
    };
    let file_type = metadata.file_type();

    if file_type.is_symlink() {
        if !options.follow_symlinks {
            log::trace!("Skipping symlink: {}", path.display());
            return state.skip();
        }
        return match fs::read_link(path) {
            Ok(target) => {
                let resolved = resolve_link_target(path, &target);
                if state.first_visit_through_link(&resolved) {
                    log::trace!("Following {} -> {}", path.display(), resolved.display());
                    Visit::Follow(request.redirect(resolved))
                } else {
                    log::debug!(
                        "Symlink target already walked, skipping: {} -> {}",
                        path.display(),
                        resolved.display()
                    );
                    state.skip()
                }
            }
            Err(e) => {
                state.record_failure(ScanError::from_io(path, e).into());
                Visit::Skip
            }
        };
    }

    if file_type.is_dir() {
        state.dirs_visited.fetch_add(1, Ordering::Relaxed);
        log::debug!("Examining {}", path.display());
        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(e) => {
                state.record_failure(ScanError::from_io(path, e).into());
                return Visit::Skip;
            }
        };
        let mut children = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => children.push(request.child(&entry.file_name())),
                Err(e) => state.record_failure(ScanError::from_io(path, e).into()),
            }
        }
        return Visit::Descend(children);
    }

    if file_type.is_file() {
        return Visit::File(FileRecord::new(path.clone(), metadata.len()));
    }

    log::trace!("Skipping special file: {}", path.display());
    state.skip()
}
