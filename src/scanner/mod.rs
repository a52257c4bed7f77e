//! Scanner module for directory traversal and file fingerprinting.
//!
//! This module provides functionality for:
//! - Sequential and parallel directory walking with depth, exclude and
//!   symlink policies
//! - Chained, optionally sampled content fingerprints
//! - Bounding the number of in-flight hashing tasks
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal, dispatching regular files to the hasher
//! - [`queue`]: Work queue shared by the parallel walker threads
//! - [`hasher`]: Chained digest construction with sampling
//! - [`governor`]: Permit gate for concurrent hash dispatch
//! - [`path_utils`]: Lexical path helpers (cleaning, suffix matching, ordering)
//!
//! # Example
//!
//! ```no_run
//! use dupcrawl::scanner::{walk, TraversalRequest, WalkOptions};
//! use std::path::Path;
//!
//! let options = WalkOptions::default().with_max_depth(3);
//! let request = TraversalRequest::root(Path::new("."), options);
//!
//! let report = walk(request).unwrap();
//! for (digest, paths) in report.groups.duplicates() {
//!     println!("{digest}: {} copies", paths.len());
//! }
//! ```

pub mod governor;
pub mod hasher;
pub mod path_utils;
pub mod queue;
pub mod walker;

use std::path::{Path, PathBuf};
use std::sync::Arc;

// Re-export main types
pub use governor::{Governor, Permit, CPU_MULTIPLIER};
pub use hasher::{Digest, Fingerprinter, HashAlgorithm, DEFAULT_CHUNK_SIZE, SAMPLE_RATIO};
pub use walker::{walk, Walker};

/// A regular file discovered by the walker.
///
/// Handed to the [`Fingerprinter`] exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path as built from the traversal root
    pub path: PathBuf,
    /// File size in bytes at the time it was statted
    pub size: u64,
}

impl FileRecord {
    /// Create a new FileRecord.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// Options shared by every step of one walk.
///
/// Controls depth limiting, exclusion, symlink handling, concurrency and
/// the fingerprint construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOptions {
    /// Maximum depth in directory levels from the root (0 = unlimited).
    /// The root itself is depth 0.
    pub max_depth: usize,

    /// Path suffixes to skip, together with their subtrees.
    pub excludes: Vec<String>,

    /// Resolve symbolic links and continue from their targets.
    /// Warning: a link into its own ancestry is only entered once.
    pub follow_symlinks: bool,

    /// Fan traversal and hashing out over worker threads.
    pub parallel: bool,

    /// Sample large files instead of reading every byte.
    pub sample: bool,

    /// Chunk size for full reads, also the sampling threshold.
    pub chunk_size: usize,

    /// Hash used for each chain step.
    pub algorithm: HashAlgorithm,

    /// Abort the whole walk on the first unreadable entry.
    pub strict: bool,

    /// In-flight hash ceiling as a multiple of available CPUs.
    pub cpu_multiplier: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_depth: 0,
            excludes: Vec::new(),
            follow_symlinks: false,
            parallel: true,
            sample: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
            algorithm: HashAlgorithm::default(),
            strict: false,
            cpu_multiplier: CPU_MULTIPLIER,
        }
    }
}

impl WalkOptions {
    /// Set the maximum depth (0 = unlimited).
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the exclusion suffixes. Empty patterns are dropped.
    #[must_use]
    pub fn with_excludes(mut self, excludes: Vec<String>) -> Self {
        self.excludes = excludes.into_iter().filter(|e| !e.is_empty()).collect();
        self
    }

    /// Follow symbolic links.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Enable or disable parallel traversal.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Enable or disable sampling of large files.
    #[must_use]
    pub fn with_sample(mut self, sample: bool) -> Self {
        self.sample = sample;
        self
    }

    /// Set the read chunk size (clamped to at least one byte).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the chain hash algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Abort on the first failure instead of recording it and moving on.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the hashing ceiling multiplier (clamped to at least 1).
    #[must_use]
    pub fn with_cpu_multiplier(mut self, multiplier: usize) -> Self {
        self.cpu_multiplier = multiplier.max(1);
        self
    }

    /// Build the fingerprinter these options describe.
    #[must_use]
    pub fn fingerprinter(&self) -> Fingerprinter {
        Fingerprinter::new()
            .with_chunk_size(self.chunk_size)
            .with_sampling(self.sample)
            .with_algorithm(self.algorithm)
    }

    /// Whether `path` ends with one of the exclusion suffixes.
    #[must_use]
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.excludes
            .iter()
            .any(|pattern| path_utils::ends_with_pattern(path, pattern))
    }

    /// Whether an entry at `depth` lies beyond the depth limit.
    #[must_use]
    pub fn exceeds_depth(&self, depth: usize) -> bool {
        self.max_depth > 0 && depth >= self.max_depth
    }
}

/// One step of a traversal: a path, its depth, and the shared options.
///
/// Children and symlink targets get fresh requests; the options are never
/// mutated once the walk starts.
#[derive(Debug, Clone)]
pub struct TraversalRequest {
    /// Path to examine
    pub path: PathBuf,
    /// Depth in directory levels from the root (root = 0)
    pub depth: usize,
    /// Options shared by the whole walk
    pub options: Arc<WalkOptions>,
}

impl TraversalRequest {
    /// Create the request for a traversal root.
    ///
    /// The root is cleaned lexically, so `testdata/` and `./testdata` both
    /// produce paths like `testdata/a/a.txt`.
    #[must_use]
    pub fn root(path: &Path, options: WalkOptions) -> Self {
        Self {
            path: path_utils::clean_path(path),
            depth: 0,
            options: Arc::new(options),
        }
    }

    /// Request for a directory entry one level below this one.
    #[must_use]
    pub fn child(&self, name: &std::ffi::OsStr) -> Self {
        Self {
            path: self.path.join(name),
            depth: self.depth + 1,
            options: Arc::clone(&self.options),
        }
    }

    /// Request for a resolved symlink target, at the same depth.
    #[must_use]
    pub fn redirect(&self, target: PathBuf) -> Self {
        Self {
            path: target,
            depth: self.depth,
            options: Arc::clone(&self.options),
        }
    }
}

/// Errors that can occur while examining a path during traversal.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The path vanished or never existed.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a path.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(path) | Self::NotFound(path) => path,
            Self::Io { path, .. } => path,
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file disappeared before it could be opened.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// A read or seek failed part way through the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(path) | Self::PermissionDenied(path) => path,
            Self::Io { path, .. } => path,
        }
    }
}

/// A single entry that could not be walked or hashed.
#[derive(thiserror::Error, Debug)]
pub enum EntryError {
    /// Stat, listing or symlink resolution failed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Opening or reading the file failed.
    #[error(transparent)]
    Hash(#[from] HashError),
}

impl EntryError {
    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Scan(e) => e.path(),
            Self::Hash(e) => e.path(),
        }
    }
}

/// Errors that end a whole walk.
#[derive(thiserror::Error, Debug)]
pub enum WalkError {
    /// The traversal root does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The walk was interrupted by the shutdown flag.
    #[error("Walk interrupted by user")]
    Interrupted,

    /// Strict mode: the first failing entry aborted the walk.
    #[error("Walk aborted: {0}")]
    Aborted(#[source] EntryError),

    /// The hashing thread pool could not be started.
    #[error("Failed to build hashing thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
