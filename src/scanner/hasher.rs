//! Chained content fingerprints with optional sampling.
//!
//! # Overview
//!
//! A file is read in chunks and every chunk is folded into a running digest:
//!
//! ```text
//! d[0] = H(chunk[0])
//! d[i] = H(d[i-1] || chunk[i])
//! ```
//!
//! The last value, base64 encoded, is the file's [`Digest`]. Because each
//! step consumes the previous output the result depends on chunk order, not
//! only on the bytes present.
//!
//! # Sampling
//!
//! When sampling is enabled and a file is larger than the chunk size, the
//! read width becomes `size / SAMPLE_RATIO` and after every read the
//! position skips `SAMPLE_RATIO - 1` widths. Only a bounded fraction of a
//! large file is read, so two large files that differ outside the sampled
//! ranges share a digest. Files no larger than one chunk are always read
//! in full and are discriminated exactly.
//!
//! # Example
//!
//! ```
//! use dupcrawl::scanner::Fingerprinter;
//! use std::io::Cursor;
//!
//! let fingerprinter = Fingerprinter::new();
//! let a = fingerprinter.digest_reader(&mut Cursor::new(b"hello"), 5).unwrap();
//! let b = fingerprinter.digest_reader(&mut Cursor::new(b"hello"), 5).unwrap();
//! assert_eq!(a, b);
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

use base64::prelude::{Engine as _, BASE64_STANDARD};
use serde::{Deserialize, Serialize};

use super::{FileRecord, HashError};

/// Default read chunk size (256 KiB). Files above it are sampled.
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

/// Ratio between a sampled file's size and its read width.
pub const SAMPLE_RATIO: u64 = 16;

/// Upper bound on the read buffer, whatever the read width.
pub const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Hash function applied at each chain step.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-1 (20-byte links, 28-character digests)
    #[default]
    Sha1,
    /// SHA-256 (32-byte links)
    Sha256,
    /// BLAKE3 (32-byte links)
    Blake3,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => write!(f, "sha1"),
            Self::Sha256 => write!(f, "sha256"),
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

/// One chain step in progress: `H(previous || chunk)`, fed piece by piece.
enum ChainStep {
    Sha1(sha1::Sha1),
    Sha256(sha2::Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl ChainStep {
    fn new(algorithm: HashAlgorithm, previous: &[u8]) -> Self {
        use sha2::Digest as _;

        let mut step = match algorithm {
            HashAlgorithm::Sha1 => Self::Sha1(sha1::Sha1::new()),
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        };
        step.update(previous);
        step
    }

    fn update(&mut self, bytes: &[u8]) {
        use sha2::Digest as _;

        match self {
            Self::Sha1(h) => h.update(bytes),
            Self::Sha256(h) => h.update(bytes),
            Self::Blake3(h) => {
                h.update(bytes);
            }
        }
    }

    fn finish(self) -> Vec<u8> {
        use sha2::Digest as _;

        match self {
            Self::Sha1(h) => h.finalize().to_vec(),
            Self::Sha256(h) => h.finalize().to_vec(),
            Self::Blake3(h) => h.finalize().as_bytes().to_vec(),
        }
    }
}

/// Base64 text of the last chain link.
///
/// Equal digests are necessary but not sufficient for equal content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    fn from_link(link: &[u8]) -> Self {
        Self(BASE64_STANDARD.encode(link))
    }

    /// The digest text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Digest {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Computes [`Digest`]s for files.
///
/// Cheap to clone; holds only configuration. Each call allocates its own
/// buffer of at most [`HASH_BUFFER_SIZE`] bytes and streams wider reads
/// through it, so one instance can be shared across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprinter {
    chunk_size: usize,
    sample: bool,
    algorithm: HashAlgorithm,
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

impl Fingerprinter {
    /// Create a fingerprinter with the default chunk size, sampling on, SHA-1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            sample: true,
            algorithm: HashAlgorithm::Sha1,
        }
    }

    /// Set the chunk size (clamped to at least one byte).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Enable or disable sampling of large files.
    #[must_use]
    pub fn with_sampling(mut self, sample: bool) -> Self {
        self.sample = sample;
        self
    }

    /// Set the chain hash algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// The configured chunk size.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Whether a file of `size` bytes is sampled rather than read in full.
    #[must_use]
    pub fn is_sampled(&self, size: u64) -> bool {
        self.sample && size > self.chunk_size as u64
    }

    /// Width of each read for a file of `size` bytes.
    #[must_use]
    pub fn read_width(&self, size: u64) -> usize {
        if self.is_sampled(size) {
            usize::try_from(size / SAMPLE_RATIO)
                .unwrap_or(usize::MAX)
                .max(1)
        } else {
            self.chunk_size
        }
    }

    /// Number of bytes skipped after each read for a file of `size` bytes.
    #[must_use]
    pub fn skip_width(&self, size: u64) -> u64 {
        if self.is_sampled(size) {
            self.read_width(size) as u64 * (SAMPLE_RATIO - 1)
        } else {
            0
        }
    }

    /// Fingerprint a discovered file.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened, read or seeked.
    pub fn digest_file(&self, record: &FileRecord) -> Result<Digest, HashError> {
        let mut file = File::open(&record.path).map_err(|e| HashError::from_io(&record.path, e))?;
        self.digest_reader(&mut file, record.size)
            .map_err(|e| HashError::from_io(&record.path, e))
    }

    /// Fingerprint a seekable stream of `size` bytes.
    ///
    /// A stream shorter than one read still produces exactly one chain step,
    /// and an empty stream yields `H("")`.
    ///
    /// # Errors
    ///
    /// Propagates read and seek errors.
    pub fn digest_reader<R: Read + Seek>(&self, reader: &mut R, size: u64) -> io::Result<Digest> {
        let width = self.read_width(size);
        let skip = i64::try_from(self.skip_width(size)).unwrap_or(i64::MAX);
        let mut buffer = vec![0u8; width.min(HASH_BUFFER_SIZE)];
        let mut link: Vec<u8> = Vec::new();
        let mut steps = 0usize;

        loop {
            let mut step = ChainStep::new(self.algorithm, &link);
            let n = stream_window(reader, &mut buffer, width, &mut step)?;
            if n == 0 && steps > 0 {
                break;
            }
            link = step.finish();
            steps += 1;
            if n < width {
                break;
            }
            if skip > 0 {
                reader.seek(SeekFrom::Current(skip))?;
            }
        }

        log::trace!(
            "Digest of {} bytes: {} step(s), width {}, skip {}",
            size,
            steps,
            width,
            skip
        );
        Ok(Digest::from_link(&link))
    }
}

/// Feed up to `width` bytes from `reader` into `step` through `buffer`.
///
/// Returns the number of bytes consumed, short only at end of stream.
fn stream_window<R: Read>(
    reader: &mut R,
    buffer: &mut [u8],
    width: usize,
    step: &mut ChainStep,
) -> io::Result<usize> {
    let mut consumed = 0;
    while consumed < width {
        let want = buffer.len().min(width - consumed);
        match reader.read(&mut buffer[..want]) {
            Ok(0) => break,
            Ok(n) => {
                step.update(&buffer[..n]);
                consumed += n;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(consumed)
}
