//! Digest-keyed aggregation of walk results.
//!
//! # Overview
//!
//! While a walk is running, every hashing task inserts its `(digest, path)`
//! pair into one shared [`ResultAggregator`]. Inserts go through a single
//! mutex-guarded operation, so two writers for the same digest can never
//! lose each other's update. The map is not reachable from outside the
//! aggregator until [`ResultAggregator::finalize`] consumes it.
//!
//! Finalizing sorts every path list lexicographically by the raw path text
//! and hands back an immutable [`ResultMap`]. Traversal order therefore has
//! no effect on the output: sequential and parallel runs over the same tree
//! produce equal maps.
//!
//! # Example
//!
//! ```
//! use dupcrawl::duplicates::ResultAggregator;
//! use dupcrawl::scanner::Digest;
//! use std::path::PathBuf;
//!
//! let aggregator = ResultAggregator::new();
//! aggregator.insert(Digest::from("x".to_string()), PathBuf::from("b.txt"));
//! aggregator.insert(Digest::from("x".to_string()), PathBuf::from("a.txt"));
//! aggregator.insert(Digest::from("y".to_string()), PathBuf::from("c.txt"));
//!
//! let map = aggregator.finalize();
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.duplicates().count(), 1);
//! assert_eq!(
//!     map.get(&Digest::from("x".to_string())).unwrap(),
//!     &[PathBuf::from("a.txt"), PathBuf::from("b.txt")]
//! );
//! ```

use std::collections::btree_map::{self, BTreeMap};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use crate::scanner::path_utils::compare_paths;
use crate::scanner::Digest;

/// Concurrency-safe digest → paths accumulator.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    groups: Mutex<HashMap<Digest, Vec<PathBuf>>>,
}

impl ResultAggregator {
    /// Create an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` to the list for `digest`, creating the list if absent.
    pub fn insert(&self, digest: Digest, path: PathBuf) {
        let mut groups = self.groups.lock().unwrap_or_else(PoisonError::into_inner);
        groups.entry(digest).or_default().push(path);
    }

    /// Number of paths inserted so far.
    #[must_use]
    pub fn len(&self) -> usize {
        let groups = self.groups.lock().unwrap_or_else(PoisonError::into_inner);
        groups.values().map(Vec::len).sum()
    }

    /// Whether nothing has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sort every group and return the finished map.
    ///
    /// Consuming `self` guarantees no producer can still be writing.
    #[must_use]
    pub fn finalize(self) -> ResultMap {
        let groups = self
            .groups
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        ResultMap::from_groups(groups)
    }
}

/// Finalized mapping from digest to sorted paths.
///
/// Invariants: every list is non-empty, sorted by raw path text, and free
/// of repeated paths. Iteration is in ascending digest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultMap {
    groups: BTreeMap<Digest, Vec<PathBuf>>,
}

impl ResultMap {
    /// Build a finalized map from raw groups.
    #[must_use]
    pub fn from_groups<I>(groups: I) -> Self
    where
        I: IntoIterator<Item = (Digest, Vec<PathBuf>)>,
    {
        let mut map = Self::default();
        for (digest, paths) in groups {
            map.groups.entry(digest).or_default().extend(paths);
        }
        map.normalize();
        map
    }

    /// Merge another map into this one.
    ///
    /// Lists under the same digest are concatenated and re-sorted; used to
    /// combine the results of several traversal roots.
    ///
    /// A path present in both maps is kept once, so walking the same root
    /// twice (or overlapping roots) does not list a file twice.
    pub fn merge(&mut self, other: ResultMap) {
        for (digest, paths) in other.groups {
            self.groups.entry(digest).or_default().extend(paths);
        }
        self.normalize();
    }

    fn normalize(&mut self) {
        self.groups.retain(|_, paths| !paths.is_empty());
        for paths in self.groups.values_mut() {
            paths.sort_by(|a, b| compare_paths(a, b));
            paths.dedup();
        }
    }

    /// Paths sharing `digest`.
    #[must_use]
    pub fn get(&self, digest: &Digest) -> Option<&[PathBuf]> {
        self.groups.get(digest).map(Vec::as_slice)
    }

    /// Iterate over all groups in digest order.
    pub fn iter(&self) -> impl Iterator<Item = (&Digest, &[PathBuf])> {
        self.groups.iter().map(|(d, p)| (d, p.as_slice()))
    }

    /// Iterate over groups with more than one path.
    pub fn duplicates(&self) -> impl Iterator<Item = (&Digest, &[PathBuf])> {
        self.iter().filter(|(_, paths)| paths.len() > 1)
    }

    /// Find the digest a path was filed under.
    #[must_use]
    pub fn digest_of(&self, path: &std::path::Path) -> Option<&Digest> {
        self.groups
            .iter()
            .find(|(_, paths)| paths.iter().any(|p| p == path))
            .map(|(digest, _)| digest)
    }

    /// Number of distinct digests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the map holds no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of paths across all groups.
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Number of groups with more than one path.
    #[must_use]
    pub fn duplicate_groups(&self) -> usize {
        self.duplicates().count()
    }

    /// Consume the map, yielding the underlying ordered mapping.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<Digest, Vec<PathBuf>> {
        self.groups
    }
}

impl IntoIterator for ResultMap {
    type Item = (Digest, Vec<PathBuf>);
    type IntoIter = btree_map::IntoIter<Digest, Vec<PathBuf>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}
