//! Duplicate grouping module.
//!
//! This module provides functionality for:
//! - Collecting `(digest, path)` pairs from concurrent hashing tasks
//! - Finalizing them into a sorted digest → paths map
//! - Crawling several roots and merging their reports

pub mod finder;
pub mod groups;

pub use finder::{Crawler, WalkReport, WalkStats};
pub use groups::{ResultAggregator, ResultMap};
