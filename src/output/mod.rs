//! Output formatters for crawl results.
//!
//! - [`text`]: the plain group listing
//! - [`json`]: a JSON document for scripting, including skipped entries
//!
//! # Example
//!
//! ```no_run
//! use dupcrawl::duplicates::Crawler;
//! use dupcrawl::output::TextOutput;
//! use std::path::Path;
//!
//! let report = Crawler::with_defaults().walk(Path::new(".")).unwrap();
//! TextOutput::new(&report.groups)
//!     .write_to(&mut std::io::stdout().lock())
//!     .unwrap();
//! ```

pub mod json;
pub mod text;

// Re-export main types
pub use json::JsonOutput;
pub use text::TextOutput;
