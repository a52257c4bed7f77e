//! Plain text report.
//!
//! For every group with more than one path, in ascending digest order, the
//! paths are printed one per line followed by an empty line:
//!
//! ```text
//! testdata/a/a.txt
//! testdata/b/a.txt
//! testdata/c/d/a.txt
//!
//! testdata/a/b.txt
//! testdata/c/b.txt
//!
//! ```

use std::io::{self, Write};

use crate::duplicates::ResultMap;

/// Text formatter over a finalized map.
#[derive(Debug, Clone, Copy)]
pub struct TextOutput<'a> {
    groups: &'a ResultMap,
}

impl<'a> TextOutput<'a> {
    /// Format the duplicate groups of `groups`.
    #[must_use]
    pub fn new(groups: &'a ResultMap) -> Self {
        Self { groups }
    }

    /// Write the report.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for (_, paths) in self.groups.duplicates() {
            for path in paths {
                writeln!(writer, "{}", path.display())?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    /// Render the report to a string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        // Writing to a Vec cannot fail
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}
