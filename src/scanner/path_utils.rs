//! Lexical path helpers.
//!
//! The walker builds every path by joining entry names onto the root as
//! given, so these helpers work on the path text alone and never touch the
//! filesystem.
//!
//! # Example
//!
//! ```
//! use dupcrawl::scanner::path_utils::{clean_path, ends_with_pattern};
//! use std::path::{Path, PathBuf};
//!
//! assert_eq!(clean_path(Path::new("./testdata//b/")), PathBuf::from("testdata/b"));
//! assert!(ends_with_pattern(Path::new("testdata/b"), "b"));
//! ```

use std::cmp::Ordering;
use std::path::{Component, Path, PathBuf};

/// Lexically clean a path.
///
/// Removes repeated separators, `.` components and trailing separators.
/// `..` components are kept, since resolving them would need the
/// filesystem. An empty result becomes `.`.
///
/// # Example
///
/// ```
/// use dupcrawl::scanner::path_utils::clean_path;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(clean_path(Path::new("a/./b//c/")), PathBuf::from("a/b/c"));
/// assert_eq!(clean_path(Path::new("")), PathBuf::from("."));
/// assert_eq!(clean_path(Path::new("./")), PathBuf::from("."));
/// ```
#[must_use]
pub fn clean_path(path: &Path) -> PathBuf {
    let cleaned: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}

/// Check whether the path's text ends with `pattern`.
///
/// This is a plain suffix match on the encoded bytes, not a component
/// match: `"b"` matches both `dir/b` and `dir/club`. An empty pattern
/// never matches.
///
/// # Example
///
/// ```
/// use dupcrawl::scanner::path_utils::ends_with_pattern;
/// use std::path::Path;
///
/// assert!(ends_with_pattern(Path::new("src/club"), "b"));
/// assert!(ends_with_pattern(Path::new("testdata/b"), "testdata/b"));
/// assert!(!ends_with_pattern(Path::new("testdata/b/a.txt"), "testdata/b"));
/// assert!(!ends_with_pattern(Path::new("anything"), ""));
/// ```
#[must_use]
pub fn ends_with_pattern(path: &Path, pattern: &str) -> bool {
    !pattern.is_empty()
        && path
            .as_os_str()
            .as_encoded_bytes()
            .ends_with(pattern.as_bytes())
}

/// Order two paths by their raw text, byte by byte.
///
/// Unlike `Path`'s own `Ord`, which compares component-wise, this is the
/// plain lexicographic order of the path strings (`a-b` sorts before `a/b`).
#[must_use]
pub fn compare_paths(a: &Path, b: &Path) -> Ordering {
    a.as_os_str()
        .as_encoded_bytes()
        .cmp(b.as_os_str().as_encoded_bytes())
}

/// Resolve a symlink's target relative to the directory holding the link.
///
/// Relative targets are joined onto the link's parent. The result is
/// cleaned and `..` components are folded lexically, so a link `a/l -> ../c`
/// yields `c` and the files behind it keep the paths a direct walk would give.
///
/// # Example
///
/// ```
/// use dupcrawl::scanner::path_utils::resolve_link_target;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(
///     resolve_link_target(Path::new("root/links/l"), Path::new("../data/f")),
///     PathBuf::from("root/data/f")
/// );
/// assert_eq!(
///     resolve_link_target(Path::new("root/l"), Path::new("/abs/f")),
///     PathBuf::from("/abs/f")
/// );
/// ```
#[must_use]
pub fn resolve_link_target(link: &Path, target: &Path) -> PathBuf {
    let joined = match link.parent() {
        Some(parent) if !target.is_absolute() && !parent.as_os_str().is_empty() => {
            parent.join(target)
        }
        _ => target.to_path_buf(),
    };
    clean_path(&fold_parent_dirs(&joined))
}

fn fold_parent_dirs(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            Component::CurDir => {}
            _ => parts.push(component),
        }
    }
    parts.iter().collect()
}
