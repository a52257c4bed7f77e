#![cfg(unix)]

use super::common::{scenario_tree, write_file};
use dupcrawl::duplicates::Crawler;
use dupcrawl::scanner::{EntryError, HashError, ScanError, WalkError, WalkOptions};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::tempdir;

/// Make `path` unreadable; returns false when running with privileges that
/// bypass permission checks.
fn lock(path: &Path, mode: u32) -> bool {
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    if fs::File::open(path).is_ok() && (path.is_file() || fs::read_dir(path).is_ok()) {
        unlock(path, 0o755);
        return false;
    }
    true
}

fn unlock(path: &Path, mode: u32) {
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

#[test]
fn test_unreadable_file_is_skipped_and_reported() {
    let dir = tempdir().unwrap();
    let root = scenario_tree(dir.path());
    let secret = write_file(&root, "b/secret.txt", b"secret");
    if !lock(&secret, 0o000) {
        eprintln!("Skipping: permissions are not enforced for this user");
        return;
    }

    for parallel in [false, true] {
        let report = Crawler::new(WalkOptions::default().with_parallel(parallel))
            .walk(&root)
            .unwrap();

        assert_eq!(report.groups.total_files(), 6);
        assert_eq!(report.groups.duplicate_groups(), 1);
        assert!(report.is_partial());
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(
            &report.errors[0],
            EntryError::Hash(HashError::PermissionDenied(p)) if p == &secret
        ));
        assert_eq!(report.stats.failed_entries, 1);
    }

    unlock(&secret, 0o644);
}

#[test]
fn test_unreadable_directory_is_skipped_and_reported() {
    let dir = tempdir().unwrap();
    let root = scenario_tree(dir.path());
    let locked = root.join("c");
    if !lock(&locked, 0o000) {
        eprintln!("Skipping: permissions are not enforced for this user");
        return;
    }

    let report = Crawler::with_defaults().walk(&root).unwrap();

    assert_eq!(report.groups.total_files(), 3);
    assert_eq!(report.errors.len(), 1);
    assert!(matches!(
        &report.errors[0],
        EntryError::Scan(ScanError::PermissionDenied(p)) if p == &locked
    ));

    unlock(&locked, 0o755);
}

#[test]
fn test_strict_mode_aborts_without_results() {
    let dir = tempdir().unwrap();
    let root = scenario_tree(dir.path());
    let locked = root.join("c/d");
    if !lock(&locked, 0o000) {
        eprintln!("Skipping: permissions are not enforced for this user");
        return;
    }

    for parallel in [false, true] {
        let crawler = Crawler::new(
            WalkOptions::default()
                .with_strict(true)
                .with_parallel(parallel),
        );
        match crawler.walk(&root) {
            Err(WalkError::Aborted(err)) => assert_eq!(err.path(), locked.as_path()),
            other => panic!("Expected strict abort, got {other:?}"),
        }
    }

    unlock(&locked, 0o755);
}

#[test]
fn test_excluded_unreadable_directory_is_not_an_error() {
    let dir = tempdir().unwrap();
    let root = scenario_tree(dir.path());
    let locked = root.join("c");
    if !lock(&locked, 0o000) {
        eprintln!("Skipping: permissions are not enforced for this user");
        return;
    }

    let report = Crawler::new(
        WalkOptions::default()
            .with_strict(true)
            .with_excludes(vec!["testdata/c".into()]),
    )
    .walk(&root)
    .unwrap();
    assert!(report.errors.is_empty());
    assert_eq!(report.groups.total_files(), 3);

    unlock(&locked, 0o755);
}
