use super::common::{scenario_tree, write_file};
use dupcrawl::duplicates::Crawler;
use dupcrawl::scanner::WalkOptions;
use tempfile::tempdir;

#[test]
fn test_duplicates_across_roots() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    let a = write_file(first.path(), "photo.jpg", b"jpeg bytes");
    let b = write_file(second.path(), "backup/photo.jpg", b"jpeg bytes");
    write_file(second.path(), "other.jpg", b"other bytes");

    let report = Crawler::with_defaults()
        .crawl_paths(&[first.path().to_path_buf(), second.path().to_path_buf()])
        .unwrap();

    assert_eq!(report.groups.duplicate_groups(), 1);
    let (_, paths) = report.groups.duplicates().next().unwrap();
    assert!(paths.contains(&a));
    assert!(paths.contains(&b));
    assert_eq!(report.stats.files_hashed, 3);
}

#[test]
fn test_root_order_does_not_change_result() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    scenario_tree(first.path());
    scenario_tree(second.path());

    let crawler = Crawler::new(WalkOptions::default().with_parallel(true));
    let forward = crawler
        .crawl_paths(&[first.path().to_path_buf(), second.path().to_path_buf()])
        .unwrap();
    let backward = crawler
        .crawl_paths(&[second.path().to_path_buf(), first.path().to_path_buf()])
        .unwrap();

    assert_eq!(forward.groups, backward.groups);
    assert_eq!(forward.groups.total_files(), 12);
    // Identical trees pair every file with its twin
    assert_eq!(forward.groups.duplicate_groups(), 4);
}

#[test]
fn test_overlapping_roots_do_not_double_count() {
    let dir = tempdir().unwrap();
    let root = scenario_tree(dir.path());

    let report = Crawler::with_defaults()
        .crawl_paths(&[root.clone(), root.join("c")])
        .unwrap();

    assert_eq!(report.groups.total_files(), 6);
}

#[test]
fn test_file_root_alongside_directory_root() {
    let dir = tempdir().unwrap();
    let root = scenario_tree(dir.path());
    let loose = write_file(dir.path(), "loose.txt", b"bee\n");

    let report = Crawler::with_defaults()
        .crawl_paths(&[root.clone(), loose.clone()])
        .unwrap();

    let digest = report.groups.digest_of(&loose).unwrap();
    assert_eq!(
        report.groups.get(digest).unwrap(),
        // "loose.txt" sorts before "testdata/..."
        &[loose, root.join("b/b.txt")][..]
    );
}
