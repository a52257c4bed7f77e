use super::common::{scenario_tree, under, write_file};
use dupcrawl::duplicates::Crawler;
use dupcrawl::scanner::{walk, TraversalRequest, WalkOptions};
use std::fs;
use tempfile::tempdir;

fn crawl(root: &std::path::Path, options: WalkOptions) -> dupcrawl::duplicates::WalkReport {
    walk(TraversalRequest::root(root, options)).unwrap()
}

#[test]
fn test_scenario_groups() {
    let dir = tempdir().unwrap();
    let root = scenario_tree(dir.path());

    for parallel in [false, true] {
        let report = crawl(&root, WalkOptions::default().with_parallel(parallel));
        let map = &report.groups;

        assert_eq!(map.len(), 4);
        assert_eq!(map.total_files(), 6);
        assert_eq!(map.duplicate_groups(), 1);

        let (_, paths) = map.duplicates().next().unwrap();
        assert_eq!(paths, under(&root, &["a/a.txt", "b/a.txt", "c/d/a.txt"]).as_slice());

        for single in ["b/b.txt", "c/c.txt", "c/d/d.txt"] {
            let digest = map.digest_of(&root.join(single)).unwrap();
            assert_eq!(map.get(digest).unwrap().len(), 1);
        }
    }
}

#[test]
fn test_scenario_depth_three() {
    let dir = tempdir().unwrap();
    let root = scenario_tree(dir.path());

    let report = crawl(
        &root,
        WalkOptions::default().with_max_depth(3).with_parallel(false),
    );
    let map = &report.groups;

    assert_eq!(map.total_files(), 4);
    assert!(map.digest_of(&root.join("c/d/a.txt")).is_none());
    assert!(map.digest_of(&root.join("c/d/d.txt")).is_none());

    let (_, paths) = map.duplicates().next().unwrap();
    assert_eq!(paths, under(&root, &["a/a.txt", "b/a.txt"]).as_slice());
}

#[test]
fn test_depth_limit_drops_deep_file() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("root");
    write_file(&root, "a/a.txt", b"a");
    write_file(&root, "b/c/d.txt", b"d");

    let report = crawl(&root, WalkOptions::default().with_max_depth(2));
    assert!(report.groups.digest_of(&root.join("b/c/d.txt")).is_none());
}

#[test]
fn test_parallel_and_sequential_maps_are_identical() {
    let dir = tempdir().unwrap();
    let root = scenario_tree(dir.path());
    for i in 0..40 {
        write_file(&root, &format!("bulk/{}/f{}.bin", i % 5, i), &[(i % 7) as u8; 300]);
    }

    let sequential = crawl(&root, WalkOptions::default().with_parallel(false));
    for _ in 0..3 {
        let parallel = crawl(&root, WalkOptions::default().with_parallel(true));
        assert_eq!(parallel.groups, sequential.groups);
    }
}

#[test]
fn test_exclusion_by_path_suffix() {
    let dir = tempdir().unwrap();
    let root = scenario_tree(dir.path());

    let report = crawl(
        &root,
        WalkOptions::default().with_excludes(vec!["testdata/b".into()]),
    );
    let map = &report.groups;

    assert_eq!(map.total_files(), 4);
    let (_, paths) = map.duplicates().next().unwrap();
    assert_eq!(paths, under(&root, &["a/a.txt", "c/d/a.txt"]).as_slice());
}

#[test]
fn test_exclusion_single_letter() {
    let dir = tempdir().unwrap();
    let root = scenario_tree(dir.path());

    let report = crawl(&root, WalkOptions::default().with_excludes(vec!["b".into()]));
    for (_, paths) in report.groups.iter() {
        for path in paths {
            assert!(!path.to_string_lossy().ends_with('b'));
            assert!(!path.starts_with(root.join("b")));
        }
    }
}

#[test]
fn test_every_group_is_sorted() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("r");
    for name in ["z", "a-b", "a/b", "M", "a.b", "_x"] {
        write_file(&root, &format!("{name}/same.txt"), b"same");
    }

    let report = crawl(&root, WalkOptions::default());
    for (_, paths) in report.groups.iter() {
        assert!(paths
            .windows(2)
            .all(|w| w[0].as_os_str().as_encoded_bytes() <= w[1].as_os_str().as_encoded_bytes()));
    }
}

#[test]
fn test_small_files_differing_by_one_byte_never_collide() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("r");
    let mut content = vec![b'x'; 4096];
    write_file(&root, "one.bin", &content);
    content[2048] = b'y';
    write_file(&root, "two.bin", &content);

    let report = crawl(&root, WalkOptions::default());
    assert_eq!(report.groups.len(), 2);
    assert_eq!(report.groups.duplicate_groups(), 0);
}

#[test]
fn test_empty_directory() {
    let dir = tempdir().unwrap();
    let report = Crawler::with_defaults().walk(dir.path()).unwrap();
    assert!(report.groups.is_empty());
    assert_eq!(report.stats.files_hashed, 0);
    assert_eq!(report.stats.dirs_visited, 1);
}

#[test]
fn test_empty_files_group_together() {
    let dir = tempdir().unwrap();
    fs::File::create(dir.path().join("empty1")).unwrap();
    fs::File::create(dir.path().join("empty2")).unwrap();

    let report = Crawler::with_defaults().walk(dir.path()).unwrap();
    assert_eq!(report.groups.duplicate_groups(), 1);
    let (digest, _) = report.groups.duplicates().next().unwrap();
    // SHA-1 of the empty string
    assert_eq!(digest.as_str(), "2jmj7l5rSw0yVb/vlWAYkK/YBwk=");
}

#[test]
fn test_trailing_slash_root_builds_clean_paths() {
    let dir = tempdir().unwrap();
    let root = scenario_tree(dir.path());
    let with_slash = std::path::PathBuf::from(format!("{}/", root.display()));

    let report = crawl(&with_slash, WalkOptions::default());
    assert!(report.groups.digest_of(&root.join("a/a.txt")).is_some());
}
