use super::common::write_file;
use dupcrawl::scanner::{walk, HashAlgorithm, TraversalRequest, WalkOptions};
use std::path::Path;
use tempfile::tempdir;

const CHUNK: usize = 1024;
const SIZE: usize = 64 * 1024;

fn options() -> WalkOptions {
    WalkOptions::default().with_chunk_size(CHUNK)
}

fn groups_for(root: &Path, options: WalkOptions) -> usize {
    walk(TraversalRequest::root(root, options))
        .unwrap()
        .groups
        .len()
}

/// Two large files that differ only in the middle.
fn middle_differs(root: &Path) {
    let mut content = vec![7u8; SIZE];
    write_file(root, "one.bin", &content);
    content[SIZE / 2] = 8;
    write_file(root, "two.bin", &content);
}

#[test]
fn test_sampling_misses_difference_outside_sampled_range() {
    let dir = tempdir().unwrap();
    middle_differs(dir.path());

    // Only the first SIZE/16 bytes are read, so both files share a digest
    assert_eq!(groups_for(dir.path(), options()), 1);
}

#[test]
fn test_full_read_separates_large_files() {
    let dir = tempdir().unwrap();
    middle_differs(dir.path());

    assert_eq!(groups_for(dir.path(), options().with_sample(false)), 2);
}

#[test]
fn test_sampling_sees_difference_in_first_window() {
    let dir = tempdir().unwrap();
    let mut content = vec![7u8; SIZE];
    write_file(dir.path(), "one.bin", &content);
    content[10] = 8;
    write_file(dir.path(), "two.bin", &content);

    assert_eq!(groups_for(dir.path(), options()), 2);
}

#[test]
fn test_sampling_reads_the_tail_remainder() {
    let dir = tempdir().unwrap();
    // 16 * 1000 + 5: reads [0, 1000) then the 5 trailing bytes
    let size = 16_005;
    let mut content = vec![1u8; size];
    write_file(dir.path(), "one.bin", &content);
    content[size - 1] = 2;
    write_file(dir.path(), "two.bin", &content);

    assert_eq!(groups_for(dir.path(), options()), 2);
}

#[test]
fn test_file_at_threshold_is_read_in_full() {
    let dir = tempdir().unwrap();
    let mut content = vec![3u8; CHUNK];
    write_file(dir.path(), "one.bin", &content);
    content[CHUNK - 1] = 4;
    write_file(dir.path(), "two.bin", &content);

    assert_eq!(groups_for(dir.path(), options()), 2);
}

#[test]
fn test_algorithms_agree_on_grouping() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a", b"same");
    write_file(dir.path(), "b", b"same");
    write_file(dir.path(), "c", b"different");

    for algorithm in [HashAlgorithm::Sha1, HashAlgorithm::Sha256, HashAlgorithm::Blake3] {
        let report = walk(TraversalRequest::root(
            dir.path(),
            options().with_algorithm(algorithm),
        ))
        .unwrap();
        assert_eq!(report.groups.len(), 2);
        assert_eq!(report.groups.duplicate_groups(), 1);
    }
}

#[test]
fn test_large_sparse_files_hash_without_whole_window_buffers() {
    let dir = tempdir().unwrap();
    // 1 GiB each, so every sampled window is 64 MiB
    let size = 1u64 << 30;
    for name in ["disk_a.img", "disk_b.img"] {
        let file = std::fs::File::create(dir.path().join(name)).unwrap();
        if let Err(e) = file.set_len(size) {
            eprintln!("Skipping sparse file test: {}", e);
            return;
        }
    }

    let report = walk(TraversalRequest::root(dir.path(), WalkOptions::default())).unwrap();
    assert!(report.errors.is_empty());
    assert_eq!(report.stats.bytes_hashed, 2 * size);
    assert_eq!(report.groups.duplicate_groups(), 1);
}
