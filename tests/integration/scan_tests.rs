use dupehunt::duplicates::{detect_duplicates, DuplicateFinder, FinderConfig};
use dupehunt::scanner::{hash_to_hex, HashAlgorithm, Hasher};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let (report, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(report.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.duplicate_groups, 0);
    assert_eq!(summary.hash_operations, 0);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();

    File::create(dir.path().join("a.txt"))
        .unwrap()
        .write_all(b"content a")
        .unwrap();
    File::create(dir.path().join("b.txt"))
        .unwrap()
        .write_all(b"content b")
        .unwrap();
    File::create(dir.path().join("c.txt"))
        .unwrap()
        .write_all(b"content c")
        .unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (report, summary) = finder.find_duplicates(dir.path()).unwrap();

    // Same size, so all three are prefix hashed and then discarded.
    assert!(report.is_empty());
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.eliminated_by_prehash, 3);
    assert_eq!(summary.hash_operations, 3);
}

#[test]
fn test_two_copies_and_one_distinct_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"hello").unwrap();
    fs::write(dir.path().join("b.txt"), b"hello").unwrap();
    fs::write(dir.path().join("c.txt"), b"world!").unwrap();

    let report = detect_duplicates(dir.path()).unwrap();

    assert_eq!(report.len(), 1);
    let group = &report.groups()[0];
    assert_eq!(group.paths(), vec![dir.path().join("a.txt"), dir.path().join("b.txt")]);
    assert_eq!(group.hash, Hasher::new().hash_bytes(b"hello"));
}

#[test]
fn test_same_size_different_content() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"aaaa").unwrap();
    fs::write(dir.path().join("b.txt"), b"bbbb").unwrap();

    let (report, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(report.is_empty());
    assert_eq!(summary.eliminated_by_size, 0);
    assert_eq!(summary.eliminated_by_prehash, 2);
}

#[test]
fn test_duplicates_across_nested_directories() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("x").join("y");
    fs::create_dir_all(&nested).unwrap();
    fs::create_dir_all(dir.path().join("z")).unwrap();

    fs::write(dir.path().join("top.dat"), b"shared payload").unwrap();
    fs::write(nested.join("deep.dat"), b"shared payload").unwrap();
    fs::write(dir.path().join("z").join("side.dat"), b"shared payload").unwrap();

    let (report, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.groups()[0].len(), 3);
    assert_eq!(summary.duplicate_files, 2);
    assert_eq!(summary.reclaimable_space, 2 * b"shared payload".len() as u64);
}

#[test]
fn test_multiple_groups_are_ordered_by_size() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("s1"), b"tiny").unwrap();
    fs::write(dir.path().join("s2"), b"tiny").unwrap();
    fs::write(dir.path().join("l1"), vec![7u8; 10_000]).unwrap();
    fs::write(dir.path().join("l2"), vec![7u8; 10_000]).unwrap();
    fs::write(dir.path().join("m1"), vec![3u8; 500]).unwrap();
    fs::write(dir.path().join("m2"), vec![3u8; 500]).unwrap();

    let report = detect_duplicates(dir.path()).unwrap();

    let sizes: Vec<u64> = report.iter().map(|g| g.size).collect();
    assert_eq!(sizes, vec![10_000, 500, 4]);
    let ids: Vec<usize> = report.iter().map(|g| g.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn test_report_as_map() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("one"), b"payload").unwrap();
    fs::write(dir.path().join("two"), b"payload").unwrap();

    let report = detect_duplicates(dir.path()).unwrap();

    let map = report.as_map();
    let key = hash_to_hex(&Hasher::new().hash_bytes(b"payload"));
    let expected: Vec<PathBuf> = vec![dir.path().join("one"), dir.path().join("two")];
    assert_eq!(map.len(), 1);
    assert_eq!(map[&key], expected);

    let labelled = report.as_labelled_map();
    assert_eq!(labelled["Group 1"], expected);
}

#[test]
fn test_blake3_finds_the_same_groups() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same bytes").unwrap();
    fs::write(dir.path().join("b"), b"same bytes").unwrap();
    fs::write(dir.path().join("c"), b"other byte").unwrap();

    let sha = detect_duplicates(dir.path()).unwrap();
    let (blake, _) = DuplicateFinder::new(FinderConfig::default().with_algorithm(HashAlgorithm::Blake3))
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(sha.groups()[0].paths(), blake.groups()[0].paths());
    assert_ne!(sha.groups()[0].hash, blake.groups()[0].hash);
    assert_eq!(
        blake.groups()[0].hash,
        Hasher::with_algorithm(HashAlgorithm::Blake3).hash_bytes(b"same bytes")
    );
}

#[test]
fn test_scan_does_not_modify_files() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::write(&a, b"keep me").unwrap();
    fs::write(&b, b"keep me").unwrap();
    let before = fs::metadata(&a).unwrap().modified().unwrap();

    detect_duplicates(dir.path()).unwrap();

    assert_eq!(fs::read(&a).unwrap(), b"keep me");
    assert_eq!(fs::read(&b).unwrap(), b"keep me");
    assert_eq!(fs::metadata(&a).unwrap().modified().unwrap(), before);
}
