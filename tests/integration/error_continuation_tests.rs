use dupehunt::duplicates::{
    build_io_pool, phase2_prehash, DuplicateFinder, FinderConfig, PhaseContext,
};
use dupehunt::scanner::{FileEntry, HashError, Hasher, ScanError};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_find_duplicates_from_files_continues_on_error() {
    let finder = DuplicateFinder::with_defaults();
    // Files that don't exist trigger hashing errors
    let file1 = FileEntry::new(PathBuf::from("nonexistent_1.txt"), 100);
    let file2 = FileEntry::new(PathBuf::from("nonexistent_2.txt"), 100);

    let (report, summary) = finder
        .find_duplicates_from_files(vec![file1, file2])
        .unwrap();

    assert!(report.is_empty());
    assert_eq!(summary.errors.len(), 2);

    for err in &summary.errors {
        match err {
            ScanError::Hash(HashError::NotFound(_)) => {}
            _ => panic!("Expected NotFound HashError, got: {:?}", err),
        }
    }
}

#[test]
fn test_missing_member_does_not_hide_remaining_duplicates() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::write(&a, b"survivor").unwrap();
    fs::write(&b, b"survivor").unwrap();

    let files = vec![
        FileEntry::new(a.clone(), 8),
        FileEntry::new(dir.path().join("gone"), 8),
        FileEntry::new(b.clone(), 8),
    ];

    let (report, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_from_files(files)
        .unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.groups()[0].paths(), vec![a, b]);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].path(), dir.path().join("gone"));
}

#[test]
fn test_file_removed_between_scan_and_hash() {
    let dir = tempdir().unwrap();
    let keep = dir.path().join("keep");
    let doomed = dir.path().join("doomed");
    fs::write(&keep, b"twin").unwrap();
    fs::write(&doomed, b"twin").unwrap();

    let mut groups = BTreeMap::new();
    groups.insert(
        4,
        vec![
            FileEntry::new(keep.clone(), 4),
            FileEntry::new(doomed.clone(), 4),
        ],
    );
    fs::remove_file(&doomed).unwrap();

    let pool = build_io_pool(2).unwrap();
    let (candidates, stats) = phase2_prehash(groups, &Hasher::new(), &pool, &PhaseContext::default());

    // The lone survivor has nothing left to match
    assert!(candidates.is_empty());
    assert_eq!(stats.failed_files, 1);
    assert!(matches!(stats.errors[0], HashError::NotFound(ref p) if *p == doomed));
    assert!(!stats.interrupted);
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_reported_and_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let locked = dir.path().join("locked");
    fs::write(dir.path().join("a"), b"data").unwrap();
    fs::write(dir.path().join("b"), b"data").unwrap();
    fs::write(&locked, b"data").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Permission bits do not apply to root
    if fs::File::open(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
        return;
    }

    let (report, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.groups()[0].len(), 2);
    assert_eq!(summary.errors.len(), 1);
    assert!(matches!(
        summary.errors[0],
        ScanError::Hash(HashError::PermissionDenied(_))
    ));
}

#[cfg(unix)]
#[test]
fn test_read_failure_after_open_is_recorded_with_retry() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    let sub = dir.path().join("c");
    fs::write(&a, b"pair").unwrap();
    fs::write(&b, b"pair").unwrap();
    fs::create_dir(&sub).unwrap();

    // A directory opens fine but every read fails, so the retry fails too
    let files = vec![
        FileEntry::new(a.clone(), 4),
        FileEntry::new(sub.clone(), 4),
        FileEntry::new(b.clone(), 4),
    ];
    let finder = DuplicateFinder::new(FinderConfig::default().with_retry_reads(true));

    let (report, summary) = finder.find_duplicates_from_files(files).unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.groups()[0].paths(), vec![a, b]);
    assert_eq!(summary.errors.len(), 1);
    match &summary.errors[0] {
        ScanError::Hash(HashError::Io { path, .. }) => assert_eq!(*path, sub),
        other => panic!("Expected Io HashError, got: {:?}", other),
    }
}
