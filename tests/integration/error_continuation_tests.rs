use dupefind::duplicates::{DuplicateGrouper, GrouperConfig, UnreadablePolicy};
use dupefind::scanner::{ContentHash, FileRecord, FilterConfig, HashError, Hasher, ERROR_HASH};
use dupefind::session::{ScanSession, ScanState, SessionConfig};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn missing(name: &str, size: u64) -> FileRecord {
    FileRecord::from_parts(PathBuf::from(format!("/nonexistent/dupefind/{name}")), size, None, None)
}

#[test]
fn test_unreadable_file_does_not_pair_with_readable_one() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ok.txt");
    fs::write(&path, "hello").unwrap();
    let readable = FileRecord::from_path(&path).unwrap();

    let mut grouper = DuplicateGrouper::new(GrouperConfig::default());
    let (groups, stats) = grouper.find_groups(vec![readable, missing("gone.txt", 5)]);

    assert!(groups.is_empty());
    assert_eq!(stats.hashed_files, 2);
    assert_eq!(stats.hash_failures, 1);
}

#[test]
fn test_two_unreadable_files_group_together_by_default() {
    let mut grouper = DuplicateGrouper::new(GrouperConfig::default());
    let (groups, stats) = grouper.find_groups(vec![missing("x", 100), missing("y", 100)]);

    assert_eq!(groups.len(), 1);
    assert!(groups[0].is_unreadable());
    assert_eq!(groups[0].hash, ContentHash::Error);
    assert_eq!(groups[0].hash.as_str(), ERROR_HASH);
    assert_eq!(stats.hash_failures, 2);
    assert_eq!(stats.excluded_unreadable, 0);
}

#[test]
fn test_exclude_policy_drops_unreadable_files() {
    let config = GrouperConfig::default().with_unreadable(UnreadablePolicy::Exclude);
    let mut grouper = DuplicateGrouper::new(config);
    let (groups, stats) = grouper.find_groups(vec![missing("x", 100), missing("y", 100)]);

    assert!(groups.is_empty());
    assert_eq!(stats.hash_failures, 2);
    assert_eq!(stats.excluded_unreadable, 2);
    assert_eq!(grouper.next_id(), 1);
}

#[test]
fn test_unreadable_files_are_hashed_once() {
    let record = missing("once", 3);
    let hasher = Hasher::new();

    assert!(record.cached_hash().is_none());
    assert!(record.content_hash(&hasher).is_error());
    assert_eq!(record.cached_hash(), Some(&ContentHash::Error));
}

#[test]
fn test_try_hash_reports_not_found() {
    let err = Hasher::new()
        .try_hash(std::path::Path::new("/nonexistent/dupefind/file"))
        .unwrap_err();
    assert!(matches!(err, HashError::NotFound(_)));
}

#[test]
fn test_missing_roots_do_not_abort_scan() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "same").unwrap();
    fs::write(dir.path().join("b.txt"), "same").unwrap();

    let session = ScanSession::new(SessionConfig::default());
    let mut found = 0;
    let summary = session
        .search_duplicates(
            [PathBuf::from("/nonexistent/dupefind/root"), dir.path().to_path_buf()],
            &FilterConfig::default(),
            |_, _| found += 1,
            |_| {},
        )
        .unwrap();

    assert_eq!(found, 2);
    assert_eq!(summary.duplicate_groups, 1);
    assert_eq!(summary.hash_failures, 0);
}

#[test]
fn test_directory_removed_mid_scan_is_counted() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "a").unwrap();
    fs::write(dir.path().join("b.txt"), "b").unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("c.txt"), "c").unwrap();

    let session = ScanSession::new(SessionConfig::default());
    let filter = FilterConfig::default().with_include_subfolders(true);
    let mut names = Vec::new();
    let summary = session
        .search(
            [dir.path()],
            &filter,
            |record| {
                // Top-level files come first, so sub/ is still unlisted
                if sub.exists() {
                    fs::remove_dir_all(&sub).unwrap();
                }
                names.push(record.name().to_string());
            },
            |_| {},
        )
        .unwrap();

    names.sort();
    assert_eq!(names, vec!["a.txt", "b.txt"]);
    assert_eq!(summary.unreadable_dirs, 1);
    assert_eq!(summary.matched, 2);
    assert_eq!(summary.state, ScanState::Completed);
    assert_eq!(session.state(), ScanState::Completed);
}

#[cfg(unix)]
#[test]
fn test_file_removed_before_hashing_is_counted() {
    let dir = tempdir().unwrap();
    let keep = dir.path().join("keep.bin");
    let vanish = dir.path().join("vanish.bin");
    fs::write(&keep, "12345").unwrap();
    fs::write(&vanish, "67890").unwrap();

    let records = vec![
        FileRecord::from_path(&keep).unwrap(),
        FileRecord::from_path(&vanish).unwrap(),
    ];
    fs::remove_file(&vanish).unwrap();

    let mut grouper = DuplicateGrouper::new(GrouperConfig::default());
    let (groups, stats) = grouper.find_groups(records);

    assert!(groups.is_empty());
    assert_eq!(stats.hash_failures, 1);
}
