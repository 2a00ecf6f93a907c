use chrono::{Local, NaiveDate, TimeZone};
use dupefind::duplicates::{DuplicateGrouper, GrouperConfig};
use dupefind::scanner::{DateFilter, DateOperator, FileRecord, FilterConfig, Walker};
use dupefind::session::{ScanSession, ScanState, SessionConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::tempdir;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn hello_world_root() -> tempfile::TempDir {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", "hello");
    write(dir.path(), "b.txt", "hello");
    write(dir.path(), "c.txt", "world");
    dir
}

fn duplicates(root: &Path, filter: &FilterConfig) -> (Vec<(String, usize)>, dupefind::session::ScanSummary) {
    let session = ScanSession::new(SessionConfig::default());
    let mut found = Vec::new();
    let summary = session
        .search_duplicates(
            [root],
            filter,
            |record, id| found.push((record.name().to_string(), id)),
            |_| {},
        )
        .unwrap();
    (found, summary)
}

fn search_names(root: &Path, filter: &FilterConfig) -> Vec<String> {
    let session = ScanSession::new(SessionConfig::default());
    let mut names = Vec::new();
    session
        .search([root], filter, |record| names.push(record.name().to_string()), |_| {})
        .unwrap();
    names.sort();
    names
}

#[test]
fn test_identical_files_form_one_group() {
    let dir = hello_world_root();
    let (mut found, summary) = duplicates(dir.path(), &FilterConfig::default());
    found.sort();

    assert_eq!(
        found,
        vec![("a.txt".to_string(), 1), ("b.txt".to_string(), 1)]
    );
    assert_eq!(summary.state, ScanState::Completed);
    assert_eq!(summary.duplicate_groups, 1);
    assert_eq!(summary.duplicate_files, 1);
    assert_eq!(summary.reclaimable_bytes, 5);
    assert_eq!(summary.candidates, 3);
}

#[test]
fn test_min_size_filters_before_grouping() {
    let dir = hello_world_root();
    let filter = FilterConfig::default().with_min_size(1.0);
    let (found, summary) = duplicates(dir.path(), &filter);

    assert!(found.is_empty());
    assert_eq!(summary.matched, 0);
    assert_eq!(summary.duplicate_groups, 0);
    assert!(!summary.has_results());
}

#[test]
fn test_extension_filter_is_case_insensitive() {
    let dir = tempdir().unwrap();
    write(dir.path(), "report.PDF", "one");
    write(dir.path(), "report.txt", "two");

    let filter = FilterConfig::default().with_extensions(["pdf"]);
    assert_eq!(search_names(dir.path(), &filter), vec!["report.PDF"]);
}

#[test]
fn test_creation_date_operators() {
    let created = Local.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let record = FileRecord::from_parts(
        PathBuf::from("/data/new-year.txt"),
        10,
        Some(SystemTime::from(created)),
        None,
    );
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let on_or_after = FilterConfig::default().with_created(DateFilter::new(DateOperator::AfterOrEqual, date));
    assert!(on_or_after.matches(&record));

    let strictly_after = FilterConfig::default().with_created(DateFilter::new(DateOperator::After, date));
    assert!(!strictly_after.matches(&record));
}

#[test]
fn test_modification_date_filter_on_disk() {
    let dir = tempdir().unwrap();
    let old = write(dir.path(), "old.txt", "old");
    write(dir.path(), "new.txt", "new");

    let past = Local.with_ymd_and_hms(2020, 6, 15, 12, 0, 0).unwrap();
    filetime::set_file_mtime(&old, filetime::FileTime::from_system_time(SystemTime::from(past))).unwrap();

    let cutoff = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
    let before = FilterConfig::default().with_modified(DateFilter::new(DateOperator::Before, cutoff));
    assert_eq!(search_names(dir.path(), &before), vec!["old.txt"]);

    let after: FilterConfig = FilterConfig::default().with_modified(">=2021-01-01".parse().unwrap());
    assert_eq!(search_names(dir.path(), &after), vec!["new.txt"]);
}

#[test]
fn test_name_filter() {
    let dir = tempdir().unwrap();
    write(dir.path(), "Holiday-Beach.jpg", "x");
    write(dir.path(), "work.jpg", "y");

    let filter = FilterConfig::default().with_name_contains("beach");
    assert_eq!(search_names(dir.path(), &filter), vec!["Holiday-Beach.jpg"]);
}

#[test]
fn test_nested_duplicates_need_recursion() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("subdir");
    fs::create_dir(&sub).unwrap();
    write(dir.path(), "a.txt", "dup");
    write(&sub, "b.txt", "dup");

    let (found, _) = duplicates(dir.path(), &FilterConfig::default());
    assert!(found.is_empty());

    let (found, summary) = duplicates(dir.path(), &FilterConfig::default().with_include_subfolders(true));
    assert_eq!(found.len(), 2);
    assert_eq!(summary.duplicate_groups, 1);
}

#[test]
fn test_multiple_roots_are_scanned_in_order() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    write(first.path(), "one.txt", "same");
    write(second.path(), "two.txt", "same");

    let session = ScanSession::new(SessionConfig::default());
    let mut names = Vec::new();
    let summary = session
        .search_duplicates(
            [first.path(), second.path()],
            &FilterConfig::default(),
            |record, _| names.push(record.name().to_string()),
            |_| {},
        )
        .unwrap();

    assert_eq!(names, vec!["one.txt", "two.txt"]);
    assert_eq!(summary.duplicate_groups, 1);
}

#[test]
fn test_group_ids_increase_across_buckets() {
    let dir = tempdir().unwrap();
    for (name, content) in [
        ("1a.txt", "group1"),
        ("1b.txt", "group1"),
        ("1c.txt", "group1"),
        ("2a.txt", "second-group"),
        ("2b.txt", "second-group"),
        ("3a.txt", "group3"),
        ("3b.txt", "group3"),
        ("unique.txt", "unique"),
    ] {
        write(dir.path(), name, content);
    }

    let (found, summary) = duplicates(dir.path(), &FilterConfig::default());
    let ids: Vec<usize> = found.iter().map(|(_, id)| *id).collect();

    assert_eq!(summary.duplicate_groups, 3);
    assert_eq!(found.len(), 7);
    assert!(ids.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(ids.first(), Some(&1));
    assert_eq!(ids.last(), Some(&3));
}

#[test]
fn test_empty_files_are_duplicates() {
    let dir = tempdir().unwrap();
    write(dir.path(), "empty1", "");
    write(dir.path(), "empty2", "");

    let (found, summary) = duplicates(dir.path(), &FilterConfig::default());
    assert_eq!(found.len(), 2);
    assert_eq!(summary.reclaimable_bytes, 0);
}

#[test]
fn test_walker_and_grouper_compose() {
    let dir = hello_world_root();
    let files: Vec<FileRecord> = Walker::new([dir.path()], false)
        .walk()
        .filter_map(|path| FileRecord::from_path(&path).ok())
        .collect();

    let mut grouper = DuplicateGrouper::new(GrouperConfig::default());
    let (groups, stats) = grouper.find_groups(files);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id, 1);
    assert_eq!(
        groups[0].hash.as_str(),
        "5d41402abc4b2a76b9719d911017c592"
    );
    assert_eq!(stats.input_files, 3);
    assert_eq!(stats.eliminated_by_size, 0);
    assert_eq!(stats.hashed_files, 3);
    assert_eq!(grouper.next_id(), 2);
}

#[test]
fn test_parallel_hashing_matches_sequential() {
    let dir = tempdir().unwrap();
    for i in 0..20 {
        write(dir.path(), &format!("copy{i:02}.dat"), "parallel content");
    }
    write(dir.path(), "other.dat", "different dat!!!");

    let session = ScanSession::new(SessionConfig::default().with_hash_threads(4));
    let mut found = Vec::new();
    let summary = session
        .search_duplicates(
            [dir.path()],
            &FilterConfig::default(),
            |record, id| found.push((record.name().to_string(), id)),
            |_| {},
        )
        .unwrap();

    assert_eq!(summary.duplicate_groups, 1);
    assert_eq!(found.len(), 20);
    assert!(found.iter().all(|(_, id)| *id == 1));
}
