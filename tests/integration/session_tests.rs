use dupefind::scanner::FilterConfig;
use dupefind::session::{ScanEvent, ScanSession, ScanState, SessionConfig, SessionError};
use dupefind::signal::CancelToken;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

fn populate(dir: &Path, count: usize) {
    let sub = dir.join("nested");
    fs::create_dir_all(&sub).unwrap();
    for i in 0..count {
        let target = if i % 2 == 0 { dir } else { sub.as_path() };
        fs::write(target.join(format!("file{i:05}.txt")), format!("{}", i % 7)).unwrap();
    }
}

fn large_tree() -> TempDir {
    let dir = tempdir().unwrap();
    populate(dir.path(), 2000);
    dir
}

fn recursive() -> FilterConfig {
    FilterConfig::default().with_include_subfolders(true)
}

fn unthrottled() -> SessionConfig {
    SessionConfig::default().with_progress_interval(Duration::ZERO)
}

#[test]
fn test_cancel_stops_results_immediately() {
    let dir = large_tree();
    let session = ScanSession::new(unthrottled());
    let token = session.cancel_token();
    let mut seen = 0;

    let summary = session
        .search(
            [dir.path()],
            &recursive(),
            |_| {
                seen += 1;
                if seen == 10 {
                    token.cancel();
                }
            },
            |_| {},
        )
        .unwrap();

    assert_eq!(seen, 10);
    assert_eq!(summary.reported, 10);
    assert_eq!(summary.state, ScanState::Cancelled);
    assert_eq!(session.state(), ScanState::Cancelled);
}

#[test]
fn test_cancel_right_after_background_start() {
    let dir = large_tree();
    let session = ScanSession::new(SessionConfig::default());
    let handle = session.spawn_search(vec![dir.path().to_path_buf()], recursive()).unwrap();
    handle.cancel();

    let mut files = 0;
    let mut finished = None;
    for event in handle.events() {
        match event {
            ScanEvent::File(_) => files += 1,
            ScanEvent::Finished(summary) => finished = Some(summary),
            ScanEvent::Progress(_) | ScanEvent::Duplicate { .. } => {}
        }
    }

    let summary = finished.unwrap();
    assert_eq!(summary.state, ScanState::Cancelled);
    assert!(files < 2000);
    assert_eq!(handle.join().unwrap(), summary);
}

#[test]
fn test_cancel_duplicate_search_from_callback() {
    let dir = large_tree();
    let session = ScanSession::new(unthrottled());
    let token = session.cancel_token();
    let mut seen = 0;

    let summary = session
        .search_duplicates(
            [dir.path()],
            &recursive(),
            |_, _| {
                seen += 1;
                token.cancel();
            },
            |_| {},
        )
        .unwrap();

    assert_eq!(seen, 1);
    assert!(summary.is_cancelled());
}

#[test]
fn test_progress_is_monotonic_and_bounded() {
    let dir = large_tree();
    for duplicates in [false, true] {
        let session = ScanSession::new(unthrottled());
        let mut progress = Vec::new();

        if duplicates {
            session
                .search_duplicates([dir.path()], &recursive(), |_, _| {}, |p| progress.push(p))
                .unwrap();
        } else {
            session
                .search([dir.path()], &recursive(), |_| {}, |p| progress.push(p))
                .unwrap();
        }

        assert_eq!(progress.first(), Some(&0));
        assert_eq!(progress.last(), Some(&100));
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        assert!(progress.iter().all(|&p| p <= 100));
    }
}

#[test]
fn test_progress_is_throttled() {
    let dir = large_tree();
    let session = ScanSession::new(SessionConfig::default().with_progress_interval(Duration::from_secs(3600)));
    let mut progress = Vec::new();

    session
        .search([dir.path()], &recursive(), |_| {}, |p| progress.push(p))
        .unwrap();

    assert_eq!(progress, vec![0, 100]);
}

#[test]
fn test_background_duplicates_stream_groups() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "hello").unwrap();
    fs::write(dir.path().join("b.txt"), "hello").unwrap();
    fs::write(dir.path().join("c.txt"), "world").unwrap();

    let session = ScanSession::new(SessionConfig::default());
    let handle = session
        .spawn_duplicates(vec![dir.path().to_path_buf()], FilterConfig::default())
        .unwrap();

    let mut members = Vec::new();
    let mut last = None;
    for event in handle.events() {
        if let ScanEvent::Duplicate { record, group_id } = &event {
            members.push((record.name().to_string(), *group_id));
        }
        last = Some(event);
    }
    members.sort();

    assert_eq!(members, vec![("a.txt".to_string(), 1), ("b.txt".to_string(), 1)]);
    assert!(matches!(last, Some(ScanEvent::Finished(ref s)) if s.duplicate_groups == 1));
    let summary = handle.join().unwrap();
    assert_eq!(summary.state, ScanState::Completed);
    assert_eq!(session.state(), ScanState::Completed);
}

#[test]
fn test_dropped_handle_cancels_scan() {
    let dir = large_tree();
    let session = ScanSession::new(unthrottled().with_channel_capacity(1));
    let handle = session.spawn_search(vec![dir.path().to_path_buf()], recursive()).unwrap();
    let token = session.cancel_token();
    drop(handle);

    // The worker is detached; wait for it to notice
    for _ in 0..500 {
        if session.state().is_finished() {
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(session.state(), ScanState::Cancelled);
    assert!(token.is_cancelled());
}

#[test]
fn test_second_scan_rejected_while_running() {
    let dir = large_tree();
    let session = ScanSession::new(unthrottled().with_channel_capacity(1));
    let handle = session.spawn_search(vec![dir.path().to_path_buf()], recursive()).unwrap();

    let err = session
        .search([dir.path()], &recursive(), |_| {}, |_| {})
        .unwrap_err();
    assert!(matches!(err, SessionError::AlreadyRunning));

    handle.cancel();
    handle.join().unwrap();
    assert!(session
        .search([dir.path()], &recursive(), |_| {}, |_| {})
        .is_ok());
}

#[test]
fn test_shared_token_cancels_session() {
    let dir = large_tree();
    let token = CancelToken::new();
    let session = ScanSession::with_cancel_token(unthrottled(), token.clone());
    let mut seen = 0;

    let summary = session
        .search(
            [dir.path()],
            &recursive(),
            |_| {
                seen += 1;
                token.cancel();
            },
            |_| {},
        )
        .unwrap();

    assert_eq!(seen, 1);
    assert!(summary.is_cancelled());
    assert!(session.cancel_token().same_as(&token));
}
