//! Tests for the session read loop.

use fsevent_client::events::EventFlag;
use fsevent_client::process::{SpawnError, WatchOptions};
use fsevent_client::session::{
    SessionConfig, SessionDiagnostic, SessionError, SessionState, WatcherSession,
};
use fsevent_client::stream::{LineError, NumberParsing};
use tokio::sync::mpsc;

use super::{collector, fake_watcher, paths};

#[tokio::test]
async fn run_delivers_terminated_batches_in_order() {
    let (batches, handler) = collector();
    let config = fake_watcher(
        r"printf '100:1:/a\n200:2:/b\n\n\n300:3:/c\n\n'",
        WatchOptions::new(),
    );
    let mut session = WatcherSession::new(config, handler).unwrap();

    session.run().await.unwrap();

    let batches = batches.lock().unwrap();
    assert_eq!(batches.len(), 3);
    assert_eq!(paths(&batches[0]), vec!["/a", "/b"]);
    assert!(batches[1].is_empty());
    assert_eq!(paths(&batches[2]), vec!["/c"]);
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(session.stats().batches, 3);
    assert_eq!(session.stats().changes, 3);
}

#[tokio::test]
async fn run_decodes_flags_and_ids_when_requested() {
    let (batches, handler) = collector();
    let config = fake_watcher(
        r"printf '256:42:/tmp/x\n0:1:/foo:bar\n\n'",
        WatchOptions::new().use_flags_and_id(true),
    );
    let mut session = WatcherSession::new(config, handler).unwrap();

    session.run().await.unwrap();

    let batches = batches.lock().unwrap();
    let first = batches[0][0].record().unwrap();
    assert!(first.flags.is_set(EventFlag::ItemCreated));
    assert_eq!(first.id, 42);
    assert_eq!(first.path, "/tmp/x");

    let second = batches[0][1].record().unwrap();
    assert_eq!(second.id, 1);
    assert_eq!(second.path, "/foo:bar");
}

#[tokio::test]
async fn watch_paths_are_passed_last() {
    let (batches, handler) = collector();
    let config = fake_watcher(r#"printf '0:1:%s\n\n' "$1""#, WatchOptions::new());
    let mut session = WatcherSession::new(config, handler).unwrap();

    session.run().await.unwrap();

    assert_eq!(paths(&batches.lock().unwrap()[0]), vec!["/watched"]);
}

#[tokio::test]
async fn unterminated_tail_is_never_delivered() {
    let (batches, handler) = collector();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let config = fake_watcher(r"printf '1:1:/a\n\n2:2:/b\n3:3:/c'", WatchOptions::new());
    let mut session = WatcherSession::new(config, handler)
        .unwrap()
        .with_diagnostics(tx);

    session.run().await.unwrap();

    let batches = batches.lock().unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(paths(&batches[0]), vec!["/a"]);
    assert_eq!(rx.try_recv(), Ok(SessionDiagnostic::DroppedTail(2)));
}

#[tokio::test]
async fn malformed_lines_are_reported_and_skipped() {
    let (batches, handler) = collector();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let config = fake_watcher(
        r"printf 'bogus\nx:1:/bad\n1:1:/a\n\n'",
        WatchOptions::new().use_flags_and_id(true),
    )
    .numbers(NumberParsing::Strict);
    let mut session = WatcherSession::new(config, handler)
        .unwrap()
        .with_diagnostics(tx);

    session.run().await.unwrap();

    assert_eq!(paths(&batches.lock().unwrap()[0]), vec!["/a"]);
    assert_eq!(session.stats().skipped_lines, 2);
    assert_eq!(
        rx.try_recv(),
        Ok(SessionDiagnostic::MalformedLine {
            line: "bogus".to_string(),
            error: LineError::MissingFields(1),
        })
    );
    assert_eq!(
        rx.try_recv(),
        Ok(SessionDiagnostic::MalformedLine {
            line: "x:1:/bad".to_string(),
            error: LineError::InvalidFlags("x".to_string()),
        })
    );
}

#[tokio::test]
async fn silent_watcher_exit_delivers_nothing() {
    let (batches, handler) = collector();
    let mut session =
        WatcherSession::new(fake_watcher("exit 0", WatchOptions::new()), handler).unwrap();

    session.run().await.unwrap();

    assert!(batches.lock().unwrap().is_empty());
    assert_eq!(session.state(), SessionState::Stopped);
}

#[tokio::test]
async fn run_twice_is_rejected() {
    let (_batches, handler) = collector();
    let mut session =
        WatcherSession::new(fake_watcher("exit 0", WatchOptions::new()), handler).unwrap();

    session.run().await.unwrap();
    let second = session.run().await;

    assert!(matches!(
        second,
        Err(SessionError::NotIdle(SessionState::Stopped))
    ));
}

#[tokio::test]
async fn missing_executable_fails_before_reading() {
    let (batches, handler) = collector();
    let config = SessionConfig::new("/nonexistent/bin/fsevent_watch", ["/tmp"]);
    let mut session = WatcherSession::new(config, handler).unwrap();

    let result = session.run().await;

    assert!(matches!(
        result,
        Err(SessionError::Spawn(SpawnError::NotFound(_)))
    ));
    assert_eq!(session.state(), SessionState::Stopped);
    assert!(batches.lock().unwrap().is_empty());
}
