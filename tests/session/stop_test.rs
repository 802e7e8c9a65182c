//! Tests for session teardown.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use fsevent_client::events::Change;
use fsevent_client::process::WatchOptions;
use fsevent_client::session::{SessionState, StopHandle, WatcherSession};

use super::{collector, fake_watcher};

/// Generous bound; the fake watchers below would otherwise sleep for 30s.
const STOP_DEADLINE: Duration = Duration::from_secs(10);

#[tokio::test]
async fn stop_handle_ends_blocked_run() {
    let (batches, handler) = collector();
    let mut session =
        WatcherSession::new(fake_watcher("exec sleep 30", WatchOptions::new()), handler).unwrap();
    let handle = session.stop_handle();

    let task = tokio::spawn(async move {
        session.run().await.unwrap();
        session
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.stop();

    let session = tokio::time::timeout(STOP_DEADLINE, task)
        .await
        .expect("run did not stop in time")
        .unwrap();

    assert_eq!(session.state(), SessionState::Stopped);
    assert!(session.pid().is_none());
    assert!(batches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn stop_from_handler_kills_watcher_and_ends_delivery() {
    let pids: Arc<Mutex<Vec<String>>> = Arc::default();
    let seen = Arc::clone(&pids);

    let handle = StopHandle::new();
    let stopper = handle.clone();

    let config = fake_watcher(
        r"printf '0:0:%s\n\n' $$; exec sleep 30",
        WatchOptions::new(),
    );
    let mut session = WatcherSession::new(config, move |batch: &[Change]| {
        seen.lock()
            .unwrap()
            .extend(batch.iter().map(|c| c.path().to_string()));
        stopper.stop();
    })
    .unwrap()
    .with_stop_handle(handle);

    tokio::time::timeout(STOP_DEADLINE, session.run())
        .await
        .expect("run did not stop in time")
        .unwrap();

    assert_eq!(session.state(), SessionState::Stopped);
    let pids = pids.lock().unwrap();
    assert_eq!(pids.len(), 1);

    let alive = std::process::Command::new("kill")
        .args(["-0", &pids[0]])
        .stderr(std::process::Stdio::null())
        .status()
        .unwrap();
    assert!(!alive.success(), "watcher {} still running", pids[0]);
}

#[tokio::test]
async fn stop_twice_is_a_no_op() {
    let (_batches, handler) = collector();
    let mut session =
        WatcherSession::new(fake_watcher("exit 0", WatchOptions::new()), handler).unwrap();

    session.run().await.unwrap();
    assert_eq!(session.state(), SessionState::Stopped);

    session.stop().await;
    session.stop().await;
    assert_eq!(session.state(), SessionState::Stopped);
    assert!(session.pid().is_none());
}
