//! Session lifecycle tests.
//!
//! These drive a real child process: `sh -c <script>` stands in for the
//! native watcher and prints protocol lines with `printf`.

mod run_test;
mod stop_test;

use std::sync::{Arc, Mutex};

use fsevent_client::events::Change;
use fsevent_client::process::WatchOptions;
use fsevent_client::session::SessionConfig;

pub type Batches = Arc<Mutex<Vec<Vec<Change>>>>;

/// A session config whose "watcher" runs `script` with `/watched` as `$1`.
pub fn fake_watcher(script: &str, options: WatchOptions) -> SessionConfig {
    SessionConfig::new("sh", ["/watched"])
        .options(options.extra_args(["-c", script, "fake_watch"]))
}

/// A handler that records every batch it receives.
pub fn collector() -> (Batches, impl FnMut(&[Change]) + Send + 'static) {
    let batches: Batches = Arc::default();
    let sink = Arc::clone(&batches);
    let handler = move |batch: &[Change]| sink.lock().unwrap().push(batch.to_vec());
    (batches, handler)
}

pub fn paths(batch: &[Change]) -> Vec<&str> {
    batch.iter().map(Change::path).collect()
}
