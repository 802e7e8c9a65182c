//! Watcher invocation options.

use serde::{Deserialize, Serialize};

/// Options passed through to the watcher process.
///
/// Unknown keys in a config file are ignored so newer option tables still
/// load.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchOptions {
    /// Resume cursor handed to `--since-when`.
    pub since_when: Option<String>,
    /// Coalescing delay in seconds.
    pub latency: Option<f64>,
    /// Deliver the first event without waiting for the latency window.
    pub no_defer: bool,
    /// Also report moves of the watched roots.
    pub watch_root: bool,
    /// Report individual files, not only directories.
    pub file: bool,
    /// Deliver flags and ids alongside each path.
    pub use_flags_and_id: bool,
    /// Raw arguments appended after the named options.
    pub extra_args: Vec<String>,
}

impl WatchOptions {
    /// Create options with every toggle off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from the given event id or cursor.
    #[must_use]
    pub fn since_when(mut self, token: impl Into<String>) -> Self {
        self.since_when = Some(token.into());
        self
    }

    /// Set the coalescing latency in seconds.
    #[must_use]
    pub fn latency(mut self, seconds: f64) -> Self {
        self.latency = Some(seconds);
        self
    }

    /// Enable `--no-defer`.
    #[must_use]
    pub fn no_defer(mut self, enabled: bool) -> Self {
        self.no_defer = enabled;
        self
    }

    /// Enable `--watch-root`.
    #[must_use]
    pub fn watch_root(mut self, enabled: bool) -> Self {
        self.watch_root = enabled;
        self
    }

    /// Enable `--file`.
    #[must_use]
    pub fn file(mut self, enabled: bool) -> Self {
        self.file = enabled;
        self
    }

    /// Deliver decoded flags and ids instead of bare paths.
    #[must_use]
    pub fn use_flags_and_id(mut self, enabled: bool) -> Self {
        self.use_flags_and_id = enabled;
        self
    }

    /// Append raw arguments, passed verbatim before the paths.
    #[must_use]
    pub fn extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Build the option part of the argument vector.
    #[must_use]
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(token) = &self.since_when {
            args.push("--since-when".to_string());
            args.push(token.clone());
        }

        if let Some(latency) = self.latency {
            args.push("--latency".to_string());
            args.push(latency.to_string());
        }

        if self.no_defer {
            args.push("--no-defer".to_string());
        }

        if self.watch_root {
            args.push("--watch-root".to_string());
        }

        if self.file {
            args.push("--file".to_string());
        }

        args.extend(self.extra_args.iter().cloned());
        args
    }
}
