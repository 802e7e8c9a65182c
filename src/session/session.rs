//! Watcher session: one subprocess, one read loop, one teardown.
//!
//! A [`WatcherSession`] spawns the watcher on [`WatcherSession::run`], feeds
//! every output line through a [`BatchParser`] and calls the handler inline
//! for each completed batch. A slow handler therefore throttles the read loop,
//! and the OS pipe pushes back on the watcher.
//!
//! Every exit path (end of stream, stop request, interrupt, read error) ends
//! in [`WatcherSession::stop`], which kills the process before dropping the
//! stream and is a no-op once the session is `Stopped`.

use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::events::{Change, OutputMode};
use crate::process::{SpawnError, WatchOptions, WatcherProcess, WatcherProcessBuilder};
use crate::stream::{BatchParser, LineError, NumberParsing};

use super::{SessionState, SessionStateMachine, SessionStats};

/// Error type for session operations.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    /// No paths were configured.
    #[error("At least one path must be watched")]
    NoPaths,
    /// `run` was called on a session that already ran or was stopped.
    #[error("Session is not idle (state: {0:?})")]
    NotIdle(SessionState),
    /// The watcher process could not be started.
    #[error("Failed to spawn watcher: {0}")]
    Spawn(#[from] SpawnError),
    /// The watcher's stdout was not captured.
    #[error("Watcher stdout not available")]
    NoStdout,
}

/// Recoverable conditions observed by a running session.
///
/// None of these are returned from `run`; they are only visible through an
/// optional diagnostics channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionDiagnostic {
    /// A line could not be decoded and was skipped.
    MalformedLine { line: String, error: LineError },
    /// Reading the watcher's output failed; the session stopped.
    StreamError(String),
    /// An interrupt signal stopped the session.
    Interrupted,
    /// Changes after the last terminator were discarded at end of stream.
    DroppedTail(usize),
}

/// Everything needed to start a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    executable: PathBuf,
    paths: Vec<String>,
    options: WatchOptions,
    numbers: NumberParsing,
    stop_on_interrupt: bool,
}

impl SessionConfig {
    /// Watch `paths` with the watcher at `executable`.
    #[must_use]
    pub fn new<I, S>(executable: impl Into<PathBuf>, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            executable: executable.into(),
            paths: paths.into_iter().map(Into::into).collect(),
            options: WatchOptions::default(),
            numbers: NumberParsing::default(),
            stop_on_interrupt: false,
        }
    }

    /// Set the watcher options.
    #[must_use]
    pub fn options(mut self, options: WatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Set how numeric fields are decoded.
    #[must_use]
    pub fn numbers(mut self, numbers: NumberParsing) -> Self {
        self.numbers = numbers;
        self
    }

    /// Stop the session when the process receives Ctrl-C.
    #[must_use]
    pub fn stop_on_interrupt(mut self, enabled: bool) -> Self {
        self.stop_on_interrupt = enabled;
        self
    }

    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    #[must_use]
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    #[must_use]
    pub fn watch_options(&self) -> &WatchOptions {
        &self.options
    }

    /// Output shape selected by `use_flags_and_id`.
    #[must_use]
    pub fn output_mode(&self) -> OutputMode {
        OutputMode::from_flags_and_id(self.options.use_flags_and_id)
    }

    fn process_builder(&self) -> WatcherProcessBuilder {
        WatcherProcessBuilder::new(&self.executable)
            .options(self.options.clone())
            .paths(self.paths.iter().cloned())
    }
}

/// Requests a stop from outside the read loop.
///
/// Cloneable and idempotent. The running session notices the request and
/// performs the single teardown itself.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    token: CancellationToken,
}

impl StopHandle {
    /// Create a handle to attach with [`WatcherSession::with_stop_handle`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the session to stop.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Returns true once a stop has been requested.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.token.is_cancelled()
    }
}

type BatchHandler = Box<dyn FnMut(&[Change]) + Send>;

/// The watcher's stdout, buffered for line reads.
type OutputStream = Box<dyn AsyncBufRead + Send + Unpin>;

/// A watcher subprocess and the read loop over its output.
pub struct WatcherSession {
    config: SessionConfig,
    handler: BatchHandler,
    state: SessionStateMachine,
    process: Option<WatcherProcess>,
    stream: Option<OutputStream>,
    cancel: CancellationToken,
    diagnostics: Option<UnboundedSender<SessionDiagnostic>>,
}

impl WatcherSession {
    /// Configure a session. No process is started until [`Self::run`].
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoPaths` if the config has no paths.
    pub fn new<F>(config: SessionConfig, handler: F) -> Result<Self, SessionError>
    where
        F: FnMut(&[Change]) + Send + 'static,
    {
        if config.paths.is_empty() {
            return Err(SessionError::NoPaths);
        }

        Ok(Self {
            config,
            handler: Box::new(handler),
            state: SessionStateMachine::new(),
            process: None,
            stream: None,
            cancel: CancellationToken::new(),
            diagnostics: None,
        })
    }

    /// Send recoverable conditions to `tx` instead of only logging them.
    #[must_use]
    pub fn with_diagnostics(mut self, tx: UnboundedSender<SessionDiagnostic>) -> Self {
        self.diagnostics = Some(tx);
        self
    }

    /// Use `handle` as this session's stop handle.
    ///
    /// Lets a handler built before the session stop it.
    #[must_use]
    pub fn with_stop_handle(mut self, handle: StopHandle) -> Self {
        self.cancel = handle.token;
        self
    }

    /// A handle that stops this session from another task.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            token: self.cancel.clone(),
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.state()
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.state.stats()
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Pid of the watcher while it is running.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().and_then(WatcherProcess::id)
    }

    /// Spawn the watcher and deliver batches until the stream ends or a stop
    /// is requested.
    ///
    /// Stream errors and interrupts end the run normally. The session is
    /// always `Stopped` when this returns.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotIdle` if the session already ran, and
    /// `SessionError::Spawn` if the watcher cannot be started.
    pub async fn run(&mut self) -> Result<(), SessionError> {
        if self.state.state() != SessionState::Idle {
            return Err(SessionError::NotIdle(self.state.state()));
        }

        if self.cancel.is_cancelled() {
            tracing::debug!("Stop requested before run, not spawning");
            self.stop().await;
            return Ok(());
        }

        let mut process = match WatcherProcess::spawn(&self.config.process_builder()) {
            Ok(process) => process,
            Err(e) => {
                self.stop().await;
                return Err(e.into());
            }
        };

        let stdout = process.take_stdout();
        self.process = Some(process);
        let Some(stdout) = stdout else {
            self.stop().await;
            return Err(SessionError::NoStdout);
        };
        self.drive(Box::new(BufReader::new(stdout))).await;
        Ok(())
    }

    /// Read `stream` until it ends, fails or a stop is requested, then stop.
    async fn drive(&mut self, stream: OutputStream) {
        self.stream = Some(stream);
        self.state.transition(SessionState::Running);

        let mut parser = BatchParser::new(self.config.output_mode(), self.config.numbers);
        self.read_loop(&mut parser).await;

        let dropped = parser.finish();
        if dropped > 0 {
            tracing::debug!(dropped, "Discarding unterminated batch");
            report(
                self.diagnostics.as_ref(),
                SessionDiagnostic::DroppedTail(dropped),
            );
        }

        self.stop().await;
    }

    async fn read_loop(&mut self, parser: &mut BatchParser) {
        let Some(stream) = self.stream.as_mut() else {
            return;
        };

        let interrupt = interrupt_signal(self.config.stop_on_interrupt);
        tokio::pin!(interrupt);

        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = tokio::select! {
                biased;

                () = self.cancel.cancelled() => {
                    tracing::debug!("Stop requested");
                    break;
                }
                () = &mut interrupt => {
                    tracing::info!("Interrupted, stopping watcher");
                    report(self.diagnostics.as_ref(), SessionDiagnostic::Interrupted);
                    break;
                }
                read = stream.read_until(b'\n', &mut buf) => read,
            };

            match read {
                Ok(0) => {
                    tracing::debug!("Watcher stream ended");
                    break;
                }
                Ok(_) => {
                    let text = String::from_utf8_lossy(&buf);
                    let line = text.strip_suffix('\n').unwrap_or(&text);
                    match parser.push_line(line) {
                        Ok(Some(batch)) => {
                            self.state.record_batch(batch.len());
                            tracing::trace!(changes = batch.len(), "Delivering batch");
                            (self.handler)(batch.as_slice());
                        }
                        Ok(None) => {}
                        Err(error) => {
                            tracing::warn!(line = %line, error = %error, "Skipping malformed line");
                            self.state.record_skipped_line();
                            report(
                                self.diagnostics.as_ref(),
                                SessionDiagnostic::MalformedLine {
                                    line: line.to_string(),
                                    error,
                                },
                            );
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Watcher stream read failed, stopping");
                    report(
                        self.diagnostics.as_ref(),
                        SessionDiagnostic::StreamError(e.to_string()),
                    );
                    break;
                }
            }
        }
    }

    /// Kill the watcher, close its stream and move to `Stopped`.
    ///
    /// Safe to call any number of times; only the first call does anything.
    /// Teardown errors are logged and otherwise ignored.
    pub async fn stop(&mut self) {
        if self.state.is_stopped() {
            return;
        }

        self.cancel.cancel();

        // Kill before closing the stream so the watcher never sees a broken pipe.
        if let Some(mut process) = self.process.take() {
            if let Err(e) = process.kill().await {
                tracing::debug!(error = %e, "Ignoring watcher teardown error");
            }
        }
        self.stream = None;

        self.state.transition(SessionState::Stopped);
    }
}

fn report(tx: Option<&UnboundedSender<SessionDiagnostic>>, diagnostic: SessionDiagnostic) {
    if let Some(tx) = tx {
        let _ = tx.send(diagnostic);
    }
}

/// Resolves on Ctrl-C when enabled, never otherwise.
async fn interrupt_signal(enabled: bool) {
    if enabled {
        match tokio::signal::ctrl_c().await {
            Ok(()) => return,
            Err(e) => tracing::warn!(error = %e, "Cannot listen for interrupts"),
        }
    }
    std::future::pending::<()>().await;
}
