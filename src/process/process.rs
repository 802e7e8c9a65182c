//! Watcher process spawning and control.
//!
//! The watcher is always started from an argument vector, never through a
//! shell. Its stdout is piped back for the line protocol; stdin is closed
//! and stderr is inherited so diagnostics from the native tool stay visible.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, ChildStdout, Command};

use super::WatchOptions;

/// Error type for process spawning operations.
#[derive(thiserror::Error, Debug)]
pub enum SpawnError {
    /// The watcher executable was not found.
    #[error("Watcher executable not found: {0}")]
    NotFound(PathBuf),
    /// Permission denied when spawning.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpawnError {
    /// Create a `SpawnError` from an I/O error, classifying common cases.
    fn from_io(err: std::io::Error, executable: &Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(executable.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => {
                Self::PermissionDenied(executable.to_path_buf())
            }
            _ => Self::Io(err),
        }
    }
}

/// Builder for a watcher invocation: executable, options and watch paths.
#[derive(Debug, Clone)]
pub struct WatcherProcessBuilder {
    executable: PathBuf,
    options: WatchOptions,
    paths: Vec<String>,
}

impl WatcherProcessBuilder {
    /// Create a builder for the given executable.
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            options: WatchOptions::default(),
            paths: Vec::new(),
        }
    }

    /// Set the options passed before the paths.
    #[must_use]
    pub fn options(mut self, options: WatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Add paths to watch.
    #[must_use]
    pub fn paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// The executable that will be spawned.
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Build the full argument vector: options first, then paths.
    #[must_use]
    pub fn build_args(&self) -> Vec<String> {
        let mut args = self.options.build_args();
        args.extend(self.paths.iter().cloned());
        args
    }
}

/// A running watcher process.
#[derive(Debug)]
pub struct WatcherProcess {
    child: Child,
}

impl WatcherProcess {
    /// Spawn the watcher described by the builder.
    ///
    /// The child is killed if this handle is dropped without an explicit
    /// [`WatcherProcess::kill`].
    ///
    /// # Errors
    ///
    /// Returns `SpawnError` if the process fails to spawn.
    pub fn spawn(builder: &WatcherProcessBuilder) -> Result<Self, SpawnError> {
        let args = builder.build_args();

        let child = Command::new(&builder.executable)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SpawnError::from_io(e, &builder.executable))?;

        tracing::info!(
            executable = %builder.executable.display(),
            pid = child.id(),
            args = ?args,
            "Spawned watcher process"
        );

        Ok(Self { child })
    }

    /// Take ownership of the stdout handle.
    ///
    /// This can only be called once; subsequent calls return `None`.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Get the process ID, if the process has not been reaped yet.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Forcefully kill the process and reap it.
    ///
    /// On Unix this sends `SIGKILL` to the pid. Once the child has been
    /// reaped its pid is forgotten, so calling this again sends nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the signal cannot be sent or the child cannot be
    /// reaped.
    pub async fn kill(&mut self) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            self.kill_unix().await
        }

        #[cfg(not(unix))]
        {
            self.child.kill().await
        }
    }

    #[cfg(unix)]
    async fn kill_unix(&mut self) -> std::io::Result<()> {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let Some(pid) = self.id() else {
            // Already reaped
            return Ok(());
        };

        let raw = i32::try_from(pid).map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "pid out of range")
        })?;

        match kill(Pid::from_raw(raw), Signal::SIGKILL) {
            // ESRCH: exited on its own but not yet reaped
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => return Err(e.into()),
        }

        tracing::debug!(pid, "Sent SIGKILL to watcher process");
        self.child.wait().await.map(|_| ())
    }
}
