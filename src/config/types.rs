//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::process::{default_install_root, watcher_path, WatchOptions};
use crate::session::SessionConfig;
use crate::stream::NumberParsing;

use super::ConfigError;

/// Client configuration, usually loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Explicit watcher executable. Takes precedence over `install_root`.
    pub executable: Option<PathBuf>,
    /// Install root containing `bin/fsevent_watch`.
    pub install_root: Option<PathBuf>,
    /// Options passed to the watcher.
    pub options: WatchOptions,
    /// Numeric field decoding.
    pub numbers: NumberParsing,
    /// Stop the session on Ctrl-C.
    pub stop_on_interrupt: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            executable: None,
            install_root: None,
            options: WatchOptions::default(),
            numbers: NumberParsing::Permissive,
            stop_on_interrupt: true,
        }
    }
}

impl ClientConfig {
    /// Resolve the watcher executable.
    ///
    /// Precedence: `executable`, then `install_root`, then the install root of
    /// the running program.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoExecutable` if nothing is configured and the
    /// running program's location is unknown.
    pub fn resolve_executable(&self) -> Result<PathBuf, ConfigError> {
        if let Some(executable) = &self.executable {
            return Ok(executable.clone());
        }
        let root = match &self.install_root {
            Some(root) => root.clone(),
            None => default_install_root().ok_or(ConfigError::NoExecutable)?,
        };
        Ok(watcher_path(&root))
    }

    /// Build a session config for `paths`.
    ///
    /// # Errors
    ///
    /// Returns an error if the executable cannot be resolved.
    pub fn session_config<I, S>(&self, paths: I) -> Result<SessionConfig, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(SessionConfig::new(self.resolve_executable()?, paths)
            .options(self.options.clone())
            .numbers(self.numbers)
            .stop_on_interrupt(self.stop_on_interrupt))
    }
}
