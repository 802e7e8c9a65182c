//! Watcher executable location.

use std::path::{Path, PathBuf};

/// File name of the native watcher.
pub const WATCHER_BINARY: &str = "fsevent_watch";

/// Path of the watcher below an install root: `<root>/bin/fsevent_watch`.
#[must_use]
pub fn watcher_path(install_root: &Path) -> PathBuf {
    install_root.join("bin").join(WATCHER_BINARY)
}

/// Install root of the running program: two levels above its executable.
///
/// Returns `None` if the current executable cannot be determined.
#[must_use]
pub fn default_install_root() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    exe.parent()?.parent().map(Path::to_path_buf)
}
