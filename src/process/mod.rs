//! Watcher process location, spawning and control.

mod locate;
mod options;
#[allow(clippy::module_inception)]
mod process;

pub use locate::*;
pub use options::*;
pub use process::*;
