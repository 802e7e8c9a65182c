//! Watcher session lifecycle.

#[allow(clippy::module_inception)]
mod session;
mod state;

pub use session::*;
pub use state::*;
