//! Event types decoded from the watcher's output stream.

mod flags;
mod record;

pub use flags::*;
pub use record::*;
