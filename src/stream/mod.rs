//! Decoding of the watcher's line-oriented output stream.

mod parser;

pub use parser::*;
