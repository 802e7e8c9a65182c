//! fsevent-client - batching client for the `fsevent_watch` process.

pub mod config;
pub mod display;
pub mod events;
pub mod process;
pub mod session;
pub mod stream;
