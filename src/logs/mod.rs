// src/logs/mod.rs

//! Job output capture and live tailing.
//!
//! - [`buffer`] holds the bounded per-job ring of timestamped lines.
//! - [`store`] keys the current buffer of every catalog job.
//! - [`stream`] turns a buffer into a push stream of `log` events that ends
//!   with one `complete` event when the job finishes.

pub mod buffer;
pub mod store;
pub mod stream;

pub use buffer::{DEFAULT_LOG_CAPACITY, LogBuffer, LogEntry};
pub use store::LogStore;
pub use stream::{DEFAULT_POLL_INTERVAL, LiveLogStreamer, LogEvent};
