// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running catalog jobs, using
//! `tokio::process::Command`, and reporting back through the shared stores.
//!
//! - [`command`] builds the argv / `Command` for one invocation.
//! - [`progress`] parses the `[PROGRESS] n/m` output marker.
//! - [`registry`] tracks the one live process per job.
//! - [`supervisor`] owns a running process: captures output, updates
//!   progress, and finalizes the job state on every exit path.

pub mod command;
pub mod progress;
pub mod registry;
pub mod supervisor;

pub use command::{build_command, job_argv};
pub use progress::parse_progress;
pub use registry::{ProcessHandle, ProcessRegistry};
pub use supervisor::{JobOutcome, MAX_LINE_BYTES, ProcessSupervisor};
