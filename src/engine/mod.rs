// src/engine/mod.rs

//! Orchestration engine for jobtower.
//!
//! The [`Orchestrator`] ties together:
//! - the job catalog (what can run)
//! - the state store (what is happening now)
//! - the log store and live tailer
//! - the process supervisor that runs jobs in the background
//!
//! It is the transport-agnostic control surface; [`crate::server`] exposes it
//! over HTTP.

pub mod orchestrator;

pub use orchestrator::{LogEventStream, Orchestrator, OrchestratorOptions};
