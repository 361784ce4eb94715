// src/config/mod.rs

//! Configuration loading and validation for jobtower.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants like non-empty commands (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, resolve_project_root};
pub use model::{ConfigFile, CostEstimateConfig, JobConfig, LogsSection, ServerSection};
pub use validate::validate_config;
