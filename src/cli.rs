// src/cli.rs

//! CLI argument parsing using `clap`.

use std::net::SocketAddr;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `jobtower`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "jobtower",
    version,
    about = "Launch catalog jobs, watch their progress and tail their logs over HTTP.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Jobtower.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Jobtower.toml")]
    pub config: String,

    /// Address to serve on; overrides `[server].listen`.
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<SocketAddr>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `JOBTOWER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the job catalog, but don't serve.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
