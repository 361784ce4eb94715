// src/lib.rs

pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod logs;
pub mod results;
pub mod server;
pub mod state;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::catalog::JobCatalog;
use crate::cli::CliArgs;
use crate::config::{load_and_validate, resolve_project_root};
use crate::engine::{Orchestrator, OrchestratorOptions};
use crate::server::HttpServer;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - job catalog
/// - orchestrator (state / logs / supervisor)
/// - HTTP server
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    let project_root = resolve_project_root(&cfg, &config_path);
    let catalog = JobCatalog::from_config(&cfg);

    if args.dry_run {
        print_dry_run(&catalog, &project_root);
        return Ok(());
    }

    let options = OrchestratorOptions::from_config(&cfg, project_root);
    let orchestrator = Arc::new(Orchestrator::new(catalog, options));

    let listen = args.listen.unwrap_or(cfg.server.listen);
    let server = HttpServer::new(orchestrator, listen, &cfg.server.allowed_origins);

    // Ctrl-C → graceful shutdown. Running jobs are killed with the process.
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        info!("shutdown requested");
    };

    server.serve(shutdown).await
}

/// Simple dry-run output: print jobs, commands, result paths and costs.
fn print_dry_run(catalog: &JobCatalog, project_root: &Path) {
    println!("jobtower dry-run");
    println!("  project_root = {}", project_root.display());
    println!();

    println!("jobs ({}):", catalog.len());
    for job in catalog.jobs() {
        println!("  - {}", job.job_id);
        println!("      cmd: {:?}", job.command_template);
        if !job.result_paths.is_empty() {
            println!("      results: {:?}", job.result_paths);
        }
    }

    if !catalog.cost_estimates().is_empty() {
        println!();
        println!("cost estimates:");
        for est in catalog.cost_estimates() {
            println!(
                "  - {}: {} calls, ${:.2} ({})",
                est.job_id, est.calls, est.estimated_cost, est.model
            );
        }
    }

    debug!("dry-run complete (no execution)");
}
