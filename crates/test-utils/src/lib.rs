pub mod builders;

use std::path::Path;
use std::sync::Once;
use std::time::Duration;

use jobtower::catalog::JobCatalog;
use jobtower::engine::{Orchestrator, OrchestratorOptions};
use jobtower::state::JobState;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 10-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(10), f)
        .await
        .expect("Test timed out after 10 seconds")
}

/// Orchestrator rooted at `root` with a short tail poll interval.
pub fn orchestrator(catalog: JobCatalog, root: &Path) -> Orchestrator {
    let mut options = OrchestratorOptions::new(root);
    options.poll_interval = Duration::from_millis(50);
    Orchestrator::new(catalog, options)
}

/// Poll `status` until the job is completed or failed.
pub async fn wait_for_terminal(orchestrator: &Orchestrator, job_id: &str) -> JobState {
    with_timeout(async {
        loop {
            let state = orchestrator
                .status(job_id)
                .await
                .expect("status of catalog job");
            if state.status.is_terminal() {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
}

/// Poll until the job's log buffer has seen at least `lines` appends.
pub async fn wait_for_lines(orchestrator: &Orchestrator, job_id: &str, lines: usize) {
    with_timeout(async {
        loop {
            let seen = orchestrator
                .log_snapshot(job_id)
                .expect("log snapshot of catalog job")
                .last()
                .map_or(0, |entry| entry.seq as usize + 1);
            if seen >= lines {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
}
