// tests/filesystem_faults.rs

use std::error::Error;
use std::path::Path;
use std::sync::mpsc::{Receiver, channel};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use tokio::sync::Notify;
use tokio_stream::StreamExt;

use jobtower::engine::{Orchestrator, OrchestratorOptions};
use jobtower::errors::JobtowerError;
use jobtower::exec::JobOutcome;
use jobtower::fs::FileSystem;
use jobtower::logs::LogEvent;
use jobtower::types::{JobStatus, RunConfig};
use jobtower_test_utils::builders::{CatalogBuilder, JobBuilder};
use jobtower_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

/// Filesystem whose artifact lookups panic.
#[derive(Debug)]
struct PanickingFileSystem;

impl FileSystem for PanickingFileSystem {
    fn read_to_string(&self, path: &Path) -> anyhow::Result<String> {
        panic!("read of {path:?} blew up");
    }

    fn is_file(&self, path: &Path) -> bool {
        panic!("lookup of {path:?} blew up");
    }
}

/// Filesystem that parks every lookup until the test releases it.
#[derive(Debug)]
struct GatedFileSystem {
    entered: Arc<Notify>,
    release: Mutex<Receiver<()>>,
}

impl FileSystem for GatedFileSystem {
    fn read_to_string(&self, _path: &Path) -> anyhow::Result<String> {
        Ok(r#"{"score": 1}"#.to_string())
    }

    fn is_file(&self, _path: &Path) -> bool {
        self.entered.notify_one();
        let _ = self.release.lock().unwrap().recv();
        true
    }
}

#[tokio::test]
async fn panic_while_loading_results_fails_the_job_and_allows_restart() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let catalog = CatalogBuilder::new()
        .with_job(JobBuilder::shell("j", "true").result("out.json").build())
        .build();
    let orch = Orchestrator::with_filesystem(
        catalog,
        OrchestratorOptions::new(dir.path()),
        Arc::new(PanickingFileSystem),
    );

    let (running, handle) = orch.start_tracked("j", RunConfig::default())?;
    assert_eq!(running.status, JobStatus::Running);

    let outcome = with_timeout(handle).await?;
    match &outcome {
        JobOutcome::Faulted(message) => assert!(
            message.starts_with("supervisor panicked"),
            "unexpected fault message: {message}"
        ),
        other => panic!("expected a faulted outcome, got {other:?}"),
    }

    let state = orch.status("j").await?;
    assert_eq!(state.status, JobStatus::Failed);
    assert!(state.completed_at.is_some());
    assert_eq!(state.results, None);
    assert!(
        state
            .error
            .as_deref()
            .is_some_and(|e| e.starts_with("supervisor panicked")),
        "error was {:?}",
        state.error
    );
    assert_eq!(orch.process_handle("j")?, None);

    let events = with_timeout(orch.stream_logs("j").await?.collect::<Vec<_>>()).await;
    assert_eq!(
        events.last(),
        Some(&LogEvent::Complete {
            status: JobStatus::Failed
        })
    );

    // Not stuck: a new run is accepted and ends the same way.
    let (again, handle) = orch.start_tracked("j", RunConfig::default())?;
    assert_eq!(again.status, JobStatus::Running);
    assert!(matches!(with_timeout(handle).await?, JobOutcome::Faulted(_)));
    Ok(())
}

#[tokio::test]
async fn panic_while_reconstructing_status_is_an_error_not_a_crash() -> TestResult {
    init_tracing();
    let catalog = CatalogBuilder::new()
        .with_job(JobBuilder::shell("j", "true").result("out.json").build())
        .build();
    let orch = Orchestrator::with_filesystem(
        catalog,
        OrchestratorOptions::new("/project"),
        Arc::new(PanickingFileSystem),
    );

    assert!(matches!(orch.status("j").await, Err(JobtowerError::Other(_))));
    assert!(matches!(orch.list_all().await, Err(JobtowerError::Other(_))));
    Ok(())
}

// The default test runtime has a single thread: if artifact reads ran on it,
// the parked lookup would stall this test instead of letting it continue.
#[tokio::test]
async fn artifact_reads_do_not_block_the_runtime() -> TestResult {
    init_tracing();
    let entered = Arc::new(Notify::new());
    let (release, gate) = channel();
    let fs = GatedFileSystem {
        entered: Arc::clone(&entered),
        release: Mutex::new(gate),
    };
    let catalog = CatalogBuilder::new()
        .with_job(
            JobBuilder::new("e4_evaluation", &["python", "scripts/eval_router.py"])
                .result("data/results/evaluation_results.json")
                .build(),
        )
        .build();
    let orch = Arc::new(Orchestrator::with_filesystem(
        catalog,
        OrchestratorOptions::new("/project"),
        Arc::new(fs),
    ));

    let pending = {
        let orch = Arc::clone(&orch);
        tokio::spawn(async move { orch.status("e4_evaluation").await })
    };

    with_timeout(entered.notified()).await;
    // The lookup is parked on another thread; this thread still runs timers.
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(!pending.is_finished());

    release.send(())?;
    let state = with_timeout(pending).await??;
    assert_eq!(state.status, JobStatus::Completed);
    assert_eq!(
        state.results.map(|r| r["evaluation_results"].clone()),
        Some(serde_json::json!({"score": 1}))
    );
    Ok(())
}
