// src/engine/orchestrator.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tokio::task::JoinHandle;
use tokio_stream::Stream;
use tracing::{debug, info};

use crate::catalog::{CostEstimate, JobCatalog, JobDefinition};
use crate::config::ConfigFile;
use crate::errors::{JobtowerError, Result};
use crate::exec::{JobOutcome, ProcessHandle, ProcessRegistry, ProcessSupervisor};
use crate::fs::{FileSystem, RealFileSystem};
use crate::logs::{
    DEFAULT_LOG_CAPACITY, DEFAULT_POLL_INTERVAL, LiveLogStreamer, LogEntry, LogEvent, LogStore,
};
use crate::results::ResultsLoader;
use crate::state::{JobResults, JobState, JobStateStore};
use crate::types::{JobId, JobStatus, RunConfig};

/// Boxed stream of log events for one subscriber.
pub type LogEventStream = Pin<Box<dyn Stream<Item = LogEvent> + Send + 'static>>;

/// Knobs for constructing an [`Orchestrator`].
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Working directory for jobs; relative result paths resolve against it.
    pub project_root: PathBuf,
    /// Lines kept per job log buffer.
    pub log_capacity: usize,
    /// Log tailer poll interval.
    pub poll_interval: Duration,
}

impl OrchestratorOptions {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            log_capacity: DEFAULT_LOG_CAPACITY,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn from_config(cfg: &ConfigFile, project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            log_capacity: cfg.logs.capacity,
            poll_interval: Duration::from_millis(cfg.logs.poll_interval_ms),
        }
    }
}

/// Owner of all job state: lifecycle, logs and live processes.
///
/// Constructed once at service start and shared (behind an `Arc`) with the
/// control surface. Every store is keyed by the catalog's job ids and locks
/// per job.
#[derive(Debug)]
pub struct Orchestrator {
    catalog: Arc<JobCatalog>,
    states: Arc<JobStateStore>,
    logs: Arc<LogStore>,
    processes: Arc<ProcessRegistry>,
    results: Arc<ResultsLoader>,
    supervisor: Arc<ProcessSupervisor>,
    streamer: LiveLogStreamer,
}

impl Orchestrator {
    pub fn new(catalog: JobCatalog, options: OrchestratorOptions) -> Self {
        Self::with_filesystem(catalog, options, Arc::new(RealFileSystem))
    }

    /// Like [`Orchestrator::new`], reading result artifacts through `fs`.
    pub fn with_filesystem(
        catalog: JobCatalog,
        options: OrchestratorOptions,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        let ids: Vec<&str> = catalog.job_ids().collect();
        let states = Arc::new(JobStateStore::new(ids.iter().copied()));
        let logs = Arc::new(LogStore::new(ids.iter().copied(), options.log_capacity));
        let processes = Arc::new(ProcessRegistry::new(ids.iter().copied()));
        let results = Arc::new(ResultsLoader::with_filesystem(
            options.project_root.clone(),
            fs,
        ));
        let supervisor = Arc::new(ProcessSupervisor::new(
            Arc::clone(&states),
            Arc::clone(&processes),
            Arc::clone(&results),
            options.project_root.clone(),
        ));
        let streamer = LiveLogStreamer::new(Arc::clone(&logs), options.poll_interval);

        info!(
            jobs = catalog.len(),
            project_root = ?options.project_root,
            log_capacity = options.log_capacity,
            "orchestrator initialised"
        );

        Self {
            catalog: Arc::new(catalog),
            states,
            logs,
            processes,
            results,
            supervisor,
            streamer,
        }
    }

    pub fn catalog(&self) -> &JobCatalog {
        &self.catalog
    }

    /// Start a job in the background and return its new `Running` state.
    ///
    /// Fails with `UnknownJob` for ids outside the catalog and with
    /// `AlreadyRunning` if the job is running; neither changes any state.
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, job_id: &str, config: RunConfig) -> Result<JobState> {
        self.start_tracked(job_id, config).map(|(state, _)| state)
    }

    /// [`Orchestrator::start`], also returning the supervision task handle.
    pub fn start_tracked(
        &self,
        job_id: &str,
        config: RunConfig,
    ) -> Result<(JobState, JoinHandle<JobOutcome>)> {
        let job = self.catalog.require(job_id)?.clone();

        // The fresh buffer is in place before `Running` is visible, so no
        // subscriber pairs the new run with the previous run's lines.
        let (state, buffer) = self
            .states
            .begin_run(job_id, || self.logs.reset(job_id))?;

        info!(job = %job_id, ?config, "job started");
        let handle = self.supervisor.launch(job, config, buffer);
        Ok((state, handle))
    }

    /// Current state of a job.
    ///
    /// Jobs not started in this process are reconstructed from disk: any
    /// result artifact present means `Completed`, otherwise `Idle`.
    pub async fn status(&self, job_id: &str) -> Result<JobState> {
        let job = self.catalog.require(job_id)?;

        if let Some(state) = self.states.get(job_id)? {
            return Ok(state);
        }

        match self.disk_results(job).await? {
            Some(results) => {
                debug!(job = %job_id, "status reconstructed from result artifacts");
                Ok(JobState::from_disk(job_id, results))
            }
            None => Ok(JobState::idle(job_id)),
        }
    }

    /// Live tail of a job's log, ending with one `complete` event.
    pub async fn stream_logs(&self, job_id: &str) -> Result<LogEventStream> {
        let job = self.catalog.require(job_id)?;

        if self.states.get(job_id)?.is_none() && self.disk_results(job).await?.is_some() {
            return Ok(Box::pin(tokio_stream::once(LogEvent::Complete {
                status: JobStatus::Completed,
            })));
        }

        Ok(Box::pin(self.streamer.tail(job_id.to_string())))
    }

    /// State of every catalog job, ordered by job id.
    pub async fn list_all(&self) -> Result<BTreeMap<JobId, JobState>> {
        let mut all = BTreeMap::new();
        for job_id in self.catalog.job_ids() {
            all.insert(job_id.to_string(), self.status(job_id).await?);
        }
        Ok(all)
    }

    /// Artifacts on disk, read off the async worker threads.
    async fn disk_results(&self, job: &JobDefinition) -> Result<Option<JobResults>> {
        self.results.load_async(job).await.map_err(|join_err| {
            JobtowerError::Other(anyhow!(
                "loading results for job '{}': {join_err}",
                job.job_id
            ))
        })
    }

    /// Static cost table; independent of live state.
    pub fn estimate_cost(&self) -> Vec<CostEstimate> {
        self.catalog.cost_estimates().to_vec()
    }

    /// Lines currently held in the job's log buffer.
    pub fn log_snapshot(&self, job_id: &str) -> Result<Vec<LogEntry>> {
        self.catalog.require(job_id)?;
        Ok(self.logs.current(job_id)?.snapshot())
    }

    /// Handle of the job's live process, if it is running.
    pub fn process_handle(&self, job_id: &str) -> Result<Option<ProcessHandle>> {
        self.catalog.require(job_id)?;
        self.processes.get(job_id)
    }

    /// Number of jobs with a live process.
    pub fn active_jobs(&self) -> usize {
        self.processes.active_count()
    }
}
