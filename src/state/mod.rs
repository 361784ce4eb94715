// src/state/mod.rs

//! Lifecycle state of each catalog job.
//!
//! [`JobStateStore`] is the single source of truth for "what is happening
//! now". It holds one slot per catalog job, each behind its own mutex, so
//! updates to one job never contend with another. A slot stays empty until
//! the job is first started in this process; queries for empty slots fall
//! back to the results on disk (see [`crate::engine::Orchestrator::status`]).

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{JobtowerError, Result};
use crate::types::{JobId, JobStatus, Progress};

/// Parsed result artifacts keyed by file stem.
pub type JobResults = BTreeMap<String, serde_json::Value>;

/// Snapshot of one job's lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobState {
    #[serde(rename = "experiment_id")]
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress: Option<Progress>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub results: Option<JobResults>,
    pub error: Option<String>,
}

impl JobState {
    /// A job that has never run and has nothing on disk.
    pub fn idle(job_id: impl Into<JobId>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Idle,
            progress: None,
            started_at: None,
            completed_at: None,
            results: None,
            error: None,
        }
    }

    /// State inferred purely from artifacts on disk: completed, with no
    /// progress or timestamps.
    pub fn from_disk(job_id: impl Into<JobId>, results: JobResults) -> Self {
        Self {
            status: JobStatus::Completed,
            results: Some(results),
            ..Self::idle(job_id)
        }
    }

    fn running(job_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            status: JobStatus::Running,
            started_at: Some(now),
            ..Self::idle(job_id)
        }
    }
}

#[derive(Debug)]
pub struct JobStateStore {
    slots: HashMap<JobId, Mutex<Option<JobState>>>,
}

impl JobStateStore {
    /// Create one empty slot per job id. The key set is fixed afterwards.
    pub fn new<'a>(job_ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            slots: job_ids
                .into_iter()
                .map(|id| (id.to_string(), Mutex::new(None)))
                .collect(),
        }
    }

    fn slot(&self, job_id: &str) -> Result<MutexGuard<'_, Option<JobState>>> {
        let slot = self
            .slots
            .get(job_id)
            .ok_or_else(|| JobtowerError::UnknownJob(job_id.to_string()))?;
        Ok(slot.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// In-memory state, if the job has been started in this process.
    pub fn get(&self, job_id: &str) -> Result<Option<JobState>> {
        Ok(self.slot(job_id)?.clone())
    }

    /// Transition a job to `Running`, resetting every other field.
    ///
    /// Check and transition happen under the slot lock, so two concurrent
    /// starts cannot both succeed. A running job is left untouched.
    /// `prepare` runs under the same lock just before the transition, so
    /// anything it sets up is in place by the time `Running` is visible; if
    /// it fails the state is not changed.
    pub fn begin_run<T>(
        &self,
        job_id: &str,
        prepare: impl FnOnce() -> Result<T>,
    ) -> Result<(JobState, T)> {
        let mut slot = self.slot(job_id)?;

        if let Some(current) = slot.as_ref() {
            if current.status == JobStatus::Running {
                return Err(JobtowerError::AlreadyRunning(job_id.to_string()));
            }
        }

        let prepared = prepare()?;
        let state = JobState::running(job_id, Utc::now());
        *slot = Some(state.clone());
        debug!(job = %job_id, "job transitioned to running");
        Ok((state, prepared))
    }

    /// Record progress. Ignored unless the job is running.
    pub fn set_progress(&self, job_id: &str, progress: Progress) -> Result<()> {
        let mut slot = self.slot(job_id)?;
        match slot.as_mut() {
            Some(state) if state.status == JobStatus::Running => {
                state.progress = Some(progress);
            }
            _ => {
                debug!(job = %job_id, "progress update for non-running job ignored");
            }
        }
        Ok(())
    }

    /// `Running -> Completed`.
    pub fn complete(&self, job_id: &str, results: Option<JobResults>) -> Result<()> {
        self.finalize(job_id, |state| {
            state.status = JobStatus::Completed;
            state.results = results;
        })
    }

    /// `Running -> Failed`.
    pub fn fail(&self, job_id: &str, error: impl Into<String>) -> Result<()> {
        let error = error.into();
        self.finalize(job_id, |state| {
            state.status = JobStatus::Failed;
            state.error = Some(error);
        })
    }

    fn finalize(&self, job_id: &str, apply: impl FnOnce(&mut JobState)) -> Result<()> {
        let mut slot = self.slot(job_id)?;
        match slot.as_mut() {
            Some(state) if state.status == JobStatus::Running => {
                apply(state);
                state.completed_at = Some(Utc::now());
            }
            other => {
                warn!(
                    job = %job_id,
                    status = ?other.as_ref().map(|s| s.status),
                    "finalization requested for a job that is not running; ignoring"
                );
            }
        }
        Ok(())
    }
}
