// src/exec/registry.rs

//! Tracking of live job processes.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::errors::{JobtowerError, Result};
use crate::types::JobId;

/// Record of a running job process. Exists only while the job runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHandle {
    pub job_id: JobId,
    /// OS process id, when the platform reported one.
    pub pid: Option<u32>,
}

/// At most one [`ProcessHandle`] per catalog job.
#[derive(Debug)]
pub struct ProcessRegistry {
    handles: HashMap<JobId, Mutex<Option<ProcessHandle>>>,
}

impl ProcessRegistry {
    pub fn new<'a>(job_ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            handles: job_ids
                .into_iter()
                .map(|id| (id.to_string(), Mutex::new(None)))
                .collect(),
        }
    }

    fn slot(&self, job_id: &str) -> Result<MutexGuard<'_, Option<ProcessHandle>>> {
        let slot = self
            .handles
            .get(job_id)
            .ok_or_else(|| JobtowerError::UnknownJob(job_id.to_string()))?;
        Ok(slot.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Track a freshly spawned process; fails if one is already tracked.
    pub fn register(&self, handle: ProcessHandle) -> Result<()> {
        let mut slot = self.slot(&handle.job_id)?;
        if slot.is_some() {
            return Err(JobtowerError::AlreadyRunning(handle.job_id));
        }
        *slot = Some(handle);
        Ok(())
    }

    /// Stop tracking the job's process, returning the handle if there was one.
    pub fn release(&self, job_id: &str) -> Option<ProcessHandle> {
        self.slot(job_id).ok().and_then(|mut slot| slot.take())
    }

    pub fn get(&self, job_id: &str) -> Result<Option<ProcessHandle>> {
        Ok(self.slot(job_id)?.clone())
    }

    /// Number of jobs with a tracked process.
    pub fn active_count(&self) -> usize {
        self.handles
            .values()
            .filter(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner).is_some())
            .count()
    }
}
