use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::errors::{JobtowerError, Result};
use crate::logs::buffer::LogBuffer;
use crate::types::JobId;

/// Keyed set of per-job log buffers.
///
/// Each job has a "current" buffer. Starting a run swaps in a fresh one;
/// tailers that still hold the previous buffer notice the swap by pointer
/// comparison and move over.
#[derive(Debug)]
pub struct LogStore {
    capacity: usize,
    buffers: HashMap<JobId, Mutex<Arc<LogBuffer>>>,
}

impl LogStore {
    pub fn new<'a>(job_ids: impl IntoIterator<Item = &'a str>, capacity: usize) -> Self {
        Self {
            capacity,
            buffers: job_ids
                .into_iter()
                .map(|id| (id.to_string(), Mutex::new(Arc::new(LogBuffer::new(capacity)))))
                .collect(),
        }
    }

    fn slot(&self, job_id: &str) -> Result<MutexGuard<'_, Arc<LogBuffer>>> {
        let slot = self
            .buffers
            .get(job_id)
            .ok_or_else(|| JobtowerError::UnknownJob(job_id.to_string()))?;
        Ok(slot.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn current(&self, job_id: &str) -> Result<Arc<LogBuffer>> {
        Ok(Arc::clone(&*self.slot(job_id)?))
    }

    /// Replace the job's buffer with an empty one and return it.
    pub fn reset(&self, job_id: &str) -> Result<Arc<LogBuffer>> {
        let fresh = Arc::new(LogBuffer::new(self.capacity));
        let previous = {
            let mut slot = self.slot(job_id)?;
            std::mem::replace(&mut *slot, Arc::clone(&fresh))
        };
        // Tailers parked on the old buffer re-check and switch over.
        previous.wake();
        Ok(fresh)
    }
}
