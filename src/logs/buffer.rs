// src/logs/buffer.rs

//! Bounded, append-only record of a job's output lines.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};
use tokio::sync::Notify;
use tokio::sync::futures::Notified;

use crate::types::JobStatus;

/// Default number of lines kept per job.
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// One captured output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Position of this entry in the buffer's lifetime append order.
    pub seq: u64,
    pub timestamp: DateTime<Local>,
    pub text: String,
}

impl LogEntry {
    /// `[HH:MM:SS] text`, the form pushed to log subscribers.
    pub fn render(&self) -> String {
        format!("[{}] {}", self.timestamp.format("%H:%M:%S"), self.text)
    }
}

#[derive(Debug)]
struct Ring {
    entries: VecDeque<LogEntry>,
    next_seq: u64,
    /// Terminal status of the run that wrote this buffer, once it ended.
    closed: Option<JobStatus>,
}

/// Fixed-capacity ring of [`LogEntry`] values.
///
/// Appending past capacity silently evicts the oldest entry. Readers keep
/// their own cursor (a sequence number) and ask for everything at or after
/// it; entries evicted before they were read are simply gone.
#[derive(Debug)]
pub struct LogBuffer {
    capacity: usize,
    ring: Mutex<Ring>,
    appended: Notify,
}

impl LogBuffer {
    /// `capacity` is clamped to at least one entry.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            ring: Mutex::new(Ring {
                entries: VecDeque::with_capacity(capacity),
                next_seq: 0,
                closed: None,
            }),
            appended: Notify::new(),
        }
    }

    fn ring(&self) -> MutexGuard<'_, Ring> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a line stamped with the current local time.
    pub fn append(&self, text: impl Into<String>) -> u64 {
        self.append_at(Local::now(), text)
    }

    pub fn append_at(&self, timestamp: DateTime<Local>, text: impl Into<String>) -> u64 {
        let seq = {
            let mut ring = self.ring();
            if ring.entries.len() == self.capacity {
                ring.entries.pop_front();
            }
            let seq = ring.next_seq;
            ring.entries.push_back(LogEntry {
                seq,
                timestamp,
                text: text.into(),
            });
            ring.next_seq += 1;
            seq
        };
        self.appended.notify_waiters();
        seq
    }

    /// Entries with `seq >= cursor` still held, plus the cursor to use next.
    pub fn read_from(&self, cursor: u64) -> (Vec<LogEntry>, u64) {
        let ring = self.ring();
        let oldest = ring.next_seq - ring.entries.len() as u64;
        let skip = cursor.saturating_sub(oldest) as usize;
        let entries: Vec<LogEntry> = ring.entries.iter().skip(skip).cloned().collect();
        (entries, ring.next_seq.max(cursor))
    }

    /// Copy of everything currently held, oldest first.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.ring().entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ring().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total number of lines ever appended.
    pub fn total_appended(&self) -> u64 {
        self.ring().next_seq
    }

    /// Mark the run as finished and wake every reader.
    ///
    /// Must be called after the last append. The first close wins.
    pub fn close(&self, status: JobStatus) {
        {
            let mut ring = self.ring();
            if ring.closed.is_none() {
                ring.closed = Some(status);
            }
        }
        self.appended.notify_waiters();
    }

    /// Terminal status of the run, once [`LogBuffer::close`] was called.
    pub fn closed(&self) -> Option<JobStatus> {
        self.ring().closed
    }

    /// Future resolving on the next append, close or [`LogBuffer::wake`].
    pub fn notified(&self) -> Notified<'_> {
        self.appended.notified()
    }

    /// Wake every waiting reader without appending (used when the buffer is
    /// replaced by a new run).
    pub fn wake(&self) {
        self.appended.notify_waiters();
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}
