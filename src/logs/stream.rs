// src/logs/stream.rs

//! Incremental tailing of a job's log buffer.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_stream::Stream;
use tracing::{debug, warn};

use crate::logs::buffer::LogEntry;
use crate::logs::store::LogStore;
use crate::types::{JobId, JobStatus};

/// Default wait between polls when no append wakes the tailer earlier.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// One event pushed to a log subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LogEvent {
    Log { message: String },
    Complete { status: JobStatus },
}

impl LogEvent {
    pub fn log(entry: &LogEntry) -> Self {
        LogEvent::Log {
            message: entry.render(),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, LogEvent::Complete { .. })
    }
}

/// Produces per-subscriber tails over the job log buffers.
#[derive(Debug, Clone)]
pub struct LiveLogStreamer {
    logs: Arc<LogStore>,
    poll_interval: Duration,
}

impl LiveLogStreamer {
    pub fn new(logs: Arc<LogStore>, poll_interval: Duration) -> Self {
        Self {
            logs,
            poll_interval,
        }
    }

    /// Tail one job's log.
    ///
    /// Emits a `Log` event for every entry appended since the subscriber's
    /// last read. When the run that owns the buffer has ended, the stream
    /// ends with exactly one `Complete` event carrying that run's status.
    /// A buffer replaced before its run ever started (a job that has not run
    /// yet) is followed into the new run. Otherwise the tailer waits for the
    /// next append or the poll interval, whichever comes first.
    ///
    /// The stream is lazy: it attaches to the buffer that is current when it
    /// is first polled. Each call owns an independent cursor.
    pub fn tail(&self, job_id: JobId) -> impl Stream<Item = LogEvent> + Send + 'static {
        let logs = Arc::clone(&self.logs);
        let poll_interval = self.poll_interval;

        async_stream::stream! {
            let mut buffer = match logs.current(&job_id) {
                Ok(buffer) => buffer,
                Err(err) => {
                    warn!(job = %job_id, error = %err, "cannot tail log");
                    return;
                }
            };
            let mut cursor = 0u64;

            loop {
                // Register interest before reading so an append between the
                // read and the wait is not missed.
                let waiter = Arc::clone(&buffer);
                let notified = waiter.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();

                let (entries, next) = buffer.read_from(cursor);
                cursor = next;
                for entry in &entries {
                    yield LogEvent::log(entry);
                }

                if let Some(status) = buffer.closed() {
                    // Lines appended between the read above and the close.
                    let (entries, _) = buffer.read_from(cursor);
                    for entry in &entries {
                        yield LogEvent::log(entry);
                    }
                    debug!(job = %job_id, ?status, "run finished; closing log tail");
                    yield LogEvent::Complete { status };
                    break;
                }

                match logs.current(&job_id) {
                    Ok(latest) if !Arc::ptr_eq(&latest, &buffer) => {
                        debug!(job = %job_id, "job started; following the new run's log");
                        buffer = latest;
                        cursor = 0;
                        continue;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(job = %job_id, error = %err, "cannot read current log; ending tail");
                        return;
                    }
                }

                let _ = tokio::time::timeout(poll_interval, notified).await;
            }
        }
    }
}
