// src/exec/supervisor.rs

//! Supervision of a single job invocation.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::catalog::JobDefinition;
use crate::exec::command::build_command;
use crate::exec::progress::parse_progress;
use crate::exec::registry::{ProcessHandle, ProcessRegistry};
use crate::logs::LogBuffer;
use crate::results::ResultsLoader;
use crate::state::{JobResults, JobStateStore};
use crate::types::{JobStatus, RunConfig};

/// Longest output line kept as one log entry; longer runs are split.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// How a supervised invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The process exited; signals are reported as `-<signal>`.
    Exited(i32),
    /// Supervision itself failed (launch error, I/O error, panic).
    Faulted(String),
}

/// Spawns job processes and drives them to a terminal state.
///
/// Every invocation runs in its own Tokio task and only touches its own job's
/// slots in the shared stores.
#[derive(Debug)]
pub struct ProcessSupervisor {
    states: Arc<JobStateStore>,
    processes: Arc<ProcessRegistry>,
    results: Arc<ResultsLoader>,
    workdir: PathBuf,
}

impl ProcessSupervisor {
    pub fn new(
        states: Arc<JobStateStore>,
        processes: Arc<ProcessRegistry>,
        results: Arc<ResultsLoader>,
        workdir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            states,
            processes,
            results,
            workdir: workdir.into(),
        }
    }

    /// Launch `job` in the background, writing its output to `buffer`.
    ///
    /// The job must already be `Running` in the state store. The returned
    /// handle resolves once the job has been finalized.
    pub fn launch(
        self: &Arc<Self>,
        job: JobDefinition,
        config: RunConfig,
        buffer: Arc<LogBuffer>,
    ) -> JoinHandle<JobOutcome> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.supervise(job, config, buffer).await })
    }

    /// Failure-capturing boundary around [`ProcessSupervisor::run`] and the
    /// result loading that follows a clean exit.
    ///
    /// Errors and panics inside the boundary become a `Failed` state; the
    /// process handle is released on every path and the log buffer is closed
    /// once the final state is recorded.
    async fn supervise(
        self: Arc<Self>,
        job: JobDefinition,
        config: RunConfig,
        buffer: Arc<LogBuffer>,
    ) -> JobOutcome {
        let job_id = job.job_id.clone();

        let inner = {
            let this = Arc::clone(&self);
            let job = job.clone();
            let buffer = Arc::clone(&buffer);
            tokio::spawn(async move {
                let code = this.run(&job, &config, &buffer).await?;
                let results = if code == 0 {
                    this.load_results(&job).await?
                } else {
                    None
                };
                Ok::<_, anyhow::Error>((code, results))
            })
        };

        let (outcome, results) = match inner.await {
            Ok(Ok((code, results))) => (JobOutcome::Exited(code), results),
            Ok(Err(err)) => {
                error!(job = %job_id, error = %format!("{err:#}"), "job supervision error");
                (JobOutcome::Faulted(format!("{err:#}")), None)
            }
            Err(join_err) => {
                error!(job = %job_id, error = %join_err, "job supervision task panicked");
                (
                    JobOutcome::Faulted(format!("supervisor panicked: {join_err}")),
                    None,
                )
            }
        };

        // Release before finalizing: once the job is terminal a new start may
        // register its own handle.
        if self.processes.release(&job_id).is_none() {
            debug!(job = %job_id, "no process handle to release");
        }

        let status = self.finalize(&job, &outcome, results);
        buffer.close(status);
        outcome
    }

    /// Read the job's artifacts on the blocking pool.
    async fn load_results(&self, job: &JobDefinition) -> Result<Option<JobResults>> {
        self.results.load_async(job).await.map_err(|join_err| {
            if join_err.is_panic() {
                anyhow!("supervisor panicked: {join_err}")
            } else {
                anyhow!("loading results for job '{}' was cancelled", job.job_id)
            }
        })
    }

    /// Record the terminal state. Performs no I/O.
    fn finalize(
        &self,
        job: &JobDefinition,
        outcome: &JobOutcome,
        results: Option<JobResults>,
    ) -> JobStatus {
        let job_id = job.job_id.as_str();
        let (status, res) = match outcome {
            JobOutcome::Exited(0) => {
                info!(
                    job = %job_id,
                    artifacts = results.as_ref().map_or(0, |r| r.len()),
                    "job completed"
                );
                (JobStatus::Completed, self.states.complete(job_id, results))
            }
            JobOutcome::Exited(code) => {
                warn!(job = %job_id, exit_code = code, "job failed");
                (
                    JobStatus::Failed,
                    self.states
                        .fail(job_id, format!("process exited with code {code}")),
                )
            }
            JobOutcome::Faulted(message) => {
                (JobStatus::Failed, self.states.fail(job_id, message.clone()))
            }
        };

        if let Err(err) = res {
            error!(job = %job_id, error = %err, "failed to record final job state");
        }
        status
    }

    /// Spawn the process, pump its merged output into the log buffer and
    /// progress, then wait for exit.
    async fn run(
        &self,
        job: &JobDefinition,
        config: &RunConfig,
        buffer: &LogBuffer,
    ) -> Result<i32> {
        let job_id = job.job_id.as_str();
        let mut cmd = build_command(job, config, &self.workdir)?;

        info!(
            job = %job_id,
            cmd = ?job.command_template,
            flags = ?config.to_args(),
            "starting job process"
        );

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning process for job '{}'", job_id))?;

        let pid = child.id();
        self.processes.register(ProcessHandle {
            job_id: job_id.to_string(),
            pid,
        })?;
        debug!(job = %job_id, ?pid, "process registered");

        // stdout and stderr share one channel; order is arrival order.
        let (tx, mut rx) = mpsc::channel::<io::Result<String>>(256);
        if let Some(stdout) = child.stdout.take() {
            spawn_line_reader(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_line_reader(stderr, tx.clone());
        }
        drop(tx);

        while let Some(line) = rx.recv().await {
            let line = line.with_context(|| format!("reading output of job '{}'", job_id))?;
            self.record_line(job_id, buffer, line)?;
        }

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for process of job '{}'", job_id))?;
        let code = exit_code(status);

        info!(
            job = %job_id,
            exit_code = code,
            success = status.success(),
            lines = buffer.total_appended(),
            "job process exited"
        );

        Ok(code)
    }

    fn record_line(&self, job_id: &str, buffer: &LogBuffer, line: String) -> Result<()> {
        if let Some(progress) = parse_progress(&line) {
            debug!(
                job = %job_id,
                current = progress.current,
                total = progress.total,
                "progress marker"
            );
            self.states.set_progress(job_id, progress)?;
        }
        buffer.append(line);
        Ok(())
    }
}

/// Forward trimmed, lossily-decoded lines from `reader` until EOF or error.
fn spawn_line_reader<R>(reader: R, tx: mpsc::Sender<io::Result<String>>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut raw = Vec::new();

        loop {
            match read_capped_line(&mut reader, &mut raw).await {
                Ok(false) => break,
                Ok(true) => {
                    let line = String::from_utf8_lossy(&raw).trim().to_string();
                    if tx.send(Ok(line)).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    let _ = tx.send(Err(err)).await;
                    break;
                }
            }
        }
    });
}

/// Read up to the next `\n` into `raw`, stopping early at [`MAX_LINE_BYTES`].
///
/// The newline is consumed but not stored. Returns `false` at EOF with
/// nothing read.
async fn read_capped_line<R>(reader: &mut R, raw: &mut Vec<u8>) -> io::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    raw.clear();
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(!raw.is_empty());
        }

        let room = MAX_LINE_BYTES - raw.len();
        let window = &available[..available.len().min(room)];
        if let Some(pos) = window.iter().position(|&b| b == b'\n') {
            raw.extend_from_slice(&window[..pos]);
            reader.consume(pos + 1);
            return Ok(true);
        }

        let taken = window.len();
        raw.extend_from_slice(window);
        reader.consume(taken);
        if raw.len() >= MAX_LINE_BYTES {
            return Ok(true);
        }
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }

    -1
}
