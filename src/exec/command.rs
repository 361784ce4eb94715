// src/exec/command.rs

use std::path::Path;
use std::process::Stdio;

use anyhow::{anyhow, Result};
use tokio::process::Command;

use crate::catalog::JobDefinition;
use crate::types::RunConfig;

/// Full argv for one invocation: the catalog template followed by the flags
/// derived from `config`.
pub fn job_argv(job: &JobDefinition, config: &RunConfig) -> Vec<String> {
    let mut argv = job.command_template.clone();
    argv.extend(config.to_args());
    argv
}

/// Build the process for one invocation of `job`.
///
/// The program runs directly (no shell) in `cwd`, with stdout and stderr
/// piped and stdin closed. The child is killed if its handle is dropped.
pub fn build_command(job: &JobDefinition, config: &RunConfig, cwd: &Path) -> Result<Command> {
    let argv = job_argv(job, config);
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| anyhow!("job '{}' has an empty command template", job.job_id))?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    Ok(cmd)
}
