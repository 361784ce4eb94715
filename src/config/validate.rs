use crate::config::model::ConfigFile;
use crate::errors::{JobtowerError, Result};

/// Run semantic validation against a loaded configuration.
///
/// This checks:
/// - there is at least one job
/// - every job has a non-empty command whose program is not blank
/// - result paths are not blank
/// - `[logs].capacity >= 1` and `[logs].poll_interval_ms >= 1`
///
/// It does **not** check that programs exist; a missing executable is a
/// launch failure recorded on the job at start time.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_has_jobs(cfg)?;
    validate_jobs(cfg)?;
    validate_logs(cfg)?;
    Ok(())
}

fn ensure_has_jobs(cfg: &ConfigFile) -> Result<()> {
    if cfg.job.is_empty() {
        return Err(JobtowerError::ConfigError(
            "config must contain at least one [job.<id>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_jobs(cfg: &ConfigFile) -> Result<()> {
    for (id, job) in cfg.job.iter() {
        if id.trim().is_empty() {
            return Err(JobtowerError::ConfigError(
                "job ids must not be blank".to_string(),
            ));
        }

        match job.cmd.first() {
            Some(program) if !program.trim().is_empty() => {}
            _ => {
                return Err(JobtowerError::ConfigError(format!(
                    "job '{}' must have a non-empty `cmd` with a program",
                    id
                )));
            }
        }

        if job.results.iter().any(|p| p.trim().is_empty()) {
            return Err(JobtowerError::ConfigError(format!(
                "job '{}' has a blank entry in `results`",
                id
            )));
        }
    }
    Ok(())
}

fn validate_logs(cfg: &ConfigFile) -> Result<()> {
    if cfg.logs.capacity == 0 {
        return Err(JobtowerError::ConfigError(
            "[logs].capacity must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.logs.poll_interval_ms == 0 {
        return Err(JobtowerError::ConfigError(
            "[logs].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
