// src/catalog/mod.rs

//! Static, read-only table of runnable jobs.
//!
//! The catalog is built once from the config file and never mutated. It
//! answers two questions: "does this job exist?" and "how is it launched /
//! where does it write its results?". It also carries the descriptive cost
//! table, which is independent of live job state.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::ConfigFile;
use crate::errors::{JobtowerError, Result};
use crate::types::JobId;

/// Immutable description of one job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDefinition {
    pub job_id: JobId,
    /// argv template; `command_template[0]` is the program.
    pub command_template: Vec<String>,
    /// Result artifact paths, relative to the project root unless absolute.
    pub result_paths: Vec<PathBuf>,
}

impl JobDefinition {
    pub fn new(
        job_id: impl Into<JobId>,
        command_template: Vec<String>,
        result_paths: Vec<PathBuf>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            command_template,
            result_paths,
        }
    }
}

/// One row of the cost-estimate table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEstimate {
    #[serde(rename = "experiment_id")]
    pub job_id: String,
    /// Expected number of paid API calls.
    pub calls: u64,
    pub estimated_cost: f64,
    pub model: String,
}

#[derive(Debug, Clone, Default)]
pub struct JobCatalog {
    jobs: BTreeMap<JobId, JobDefinition>,
    cost_estimates: Vec<CostEstimate>,
}

impl JobCatalog {
    pub fn new(
        jobs: impl IntoIterator<Item = JobDefinition>,
        cost_estimates: Vec<CostEstimate>,
    ) -> Self {
        Self {
            jobs: jobs
                .into_iter()
                .map(|def| (def.job_id.clone(), def))
                .collect(),
            cost_estimates,
        }
    }

    pub fn from_config(cfg: &ConfigFile) -> Self {
        let jobs = cfg.job.iter().map(|(id, job)| {
            JobDefinition::new(
                id.clone(),
                job.cmd.clone(),
                job.results.iter().map(PathBuf::from).collect(),
            )
        });

        let estimates = cfg
            .cost_estimate
            .iter()
            .map(|c| CostEstimate {
                job_id: c.job_id.clone(),
                calls: c.calls,
                estimated_cost: c.estimated_cost,
                model: c.model.clone(),
            })
            .collect();

        Self::new(jobs, estimates)
    }

    pub fn get(&self, job_id: &str) -> Option<&JobDefinition> {
        self.jobs.get(job_id)
    }

    /// Look up a job, mapping absence to [`JobtowerError::UnknownJob`].
    pub fn require(&self, job_id: &str) -> Result<&JobDefinition> {
        self.get(job_id)
            .ok_or_else(|| JobtowerError::UnknownJob(job_id.to_string()))
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.jobs.contains_key(job_id)
    }

    /// Job ids in sorted order.
    pub fn job_ids(&self) -> impl Iterator<Item = &str> {
        self.jobs.keys().map(|s| s.as_str())
    }

    pub fn jobs(&self) -> impl Iterator<Item = &JobDefinition> {
        self.jobs.values()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn cost_estimates(&self) -> &[CostEstimate] {
        &self.cost_estimates
    }
}
