#![allow(dead_code)]

use std::path::PathBuf;

use jobtower::catalog::{CostEstimate, JobCatalog, JobDefinition};

/// Builder for `JobCatalog` to simplify test setup.
pub struct CatalogBuilder {
    jobs: Vec<JobDefinition>,
    costs: Vec<CostEstimate>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            costs: Vec::new(),
        }
    }

    pub fn with_job(mut self, job: JobDefinition) -> Self {
        self.jobs.push(job);
        self
    }

    /// Shorthand for a `sh -c` job without result artifacts.
    pub fn with_shell_job(self, id: &str, script: &str) -> Self {
        self.with_job(JobBuilder::shell(id, script).build())
    }

    pub fn with_cost(mut self, job_id: &str, calls: u64, estimated_cost: f64, model: &str) -> Self {
        self.costs.push(CostEstimate {
            job_id: job_id.to_string(),
            calls,
            estimated_cost,
            model: model.to_string(),
        });
        self
    }

    pub fn build(self) -> JobCatalog {
        JobCatalog::new(self.jobs, self.costs)
    }
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobDefinition`.
pub struct JobBuilder {
    job: JobDefinition,
}

impl JobBuilder {
    pub fn new(id: &str, argv: &[&str]) -> Self {
        Self {
            job: JobDefinition::new(
                id,
                argv.iter().map(|s| s.to_string()).collect(),
                Vec::new(),
            ),
        }
    }

    /// `sh -c <script> <id>`; flags derived from a `RunConfig` land in `$@`.
    pub fn shell(id: &str, script: &str) -> Self {
        Self::new(id, &["sh", "-c", script, id])
    }

    pub fn result(mut self, path: &str) -> Self {
        self.job.result_paths.push(PathBuf::from(path));
        self
    }

    pub fn build(self) -> JobDefinition {
        self.job
    }
}
