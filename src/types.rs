use serde::{Deserialize, Serialize};

/// Identifier of a catalog job (e.g. `"e1_baselines"`).
pub type JobId = String;

/// Lifecycle status of a job.
///
/// Legal transitions are `Idle -> Running`, `Running -> Completed` and
/// `Running -> Failed`. A terminal job only returns to `Running` through a
/// fresh start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// `Completed` or `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Progress reported by a job through `[PROGRESS] n/m` markers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
    pub percent: f64,
}

impl Progress {
    /// Build a progress value; `percent` is `0` when `total` is `0`.
    ///
    /// Returns `None` when `current > total`.
    pub fn new(current: u64, total: u64) -> Option<Self> {
        if current > total {
            return None;
        }
        let percent = if total == 0 {
            0.0
        } else {
            current as f64 / total as f64 * 100.0
        };
        Some(Self {
            current,
            total,
            percent,
        })
    }
}

/// Per-invocation overrides, translated into command-line flags only when
/// present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub judge_model: Option<String>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub threshold: Option<f64>,
}

impl RunConfig {
    /// Flags appended after a job's command template.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(model) = &self.judge_model {
            args.push("--judge-model".to_string());
            args.push(model.clone());
        }
        if let Some(limit) = self.limit {
            args.push("--limit".to_string());
            args.push(limit.to_string());
        }
        if let Some(threshold) = self.threshold {
            args.push("--threshold".to_string());
            args.push(threshold.to_string());
        }
        args
    }
}
