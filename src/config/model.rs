use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [server]
/// listen = "127.0.0.1:8000"
///
/// [logs]
/// capacity = 1000
/// poll_interval_ms = 500
///
/// [job.e1_baselines]
/// cmd = ["python", "scripts/eval_baselines.py"]
/// results = ["data/results/mtbench_local_scores.json"]
///
/// [[cost_estimate]]
/// job_id = "e1_baselines"
/// calls = 160
/// estimated_cost = 0.40
/// model = "gpt-4o-mini"
/// ```
///
/// Everything except `[job.<id>]` has defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub logs: LogsSection,

    /// All jobs from `[job.<id>]`, keyed by job id.
    #[serde(default)]
    pub job: BTreeMap<String, JobConfig>,

    /// Static cost table served by the cost-estimate endpoint.
    #[serde(default)]
    pub cost_estimate: Vec<CostEstimateConfig>,
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Working directory for jobs; result paths are relative to it.
    ///
    /// When `None`, the directory of the config file is used.
    #[serde(default)]
    pub project_root: Option<PathBuf>,

    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:3030".to_string(),
    ]
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            project_root: None,
            allowed_origins: default_allowed_origins(),
        }
    }
}

/// `[logs]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LogsSection {
    /// Lines kept per job before the oldest is evicted.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// How long a log tailer sleeps between polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_capacity() -> usize {
    1000
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for LogsSection {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// `[job.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// Command template as an argv list; the first element is the program.
    pub cmd: Vec<String>,

    /// Result artifacts the job writes on success.
    #[serde(default)]
    pub results: Vec<String>,
}

/// `[[cost_estimate]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CostEstimateConfig {
    pub job_id: String,
    pub calls: u64,
    pub estimated_cost: f64,
    pub model: String,
}
