// src/results/mod.rs

//! Loading of result artifacts written by finished jobs.
//!
//! Artifacts are JSON files at catalog-declared paths. Their content is served
//! back verbatim; nothing here interprets the schema. A missing or unparsable
//! artifact is skipped, never fatal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinError;
use tracing::{debug, warn};

use crate::catalog::JobDefinition;
use crate::fs::{FileSystem, RealFileSystem};
use crate::state::JobResults;

#[derive(Debug, Clone)]
pub struct ResultsLoader {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
}

impl ResultsLoader {
    /// Loader resolving relative result paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_filesystem(root, Arc::new(RealFileSystem))
    }

    pub fn with_filesystem(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// [`ResultsLoader::load`] on Tokio's blocking pool.
    ///
    /// Artifacts can be large, so async callers go through here. A panic
    /// inside the filesystem comes back as the `JoinError`.
    pub async fn load_async(&self, job: &JobDefinition) -> Result<Option<JobResults>, JoinError> {
        let loader = self.clone();
        let job = job.clone();
        tokio::task::spawn_blocking(move || loader.load(&job)).await
    }

    /// Read every artifact of `job` that exists and parses. Blocking.
    ///
    /// Keys are file stems (`data/results/foo.json` -> `foo`). Returns `None`
    /// when nothing was found.
    pub fn load(&self, job: &JobDefinition) -> Option<JobResults> {
        let mut results = JobResults::new();

        for relative in &job.result_paths {
            let path = self.root.join(relative);
            if !self.fs.is_file(&path) {
                continue;
            }

            let Some(key) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };

            let contents = match self.fs.read_to_string(&path) {
                Ok(contents) => contents,
                Err(err) => {
                    warn!(job = %job.job_id, path = ?path, error = %err, "skipping unreadable result artifact");
                    continue;
                }
            };

            match serde_json::from_str::<serde_json::Value>(&contents) {
                Ok(value) => {
                    debug!(job = %job.job_id, artifact = %key, "loaded result artifact");
                    results.insert(key, value);
                }
                Err(err) => {
                    warn!(job = %job.job_id, path = ?path, error = %err, "skipping unparsable result artifact");
                }
            }
        }

        if results.is_empty() {
            None
        } else {
            Some(results)
        }
    }
}
