//! Pipeline configuration.

use std::path::PathBuf;
use std::sync::Arc;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

/// Default number of documents retrieved per request.
pub const DEFAULT_RETRIEVAL_LIMIT: usize = 5;

/// Default maximum number of background jobs running at once.
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 10;

/// Configuration for the pipeline and its background workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct PipelineConfig {
    /// Number of related documents retrieved per request
    #[cfg_attr(
        feature = "config",
        arg(long, env = "RETRIEVAL_LIMIT", default_value_t = DEFAULT_RETRIEVAL_LIMIT)
    )]
    #[serde(default = "default_retrieval_limit")]
    pub retrieval_limit: usize,

    /// Maximum background jobs processed simultaneously
    #[cfg_attr(
        feature = "config",
        arg(long, env = "MAX_CONCURRENT_JOBS", default_value_t = DEFAULT_MAX_CONCURRENT_JOBS)
    )]
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// Threads of the background worker runtime
    #[cfg_attr(feature = "config", arg(long, env = "WORKER_THREADS", default_value_t = 2))]
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,

    /// CSV file (`disease`,`description`) used to seed empty collections
    #[cfg_attr(feature = "config", arg(long, env = "SEED_CSV_PATH"))]
    #[serde(default)]
    pub seed_csv_path: Option<PathBuf>,

    /// Maximum number of seed rows loaded
    #[cfg_attr(feature = "config", arg(long, env = "CSV_LIMIT", default_value_t = 200))]
    #[serde(default = "default_csv_limit")]
    pub csv_limit: usize,

    /// Maximum length of a seed text in characters
    #[cfg_attr(feature = "config", arg(long, env = "CSV_MAX_LENGTH", default_value_t = 2000))]
    #[serde(default = "default_csv_max_length")]
    pub csv_max_length: usize,
}

fn default_retrieval_limit() -> usize {
    DEFAULT_RETRIEVAL_LIMIT
}

fn default_max_concurrent_jobs() -> usize {
    DEFAULT_MAX_CONCURRENT_JOBS
}

fn default_worker_threads() -> usize {
    2
}

fn default_csv_limit() -> usize {
    200
}

fn default_csv_max_length() -> usize {
    2000
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retrieval_limit: default_retrieval_limit(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
            worker_threads: default_worker_threads(),
            seed_csv_path: None,
            csv_limit: default_csv_limit(),
            csv_max_length: default_csv_max_length(),
        }
    }
}

impl PipelineConfig {
    /// Creates a new pipeline configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of retrieved documents.
    pub fn with_retrieval_limit(mut self, retrieval_limit: usize) -> Self {
        self.retrieval_limit = retrieval_limit;
        self
    }

    /// Sets the maximum concurrent jobs.
    pub fn with_max_concurrent_jobs(mut self, max_concurrent_jobs: usize) -> Self {
        self.max_concurrent_jobs = max_concurrent_jobs;
        self
    }

    /// Sets the seed corpus location.
    pub fn with_seed_csv_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.seed_csv_path = Some(path.into());
        self
    }

    /// Creates a semaphore for limiting concurrent job processing.
    pub fn create_semaphore(&self) -> Arc<Semaphore> {
        Arc::new(Semaphore::new(self.max_concurrent_jobs.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.retrieval_limit, 5);
        assert_eq!(config.max_concurrent_jobs, 10);
        assert_eq!(config.worker_threads, 2);
        assert_eq!(config.csv_limit, 200);
        assert_eq!(config.csv_max_length, 2000);
        assert!(config.seed_csv_path.is_none());
    }

    #[test]
    fn test_zero_jobs_still_allows_progress() {
        let config = PipelineConfig::new().with_max_concurrent_jobs(0);
        assert_eq!(config.create_semaphore().available_permits(), 1);
    }
}
