//! Configuration module
//!
//! Combines the worker configuration from the environment with the
//! command-line options, and builds the task context from it.

use anyhow::{Context, Result};
use sightline_client::{RemoteStorage, StorageClient};
use sightline_worker::log::{FileJobLog, JobLog, TracingJobLog};
use sightline_worker::{TaskContext, WorkerConfig};
use std::path::PathBuf;
use std::sync::Arc;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub worker: WorkerConfig,
    /// Token for the storage API
    pub token: Option<String>,
    /// File receiving tool output, if not the console
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn load(
        storage_url: String,
        token: Option<String>,
        log_file: Option<PathBuf>,
    ) -> Result<Self> {
        let mut worker = WorkerConfig::from_env();
        worker.storage_url = storage_url;
        worker.validate().context("Invalid worker configuration")?;

        Ok(Self {
            worker,
            token,
            log_file,
        })
    }

    pub fn storage(&self) -> Arc<dyn RemoteStorage> {
        let client = StorageClient::new(&self.worker.storage_url);
        match &self.token {
            Some(token) => Arc::new(client.with_token(token.as_str())),
            None => Arc::new(client),
        }
    }

    pub fn job_log(&self, title: &str) -> Result<Arc<dyn JobLog>> {
        match &self.log_file {
            Some(path) => {
                let log = FileJobLog::open(path)
                    .with_context(|| format!("Failed to open log file: {}", path.display()))?;
                Ok(Arc::new(log))
            }
            None => Ok(Arc::new(TracingJobLog::new(title))),
        }
    }

    /// Task context for one job
    pub fn task_context(&self, title: &str) -> Result<TaskContext> {
        Ok(TaskContext::new(
            self.worker.clone(),
            self.storage(),
            self.job_log(title)?,
        ))
    }
}
