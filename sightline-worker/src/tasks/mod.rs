//! Task execution
//!
//! The four long-running tasks the job queue hands to the worker. Each task
//! runs its steps strictly in sequence, writes tool output to the job log and
//! cleans up every temporary path it created unless that path is the result.

mod convert_images;
mod convert_video;
mod run_pipeline;
mod train_pipeline;

pub use convert_images::convert_images;
pub use convert_video::convert_video;
pub use run_pipeline::run_pipeline;
pub use train_pipeline::{TrainingOutcome, train_pipeline};

use sightline_client::RemoteStorage;
use sightline_core::domain::task::TaskOutput;
use sightline_core::dto::task::TaskRequest;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::{TempDir, TempPath};
use tracing::info;

use crate::config::WorkerConfig;
use crate::error::{Result, TaskError};
use crate::log::JobLog;
use crate::process::ProcessRunner;

/// Everything a task needs from its environment
#[derive(Clone)]
pub struct TaskContext {
    pub config: WorkerConfig,
    pub storage: Arc<dyn RemoteStorage>,
    pub log: Arc<dyn JobLog>,
    pub runner: ProcessRunner,
}

impl TaskContext {
    pub fn new(
        config: WorkerConfig,
        storage: Arc<dyn RemoteStorage>,
        log: Arc<dyn JobLog>,
    ) -> Self {
        Self {
            config,
            storage,
            log,
            runner: ProcessRunner::new(),
        }
    }

    /// Scoped scratch directory, deleted when the guard drops
    pub(crate) fn scratch_dir(&self, prefix: &str) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix);

        let dir = match &self.config.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        dir.map_err(|e| TaskError::io("Failed to create scratch directory", e))
    }

    /// Scoped empty scratch file, deleted when the guard drops
    pub(crate) fn scratch_file(&self, prefix: &str, suffix: &str) -> Result<TempPath> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix).suffix(suffix);

        let file = match &self.config.scratch_root {
            Some(root) => builder.tempfile_in(root),
            None => builder.tempfile(),
        };
        file.map(|f| f.into_temp_path())
            .map_err(|e| TaskError::io("Failed to create scratch file", e))
    }
}

/// Runs the task described by `request`
pub async fn dispatch(request: &TaskRequest, ctx: &TaskContext) -> Result<TaskOutput> {
    info!("Starting task {}", request.title());

    let output = match request {
        TaskRequest::RunPipeline(input) => TaskOutput::Detections {
            path: run_pipeline(ctx, input).await?,
        },
        TaskRequest::TrainPipeline(input) => {
            let outcome = train_pipeline(ctx, input).await?;
            TaskOutput::TrainedModel {
                output_dir: outcome.output_dir,
                pipeline_file: outcome.pipeline_file,
            }
        }
        TaskRequest::ConvertVideo(input) => TaskOutput::VideoConverted {
            item_id: convert_video(ctx, input).await?.item_id,
        },
        TaskRequest::ConvertImages(input) => TaskOutput::ImagesConverted {
            count: convert_images(ctx, input).await?,
        },
    };

    info!("Finished task {}", request.title());
    Ok(output)
}

/// Regular files directly inside `dir`, sorted by path
pub(crate) fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let list_error = |e| TaskError::io(format!("Failed to list {}", dir.display()), e);
    let entries = fs::read_dir(dir).map_err(list_error)?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(list_error)?;
        let path = entry.path();
        if !path.is_dir() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
