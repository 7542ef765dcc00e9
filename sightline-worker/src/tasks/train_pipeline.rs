use chrono::Utc;
use sightline_core::domain::task::{TaskKind, TrainPipelineInput};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use super::TaskContext;
use crate::command::{self, TRAINING_CONFIG};
use crate::error::{Result, TaskError};
use crate::process::{RunMode, enforce_exit_policy};
use crate::training::organize_folder_for_training;

/// Format of the per-run output directory name
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// File the trainer writes into its working directory
const TRAINED_PIPELINE: &str = "detector.pipe";

/// Where a training run left its results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingOutcome {
    /// Persistent output directory, containing the timestamped run directory
    pub output_dir: PathBuf,
    /// Name of the timestamped run directory
    pub timestamp: String,
    /// Published copy of the trained pipeline, if any
    pub pipeline_file: Option<PathBuf>,
}

/// Trains a detector on an annotated remote folder
///
/// The folder is downloaded into scratch space, reshaped by the organizer
/// and handed to the trainer. The trained pipeline is published to the
/// trained pipelines directory under `trained_<name>_<timestamp>.pipe`.
#[instrument(skip_all, fields(folder = %input.folder.name, pipeline = %input.pipeline_name))]
pub async fn train_pipeline(
    ctx: &TaskContext,
    input: &TrainPipelineInput,
) -> Result<TrainingOutcome> {
    let scratch = ctx.scratch_dir("train-input-")?;
    let data_dir = scratch.path().join(&input.folder.name);
    tokio::fs::create_dir_all(&data_dir)
        .await
        .map_err(|e| TaskError::io(format!("Failed to create {}", data_dir.display()), e))?;

    info!("Downloading folder {} to {}", input.folder.id, data_dir.display());
    ctx.storage
        .download_folder_recursive(&input.folder.id, &data_dir)
        .await?;

    let groundtruth = data_dir.join(&input.groundtruth);
    let layout = organize_folder_for_training(scratch.path(), &data_dir, &groundtruth)?;
    ctx.log.write(&format!(
        "Training with {} labels: {}",
        layout.labels.len(),
        layout.labels.join(", ")
    ));

    let output = ctx.scratch_dir("training-")?;
    let timestamp = Utc::now().format(TIMESTAMP_FORMAT).to_string();
    let run_dir = output.path().join(&timestamp);
    tokio::fs::create_dir(&run_dir)
        .await
        .map_err(|e| TaskError::io(format!("Failed to create {}", run_dir.display()), e))?;

    let spec = command::trainer(
        &ctx.config.toolkit_root,
        scratch.path(),
        &ctx.config.pipeline_base().join(TRAINING_CONFIG),
        &run_dir,
    );
    let result = ctx.runner.run(&spec, RunMode::Stream, ctx.log.as_ref()).await?;
    enforce_exit_policy(
        &result,
        TaskKind::TrainPipeline.exit_policy(),
        command::TRAINER,
        ctx.log.as_ref(),
    )?;

    let pipeline_file = publish_pipeline(ctx, &run_dir, &input.pipeline_name, &timestamp)?;

    let output_dir = output.keep();
    info!("Training output kept at {}", output_dir.display());

    Ok(TrainingOutcome {
        output_dir,
        timestamp,
        pipeline_file,
    })
}

/// Copies the trained pipeline into the trained pipelines directory
fn publish_pipeline(
    ctx: &TaskContext,
    run_dir: &Path,
    name: &str,
    timestamp: &str,
) -> Result<Option<PathBuf>> {
    let Some(trained_dir) = &ctx.config.trained_pipelines_path else {
        debug!("Trained pipelines directory is not configured, not publishing");
        return Ok(None);
    };

    let generated = run_dir.join(TRAINED_PIPELINE);
    if !generated.is_file() {
        warn!("Trainer did not produce {}", generated.display());
        return Ok(None);
    }

    let destination = trained_dir.join(trained_pipeline_name(name, timestamp));
    fs::copy(&generated, &destination).map_err(|e| {
        TaskError::io(
            format!("Failed to publish trained pipeline to {}", destination.display()),
            e,
        )
    })?;

    info!("Published trained pipeline {}", destination.display());
    Ok(Some(destination))
}

fn trained_pipeline_name(name: &str, timestamp: &str) -> String {
    format!("trained_{}_{}.pipe", name, timestamp)
}
