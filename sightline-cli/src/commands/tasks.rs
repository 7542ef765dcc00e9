//! Task command handlers
//!
//! Every task command builds a task request and runs it through the worker's
//! dispatcher, so local runs behave exactly like queued jobs.

use anyhow::{Context, Result};
use colored::*;
use sightline_core::domain::storage::FolderRef;
use sightline_core::domain::task::{
    ConvertImagesInput, ConvertVideoInput, RunPipelineInput, TaskOutput, TrainPipelineInput,
};
use sightline_core::dto::task::TaskRequest;
use std::path::{Path, PathBuf};

use crate::config::Config;

pub async fn run_pipeline(
    config: &Config,
    input: PathBuf,
    pipeline: String,
    media_type: String,
) -> Result<()> {
    let request = TaskRequest::RunPipeline(RunPipelineInput {
        input_path: input,
        pipeline,
        media_type,
    });
    execute(config, request).await
}

pub async fn train(
    config: &Config,
    folder_id: String,
    folder_name: String,
    groundtruth: String,
    name: String,
) -> Result<()> {
    let request = TaskRequest::TrainPipeline(TrainPipelineInput {
        folder: FolderRef {
            id: folder_id,
            name: folder_name,
        },
        groundtruth,
        pipeline_name: name,
    });
    execute(config, request).await
}

pub async fn convert_video(
    config: &Config,
    input: PathBuf,
    folder_id: String,
    auxiliary_folder_id: String,
) -> Result<()> {
    let token = config
        .token
        .clone()
        .context("A storage token is required to convert videos (--token)")?;

    let request = TaskRequest::ConvertVideo(ConvertVideoInput {
        input_path: input,
        folder_id,
        token,
        auxiliary_folder_id,
    });
    execute(config, request).await
}

pub async fn convert_images(config: &Config, folder_id: String) -> Result<()> {
    execute(
        config,
        TaskRequest::ConvertImages(ConvertImagesInput { folder_id }),
    )
    .await
}

/// Run a request stored as JSON, as the job queue would submit it
pub async fn dispatch_file(config: &Config, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file: {}", path.display()))?;
    let request: TaskRequest =
        serde_json::from_str(&content).context("Failed to parse task request")?;

    execute(config, request).await
}

async fn execute(config: &Config, request: TaskRequest) -> Result<()> {
    let title = request.title();
    println!("{} {}", "▸".cyan(), title.bold());

    let ctx = config.task_context(&title)?;
    let output = sightline_worker::dispatch(&request, &ctx)
        .await
        .with_context(|| format!("Task {} failed", request.kind()))?;

    print_output(&output);
    Ok(())
}

fn print_output(output: &TaskOutput) {
    println!("{}", "✓ Task finished successfully!".green().bold());

    match output {
        TaskOutput::Detections { path } => {
            println!("  Output:   {}", path.display().to_string().cyan());
        }
        TaskOutput::TrainedModel {
            output_dir,
            pipeline_file,
        } => {
            println!("  Output:   {}", output_dir.display().to_string().cyan());
            match pipeline_file {
                Some(file) => println!("  Pipeline: {}", file.display().to_string().cyan()),
                None => println!("  Pipeline: {}", "not published".yellow()),
            }
        }
        TaskOutput::VideoConverted { item_id } => {
            println!("  Item:     {}", item_id.cyan());
        }
        TaskOutput::ImagesConverted { count } => {
            println!("  Converted: {}", count.to_string().cyan());
        }
    }
}
