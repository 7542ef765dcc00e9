use sightline_core::domain::task::{MediaType, RunPipelineInput};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{info, instrument};

use super::{TaskContext, list_files};
use crate::command::{self, PipelineSource};
use crate::error::{Result, TaskError};
use crate::process::RunMode;
use crate::registry::PipelineCatalog;

/// Runs an analysis pipeline over a directory of media
///
/// Returns the track CSV when the pipeline produced tracks, otherwise the
/// detection CSV. The other output is deleted.
#[instrument(skip_all, fields(pipeline = %input.pipeline, media_type = %input.media_type))]
pub async fn run_pipeline(ctx: &TaskContext, input: &RunPipelineInput) -> Result<PathBuf> {
    let media = media_files(&input.input_path)?;
    if media.is_empty() {
        return Err(TaskError::NoMediaFound {
            path: input.input_path.clone(),
        });
    }

    let media_type: MediaType = input.media_type.parse()?;
    let pipeline = pipeline_path(ctx, &input.pipeline);

    let detector_output = ctx.scratch_file("detections-", ".csv")?;
    let track_output = ctx.scratch_file("tracks-", ".csv")?;

    // The image list guard lives until the runner has exited
    let (source, _image_list) = match media_type {
        MediaType::Video => (PipelineSource::Video(media[0].clone()), None),
        MediaType::ImageSequence => {
            let list = write_image_list(ctx, &media)?;
            (PipelineSource::ImageList(list.to_path_buf()), Some(list))
        }
    };

    let spec = command::pipeline_runner(
        &ctx.config.toolkit_root,
        &pipeline,
        &source,
        &detector_output,
        &track_output,
    );
    let result = ctx
        .runner
        .run(&spec, RunMode::WaitForExit, ctx.log.as_ref())
        .await?;

    if !result.success() {
        return Err(TaskError::PipelineExecutionFailed {
            exit_code: result.exit_code,
            output: result.combined_output,
        });
    }

    select_output(detector_output, track_output)
}

/// Files of `dir` the runner can read: everything except directories and CSVs
fn media_files(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(list_files(dir)?
        .into_iter()
        .filter(|path| {
            !path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect())
}

fn pipeline_path(ctx: &TaskContext, pipe: &str) -> PathBuf {
    PipelineCatalog::from_config(&ctx.config)
        .resolve(pipe)
        .unwrap_or_else(|| ctx.config.pipeline_base().join(pipe))
}

fn write_image_list(ctx: &TaskContext, images: &[PathBuf]) -> Result<TempPath> {
    let list = ctx.scratch_file("images-", ".txt")?;

    let mut file = fs::File::create(&list)
        .map_err(|e| TaskError::io("Failed to create image list", e))?;
    for image in images {
        writeln!(file, "{}", image.display())
            .map_err(|e| TaskError::io("Failed to write image list", e))?;
    }

    Ok(list)
}

/// Keeps the track output if it has content, else the detection output
fn select_output(detector_output: TempPath, track_output: TempPath) -> Result<PathBuf> {
    let track_len = fs::metadata(&track_output)
        .map(|meta| meta.len())
        .map_err(|e| TaskError::io("Failed to inspect track output", e))?;

    let (keep, discard) = if track_len > 0 {
        (track_output, detector_output)
    } else {
        (detector_output, track_output)
    };

    discard
        .close()
        .map_err(|e| TaskError::io("Failed to remove unused pipeline output", e))?;

    let path = keep
        .keep()
        .map_err(|e| TaskError::io("Failed to keep pipeline output", e.error))?;

    info!("Pipeline output written to {}", path.display());
    Ok(path)
}
