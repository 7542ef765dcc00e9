use sightline_core::domain::task::{ConvertImagesInput, TaskKind};
use std::path::Path;
use tracing::{info, instrument};

use super::TaskContext;
use crate::command;
use crate::error::{Result, TaskError};
use crate::process::{RunMode, enforce_exit_policy};

/// Extensions browsers display directly
const WEB_IMAGE_SUFFIXES: [&str; 3] = [".png", ".jpeg", ".jpg"];

/// Replaces every non-web image in a remote folder with a PNG copy
///
/// Items that fail to convert are left untouched and do not fail the task.
///
/// # Returns
/// The number of items converted and replaced
#[instrument(skip_all, fields(folder = %input.folder_id))]
pub async fn convert_images(ctx: &TaskContext, input: &ConvertImagesInput) -> Result<usize> {
    let items = ctx.storage.list_items(&input.folder_id).await?;
    let pending: Vec<_> = items
        .into_iter()
        .filter(|item| !is_web_image(&item.name))
        .collect();

    if pending.is_empty() {
        info!("No images to convert");
        return Ok(0);
    }

    let workdir = ctx.scratch_dir("images-")?;
    let mut converted = 0;

    for (index, item) in pending.iter().enumerate() {
        // Items sharing a stem would otherwise meet at the same PNG path
        let item_dir = workdir.path().join(index.to_string());
        tokio::fs::create_dir(&item_dir).await.map_err(|e| {
            TaskError::io(format!("Failed to create {}", item_dir.display()), e)
        })?;

        let local = ctx
            .storage
            .download_item(&item.id, &item_dir, &item.name)
            .await?;
        let png = item_dir.join(png_name(&item.name));

        let spec = command::transcode_image(&ctx.config.ffmpeg, &local, &png);
        let result = ctx
            .runner
            .run(&spec, RunMode::WaitForExit, ctx.log.as_ref())
            .await?;

        let policy = TaskKind::ConvertImages.exit_policy();
        if let Err(e) = enforce_exit_policy(&result, policy, &ctx.config.ffmpeg, ctx.log.as_ref()) {
            ctx.log.warn(&format!("Skipping {}: {}", item.name, e));
            continue;
        }

        ctx.storage
            .upload_file_to_folder(&input.folder_id, &png)
            .await?;
        ctx.storage.delete_item(&item.id).await?;
        converted += 1;
    }

    info!("Converted {} of {} images", converted, pending.len());
    Ok(converted)
}

fn is_web_image(name: &str) -> bool {
    WEB_IMAGE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// `a.b.tif` becomes `a.b.png`
fn png_name(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    format!("{}.png", stem)
}
