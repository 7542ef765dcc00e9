use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use sightline_core::domain::storage::UploadedFile;
use sightline_core::domain::task::{ConvertVideoInput, TaskKind};
use std::path::Path;
use tracing::{debug, info, instrument};

use super::{TaskContext, list_files};
use crate::command;
use crate::error::{Result, TaskError};
use crate::process::{RunMode, enforce_exit_policy};

/// Frame rate annotators step through a converted video at
const ANNOTATION_FPS: u32 = 5;

/// Subset of the media probe's JSON report
#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<JsonValue>,
}

impl ProbeOutput {
    fn video_streams(&self) -> Vec<&JsonValue> {
        self.streams
            .iter()
            .filter(|stream| stream.get("codec_type").and_then(JsonValue::as_str) == Some("video"))
            .collect()
    }
}

/// Transcodes a video to H.264 and uploads it next to the original
///
/// The remote folder is tagged for annotation and carries the probe
/// description of the source video stream.
#[instrument(
    skip_all,
    fields(
        input = %input.input_path.display(),
        folder = %input.folder_id,
        auxiliary = %input.auxiliary_folder_id
    )
)]
pub async fn convert_video(ctx: &TaskContext, input: &ConvertVideoInput) -> Result<UploadedFile> {
    let storage = ctx.storage.with_token(&input.token);

    let source = list_files(&input.input_path)?
        .into_iter()
        .next()
        .ok_or_else(|| TaskError::NoMediaFound {
            path: input.input_path.clone(),
        })?;

    let video_stream = probe_video_stream(ctx, &source).await?;

    let workdir = ctx.scratch_dir("transcode-")?;
    let output = workdir.path().join(transcoded_name(&source));

    let spec = command::transcode_video(&ctx.config.ffmpeg, &source, &output);
    let result = ctx
        .runner
        .run(&spec, RunMode::WaitForExit, ctx.log.as_ref())
        .await?;
    enforce_exit_policy(
        &result,
        TaskKind::ConvertVideo.exit_policy(),
        &ctx.config.ffmpeg,
        ctx.log.as_ref(),
    )?;

    let uploaded = storage
        .upload_file_to_folder(&input.folder_id, &output)
        .await?;
    info!("Uploaded {} as item {}", output.display(), uploaded.item_id);

    storage
        .add_metadata_to_item(&uploaded.item_id, json!({ "codec": "h264" }))
        .await?;
    storage
        .add_metadata_to_folder(
            &input.folder_id,
            json!({
                "fps": ANNOTATION_FPS,
                "annotate": true,
                "ffprobe_info": video_stream,
            }),
        )
        .await?;

    Ok(uploaded)
}

/// The single video stream of `file`, as described by the media probe
async fn probe_video_stream(ctx: &TaskContext, file: &Path) -> Result<JsonValue> {
    let spec = command::probe(&ctx.config.ffprobe, file);
    let (exit_code, stdout) = ctx.runner.capture_stdout(&spec).await?;
    debug!("Probe of {} exited with {}", file.display(), exit_code);

    let probe: ProbeOutput = serde_json::from_str(&stdout)
        .map_err(|e| TaskError::ProbeFailed(format!("{}: {}", file.display(), e)))?;

    let mut streams = probe.video_streams();
    if streams.len() != 1 {
        return Err(TaskError::UnexpectedStreamCount {
            found: streams.len(),
        });
    }

    Ok(streams.remove(0).clone())
}

/// `clip.avi` becomes `clip.mp4`
fn transcoded_name(source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    format!("{}.mp4", stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_streams_filter() {
        let probe: ProbeOutput = serde_json::from_value(json!({
            "streams": [
                {"index": 0, "codec_type": "video", "codec_name": "mpeg4"},
                {"index": 1, "codec_type": "audio", "codec_name": "mp3"}
            ],
            "format": {"format_name": "avi"}
        }))
        .unwrap();

        let streams = probe.video_streams();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0]["codec_name"], "mpeg4");
    }

    #[test]
    fn test_probe_without_streams() {
        let probe: ProbeOutput = serde_json::from_str("{}").unwrap();
        assert!(probe.video_streams().is_empty());
    }

    #[test]
    fn test_transcoded_name() {
        assert_eq!(transcoded_name(Path::new("/data/in/clip.avi")), "clip.mp4");
        assert_eq!(transcoded_name(Path::new("/data/in/clip.mp4")), "clip.mp4");
        assert_eq!(transcoded_name(Path::new("/data/in/raw")), "raw.mp4");
    }
}
