//! Task domain types
//!
//! Task inputs are constructed by the caller (the job queue) and stay
//! immutable for the lifetime of a task. Each task kind reports a result of
//! a statically known shape through [`TaskOutput`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::domain::process::ExitPolicy;
use crate::domain::storage::FolderRef;

/// Kind of media a pipeline run consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaType {
    Video,
    ImageSequence,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Video => "video",
            MediaType::ImageSequence => "image-sequence",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media type tag outside the supported set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown input type: {0}")]
pub struct UnsupportedMediaType(pub String);

impl FromStr for MediaType {
    type Err = UnsupportedMediaType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(MediaType::Video),
            "image-sequence" => Ok(MediaType::ImageSequence),
            other => Err(UnsupportedMediaType(other.to_string())),
        }
    }
}

/// Input of a pipeline run
///
/// The media type is kept as the raw tag so an unknown tag is rejected by the
/// task itself rather than by deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunPipelineInput {
    pub input_path: PathBuf,
    pub pipeline: String,
    pub media_type: String,
}

/// Input of a training run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainPipelineInput {
    pub folder: FolderRef,
    /// Path of the groundtruth file (or its folder) relative to `folder`
    pub groundtruth: String,
    /// Base name of the resulting pipeline
    pub pipeline_name: String,
}

/// Input of a video conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertVideoInput {
    pub input_path: PathBuf,
    pub folder_id: String,
    pub token: String,
    pub auxiliary_folder_id: String,
}

/// Input of an image folder conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertImagesInput {
    pub folder_id: String,
}

/// The four task kinds the worker executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    RunPipeline,
    TrainPipeline,
    ConvertVideo,
    ConvertImages,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::RunPipeline => "run_pipeline",
            TaskKind::TrainPipeline => "train_pipeline",
            TaskKind::ConvertVideo => "convert_video",
            TaskKind::ConvertImages => "convert_images",
        }
    }

    /// Exit status policy applied to the main external tool of this task
    ///
    /// Training and video transcoding do not fail on a nonzero exit status;
    /// the status is logged as a warning instead.
    pub fn exit_policy(&self) -> ExitPolicy {
        match self {
            TaskKind::RunPipeline | TaskKind::ConvertImages => ExitPolicy::Checked,
            TaskKind::TrainPipeline | TaskKind::ConvertVideo => ExitPolicy::Unchecked,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a task, one variant per task kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskOutput {
    /// Detection or track CSV produced by a pipeline run
    Detections { path: PathBuf },
    /// Persistent training output directory
    TrainedModel {
        output_dir: PathBuf,
        /// Copy of the trained pipeline in the trained-pipelines directory
        pipeline_file: Option<PathBuf>,
    },
    /// Item created for the transcoded video
    VideoConverted { item_id: String },
    /// Number of images converted and replaced
    ImagesConverted { count: usize },
}
