//! Task request DTO

use serde::{Deserialize, Serialize};

use crate::domain::task::{
    ConvertImagesInput, ConvertVideoInput, RunPipelineInput, TaskKind, TrainPipelineInput,
};

/// A task submitted by the job queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum TaskRequest {
    RunPipeline(RunPipelineInput),
    TrainPipeline(TrainPipelineInput),
    ConvertVideo(ConvertVideoInput),
    ConvertImages(ConvertImagesInput),
}

impl TaskRequest {
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskRequest::RunPipeline(_) => TaskKind::RunPipeline,
            TaskRequest::TrainPipeline(_) => TaskKind::TrainPipeline,
            TaskRequest::ConvertVideo(_) => TaskKind::ConvertVideo,
            TaskRequest::ConvertImages(_) => TaskKind::ConvertImages,
        }
    }

    /// Human readable job title
    pub fn title(&self) -> String {
        match self {
            TaskRequest::RunPipeline(input) => format!(
                "Running {} on {}",
                input.pipeline,
                input.input_path.display()
            ),
            TaskRequest::TrainPipeline(input) => {
                format!("Running training on folder: {}", input.folder.name)
            }
            TaskRequest::ConvertVideo(input) => format!(
                "Converting {} to a web friendly format",
                input.input_path.display()
            ),
            TaskRequest::ConvertImages(input) => {
                format!("Converting {} to a web friendly format", input.folder_id)
            }
        }
    }
}
