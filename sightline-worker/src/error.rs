//! Task error types

use sightline_client::ClientError;
use sightline_core::domain::task::UnsupportedMediaType;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TaskError>;

/// Errors that abort a task
#[derive(Debug, Error)]
pub enum TaskError {
    /// The input directory holds no usable media file
    #[error("No media files found in {}", path.display())]
    NoMediaFound { path: PathBuf },

    #[error(transparent)]
    UnsupportedMediaType(#[from] UnsupportedMediaType),

    /// The analysis runner exited with a nonzero status
    #[error("Pipeline exited with nonzero status code {exit_code}: {output}")]
    PipelineExecutionFailed { exit_code: i32, output: String },

    #[error("Expected 1 video stream, found {found}")]
    UnexpectedStreamCount { found: usize },

    #[error("No groundtruth found at {}", path.display())]
    MissingGroundtruth { path: PathBuf },

    #[error("Failed to read probe output: {0}")]
    ProbeFailed(String),

    /// A checked external tool exited with a nonzero status
    #[error("{program} exited with nonzero status code {exit_code}")]
    ToolFailed {
        program: String,
        exit_code: i32,
        output: String,
    },

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Storage request failed: {0}")]
    Storage(#[from] ClientError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid groundtruth file {}: {source}", path.display())]
    Groundtruth {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl TaskError {
    /// Wraps an I/O error with a description of the failed operation
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = TaskError::NoMediaFound {
            path: PathBuf::from("/data/in"),
        };
        assert_eq!(err.to_string(), "No media files found in /data/in");

        let err: TaskError = UnsupportedMediaType("audio".to_string()).into();
        assert_eq!(err.to_string(), "Unknown input type: audio");

        let err = TaskError::UnexpectedStreamCount { found: 2 };
        assert_eq!(err.to_string(), "Expected 1 video stream, found 2");
    }

    #[test]
    fn test_storage_conversion() {
        let err: TaskError = ClientError::api_error(404, "missing").into();
        assert!(matches!(err, TaskError::Storage(ClientError::ApiError { status: 404, .. })));
    }
}
