//! Sightline Worker
//!
//! Discovers analysis pipelines and executes the long-running media tasks
//! the job queue submits.
//!
//! Architecture:
//! - Configuration: toolkit, pipeline and tool locations
//! - Registry: pipeline discovery over the stock and trained directories
//! - Command builder + process runner: external tool invocations
//! - Tasks: run pipeline, train pipeline, convert video, convert images
//! - Training organizer: trainer input layout
//!
//! Tasks reach remote storage only through
//! [`RemoteStorage`](sightline_client::RemoteStorage) and report tool output
//! through a [`JobLog`](log::JobLog).

pub mod command;
pub mod config;
pub mod error;
pub mod log;
pub mod process;
pub mod registry;
pub mod tasks;
pub mod training;

pub use config::WorkerConfig;
pub use error::{Result, TaskError};
pub use registry::{PipelineCatalog, discover};
pub use tasks::{TaskContext, dispatch};
