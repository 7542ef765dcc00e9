//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod pipelines;
mod tasks;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List the available pipelines grouped by type
    Pipelines {
        /// Print the registry as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a pipeline over a directory of media
    RunPipeline {
        /// Directory holding the video or the image sequence
        #[arg(short, long)]
        input: PathBuf,

        /// Pipeline file name (e.g., detector_simple_hough.pipe)
        #[arg(short, long)]
        pipeline: String,

        /// Media type: video or image-sequence
        #[arg(short = 't', long, default_value = "video")]
        media_type: String,
    },
    /// Train a detector on an annotated remote folder
    Train {
        /// Remote folder ID
        #[arg(long)]
        folder_id: String,

        /// Remote folder name, used as the local data directory
        #[arg(long)]
        folder_name: String,

        /// Groundtruth file or directory, relative to the folder
        #[arg(short, long)]
        groundtruth: String,

        /// Name of the resulting pipeline
        #[arg(short, long)]
        name: String,
    },
    /// Transcode a video and upload it to a remote folder
    ConvertVideo {
        /// Directory holding the video
        #[arg(short, long)]
        input: PathBuf,

        /// Destination folder ID
        #[arg(long)]
        folder_id: String,

        /// Auxiliary folder ID
        #[arg(long, default_value = "")]
        auxiliary_folder_id: String,
    },
    /// Replace the non-web images of a remote folder with PNG copies
    ConvertImages {
        /// Remote folder ID
        #[arg(long)]
        folder_id: String,
    },
    /// Run a task request read from a JSON file
    Dispatch {
        /// Path to the request file
        #[arg(short, long)]
        request: PathBuf,
    },
}

/// Handle a CLI command
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Pipelines { json } => pipelines::list_pipelines(config, json),
        Commands::RunPipeline {
            input,
            pipeline,
            media_type,
        } => tasks::run_pipeline(config, input, pipeline, media_type).await,
        Commands::Train {
            folder_id,
            folder_name,
            groundtruth,
            name,
        } => tasks::train(config, folder_id, folder_name, groundtruth, name).await,
        Commands::ConvertVideo {
            input,
            folder_id,
            auxiliary_folder_id,
        } => tasks::convert_video(config, input, folder_id, auxiliary_folder_id).await,
        Commands::ConvertImages { folder_id } => tasks::convert_images(config, folder_id).await,
        Commands::Dispatch { request } => tasks::dispatch_file(config, &request).await,
    }
}
