//! Worker configuration
//!
//! Locations of the analysis toolkit, the pipeline directories and the media
//! tools, plus the storage service the tasks talk to. Built once by the
//! caller and handed to every task through the task context.

use std::path::PathBuf;
use tracing::warn;

/// Default installation root of the analysis toolkit
pub const DEFAULT_TOOLKIT_ROOT: &str = "/opt/noaa/viame";

/// Default storage API base URL
pub const DEFAULT_STORAGE_URL: &str = "http://localhost:8080/api/v1";

/// Worker configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Directory of stock pipeline definitions
    pub pipelines_path: Option<PathBuf>,

    /// Directory where trained pipelines are published
    pub trained_pipelines_path: Option<PathBuf>,

    /// Installation root of the analysis toolkit (holds `setup_viame.sh`)
    pub toolkit_root: PathBuf,

    /// Media transcoder executable
    pub ffmpeg: String,

    /// Media prober executable
    pub ffprobe: String,

    /// Parent directory for scratch and output directories.
    /// The system temp directory is used when unset.
    pub scratch_root: Option<PathBuf>,

    /// Storage API base URL (e.g., "http://localhost:8080/api/v1")
    pub storage_url: String,
}

impl WorkerConfig {
    /// Creates a new configuration with defaults
    pub fn new(toolkit_root: impl Into<PathBuf>) -> Self {
        Self {
            pipelines_path: None,
            trained_pipelines_path: None,
            toolkit_root: toolkit_root.into(),
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            scratch_root: None,
            storage_url: DEFAULT_STORAGE_URL.to_string(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - VIAME_PIPELINES_PATH
    /// - VIAME_TRAINED_PIPELINES_PATH
    /// - VIAME_INSTALL_PATH (default: /opt/noaa/viame)
    /// - SIGHTLINE_FFMPEG (default: ffmpeg)
    /// - SIGHTLINE_FFPROBE (default: ffprobe)
    /// - SIGHTLINE_SCRATCH_DIR
    /// - SIGHTLINE_STORAGE_URL (default: http://localhost:8080/api/v1)
    ///
    /// Pipeline directories that do not exist are dropped with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Creates configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let toolkit_root =
            var("VIAME_INSTALL_PATH").unwrap_or_else(|| DEFAULT_TOOLKIT_ROOT.to_string());
        let mut config = Self::new(toolkit_root);

        config.pipelines_path = existing_dir("VIAME_PIPELINES_PATH", var("VIAME_PIPELINES_PATH"));
        config.trained_pipelines_path = existing_dir(
            "VIAME_TRAINED_PIPELINES_PATH",
            var("VIAME_TRAINED_PIPELINES_PATH"),
        );

        if let Some(ffmpeg) = var("SIGHTLINE_FFMPEG") {
            config.ffmpeg = ffmpeg;
        }
        if let Some(ffprobe) = var("SIGHTLINE_FFPROBE") {
            config.ffprobe = ffprobe;
        }

        config.scratch_root = var("SIGHTLINE_SCRATCH_DIR").map(PathBuf::from);

        if let Some(url) = var("SIGHTLINE_STORAGE_URL") {
            config.storage_url = url;
        }

        config
    }

    pub fn with_pipelines_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.pipelines_path = Some(path.into());
        self
    }

    pub fn with_trained_pipelines_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.trained_pipelines_path = Some(path.into());
        self
    }

    pub fn with_scratch_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(path.into());
        self
    }

    /// Directory pipeline names are resolved against
    ///
    /// Falls back to the toolkit's bundled pipelines when no pipelines
    /// directory is configured.
    pub fn pipeline_base(&self) -> PathBuf {
        match &self.pipelines_path {
            Some(path) => path.clone(),
            None => self.toolkit_root.join("configs").join("pipelines"),
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.toolkit_root.as_os_str().is_empty() {
            anyhow::bail!("toolkit_root cannot be empty");
        }

        if self.ffmpeg.is_empty() {
            anyhow::bail!("ffmpeg cannot be empty");
        }

        if self.ffprobe.is_empty() {
            anyhow::bail!("ffprobe cannot be empty");
        }

        if !self.storage_url.starts_with("http://") && !self.storage_url.starts_with("https://") {
            anyhow::bail!("storage_url must start with http:// or https://");
        }

        if let Some(root) = &self.scratch_root {
            if !root.is_dir() {
                anyhow::bail!("scratch_root {} is not a directory", root.display());
            }
        }

        Ok(())
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TOOLKIT_ROOT)
    }
}

fn existing_dir(name: &str, value: Option<String>) -> Option<PathBuf> {
    let path = PathBuf::from(value?);
    if path.is_dir() {
        Some(path)
    } else {
        warn!("{} is set to {} which does not exist", name, path.display());
        None
    }
}
