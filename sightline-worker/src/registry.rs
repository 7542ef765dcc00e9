//! Pipeline discovery
//!
//! Scans the stock and trained pipeline directories and groups the runnable
//! pipelines by type. Stock pipelines are filtered by name; every trained
//! pipeline is listed.

use regex::Regex;
use sightline_core::domain::pipeline::{PIPELINE_EXTENSION, PipelineDescriptor, PipelineRegistry};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::config::WorkerConfig;

static ALLOWED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:detector_.+|tracker_.+)$").expect("allow pattern is valid")
});

static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:.*local.*|detector_svm_models\.pipe|tracker_svm_models\.pipe)$")
        .expect("disallow pattern is valid")
});

/// Whether a stock pipeline filename is exposed to callers
pub fn is_allowed(filename: &str) -> bool {
    ALLOWED.is_match(filename) && !DISALLOWED.is_match(filename)
}

/// Builds the pipeline registry from the two pipeline directories
///
/// Missing directories contribute nothing. Never fails.
///
/// # Arguments
/// * `main_dir` - Stock pipelines, filtered with [`is_allowed`]
/// * `trained_dir` - Trained pipelines, all included
pub fn discover(main_dir: Option<&Path>, trained_dir: Option<&Path>) -> PipelineRegistry {
    let mut filenames = Vec::new();

    match main_dir {
        Some(dir) => filenames.extend(
            list_pipe_files(dir)
                .into_iter()
                .filter(|name| is_allowed(name)),
        ),
        None => warn!("Pipelines directory is not configured"),
    }

    match trained_dir {
        Some(dir) => filenames.extend(list_pipe_files(dir)),
        None => warn!("Trained pipelines directory is not configured"),
    }

    let mut registry = PipelineRegistry::new();
    for descriptor in filenames
        .iter()
        .filter_map(|name| PipelineDescriptor::from_filename(name))
    {
        registry.insert(descriptor);
    }

    debug!(
        "Discovered {} pipelines in {} categories",
        registry.pipeline_count(),
        registry.len()
    );
    registry
}

/// Bare names of the regular `*.pipe` files in `dir`, in glob order
fn list_pipe_files(dir: &Path) -> Vec<String> {
    if !dir.is_dir() {
        warn!("Pipeline directory {} does not exist", dir.display());
        return Vec::new();
    }

    let pattern = format!(
        "{}/*{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        PIPELINE_EXTENSION
    );
    let options = glob::MatchOptions {
        require_literal_leading_dot: true,
        ..Default::default()
    };

    let paths = match glob::glob_with(&pattern, options) {
        Ok(paths) => paths,
        Err(e) => {
            warn!("Invalid pipeline pattern {}: {}", pattern, e);
            return Vec::new();
        }
    };

    paths
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable pipeline entry: {}", e);
                None
            }
        })
        .filter(|path| path.is_file())
        .filter_map(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .collect()
}

/// Live view over the configured pipeline directories
///
/// Every call re-scans the filesystem, so pipelines added after startup
/// (e.g. freshly trained ones) show up immediately.
#[derive(Debug, Clone, Default)]
pub struct PipelineCatalog {
    main_dir: Option<PathBuf>,
    trained_dir: Option<PathBuf>,
}

impl PipelineCatalog {
    pub fn new(main_dir: Option<PathBuf>, trained_dir: Option<PathBuf>) -> Self {
        Self {
            main_dir,
            trained_dir,
        }
    }

    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(
            config.pipelines_path.clone(),
            config.trained_pipelines_path.clone(),
        )
    }

    pub fn list(&self) -> PipelineRegistry {
        discover(self.main_dir.as_deref(), self.trained_dir.as_deref())
    }

    /// Full path of a pipeline file, preferring the stock directory
    pub fn resolve(&self, pipe: &str) -> Option<PathBuf> {
        [self.main_dir.as_deref(), self.trained_dir.as_deref()]
            .into_iter()
            .flatten()
            .map(|dir| dir.join(pipe))
            .find(|path| path.is_file())
    }
}
