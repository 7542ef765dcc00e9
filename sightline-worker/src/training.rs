//! Training data organizer
//!
//! Reshapes a downloaded folder into the layout the trainer reads:
//!
//! ```text
//! <root>/
//!   labels.txt              one class label per line
//!   <data_dir>/
//!     groundtruth.csv       annotations in the toolkit's CSV format
//!     ...media...
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, TaskError};

/// Name the groundtruth is moved to inside the data directory
pub const GROUNDTRUTH_FILE: &str = "groundtruth.csv";

/// Label list written at the trainer input root
pub const LABELS_FILE: &str = "labels.txt";

/// First column holding a class name; class/score pairs follow
const FIRST_CLASS_COLUMN: usize = 9;

/// Paths produced by [`organize_folder_for_training`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingLayout {
    pub groundtruth: PathBuf,
    pub labels_file: PathBuf,
    pub labels: Vec<String>,
}

/// Prepares `root` for training
///
/// # Arguments
/// * `root` - Trainer input root
/// * `data_dir` - Directory holding the media, below `root`
/// * `groundtruth` - A groundtruth CSV file, or a directory containing one
///
/// # Returns
/// The final groundtruth location and the labels found in it
pub fn organize_folder_for_training(
    root: &Path,
    data_dir: &Path,
    groundtruth: &Path,
) -> Result<TrainingLayout> {
    let source = resolve_groundtruth(groundtruth)?;
    let target = data_dir.join(GROUNDTRUTH_FILE);

    if source != target {
        fs::rename(&source, &target).map_err(|e| {
            TaskError::io(
                format!(
                    "Failed to move groundtruth {} to {}",
                    source.display(),
                    target.display()
                ),
                e,
            )
        })?;
        debug!("Moved groundtruth {} to {}", source.display(), target.display());
    }

    let labels = read_labels(&target)?;
    let labels_file = root.join(LABELS_FILE);
    let mut contents = labels.join("\n");
    if !contents.is_empty() {
        contents.push('\n');
    }
    fs::write(&labels_file, contents)
        .map_err(|e| TaskError::io(format!("Failed to write {}", labels_file.display()), e))?;

    info!(
        "Organized training data in {} with {} labels",
        root.display(),
        labels.len()
    );

    Ok(TrainingLayout {
        groundtruth: target,
        labels_file,
        labels,
    })
}

/// A groundtruth file as is, or the first `*.csv` of a directory
fn resolve_groundtruth(path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    if path.is_dir() {
        let entries = fs::read_dir(path)
            .map_err(|e| TaskError::io(format!("Failed to list {}", path.display()), e))?;

        let mut candidates: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && has_csv_extension(p))
            .collect();
        candidates.sort();

        if let Some(first) = candidates.into_iter().next() {
            return Ok(first);
        }
    }

    Err(TaskError::MissingGroundtruth {
        path: path.to_path_buf(),
    })
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Unique class labels in first-seen order
///
/// Comment lines start with `#`. Columns from the tenth on hold
/// `class, score` pairs; attribute columns start with `(` and end the pairs.
fn read_labels(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| TaskError::Groundtruth {
            path: path.to_path_buf(),
            source,
        })?;

    let mut seen = HashSet::new();
    let mut labels = Vec::new();

    for record in reader.records() {
        let record = record.map_err(|source| TaskError::Groundtruth {
            path: path.to_path_buf(),
            source,
        })?;

        let classes = record
            .iter()
            .skip(FIRST_CLASS_COLUMN)
            .step_by(2)
            .take_while(|field| !field.starts_with('('));

        for class in classes.filter(|field| !field.is_empty()) {
            if seen.insert(class.to_string()) {
                labels.push(class.to_string());
            }
        }
    }

    Ok(labels)
}
