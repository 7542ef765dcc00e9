//! Pipeline domain types
//!
//! A pipeline is an external processing graph definition (`*.pipe`) consumed
//! by the analysis runner. The worker never parses its content; it only
//! classifies pipeline files by their names.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// File extension of pipeline definition files
pub const PIPELINE_EXTENSION: &str = ".pipe";

/// A runnable pipeline as exposed to callers
///
/// `pipe_type` and `name` are derived from the filename: the first
/// underscore-separated token is the type, the remaining tokens joined by a
/// single space form the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub pipe_type: String,
    /// Bare filename of the definition, relative to its pipeline directory
    pub pipe: String,
}

impl PipelineDescriptor {
    /// Builds a descriptor from a pipeline filename
    ///
    /// Returns `None` when the filename does not end in `.pipe`.
    ///
    /// # Example
    /// ```
    /// use sightline_core::domain::pipeline::PipelineDescriptor;
    ///
    /// let pipe = PipelineDescriptor::from_filename("detector_simple_hough.pipe").unwrap();
    /// assert_eq!(pipe.pipe_type, "detector");
    /// assert_eq!(pipe.name, "simple hough");
    /// ```
    pub fn from_filename(filename: &str) -> Option<Self> {
        let stem = filename.strip_suffix(PIPELINE_EXTENSION)?;
        let mut parts = stem.split('_');
        let pipe_type = parts.next().unwrap_or_default().to_string();
        let name = parts.collect::<Vec<_>>().join(" ");

        Some(Self {
            name,
            pipe_type,
            pipe: filename.to_string(),
        })
    }
}

/// All pipelines of one type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineCategory {
    pub pipes: Vec<PipelineDescriptor>,
    pub description: String,
}

/// Pipelines grouped by type
///
/// Serialized as a plain object keyed by type. Order within a type follows
/// insertion (directory scan) order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineRegistry {
    categories: BTreeMap<String, PipelineCategory>,
}

impl PipelineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a descriptor to its type, creating the type on first occurrence
    pub fn insert(&mut self, descriptor: PipelineDescriptor) {
        self.categories
            .entry(descriptor.pipe_type.clone())
            .or_default()
            .pipes
            .push(descriptor);
    }

    pub fn get(&self, pipe_type: &str) -> Option<&PipelineCategory> {
        self.categories.get(pipe_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PipelineCategory)> {
        self.categories.iter()
    }

    /// Number of pipeline types
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Total number of pipelines across all types
    pub fn pipeline_count(&self) -> usize {
        self.categories.values().map(|c| c.pipes.len()).sum()
    }
}
