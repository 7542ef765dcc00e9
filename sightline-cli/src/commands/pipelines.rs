//! Pipeline listing

use anyhow::{Context, Result};
use colored::*;
use sightline_worker::PipelineCatalog;

use crate::config::Config;

/// List the pipelines of the configured directories
pub fn list_pipelines(config: &Config, json: bool) -> Result<()> {
    let registry = PipelineCatalog::from_config(&config.worker).list();

    if json {
        let output =
            serde_json::to_string_pretty(&registry).context("Failed to serialize pipelines")?;
        println!("{}", output);
        return Ok(());
    }

    if registry.is_empty() {
        println!("{}", "No pipelines found.".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "Found {} pipeline(s) in {} categories:",
            registry.pipeline_count(),
            registry.len()
        )
        .bold()
    );
    println!();

    for (pipe_type, category) in registry.iter() {
        println!("  {} {}", "▸".cyan(), pipe_type.bold());
        for pipe in &category.pipes {
            println!("    {:<32} {}", pipe.name, pipe.pipe.dimmed());
        }
    }

    Ok(())
}
