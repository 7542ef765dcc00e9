//! Sightline Core
//!
//! Core types shared by the Sightline worker, storage client and CLI.
//!
//! This crate contains:
//! - Domain types: pipelines, tasks, process results, logs and storage documents
//! - DTOs: task requests exchanged with the job queue

pub mod domain;
pub mod dto;
