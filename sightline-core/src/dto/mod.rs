//! Data Transfer Objects for the job queue
//!
//! The job queue hands tasks to the worker as serialized requests. DTOs are
//! the wire shape of those requests.

pub mod task;
