//! Core domain types
//!
//! These types describe the entities the worker reasons about. They carry no
//! behaviour beyond construction helpers; discovery and execution live in the
//! worker crate.

pub mod log;
pub mod pipeline;
pub mod process;
pub mod storage;
pub mod task;
