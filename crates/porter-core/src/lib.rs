//! Core types for the porter file-management engine.
//!
//! This crate provides the shared vocabulary used by the filesystem
//! primitives, the archive adapters and the task layer: task kind and
//! status tags, the duplicate-handling policy and the engine-wide
//! configuration.

mod config;
mod error;
mod task;

pub use config::{EngineConfig, EngineConfigBuilder};
pub use error::OpsError;
pub use task::{DuplicatePolicy, TaskStatus, TaskType};
