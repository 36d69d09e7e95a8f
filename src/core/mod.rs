//! Core types shared by every command
//!
//! Configuration snapshot, host path resolution and the error kinds
//! surfaced to the operator.

pub mod config;
pub mod error;
pub mod paths;

pub use config::{Config, ConfigValue};
pub use error::{ConfigError, OrchestratorError, UploadError};
