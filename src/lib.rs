//! tutor-compose - layered docker-compose orchestration for an Open edX platform

pub mod backup;
pub mod cli;
pub mod compose;
pub mod core;
pub mod process;

// Re-export commonly used types
pub use backup::{BackupEvent, BackupPipeline, BackupReport, BackupStage, StageOutcome};
pub use compose::{BindMounts, ComposeFileSet, ComposeProfile, JobRunner, ProfileKind};
pub use core::{Config, ConfigValue, OrchestratorError, UploadError};
pub use process::{ComposeInvoker, ComposeProgram, ProcessRunner};
