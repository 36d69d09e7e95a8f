//! Error types for orchestration operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while assembling or running orchestration commands
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// A bare `--volume` token points at a host directory that was never created
    #[error(
        "Bind-mount volume directory {} does not exist. It must first be created with the '{command}' command.",
        path.display()
    )]
    MissingBindMount { path: PathBuf, command: String },

    /// The orchestration tool (or a shell it spawned) exited non-zero
    #[error("{program} exited with code {code}")]
    ExternalProcessFailure { program: String, code: i32 },

    /// The orchestration tool could not be started at all
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create backup archive {}: {reason}", path.display())]
    ArchiveCreationFailure { path: PathBuf, reason: String },

    #[error("Failed to delete dump file {}: {reason}", path.display())]
    CleanupFailure { path: PathBuf, reason: String },

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl OrchestratorError {
    /// Exit status the binary should terminate with for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            OrchestratorError::ExternalProcessFailure { code, .. } => *code,
            _ => 1,
        }
    }
}

/// Remote upload failures, all of them non-fatal for the backup pipeline
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("The backup file {} was not found", .0.display())]
    ArchiveNotFound(PathBuf),

    #[error("The S3 credential is not available: {0}")]
    CredentialsRejected(String),

    #[error("Upload failed: {0}")]
    Remote(String),
}

/// Configuration lookup failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Missing configuration key: {0}")]
    MissingKey(String),

    #[error("Configuration key {key} should be of type {expected}")]
    TypeMismatch { key: String, expected: &'static str },
}
