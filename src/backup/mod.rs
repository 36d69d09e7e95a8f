//! Database and data-directory backups
//!
//! A backup runs five stages in a fixed order. Each stage reports a
//! [`StageOutcome`]; only `Fatal` stops the pipeline.

pub mod archive;
pub mod pipeline;
pub mod upload;

pub use pipeline::{BackupPipeline, BackupPlan, DumpFile};
pub use upload::{ObjectStoreUploader, RemoteBackupSettings, Uploader};

use crate::core::OrchestratorError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Backup stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackupStage {
    ExportMongodb,
    ExportMysql,
    Archive,
    Cleanup,
    Upload,
}

impl BackupStage {
    pub const ALL: [BackupStage; 5] = [
        BackupStage::ExportMongodb,
        BackupStage::ExportMysql,
        BackupStage::Archive,
        BackupStage::Cleanup,
        BackupStage::Upload,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BackupStage::ExportMongodb => "Export MongoDB",
            BackupStage::ExportMysql => "Export MySQL",
            BackupStage::Archive => "Create archive",
            BackupStage::Cleanup => "Remove dumps",
            BackupStage::Upload => "Upload to S3",
        }
    }
}

impl std::fmt::Display for BackupStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// How a stage ended
#[derive(Debug)]
pub enum StageOutcome {
    Completed,
    /// Stage did not apply (e.g. remote upload disabled)
    Skipped(String),
    /// Stage failed but the backup is still usable
    Degraded(OrchestratorError),
    /// Stage failed and the pipeline stopped
    Fatal(OrchestratorError),
}

impl StageOutcome {
    pub fn is_fatal(&self) -> bool {
        matches!(self, StageOutcome::Fatal(_))
    }
}

#[derive(Debug)]
pub struct StageReport {
    pub stage: BackupStage,
    pub outcome: StageOutcome,
}

/// Events emitted while the pipeline runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupEvent {
    StageStarted { stage: BackupStage },
    StageCompleted { stage: BackupStage, message: String },
    StageSkipped { stage: BackupStage, reason: String },
    StageDegraded { stage: BackupStage, error: String },
    StageFailed { stage: BackupStage, error: String },
}

/// Everything that happened during one backup run
#[derive(Debug)]
pub struct BackupReport {
    pub archive_name: String,
    pub archive_path: PathBuf,
    pub stages: Vec<StageReport>,
    pub uploaded: bool,
}

impl BackupReport {
    pub fn new(plan: &BackupPlan) -> Self {
        Self {
            archive_name: plan.archive_name.clone(),
            archive_path: plan.archive_path.clone(),
            stages: Vec::new(),
            uploaded: false,
        }
    }

    pub fn outcome(&self, stage: BackupStage) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|r| r.stage == stage)
            .map(|r| &r.outcome)
    }

    pub fn is_success(&self) -> bool {
        !self.stages.iter().any(|r| r.outcome.is_fatal())
    }

    /// Stages that failed without stopping the pipeline
    pub fn degraded(&self) -> Vec<BackupStage> {
        self.stages
            .iter()
            .filter(|r| matches!(r.outcome, StageOutcome::Degraded(_)))
            .map(|r| r.stage)
            .collect()
    }

    /// Whether the archive is still on local disk
    pub fn archive_retained(&self) -> bool {
        self.archive_path.exists()
    }

    /// Turn a fatal stage into an error, keeping the report otherwise
    pub fn into_result(mut self) -> Result<Self, OrchestratorError> {
        if let Some(index) = self.stages.iter().position(|r| r.outcome.is_fatal()) {
            let report = self.stages.remove(index);
            if let StageOutcome::Fatal(err) = report.outcome {
                return Err(err);
            }
        }
        Ok(self)
    }
}
