//! Backup pipeline - export, archive, clean up, upload

use crate::backup::archive;
use crate::backup::upload::{ObjectStoreUploader, RemoteBackupSettings, Uploader};
use crate::backup::{BackupEvent, BackupReport, BackupStage, StageOutcome, StageReport};
use crate::compose::JobRunner;
use crate::core::{config, paths, Config, ConfigError, OrchestratorError};
use crate::process::ProcessRunner;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Timestamp embedded in dump and archive names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Data directories copied verbatim into every archive
const DATA_DIRS: [&str; 3] = ["cms", "lms", "openedx-media"];

/// A dump written inside a container and visible on the host through its data volume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpFile {
    pub service: &'static str,
    pub host_path: PathBuf,
    pub container_path: String,
}

/// Every path a backup run touches, derived from the root, config and time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPlan {
    pub timestamp: String,
    pub mongodb_dump: DumpFile,
    pub mysql_dump: DumpFile,
    pub data_dirs: Vec<PathBuf>,
    pub config_file: PathBuf,
    pub archive_name: String,
    pub archive_path: PathBuf,
}

impl BackupPlan {
    pub fn new(root: &Path, config: &Config, now: NaiveDateTime) -> Result<Self, ConfigError> {
        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        let mongodb_name = format!("dump_{}.mongodb", timestamp);
        let mysql_name = format!("dump_{}.sql", timestamp);
        let archive_name = format!("{}_{}.tar.gz", config.get_str("LMS_HOST")?, timestamp);

        Ok(Self {
            mongodb_dump: DumpFile {
                service: "mongodb",
                host_path: paths::data_path(root, &["mongodb", &mongodb_name]),
                container_path: format!("/data/db/{}", mongodb_name),
            },
            mysql_dump: DumpFile {
                service: "mysql",
                host_path: paths::data_path(root, &["mysql", &mysql_name]),
                container_path: format!("/var/lib/mysql/{}", mysql_name),
            },
            data_dirs: DATA_DIRS
                .iter()
                .map(|dir| paths::data_path(root, &[dir]))
                .collect(),
            config_file: config::config_path(root),
            archive_path: paths::data_path(root, &["backup", &archive_name]),
            archive_name,
            timestamp,
        })
    }

    pub fn dumps(&self) -> [&DumpFile; 2] {
        [&self.mongodb_dump, &self.mysql_dump]
    }

    /// Archive contents in order: dumps, data directories, configuration
    pub fn sources(&self) -> Vec<PathBuf> {
        let mut sources = vec![
            self.mongodb_dump.host_path.clone(),
            self.mysql_dump.host_path.clone(),
        ];
        sources.extend(self.data_dirs.iter().cloned());
        sources.push(self.config_file.clone());
        sources
    }
}

/// Handler invoked for every pipeline event
pub type EventHandler = Box<dyn Fn(&BackupEvent) + Send + Sync>;

/// Runs a backup against one profile's running services
pub struct BackupPipeline<'a, P> {
    runner: &'a JobRunner<P>,
    root: PathBuf,
    config: &'a Config,
    uploader: Option<Arc<dyn Uploader>>,
    handlers: Vec<EventHandler>,
    remove_host: fn(&Path) -> std::io::Result<()>,
}

impl<'a, P: ProcessRunner> BackupPipeline<'a, P> {
    pub fn new(runner: &'a JobRunner<P>, root: impl Into<PathBuf>, config: &'a Config) -> Self {
        Self {
            runner,
            root: root.into(),
            config,
            uploader: None,
            handlers: Vec::new(),
            remove_host: remove_path,
        }
    }

    /// Use this uploader instead of building an S3 one from configuration
    pub fn with_uploader(mut self, uploader: Arc<dyn Uploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(&BackupEvent) + Send + Sync + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    fn emit(&self, event: BackupEvent) {
        for handler in &self.handlers {
            handler(&event);
        }
    }

    pub async fn run(&self) -> Result<BackupReport, OrchestratorError> {
        self.run_at(chrono::Local::now().naive_local()).await
    }

    /// Run every stage for a backup stamped with `now`.
    ///
    /// Configuration problems are returned as errors before any stage runs.
    /// Stage failures are recorded in the report; use
    /// [`BackupReport::into_result`] to surface a fatal one.
    pub async fn run_at(&self, now: NaiveDateTime) -> Result<BackupReport, OrchestratorError> {
        let plan = BackupPlan::new(&self.root, self.config, now)?;
        let password = self.config.get_str("MYSQL_ROOT_PASSWORD")?.to_string();
        let remote = RemoteBackupSettings::from_config(self.config)?;
        let mut report = BackupReport::new(&plan);

        info!("Starting backup {}", plan.archive_name);

        // Exports are not transactional: a failure in either one aborts the
        // run, and whatever was already dumped is removed rather than orphaned.
        self.emit(BackupEvent::StageStarted { stage: BackupStage::ExportMongodb });
        let outcome = self
            .export(&plan.mongodb_dump, vec![
                "mongodump".to_string(),
                format!("--out={}", plan.mongodb_dump.container_path),
            ])
            .await;
        if self.finish(&mut report, BackupStage::ExportMongodb, outcome, "Exported mongo databases successfully") {
            self.cleanup_stage(&mut report, &plan).await;
            return Ok(report);
        }

        self.emit(BackupEvent::StageStarted { stage: BackupStage::ExportMysql });
        let outcome = self
            .export(&plan.mysql_dump, vec![
                "mysqldump".to_string(),
                "--all-databases".to_string(),
                "-u".to_string(),
                "root".to_string(),
                format!("--password={}", password),
                format!("--result-file={}", plan.mysql_dump.container_path),
            ])
            .await;
        if self.finish(&mut report, BackupStage::ExportMysql, outcome, "Exported mysql databases successfully") {
            self.cleanup_stage(&mut report, &plan).await;
            return Ok(report);
        }

        self.emit(BackupEvent::StageStarted { stage: BackupStage::Archive });
        let outcome = self.archive(&plan).await;
        let message = format!("Created backup file {} successfully", plan.archive_name);
        if self.finish(&mut report, BackupStage::Archive, outcome, message) {
            // The dumps are the only copy of this export: leave them for recovery
            for dump in plan.dumps() {
                warn!("Keeping {} dump at {}", dump.service, dump.host_path.display());
            }
            return Ok(report);
        }

        self.cleanup_stage(&mut report, &plan).await;

        self.emit(BackupEvent::StageStarted { stage: BackupStage::Upload });
        let outcome = self.upload(&plan, remote, &mut report).await;
        let message = format!("Uploaded backup file {} successfully", plan.archive_name);
        self.finish(&mut report, BackupStage::Upload, outcome, message);

        Ok(report)
    }

    /// Record a stage outcome and emit its event; returns true if fatal
    fn finish(
        &self,
        report: &mut BackupReport,
        stage: BackupStage,
        outcome: StageOutcome,
        message: impl Into<String>,
    ) -> bool {
        let event = match &outcome {
            StageOutcome::Completed => {
                let message = message.into();
                info!("{}", message);
                BackupEvent::StageCompleted { stage, message }
            }
            StageOutcome::Skipped(reason) => {
                info!("{} skipped: {}", stage, reason);
                BackupEvent::StageSkipped { stage, reason: reason.clone() }
            }
            StageOutcome::Degraded(err) => {
                warn!("{} failed, continuing: {}", stage, err);
                BackupEvent::StageDegraded { stage, error: err.to_string() }
            }
            StageOutcome::Fatal(err) => {
                error!("{} failed: {}", stage, err);
                BackupEvent::StageFailed { stage, error: err.to_string() }
            }
        };
        self.emit(event);

        let fatal = outcome.is_fatal();
        report.stages.push(StageReport { stage, outcome });
        fatal
    }

    /// `exec [-T] <service> <command..>`; no pseudo-TTY without a terminal
    fn exec_args(&self, service: &str, command: Vec<String>) -> Vec<String> {
        let mut args = vec!["exec".to_string()];
        if !self.runner.is_interactive() {
            args.push("-T".to_string());
        }
        args.push(service.to_string());
        args.extend(command);
        args
    }

    async fn export(&self, dump: &DumpFile, command: Vec<String>) -> StageOutcome {
        let args = self.exec_args(dump.service, command);
        match self.runner.docker_compose_checked(&args).await {
            Ok(()) => StageOutcome::Completed,
            Err(e) => StageOutcome::Fatal(e),
        }
    }

    async fn archive(&self, plan: &BackupPlan) -> StageOutcome {
        let dest = plan.archive_path.clone();
        let sources = plan.sources();
        match tokio::task::spawn_blocking(move || archive::create_archive(&dest, &sources)).await {
            Ok(Ok(())) => StageOutcome::Completed,
            Ok(Err(e)) => StageOutcome::Fatal(e),
            Err(join) => StageOutcome::Fatal(OrchestratorError::ArchiveCreationFailure {
                path: plan.archive_path.clone(),
                reason: join.to_string(),
            }),
        }
    }

    async fn cleanup_stage(&self, report: &mut BackupReport, plan: &BackupPlan) {
        self.emit(BackupEvent::StageStarted { stage: BackupStage::Cleanup });
        let outcome = self.cleanup(plan).await;
        self.finish(report, BackupStage::Cleanup, outcome, "Removed database dump files");
    }

    /// Best-effort removal of both dumps; every failure is logged
    async fn cleanup(&self, plan: &BackupPlan) -> StageOutcome {
        let mut first_failure = None;
        for dump in plan.dumps() {
            if let Err(e) = self.remove_dump(dump).await {
                warn!("Delete dump file failed: {}", e);
                first_failure.get_or_insert(e);
            }
        }
        match first_failure {
            None => StageOutcome::Completed,
            Some(e) => StageOutcome::Degraded(e),
        }
    }

    /// Remove a dump from the host. Dumps are written by the container's
    /// user, so a permission error falls back to removing it in-container.
    async fn remove_dump(&self, dump: &DumpFile) -> Result<(), OrchestratorError> {
        let host_err = match (self.remove_host)(&dump.host_path) {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => e,
            Err(e) => {
                return Err(OrchestratorError::CleanupFailure {
                    path: dump.host_path.clone(),
                    reason: e.to_string(),
                })
            }
        };

        warn!(
            "No permission to delete {}, removing it from the {} container",
            dump.host_path.display(),
            dump.service
        );
        let args = self.exec_args(
            dump.service,
            vec!["rm".to_string(), "-rf".to_string(), dump.container_path.clone()],
        );
        self.runner
            .docker_compose_checked(&args)
            .await
            .map_err(|e| OrchestratorError::CleanupFailure {
                path: dump.host_path.clone(),
                reason: format!("{} ({})", host_err, e),
            })
    }

    async fn upload(
        &self,
        plan: &BackupPlan,
        remote: Option<RemoteBackupSettings>,
        report: &mut BackupReport,
    ) -> StageOutcome {
        let Some(settings) = remote else {
            return StageOutcome::Skipped("BACKUP_ENABLED is not set".to_string());
        };

        let uploader: Arc<dyn Uploader> = match &self.uploader {
            Some(uploader) => uploader.clone(),
            None => match ObjectStoreUploader::s3(&settings) {
                Ok(uploader) => Arc::new(uploader),
                Err(e) => return StageOutcome::Degraded(e.into()),
            },
        };

        if let Err(e) = uploader.upload(&plan.archive_path, &plan.archive_name).await {
            return StageOutcome::Degraded(e.into());
        }
        report.uploaded = true;

        if let Err(e) = std::fs::remove_file(&plan.archive_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Uploaded, but failed to delete local archive {}: {}", plan.archive_path.display(), e);
            }
        }
        StageOutcome::Completed
    }
}

/// Remove a file or directory tree; a path that is already gone is fine
fn remove_path(path: &Path) -> std::io::Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path),
        Ok(_) => std::fs::remove_file(path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
