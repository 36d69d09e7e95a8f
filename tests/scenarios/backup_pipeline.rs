//! Test: Backup pipeline - stage ordering, failure policy and archive contents

use crate::helpers::*;
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::{Arc, Mutex};
use tutor_compose::{
    BackupEvent, BackupPipeline, BackupStage, OrchestratorError, ProfileKind, StageOutcome,
    UploadError,
};

fn at_noon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 17)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

const ARCHIVE: &str = "learn.example.com_20240517_120000.tar.gz";

fn enable_remote(root: &TestRoot) {
    root.write_config(
        "LMS_HOST: learn.example.com\n\
         MYSQL_ROOT_PASSWORD: s3cret\n\
         BACKUP_ENABLED: true\n\
         BACKUP_S3_ACCESS_KEY: AKIA\n\
         BACKUP_S3_SECRET_KEY: secret\n\
         BACKUP_S3_BUCKET_NAME: backups\n",
    );
}

/// Local-only backup: exports, archives, removes dumps, skips upload
#[tokio::test]
async fn test_local_backup() {
    let root = TestRoot::new();
    let process = Arc::new(RecordingRunner::new().on_call(root.dump_writer()));
    let runner = root.runner(ProfileKind::Local, process.clone());
    let config = root.config();

    let events = Arc::new(Mutex::new(Vec::new()));
    let mut pipeline = BackupPipeline::new(&runner, root.path(), &config);
    let recorded = events.clone();
    pipeline.add_event_handler(move |event| recorded.lock().unwrap().push(event.clone()));

    let report = pipeline.run_at(at_noon()).await.unwrap();

    assert!(report.is_success());
    assert!(!report.uploaded);
    assert_eq!(report.archive_name, ARCHIVE);
    assert!(report.archive_retained());
    assert!(matches!(report.outcome(BackupStage::Upload), Some(StageOutcome::Skipped(_))));

    // Exports run in the database containers, without a TTY
    let commands = process.commands();
    assert_eq!(commands.len(), 2);
    assert_eq!(
        commands[0],
        vec![
            "exec".to_string(),
            "-T".to_string(),
            "mongodb".to_string(),
            "mongodump".to_string(),
            "--out=/data/db/dump_20240517_120000.mongodb".to_string(),
        ]
    );
    assert_eq!(&commands[1][..3], &["exec", "-T", "mysql"]);
    assert!(commands[1].contains(&"--password=s3cret".to_string()));
    assert!(commands[1].contains(&"--result-file=/var/lib/mysql/dump_20240517_120000.sql".to_string()));

    // Flat archive: dumps, data directories and configuration by base name
    assert_eq!(
        archive_roots(&report.archive_path),
        vec![
            "cms",
            "config.yml",
            "dump_20240517_120000.mongodb",
            "dump_20240517_120000.sql",
            "lms",
            "openedx-media",
        ]
    );
    assert_eq!(root.entries("data/backup"), vec![ARCHIVE]);

    // Dumps do not outlive the run
    assert!(root.entries("data/mongodb").is_empty());
    assert!(root.entries("data/mysql").is_empty());

    let stages: Vec<BackupStage> = events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|e| match e {
            BackupEvent::StageStarted { stage } => Some(*stage),
            _ => None,
        })
        .collect();
    assert_eq!(stages, BackupStage::ALL.to_vec());
}

/// A failed export aborts the run and leaves no dump behind
#[tokio::test]
async fn test_export_failure_is_fatal() {
    let root = TestRoot::new();
    let process = Arc::new(
        RecordingRunner::new()
            .fail_when("mysqldump", 2)
            .on_call(root.dump_writer()),
    );
    let runner = root.runner(ProfileKind::Local, process.clone());
    let config = root.config();
    let uploader = MockUploader::new();

    let report = BackupPipeline::new(&runner, root.path(), &config)
        .with_uploader(uploader.clone())
        .run_at(at_noon())
        .await
        .unwrap();

    assert!(!report.is_success());
    assert!(matches!(report.outcome(BackupStage::ExportMongodb), Some(StageOutcome::Completed)));
    assert!(report.outcome(BackupStage::Archive).is_none());
    assert!(report.outcome(BackupStage::Upload).is_none());
    assert!(matches!(report.outcome(BackupStage::Cleanup), Some(StageOutcome::Completed)));

    // The mongo dump written before the failure is removed
    assert!(root.entries("data/mongodb").is_empty());
    assert!(root.entries("data/backup").is_empty());
    assert!(uploader.uploads().is_empty());

    let err = report.into_result().unwrap_err();
    assert!(matches!(err, OrchestratorError::ExternalProcessFailure { code: 2, .. }));
    assert_eq!(err.exit_code(), 2);
}

/// Archive creation needs every source; a missing one is fatal and the
/// dumps are kept, since they are the only copy of the export
#[tokio::test]
async fn test_missing_data_dir_is_fatal() {
    let root = TestRoot::new();
    std::fs::remove_dir_all(root.join("data/openedx-media")).unwrap();
    let process = Arc::new(RecordingRunner::new().on_call(root.dump_writer()));
    let runner = root.runner(ProfileKind::Local, process.clone());
    let config = root.config();

    let report = BackupPipeline::new(&runner, root.path(), &config)
        .run_at(at_noon())
        .await
        .unwrap();

    assert!(matches!(
        report.outcome(BackupStage::Archive),
        Some(StageOutcome::Fatal(OrchestratorError::ArchiveCreationFailure { .. }))
    ));
    assert!(report.outcome(BackupStage::Cleanup).is_none());
    assert!(report.outcome(BackupStage::Upload).is_none());
    assert!(!report.archive_retained());
    assert_eq!(root.entries("data/mongodb"), vec!["dump_20240517_120000.mongodb"]);
    assert_eq!(root.entries("data/mysql"), vec!["dump_20240517_120000.sql"]);
}

/// Upload success removes the local archive
#[tokio::test]
async fn test_upload_success() {
    let root = TestRoot::new();
    enable_remote(&root);
    let process = Arc::new(RecordingRunner::new().on_call(root.dump_writer()));
    let runner = root.runner(ProfileKind::Local, process.clone());
    let config = root.config();
    let uploader = MockUploader::new();

    let report = BackupPipeline::new(&runner, root.path(), &config)
        .with_uploader(uploader.clone())
        .run_at(at_noon())
        .await
        .unwrap();

    assert!(report.is_success());
    assert!(report.uploaded);
    assert!(report.degraded().is_empty());
    assert!(!report.archive_retained());

    let uploads = uploader.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].1, ARCHIVE);
}

/// Upload failure is reported but the backup stays on disk
#[tokio::test]
async fn test_upload_failure_keeps_archive() {
    let root = TestRoot::new();
    enable_remote(&root);
    let process = Arc::new(RecordingRunner::new().on_call(root.dump_writer()));
    let runner = root.runner(ProfileKind::Local, process.clone());
    let config = root.config();

    let report = BackupPipeline::new(&runner, root.path(), &config)
        .with_uploader(MockUploader::rejecting("InvalidAccessKeyId"))
        .run_at(at_noon())
        .await
        .unwrap();

    assert!(report.is_success());
    assert!(!report.uploaded);
    assert_eq!(report.degraded(), vec![BackupStage::Upload]);
    assert!(matches!(
        report.outcome(BackupStage::Upload),
        Some(StageOutcome::Degraded(OrchestratorError::Upload(
            UploadError::CredentialsRejected(_)
        )))
    ));
    assert!(report.archive_retained());
    assert!(report.into_result().is_ok());
}

/// Two runs a second apart produce two distinct archives
#[tokio::test]
async fn test_successive_runs_do_not_collide() {
    let root = TestRoot::new();
    let process = Arc::new(RecordingRunner::new().on_call(root.dump_writer()));
    let runner = root.runner(ProfileKind::Local, process.clone());
    let config = root.config();
    let pipeline = BackupPipeline::new(&runner, root.path(), &config);

    let first = pipeline.run_at(at_noon()).await.unwrap();
    let later = at_noon() + chrono::Duration::seconds(1);
    let second = pipeline.run_at(later).await.unwrap();

    assert_ne!(first.archive_path, second.archive_path);
    assert_eq!(root.entries("data/backup").len(), 2);
}
