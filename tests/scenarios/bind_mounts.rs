//! Test: Bind mounts - creation and resolution of `--volume` arguments

use crate::helpers::*;
use std::sync::Arc;
use tutor_compose::compose::commands;
use tutor_compose::{BindMounts, OrchestratorError, ProfileKind};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// `bindmount` copies the directory out of a throwaway root container
#[tokio::test]
async fn test_create_bind_mount() {
    let root = TestRoot::new();
    let process = Arc::new(RecordingRunner::new());
    let runner = root.runner(ProfileKind::Dev, process.clone());
    let mounts = BindMounts::new(root.path());

    let host_path = mounts.create(&runner, "lms", "/openedx/venv").await.unwrap();

    assert_eq!(host_path, root.join("volumes/venv"));
    assert!(root.join("volumes").is_dir());

    let volume = format!("{}:/tmp/volumes", root.join("volumes").display());
    assert_eq!(
        command_part(&process.last_call()),
        vec![
            "run".to_string(),
            "--rm".to_string(),
            "--no-deps".to_string(),
            "--user=0".to_string(),
            "-T".to_string(),
            "--volume".to_string(),
            volume,
            "lms".to_string(),
            "sh".to_string(),
            "-e".to_string(),
            "-c".to_string(),
            "cp -r /openedx/venv /tmp/volumes/".to_string(),
        ]
    );
}

/// A failed copy surfaces the tool's exit code
#[tokio::test]
async fn test_create_bind_mount_failure() {
    let root = TestRoot::new();
    let process = Arc::new(RecordingRunner::new().fail_when("lms", 1));
    let runner = root.runner(ProfileKind::Dev, process.clone());
    let mounts = BindMounts::new(root.path());

    let err = mounts.create(&runner, "lms", "/openedx/venv").await.unwrap_err();

    assert!(matches!(err, OrchestratorError::ExternalProcessFailure { code: 1, .. }));
    assert_eq!(err.exit_code(), 1);
}

/// Bare volume names resolve to their host directory once it exists
#[tokio::test]
async fn test_run_with_created_volume() {
    let root = TestRoot::new();
    std::fs::create_dir_all(root.join("volumes/venv")).unwrap();
    let process = Arc::new(RecordingRunner::new());
    let runner = root.runner(ProfileKind::Dev, process.clone());
    let mounts = BindMounts::new(root.path());

    let args = strings(&["--volume=/openedx/venv", "-v", "/src:/openedx/src", "lms", "bash"]);
    commands::run(&runner, &mounts, &args).await.unwrap();

    let venv = format!("{}:/openedx/venv", root.join("volumes/venv").display());
    assert_eq!(
        command_part(&process.last_call()),
        vec![
            "run".to_string(),
            "--volume".to_string(),
            venv,
            "--volume".to_string(),
            "/src:/openedx/src".to_string(),
            "--rm".to_string(),
            "-T".to_string(),
            "lms".to_string(),
            "bash".to_string(),
        ]
    );
}

/// A missing volume stops the command before anything is spawned
#[tokio::test]
async fn test_missing_volume_spawns_nothing() {
    let root = TestRoot::new();
    let process = Arc::new(RecordingRunner::new());
    let runner = root.runner(ProfileKind::Dev, process.clone());
    let mounts = BindMounts::new(root.path());

    let err = commands::exec(&runner, &mounts, &strings(&["-v", "/openedx/data", "lms", "ls"]))
        .await
        .unwrap_err();

    match &err {
        OrchestratorError::MissingBindMount { path, command } => {
            assert_eq!(path, &root.join("volumes/data"));
            assert_eq!(command, "bindmount");
        }
        other => panic!("expected MissingBindMount, got {:?}", other),
    }
    assert!(err.to_string().contains("bindmount"));
    assert!(process.calls().is_empty());
}
