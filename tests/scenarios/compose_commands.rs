//! Test: Compose commands - file layering, project names and exit codes

use crate::helpers::*;
use std::sync::Arc;
use tutor_compose::compose::commands;
use tutor_compose::ProfileKind;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// `local start` brings everything up with a build, through the local files
#[tokio::test]
async fn test_local_start() {
    let root = TestRoot::new();
    let process = Arc::new(RecordingRunner::new());
    let runner = root.runner(ProfileKind::Local, process.clone());

    let code = commands::start(&runner, false, false, &[]).await.unwrap();

    assert_eq!(code, 0);
    let args = process.last_call();
    assert_eq!(command_part(&args), strings(&["up", "--remove-orphans", "--build"]));
    assert_eq!(project_name(&args).as_deref(), Some("tutor_local"));

    // Only files that exist on disk are passed, foundation first
    let files = compose_files(&args);
    assert_eq!(files.len(), 2);
    assert!(files[0].ends_with("env/local/docker-compose.yml"));
    assert!(files[1].ends_with("env/local/docker-compose.prod.yml"));
}

/// The tool's exit code is handed back untouched
#[tokio::test]
async fn test_exit_code_passthrough() {
    let root = TestRoot::new();
    let process = Arc::new(RecordingRunner::new().fail_when("up", 17));
    let runner = root.runner(ProfileKind::Local, process.clone());

    let code = commands::start(&runner, true, true, &strings(&["lms"])).await.unwrap();

    assert_eq!(code, 17);
    assert_eq!(
        command_part(&process.last_call()),
        strings(&["up", "--remove-orphans", "-d", "lms"])
    );
}

/// Override files are picked up as soon as they appear, without rebuilding the runner
#[tokio::test]
async fn test_override_created_after_construction_is_used() {
    let root = TestRoot::new();
    let process = Arc::new(RecordingRunner::new());
    let runner = root.runner(ProfileKind::Local, process.clone());

    commands::stop(&runner, &[]).await.unwrap();
    root.write("env/local/docker-compose.override.yml", "services: {}\n");
    commands::stop(&runner, &[]).await.unwrap();

    let calls = process.calls();
    assert_eq!(compose_files(&calls[0]).len(), 2);
    let files = compose_files(&calls[1]);
    assert_eq!(files.len(), 3);
    assert!(files[2].ends_with("env/local/docker-compose.override.yml"));
}

/// Dev layers its own files on top of the local foundation, without the prod file
#[tokio::test]
async fn test_dev_layers_on_local() {
    let root = TestRoot::new();
    root.write("env/local/docker-compose.override.yml", "services: {}\n");
    let process = Arc::new(RecordingRunner::new());
    let runner = root.runner(ProfileKind::Dev, process.clone());

    commands::stop(&runner, &[]).await.unwrap();

    let args = process.last_call();
    assert_eq!(project_name(&args).as_deref(), Some("tutor_dev"));
    let files = compose_files(&args);
    assert_eq!(files.len(), 3);
    assert!(files[0].ends_with("env/local/docker-compose.yml"));
    assert!(files[1].ends_with("env/local/docker-compose.override.yml"));
    assert!(files[2].ends_with("env/dev/docker-compose.yml"));
}

/// Two profiles over the same root never share a project name
#[tokio::test]
async fn test_profiles_use_distinct_projects() {
    let root = TestRoot::new();
    root.write_config("LOCAL_PROJECT_NAME: school_prod\nDEV_PROJECT_NAME: school_dev\n");
    let process = Arc::new(RecordingRunner::new());

    let local = root.runner(ProfileKind::Local, process.clone());
    let dev = root.runner(ProfileKind::Dev, process.clone());
    commands::stop(&local, &[]).await.unwrap();
    commands::stop(&dev, &[]).await.unwrap();

    let names: Vec<Option<String>> = process.calls().iter().map(|a| project_name(a)).collect();
    assert_eq!(
        names,
        vec![Some("school_prod".to_string()), Some("school_dev".to_string())]
    );
}

/// `restart openedx` only restarts the enabled web apps and their workers
#[tokio::test]
async fn test_restart_openedx_respects_enabled_apps() {
    let root = TestRoot::new();
    root.write_config("RUN_CMS: false\n");
    let process = Arc::new(RecordingRunner::new());
    let runner = root.runner(ProfileKind::Local, process.clone());

    commands::restart(&runner, &root.config(), &strings(&["openedx", "nginx"]))
        .await
        .unwrap();
    commands::restart(&runner, &root.config(), &strings(&["all", "lms"]))
        .await
        .unwrap();

    assert_eq!(
        process.commands(),
        vec![
            strings(&["restart", "lms", "lms-worker", "nginx"]),
            strings(&["restart"]),
        ]
    );
}

/// A failed stop means no start
#[tokio::test]
async fn test_reboot_stops_on_failure() {
    let root = TestRoot::new();
    let process = Arc::new(RecordingRunner::new().fail_when("stop", 2));
    let runner = root.runner(ProfileKind::Local, process.clone());

    let code = commands::reboot(&runner, true, &[]).await.unwrap();

    assert_eq!(code, 2);
    assert_eq!(process.commands(), vec![strings(&["stop"])]);
}

/// Without a terminal, `run` and job commands never request a pseudo-TTY
#[tokio::test]
async fn test_non_interactive_runs_disable_tty() {
    let root = TestRoot::new();
    let process = Arc::new(RecordingRunner::new());
    let runner = root.runner(ProfileKind::Local, process.clone());
    let mounts = tutor_compose::BindMounts::new(root.path());

    commands::run(&runner, &mounts, &strings(&["lms", "bash"])).await.unwrap();
    runner.run_job("lms", "./manage.py lms migrate").await.unwrap();

    let commands = process.commands();
    assert_eq!(commands[0], strings(&["run", "--rm", "-T", "lms", "bash"]));

    // Job files come after the project name, then the job service
    let job = &commands[1];
    let run_at = job.iter().position(|a| a == "run").unwrap();
    assert!(job[..run_at].iter().any(|a| a.ends_with("env/local/docker-compose.jobs.yml")));
    assert_eq!(
        job[run_at..].to_vec(),
        strings(&["run", "--rm", "-T", "lms-job", "sh", "-e", "-c", "./manage.py lms migrate"])
    );
}

/// With a terminal attached, `-T` is left out
#[tokio::test]
async fn test_interactive_runs_keep_tty() {
    let root = TestRoot::new();
    let process = Arc::new(RecordingRunner::new());
    let runner = root.runner(ProfileKind::Local, process.clone()).with_interactive(true);

    runner.run_job("mysql", "mysql -e 'select 1'").await.unwrap();

    assert!(!process.last_call().iter().any(|a| a == "-T"));
}

/// `dc` forwards everything and preserves the exit code of failed jobs
#[tokio::test]
async fn test_dc_passthrough() {
    let root = TestRoot::new();
    let process = Arc::new(RecordingRunner::new().fail_when("pull", 1));
    let runner = root.runner(ProfileKind::Local, process.clone());
    let mounts = tutor_compose::BindMounts::new(root.path());

    let code = commands::dc(&runner, &mounts, "pull", &strings(&["--quiet", "lms"]))
        .await
        .unwrap();

    assert_eq!(code, 1);
    assert_eq!(command_part(&process.last_call()), strings(&["pull", "--quiet", "lms"]));
}

/// `logs` maps its options to the tool's flags
#[tokio::test]
async fn test_logs_options() {
    let root = TestRoot::new();
    let process = Arc::new(RecordingRunner::new());
    let runner = root.runner(ProfileKind::Dev, process.clone());
    let mounts = tutor_compose::BindMounts::new(root.path());

    commands::logs(&runner, &mounts, true, Some(50), &strings(&["lms"]))
        .await
        .unwrap();

    assert_eq!(
        command_part(&process.last_call()),
        strings(&["logs", "--follow", "--tail", "50", "lms"])
    );
}
