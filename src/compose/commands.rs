//! Platform commands built on top of the job runner
//!
//! Builders return the orchestration command tokens; the async functions
//! send them through a runner and hand back the tool's exit code.

use crate::compose::bindmount::BindMounts;
use crate::compose::runner::JobRunner;
use crate::core::{Config, OrchestratorError};
use crate::process::ProcessRunner;
use tracing::info;

/// `up --remove-orphans [--build] [-d] <services..>`
pub fn start_command(skip_build: bool, detach: bool, services: &[String]) -> Vec<String> {
    let mut command = vec!["up".to_string(), "--remove-orphans".to_string()];
    if !skip_build {
        command.push("--build".to_string());
    }
    if detach {
        command.push("-d".to_string());
    }
    command.extend(services.iter().cloned());
    command
}

pub fn stop_command(services: &[String]) -> Vec<String> {
    let mut command = vec!["stop".to_string()];
    command.extend(services.iter().cloned());
    command
}

/// `restart` with `all` meaning every service and `openedx` expanding to
/// the enabled web apps and their workers
pub fn restart_command(config: &Config, services: &[String]) -> Result<Vec<String>, OrchestratorError> {
    let mut command = vec!["restart".to_string()];
    if services.iter().any(|s| s == "all") {
        return Ok(command);
    }
    for service in services {
        if service == "openedx" {
            if config.get_bool("RUN_LMS")? {
                command.extend(["lms", "lms-worker"].map(String::from));
            }
            if config.get_bool("RUN_CMS")? {
                command.extend(["cms", "cms-worker"].map(String::from));
            }
        } else {
            command.push(service.clone());
        }
    }
    Ok(command)
}

/// Arguments for `dc logs`
pub fn logs_args(follow: bool, tail: Option<u32>, services: &[String]) -> Vec<String> {
    let mut args = Vec::new();
    if follow {
        args.push("--follow".to_string());
    }
    if let Some(tail) = tail {
        args.push("--tail".to_string());
        args.push(tail.to_string());
    }
    args.extend(services.iter().cloned());
    args
}

/// Arguments for `dc run`: always ephemeral, no TTY when nobody is attached
pub fn run_args(interactive: bool, args: &[String]) -> Vec<String> {
    let mut run = vec!["--rm".to_string()];
    if !interactive {
        run.push("-T".to_string());
    }
    run.extend(args.iter().cloned());
    run
}

/// URL a development server will listen on, for the web apps
pub fn runserver_url(config: &Config, service: &str) -> Result<Option<String>, OrchestratorError> {
    let (host_key, port) = match service {
        "lms" => ("LMS_HOST", 8000),
        "cms" => ("CMS_HOST", 8001),
        _ => return Ok(None),
    };
    Ok(Some(format!("http://{}:{}", config.get_str(host_key)?, port)))
}

/// Arguments for the dev `runserver` command, passed to `run`
pub fn runserver_args(options: &[String], service: &str) -> Vec<String> {
    let mut args = vec!["--service-ports".to_string()];
    args.extend(options.iter().cloned());
    args.push(service.to_string());
    args
}

pub async fn start<P: ProcessRunner>(
    runner: &JobRunner<P>,
    skip_build: bool,
    detach: bool,
    services: &[String],
) -> Result<i32, OrchestratorError> {
    runner.docker_compose(&start_command(skip_build, detach, services)).await
}

pub async fn stop<P: ProcessRunner>(runner: &JobRunner<P>, services: &[String]) -> Result<i32, OrchestratorError> {
    runner.docker_compose(&stop_command(services)).await
}

/// Stop then start again; a failed stop skips the start
pub async fn reboot<P: ProcessRunner>(
    runner: &JobRunner<P>,
    detach: bool,
    services: &[String],
) -> Result<i32, OrchestratorError> {
    let code = stop(runner, services).await?;
    if code != 0 {
        return Ok(code);
    }
    start(runner, false, detach, services).await
}

pub async fn restart<P: ProcessRunner>(
    runner: &JobRunner<P>,
    config: &Config,
    services: &[String],
) -> Result<i32, OrchestratorError> {
    runner.docker_compose(&restart_command(config, services)?).await
}

/// Direct passthrough with bind-mount resolution:
/// `<command> [--volume V]* <non-volume args..>`
pub async fn dc<P: ProcessRunner>(
    runner: &JobRunner<P>,
    mounts: &BindMounts,
    command: &str,
    args: &[String],
) -> Result<i32, OrchestratorError> {
    let (volume_args, remaining) = mounts.parse(args)?;
    let mut full = vec![command.to_string()];
    full.extend(volume_args);
    full.extend(remaining);
    runner.docker_compose(&full).await
}

pub async fn run<P: ProcessRunner>(
    runner: &JobRunner<P>,
    mounts: &BindMounts,
    args: &[String],
) -> Result<i32, OrchestratorError> {
    dc(runner, mounts, "run", &run_args(runner.is_interactive(), args)).await
}

pub async fn exec<P: ProcessRunner>(
    runner: &JobRunner<P>,
    mounts: &BindMounts,
    args: &[String],
) -> Result<i32, OrchestratorError> {
    dc(runner, mounts, "exec", args).await
}

pub async fn logs<P: ProcessRunner>(
    runner: &JobRunner<P>,
    mounts: &BindMounts,
    follow: bool,
    tail: Option<u32>,
    services: &[String],
) -> Result<i32, OrchestratorError> {
    dc(runner, mounts, "logs", &logs_args(follow, tail, services)).await
}

/// Start a development server in the foreground with its ports published
pub async fn runserver<P: ProcessRunner>(
    runner: &JobRunner<P>,
    mounts: &BindMounts,
    options: &[String],
    service: &str,
) -> Result<i32, OrchestratorError> {
    info!("Starting development server for {}", service);
    run(runner, mounts, &runserver_args(options, service)).await
}
