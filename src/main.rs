use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use tutor_compose::cli::commands::RunserverCommand;
use tutor_compose::cli::output::*;
use tutor_compose::cli::{Cli, Command, DevCommand, ProfileCommand};
use tutor_compose::compose::commands;
use tutor_compose::core::paths;
use tutor_compose::process::interrupt;
use tutor_compose::{
    BackupPipeline, BindMounts, ComposeInvoker, ComposeProfile, ComposeProgram, Config, JobRunner,
    OrchestratorError, ProfileKind,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;
    interrupt::install();

    let root = cli.root.clone().unwrap_or_else(paths::default_root);
    debug!("Project root: {}", root.display());

    match execute(&cli, &root).await {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(e) => {
            println!("{} {}", CROSS, style(format!("{:#}", e)).red());
            let code = e
                .downcast_ref::<OrchestratorError>()
                .map(OrchestratorError::exit_code)
                .unwrap_or(1);
            std::process::exit(code);
        }
    }
}

/// Run the selected command and return the exit code to report
async fn execute(cli: &Cli, root: &Path) -> Result<i32> {
    let config = Config::load(root)
        .with_context(|| format!("Failed to load configuration from {}", root.display()))?;

    match &cli.profile {
        ProfileCommand::Local { command } => {
            let runner = job_runner(ProfileKind::Local, root, &config).await?;
            run_command(command, &runner, root, &config).await
        }
        ProfileCommand::Dev { command } => {
            if !config.get_bool("DEV_MODE").unwrap_or(false) {
                println!(
                    "{} DEV_MODE is not enabled: services will run with production settings. Set DEV_MODE: true in {}.",
                    WARN,
                    tutor_compose::core::config::config_path(root).display()
                );
            }
            let runner = job_runner(ProfileKind::Dev, root, &config).await?;
            match command {
                DevCommand::Runserver(cmd) => runserver(cmd, &runner, root, &config).await,
                DevCommand::Compose(command) => run_command(command, &runner, root, &config).await,
            }
        }
    }
}

async fn job_runner(kind: ProfileKind, root: &Path, config: &Config) -> Result<JobRunner<ComposeInvoker>> {
    let profile = ComposeProfile::for_kind(kind, root, config)
        .with_context(|| format!("Failed to build the {} profile", kind))?;
    let program = ComposeProgram::detect().await;
    debug!("Using {} for the {} profile ({})", program, kind, profile.project_name);
    Ok(JobRunner::new(ComposeInvoker::new(program), profile))
}

async fn run_command(
    command: &Command,
    runner: &JobRunner<ComposeInvoker>,
    root: &Path,
    config: &Config,
) -> Result<i32> {
    let mounts = BindMounts::new(root);

    let code = match command {
        Command::Start(cmd) => commands::start(runner, cmd.skip_build, cmd.detach, &cmd.services).await?,
        Command::Stop(cmd) => commands::stop(runner, &cmd.services).await?,
        Command::Reboot(cmd) => commands::reboot(runner, cmd.detach, &cmd.services).await?,
        Command::Restart(cmd) => commands::restart(runner, config, &cmd.services).await?,
        Command::Run(cmd) => commands::run(runner, &mounts, &cmd.args).await?,
        Command::Exec(cmd) => commands::exec(runner, &mounts, &cmd.args).await?,
        Command::Logs(cmd) => {
            commands::logs(runner, &mounts, cmd.follow, cmd.tail, &cmd.services).await?
        }
        Command::Dc(cmd) => commands::dc(runner, &mounts, &cmd.command, &cmd.args).await?,
        Command::Bindmount(cmd) => {
            let host_path = mounts.create(runner, &cmd.service, &cmd.path).await?;
            println!("{}", format_bindmount_created(&host_path, &cmd.path));
            0
        }
        Command::Backup => backup(runner, root, config).await?,
    };
    Ok(code)
}

async fn runserver(
    cmd: &RunserverCommand,
    runner: &JobRunner<ComposeInvoker>,
    root: &Path,
    config: &Config,
) -> Result<i32> {
    let (options, service) = cmd.split();
    if let Some(url) = commands::runserver_url(config, service)? {
        println!(
            "{} The {} service will be available at {}",
            INFO,
            style(service).bold(),
            style(url).cyan()
        );
    }
    let mounts = BindMounts::new(root);
    Ok(commands::runserver(runner, &mounts, options, service).await?)
}

async fn backup(runner: &JobRunner<ComposeInvoker>, root: &Path, config: &Config) -> Result<i32> {
    let mut pipeline = BackupPipeline::new(runner, root, config);
    let progress = Arc::new(BackupProgress::new());
    let handler = progress.clone();
    pipeline.add_event_handler(move |event| handler.handle(event));

    match pipeline.run().await?.into_result() {
        Ok(report) => {
            println!("\n{}", format_backup_summary(&report));
            Ok(0)
        }
        Err(e) => {
            error!("Backup aborted: {}", e);
            Err(e.into())
        }
    }
}
