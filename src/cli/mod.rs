//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{
    BindmountCommand, DcCommand, ExecCommand, LogsCommand, RebootCommand, RestartCommand,
    RunCommand, RunserverCommand, StartCommand, StopCommand,
};
use std::ffi::OsString;
use std::path::PathBuf;

/// Docker-compose orchestration for an Open edX platform
#[derive(Debug, Parser, Clone)]
#[command(name = "tutor")]
#[command(version)]
#[command(about = "Run and back up an Open edX platform with docker-compose", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub profile: ProfileCommand,

    /// Enable verbose logging
    ///
    /// Long form only: `-v` is forwarded to docker-compose as a volume flag.
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Project root holding config.yml, env/, data/ and volumes/
    #[arg(long, global = true, env = crate::core::paths::ROOT_ENV_VAR)]
    pub root: Option<PathBuf>,
}

/// Deployment profiles
#[derive(Debug, Subcommand, Clone)]
pub enum ProfileCommand {
    /// Run Open edX locally with production settings
    Local {
        #[command(subcommand)]
        command: Command,
    },

    /// Run Open edX locally with development settings
    Dev {
        #[command(subcommand)]
        command: DevCommand,
    },
}

/// Commands available in every profile
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run all or a selection of services
    Start(StartCommand),

    /// Stop a running platform
    Stop(StopCommand),

    /// Fully stop then start services again
    Reboot(RebootCommand),

    /// Restart some components of a running platform
    Restart(RestartCommand),

    /// Run a command in a new container
    Run(RunCommand),

    /// Run a command in a running container
    Exec(ExecCommand),

    /// View output from containers
    Logs(LogsCommand),

    /// Direct interface to docker-compose
    Dc(DcCommand),

    /// Copy a container directory to a ready-to-bind-mount host directory
    Bindmount(BindmountCommand),

    /// Back up the mongodb and mysql databases with the platform data
    Backup,
}

/// Commands of the development profile
#[derive(Debug, Subcommand, Clone)]
pub enum DevCommand {
    /// Run a development server
    Runserver(RunserverCommand),

    #[command(flatten)]
    Compose(Command),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
