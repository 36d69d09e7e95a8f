//! CLI command definitions

use clap::Args;

/// Run all or a selection of services
#[derive(Debug, Args, Clone)]
pub struct StartCommand {
    /// Skip image building
    #[arg(long)]
    pub skip_build: bool,

    /// Start in daemon mode
    #[arg(short, long)]
    pub detach: bool,

    /// Services to start (all when empty)
    #[arg(value_name = "SERVICE")]
    pub services: Vec<String>,
}

/// Stop a running platform
#[derive(Debug, Args, Clone)]
pub struct StopCommand {
    #[arg(value_name = "SERVICE")]
    pub services: Vec<String>,
}

/// Stop then start services again
#[derive(Debug, Args, Clone)]
pub struct RebootCommand {
    /// Start in daemon mode
    #[arg(short, long)]
    pub detach: bool,

    #[arg(value_name = "SERVICE")]
    pub services: Vec<String>,
}

/// Restart components; `openedx` means the web apps and workers, `all` everything
#[derive(Debug, Args, Clone)]
pub struct RestartCommand {
    #[arg(value_name = "SERVICE")]
    pub services: Vec<String>,
}

/// `docker-compose run` wrapper; every argument is forwarded
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// `docker-compose exec` wrapper; every argument is forwarded
#[derive(Debug, Args, Clone)]
pub struct ExecCommand {
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// View output from containers
#[derive(Debug, Args, Clone)]
pub struct LogsCommand {
    /// Follow log output
    #[arg(short, long)]
    pub follow: bool,

    /// Number of lines to show from each container
    #[arg(long)]
    pub tail: Option<u32>,

    #[arg(value_name = "SERVICE")]
    pub services: Vec<String>,
}

/// Direct interface to docker-compose
#[derive(Debug, Args, Clone)]
pub struct DcCommand {
    /// docker-compose subcommand
    pub command: String,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Copy a container directory into `<root>/volumes`
#[derive(Debug, Args, Clone)]
pub struct BindmountCommand {
    /// Service whose image holds the directory
    pub service: String,

    /// Directory inside the container
    pub path: String,
}

/// Run a development server: `[OPTIONS..] SERVICE`
#[derive(Debug, Args, Clone)]
pub struct RunserverCommand {
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

impl RunserverCommand {
    /// The last argument is the service, everything before it is forwarded
    pub fn split(&self) -> (&[String], &str) {
        match self.args.split_last() {
            Some((service, options)) => (options, service.as_str()),
            None => (&[], ""),
        }
    }
}
