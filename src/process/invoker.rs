//! docker-compose subprocess invoker - inherits the terminal and waits for exit

use crate::core::OrchestratorError;
use crate::process::interrupt::{self, ChildTracker};
use crate::process::ProcessRunner;
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::{debug, warn};

/// Environment variable that overrides orchestration program detection
pub const PROGRAM_ENV_VAR: &str = "TUTOR_DOCKER_COMPOSE";

/// The orchestration program and any fixed leading arguments
/// (`docker compose` is `docker` + `["compose"]`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeProgram {
    pub program: String,
    pub prefix: Vec<String>,
}

impl ComposeProgram {
    pub fn new(program: impl Into<String>, prefix: Vec<String>) -> Self {
        Self {
            program: program.into(),
            prefix,
        }
    }

    /// Parse a whitespace-separated command line such as `docker compose`
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    /// Pick the program: env override, then `docker-compose` on PATH,
    /// falling back to the `docker compose` plugin
    pub async fn detect() -> Self {
        if let Some(program) = std::env::var(PROGRAM_ENV_VAR)
            .ok()
            .as_deref()
            .and_then(Self::parse)
        {
            debug!("Using orchestration program from {}: {}", PROGRAM_ENV_VAR, program);
            return program;
        }

        let check = Command::new("which")
            .arg("docker-compose")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        if check.map(|s| s.success()).unwrap_or(false) {
            Self::new("docker-compose", vec![])
        } else {
            Self::new("docker", vec!["compose".to_string()])
        }
    }
}

impl Default for ComposeProgram {
    fn default() -> Self {
        Self::new("docker-compose", vec![])
    }
}

impl std::fmt::Display for ComposeProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.prefix {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs the orchestration tool as a child process attached to our terminal
#[derive(Debug, Clone)]
pub struct ComposeInvoker {
    program: ComposeProgram,
    children: &'static ChildTracker,
}

impl ComposeInvoker {
    pub fn new(program: ComposeProgram) -> Self {
        Self {
            program,
            children: interrupt::children(),
        }
    }

    /// Report running children to `tracker` instead of the process-wide one
    pub fn with_tracker(mut self, tracker: &'static ChildTracker) -> Self {
        self.children = tracker;
        self
    }

    /// Spawn the child and block until it exits.
    ///
    /// The child receives terminal interrupts itself, so the first Ctrl-C
    /// only keeps us waiting for it to wind down. A second one kills it.
    async fn spawn_and_wait(&self, args: &[String]) -> Result<ExitStatus, OrchestratorError> {
        let mut child = Command::new(&self.program.program)
            .args(&self.program.prefix)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| OrchestratorError::Spawn {
                program: self.program.to_string(),
                source,
            })?;
        let _running = self.children.enter();

        let mut interrupts = 0;
        loop {
            tokio::select! {
                status = child.wait() => {
                    return status.map_err(OrchestratorError::Io);
                }
                signal = tokio::signal::ctrl_c() => {
                    if signal.is_err() {
                        // No signal handler available: just wait for the child
                        return child.wait().await.map_err(OrchestratorError::Io);
                    }
                    interrupts += 1;
                    if interrupts == 1 {
                        warn!("Interrupted, waiting for {} to exit (press Ctrl-C again to kill it)", self.program);
                    } else {
                        warn!("Killing {}", self.program);
                        child.start_kill().map_err(OrchestratorError::Io)?;
                    }
                }
            }
        }
    }
}

impl Default for ComposeInvoker {
    fn default() -> Self {
        Self::new(ComposeProgram::default())
    }
}

#[async_trait]
impl ProcessRunner for ComposeInvoker {
    async fn run(&self, args: &[String]) -> Result<i32, OrchestratorError> {
        debug!("Running: {} {}", self.program, redact(args).join(" "));

        let status = self.spawn_and_wait(args).await?;
        let code = exit_code(status);
        if code != 0 {
            debug!("{} exited with code {}", self.program, code);
        }
        Ok(code)
    }

    fn program(&self) -> String {
        self.program.to_string()
    }
}

/// Exit code of a finished child; signal deaths map to `128 + signal`
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

/// Mask inline credentials before logging an argument vector
pub fn redact(args: &[String]) -> Vec<String> {
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some((flag, _)) if flag == "--password" => format!("{}=****", flag),
            _ => arg.clone(),
        })
        .collect()
}
