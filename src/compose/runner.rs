//! Job runner - scopes every orchestration call to one profile's files and project

use crate::compose::profile::{ComposeProfile, ProfileKind};
use crate::compose::file_set::ComposeFileSet;
use crate::core::OrchestratorError;
use crate::process::ProcessRunner;
use tracing::{debug, info};

/// Runs services and one-shot jobs for a single profile
pub struct JobRunner<P> {
    process: P,
    kind: ProfileKind,
    project_name: String,
    service_files: ComposeFileSet,
    job_files: ComposeFileSet,
    interactive: bool,
}

impl<P: ProcessRunner> JobRunner<P> {
    /// Build a runner for `profile`, detecting whether a terminal is attached
    pub fn new(process: P, profile: ComposeProfile) -> Self {
        Self {
            process,
            kind: profile.kind,
            project_name: profile.project_name,
            service_files: profile.service_files,
            job_files: profile.job_files,
            interactive: crate::process::is_a_tty(),
        }
    }

    /// Override terminal detection
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn kind(&self) -> ProfileKind {
        self.kind
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn service_files(&self) -> &ComposeFileSet {
        &self.service_files
    }

    pub fn job_files(&self) -> &ComposeFileSet {
        &self.job_files
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn process(&self) -> &P {
        &self.process
    }

    /// `[-f <service file>]* --project-name <name> <command..>`
    pub fn compose_args<S: AsRef<str>>(&self, command: &[S]) -> Vec<String> {
        let mut args = self.service_files.to_args();
        args.push("--project-name".to_string());
        args.push(self.project_name.clone());
        args.extend(command.iter().map(|s| s.as_ref().to_string()));
        args
    }

    /// `[-f <job file>]* run --rm [-T] <service>-job sh -e -c <command>`
    pub fn job_args(&self, service: &str, command: &str) -> Vec<String> {
        let mut args = self.job_files.to_args();
        args.push("run".to_string());
        args.push("--rm".to_string());
        if !self.interactive {
            args.push("-T".to_string());
        }
        args.push(job_service_name(service));
        args.extend(["sh", "-e", "-c"].map(String::from));
        args.push(command.to_string());
        args
    }

    /// Run the orchestration tool against the service files
    pub async fn docker_compose<S: AsRef<str>>(&self, command: &[S]) -> Result<i32, OrchestratorError> {
        let args = self.compose_args(command);
        debug!("[{}] {} {}", self.kind, self.process.program(), crate::process::invoker::redact(&args).join(" "));
        self.process.run(&args).await
    }

    /// Like `docker_compose`, but a non-zero exit becomes `ExternalProcessFailure`
    pub async fn docker_compose_checked<S: AsRef<str>>(&self, command: &[S]) -> Result<(), OrchestratorError> {
        let code = self.docker_compose(command).await?;
        if code != 0 {
            return Err(OrchestratorError::ExternalProcessFailure {
                program: self.process.program(),
                code,
            });
        }
        Ok(())
    }

    /// Run `command` in a fresh `<service>-job` container.
    ///
    /// The shell runs with `-e`: the first failing statement aborts the rest.
    /// Job files are layered on top of the service files so the job shares
    /// the project's namespace and networks.
    ///
    /// Entry point for one-shot scripts supplied by callers, such as
    /// database migrations or init hooks; no CLI command issues one itself.
    pub async fn run_job(&self, service: &str, command: &str) -> Result<i32, OrchestratorError> {
        info!("Running {} job in project {}", job_service_name(service), self.project_name);
        let job_args = self.job_args(service, command);
        self.docker_compose(&job_args).await
    }
}

/// Jobs are named `<service>-job` by convention
pub fn job_service_name(service: &str) -> String {
    format!("{}-job", service)
}
