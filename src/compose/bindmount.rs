//! Bind-mounted volumes under `<root>/volumes`

use crate::compose::runner::JobRunner;
use crate::core::OrchestratorError;
use crate::process::ProcessRunner;
use std::path::{Path, PathBuf};
use tracing::info;

/// Name of the CLI command that creates bind-mount directories
pub const BINDMOUNT_COMMAND: &str = "bindmount";

/// Where the host volumes directory is mounted inside the copying container
const CONTAINER_VOLUMES_ROOT: &str = "/tmp/volumes";

/// Result of splitting raw arguments into volume tokens and the rest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedVolumes {
    /// Values of every `-v`/`--volume` flag, in order
    pub volumes: Vec<String>,
    /// Everything else, untouched
    pub remaining: Vec<String>,
}

/// Resolves logical volume names to host directories
#[derive(Debug, Clone)]
pub struct BindMounts {
    root: PathBuf,
}

impl BindMounts {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/volumes`
    pub fn volumes_root(&self) -> PathBuf {
        self.root.join("volumes")
    }

    /// `<root>/volumes/<basename of name>`
    pub fn resolve(&self, name: &str) -> PathBuf {
        let trimmed = name.trim_end_matches('/');
        let basename = Path::new(trimmed)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| trimmed.into());
        self.volumes_root().join(basename)
    }

    /// Copy `container_path` out of a fresh `service` container into the
    /// host volumes directory and return the resulting host path
    pub async fn create<P: ProcessRunner>(
        &self,
        runner: &JobRunner<P>,
        service: &str,
        container_path: &str,
    ) -> Result<PathBuf, OrchestratorError> {
        let volumes_root = self.volumes_root();
        std::fs::create_dir_all(&volumes_root)?;

        let mut command = vec![
            "run".to_string(),
            "--rm".to_string(),
            "--no-deps".to_string(),
            "--user=0".to_string(),
        ];
        if !runner.is_interactive() {
            command.push("-T".to_string());
        }
        command.push("--volume".to_string());
        command.push(format!("{}:{}", volumes_root.display(), CONTAINER_VOLUMES_ROOT));
        command.push(service.to_string());
        command.extend(["sh", "-e", "-c"].map(String::from));
        command.push(format!("cp -r {} {}/", container_path, CONTAINER_VOLUMES_ROOT));

        info!("Copying {} from {} to {}", container_path, service, volumes_root.display());
        runner.docker_compose_checked(&command).await?;

        Ok(self.resolve(container_path))
    }

    /// Turn parsed volume tokens into `--volume` arguments.
    ///
    /// Tokens containing `:` pass through. Bare names are resolved to their
    /// host directory, which must already exist. Nothing is returned unless
    /// every token resolves.
    pub fn volume_args(&self, volumes: &[String]) -> Result<Vec<String>, OrchestratorError> {
        let mut args = Vec::with_capacity(volumes.len() * 2);
        for volume in volumes {
            let value = if volume.contains(':') {
                volume.clone()
            } else {
                let host_path = self.resolve(volume);
                if !host_path.exists() {
                    return Err(OrchestratorError::MissingBindMount {
                        path: host_path,
                        command: BINDMOUNT_COMMAND.to_string(),
                    });
                }
                format!("{}:{}", host_path.display(), volume)
            };
            args.push("--volume".to_string());
            args.push(value);
        }
        Ok(args)
    }

    /// Parse raw args and resolve their volumes in one step:
    /// returns `(volume args, remaining args)`
    pub fn parse(&self, args: &[String]) -> Result<(Vec<String>, Vec<String>), OrchestratorError> {
        let parsed = parse_volumes(args)?;
        let volume_args = self.volume_args(&parsed.volumes)?;
        Ok((volume_args, parsed.remaining))
    }
}

/// Split `-v X`, `--volume X`, `--volume=X` and `-vX` out of an argument list
pub fn parse_volumes(args: &[String]) -> Result<ParsedVolumes, OrchestratorError> {
    let mut parsed = ParsedVolumes::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if arg == "-v" || arg == "--volume" {
            match iter.next() {
                Some(value) => parsed.volumes.push(value.clone()),
                None => {
                    return Err(OrchestratorError::InvalidArguments(format!(
                        "option '{}' requires an argument",
                        arg
                    )))
                }
            }
        } else if let Some(value) = arg.strip_prefix("--volume=") {
            parsed.volumes.push(value.to_string());
        } else if let Some(value) = arg.strip_prefix("-v").filter(|v| !v.is_empty() && !arg.starts_with("--")) {
            parsed.volumes.push(value.to_string());
        } else {
            parsed.remaining.push(arg.clone());
        }
    }

    Ok(parsed)
}
