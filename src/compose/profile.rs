//! Deployment profiles: which files to layer and which namespace to use

use crate::compose::file_set::{ComposeFileSet, ComposeLayer};
use crate::core::{paths, Config, ConfigError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Named deployment mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    /// Production-like stack
    Local,
    /// Development stack with source bind-mounts and dev servers
    Dev,
}

impl ProfileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileKind::Local => "local",
            ProfileKind::Dev => "dev",
        }
    }

    /// Configuration key holding this profile's project name
    pub fn project_name_key(&self) -> &'static str {
        match self {
            ProfileKind::Local => "LOCAL_PROJECT_NAME",
            ProfileKind::Dev => "DEV_PROJECT_NAME",
        }
    }
}

impl std::fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a job runner needs to know about a deployment mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeProfile {
    pub kind: ProfileKind,
    pub project_name: String,
    pub service_files: ComposeFileSet,
    pub job_files: ComposeFileSet,
}

impl ComposeProfile {
    pub fn for_kind(kind: ProfileKind, root: &Path, config: &Config) -> Result<Self, ConfigError> {
        match kind {
            ProfileKind::Local => Self::local(root, config),
            ProfileKind::Dev => Self::dev(root, config),
        }
    }

    /// `env/local` files; the local stack is the foundation every profile builds on
    pub fn local(root: &Path, config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            kind: ProfileKind::Local,
            project_name: config.get_str(ProfileKind::Local.project_name_key())?.to_string(),
            service_files: ComposeFileSet::layered([local_services(root, true)]),
            job_files: ComposeFileSet::layered([local_jobs(root)]),
        })
    }

    /// `env/local` foundation plus `env/dev` on top
    pub fn dev(root: &Path, config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            kind: ProfileKind::Dev,
            project_name: config.get_str(ProfileKind::Dev.project_name_key())?.to_string(),
            service_files: ComposeFileSet::layered([
                local_services(root, false),
                ComposeLayer::new(
                    vec![compose_file(root, "dev", "docker-compose.yml")],
                    vec![compose_file(root, "dev", "docker-compose.override.yml")],
                ),
            ]),
            job_files: ComposeFileSet::layered([
                local_jobs(root),
                ComposeLayer::new(
                    vec![compose_file(root, "dev", "docker-compose.jobs.yml")],
                    vec![compose_file(root, "dev", "docker-compose.jobs.override.yml")],
                ),
            ]),
        })
    }
}

fn compose_file(root: &Path, dir: &str, name: &str) -> PathBuf {
    paths::env_path(root, &[dir, name])
}

fn local_services(root: &Path, with_prod: bool) -> ComposeLayer {
    let mut files = vec![compose_file(root, "local", "docker-compose.yml")];
    if with_prod {
        files.push(compose_file(root, "local", "docker-compose.prod.yml"));
    }
    ComposeLayer::new(
        files,
        vec![compose_file(root, "local", "docker-compose.override.yml")],
    )
}

fn local_jobs(root: &Path) -> ComposeLayer {
    ComposeLayer::new(
        vec![compose_file(root, "local", "docker-compose.jobs.yml")],
        vec![compose_file(root, "local", "docker-compose.jobs.override.yml")],
    )
}
