//! Layered docker-compose invocations for a deployment profile

pub mod bindmount;
pub mod commands;
pub mod file_set;
pub mod profile;
pub mod runner;

pub use bindmount::{BindMounts, ParsedVolumes, BINDMOUNT_COMMAND};
pub use file_set::{ComposeFileSet, ComposeLayer};
pub use profile::{ComposeProfile, ProfileKind};
pub use runner::{job_service_name, JobRunner};
