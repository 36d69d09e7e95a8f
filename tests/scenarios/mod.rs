//! Scenario-based tests for tutor-compose

mod backup_pipeline;
mod bind_mounts;
mod compose_commands;
