//! CLI output formatting

use crate::backup::{BackupEvent, BackupReport, BackupStage};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");

/// Create a spinner for work with no measurable progress
pub fn create_spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Format a backup event for display
pub fn format_backup_event(event: &BackupEvent) -> String {
    match event {
        BackupEvent::StageStarted { stage } => {
            format!("{} {}", SPINNER, style(stage).cyan())
        }
        BackupEvent::StageCompleted { message, .. } => {
            format!("{} {}", CHECK, style(message).green())
        }
        BackupEvent::StageSkipped { stage, reason } => {
            format!("{} {} ({})", SKIP, style(stage).dim(), style(reason).dim())
        }
        BackupEvent::StageDegraded { stage, error } => {
            format!("{} {}: {}", WARN, style(stage).yellow(), style(error).dim())
        }
        BackupEvent::StageFailed { stage, error } => {
            format!("{} {}: {}", CROSS, style(stage).red(), style(error).dim())
        }
    }
}

/// Prints backup events, with a spinner while the archive is written
#[derive(Default)]
pub struct BackupProgress {
    spinner: Mutex<Option<ProgressBar>>,
}

impl BackupProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self, event: &BackupEvent) {
        let Ok(mut spinner) = self.spinner.lock() else {
            println!("{}", format_backup_event(event));
            return;
        };

        match event {
            BackupEvent::StageStarted { stage: BackupStage::Archive } => {
                *spinner = Some(create_spinner(BackupStage::Archive.label()));
            }
            BackupEvent::StageStarted { .. } => println!("{}", format_backup_event(event)),
            _ => {
                if let Some(bar) = spinner.take() {
                    bar.finish_and_clear();
                }
                println!("{}", format_backup_event(event));
            }
        }
    }
}

/// One-line summary printed once the pipeline returns
pub fn format_backup_summary(report: &BackupReport) -> String {
    let degraded = report.degraded();
    if report.uploaded {
        format!(
            "{} Backup {} uploaded",
            CHECK,
            style(&report.archive_name).bold()
        )
    } else if degraded.is_empty() {
        format!(
            "{} Backup stored at {}",
            CHECK,
            style(report.archive_path.display()).bold()
        )
    } else {
        let stages: Vec<&str> = degraded.iter().map(|s| s.label()).collect();
        let location = if report.archive_retained() {
            format!("stored at {}", style(report.archive_path.display()).bold())
        } else {
            "not retained".to_string()
        };
        format!(
            "{} Backup {} with warnings ({})",
            WARN,
            location,
            style(stages.join(", ")).yellow()
        )
    }
}

/// Confirmation printed after a bind-mount volume is populated.
///
/// The suggested token is the container path: that is the name
/// `--volume` resolves back to the host directory.
pub fn format_bindmount_created(host_path: &Path, container_path: &str) -> String {
    format!(
        "{} Bind-mount volume created at {}. You can now use it in all `local` and `dev` commands with the `--volume={}` option.",
        INFO,
        style(host_path.display()).bold(),
        container_path
    )
}
