//! gzip-compressed tar archives with flat, base-name entries

use crate::core::OrchestratorError;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name a source gets inside the archive: its base name, never a path
pub fn entry_name(source: &Path) -> Option<String> {
    source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

/// Write `sources` into a new archive at `dest`.
///
/// Directories are added recursively under their base name. Every source
/// must exist; on any failure the partial archive is removed.
pub fn create_archive(dest: &Path, sources: &[PathBuf]) -> Result<(), OrchestratorError> {
    let failure = |reason: String| OrchestratorError::ArchiveCreationFailure {
        path: dest.to_path_buf(),
        reason,
    };

    let mut entries = Vec::with_capacity(sources.len());
    for source in sources {
        if !source.exists() {
            return Err(failure(format!("{} does not exist", source.display())));
        }
        let name = entry_name(source)
            .ok_or_else(|| failure(format!("{} has no base name", source.display())))?;
        entries.push((source, name));
    }

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| failure(e.to_string()))?;
    }

    let result = write_entries(dest, &entries);
    if let Err(e) = result {
        if let Err(remove_err) = std::fs::remove_file(dest) {
            if remove_err.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove partial archive {}: {}", dest.display(), remove_err);
            }
        }
        return Err(failure(e.to_string()));
    }
    Ok(())
}

fn write_entries(dest: &Path, entries: &[(&PathBuf, String)]) -> std::io::Result<()> {
    let file = File::create(dest)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut archive = tar::Builder::new(encoder);
    archive.follow_symlinks(false);

    for (source, name) in entries {
        debug!("Adding {} as {}", source.display(), name);
        if source.is_dir() {
            archive.append_dir_all(name, source)?;
        } else {
            archive.append_path_with_name(source, name)?;
        }
    }

    let encoder = archive.into_inner()?;
    encoder.finish()?.sync_all()?;
    Ok(())
}
