//! Host path resolution for the project root
//!
//! These helpers only join paths. Whether a missing path is an error is
//! decided by the callers.

use std::path::{Path, PathBuf};

/// Environment variable that overrides the default project root
pub const ROOT_ENV_VAR: &str = "TUTOR_ROOT";

/// Default project root: `<platform data dir>/tutor`
pub fn default_root() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tutor")
}

/// Join a root with relative segments
pub fn pathjoin<P, I, S>(root: P, segments: I) -> PathBuf
where
    P: AsRef<Path>,
    I: IntoIterator<Item = S>,
    S: AsRef<Path>,
{
    let mut path = root.as_ref().to_path_buf();
    for segment in segments {
        path.push(segment);
    }
    path
}

/// `<root>/env/<segments>`: rendered service-definition files
pub fn env_path<P: AsRef<Path>>(root: P, segments: &[&str]) -> PathBuf {
    pathjoin(root.as_ref().join("env"), segments)
}

/// `<root>/data/<segments>`: persistent service data
pub fn data_path<P: AsRef<Path>>(root: P, segments: &[&str]) -> PathBuf {
    pathjoin(root.as_ref().join("data"), segments)
}

/// Keep only the paths that exist right now, preserving order
pub fn existing<'a, I>(paths: I) -> Vec<&'a Path>
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    paths
        .into_iter()
        .filter(|p| p.exists())
        .map(PathBuf::as_path)
        .collect()
}
