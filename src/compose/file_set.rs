//! Ordered service-definition file sets

use crate::core::paths;
use std::path::{Path, PathBuf};

/// One layer of service-definition files plus the override variant that
/// sits directly on top of it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeLayer {
    pub files: Vec<PathBuf>,
    pub overrides: Vec<PathBuf>,
}

impl ComposeLayer {
    pub fn new(files: Vec<PathBuf>, overrides: Vec<PathBuf>) -> Self {
        Self { files, overrides }
    }
}

/// Ordered list of service-definition files; later entries override earlier ones.
///
/// Entries may point at files that do not exist. They are filtered out each
/// time the set is turned into arguments, never when the set is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeFileSet {
    paths: Vec<PathBuf>,
}

impl ComposeFileSet {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Stack layers in precedence order: each layer's files, then its overrides
    pub fn layered<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = ComposeLayer>,
    {
        let mut paths = Vec::new();
        for layer in layers {
            paths.extend(layer.files);
            paths.extend(layer.overrides);
        }
        Self { paths }
    }

    /// Every declared path, existing or not
    pub fn declared(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Declared paths that exist right now
    pub fn existing(&self) -> Vec<&Path> {
        paths::existing(&self.paths)
    }

    /// `-f <path>` for every path that exists at call time
    pub fn to_args(&self) -> Vec<String> {
        self.existing()
            .into_iter()
            .flat_map(|path| ["-f".to_string(), path.display().to_string()])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
