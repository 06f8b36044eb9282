//! Artifact storage collaborator
//!
//! The pipelines never touch the filesystem directly; they hand finished
//! artifacts to an [`ArtifactStore`]. The directory-backed implementation
//! writes the compact JSON and a gzip sibling next to it. There is no
//! process-wide output directory; every store owns its root explicitly.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::repack::artifact::CompactArtifact;

/// Destination for finished artifacts
pub trait ArtifactStore {
    /// Persist an artifact under `name` and return the primary location
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Serialize` on failure; nothing is partially
    /// visible to `list` if the write fails.
    fn write(&self, name: &str, artifact: &CompactArtifact) -> Result<PathBuf>;

    /// Enumerate the primary locations of previously written artifacts
    ///
    /// # Errors
    ///
    /// Returns `Io` if the underlying listing fails.
    fn list(&self) -> Result<Vec<PathBuf>>;
}

/// Directory-backed artifact store
///
/// Writes `<root>/<name>.json` (compact) and `<root>/<name>.json.gz`.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Create a store rooted at `root`
    ///
    /// The directory is created on first write, not here.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory this store writes into
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactStore for DirectoryStore {
    fn write(&self, name: &str, artifact: &CompactArtifact) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)?;

        let json_path = self.root.join(format!("{name}.json"));
        let gz_path = self.root.join(format!("{name}.json.gz"));

        fs::write(&json_path, artifact.to_json()?)?;
        fs::write(&gz_path, artifact.to_gzip()?)?;

        Ok(json_path)
    }

    fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.root)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        Ok(paths)
    }
}
