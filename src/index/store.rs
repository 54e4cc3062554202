use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::IndexFile;
use crate::runtime::Runtime;

/// Filesystem-backed access to the package index of one install root.
///
/// Layout under the root:
/// - `<root>/index.json` - the package index
/// - `<root>/bin` - installed entry points
pub struct IndexStore<'a, R: Runtime> {
    runtime: &'a R,
    install_root: PathBuf,
}

impl<'a, R: Runtime> IndexStore<'a, R> {
    pub fn new(runtime: &'a R, install_root: PathBuf) -> Self {
        Self {
            runtime,
            install_root,
        }
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    pub fn index_path(&self) -> PathBuf {
        self.install_root.join("index.json")
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.install_root.join("bin")
    }

    /// Load the index. A root with no index file is an empty index.
    #[tracing::instrument(skip(self))]
    pub fn load(&self) -> Result<IndexFile> {
        let path = self.index_path();
        if !self.runtime.exists(&path) {
            return Ok(IndexFile::default());
        }

        let content = self.runtime.read_to_string(&path)?;
        serde_json::from_str(&content)
            .with_context(|| format!("Malformed package index at {:?}", path))
    }

    #[tracing::instrument(skip(self, index))]
    pub fn save(&self, index: &IndexFile) -> Result<()> {
        if !self.runtime.exists(&self.install_root) {
            self.runtime.create_dir_all(&self.install_root)?;
        }

        let path = self.index_path();
        let content = serde_json::to_string_pretty(index)?;
        self.runtime
            .write(&path, content.as_bytes())
            .with_context(|| format!("Failed to save package index to {:?}", path))
    }
}
