//! Install module
//!
//! Consumes a package descriptor the way the packaging tool side of the
//! system is expected to: validate the descriptor, resolve its declared
//! requirements against the local index, copy its scripts into the bin
//! directory as executable entry points, and register the package
//! name/version in the index.

mod paths;

pub use paths::{default_install_root, resolve_install_root};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::descriptor::Manifest;
use crate::index::{IndexStore, InstalledPackage};
use crate::runtime::Runtime;

/// Mode bits applied to installed entry points on unix.
const ENTRY_POINT_MODE: u32 = 0o755;

/// Outcome of a successful install.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallReport {
    pub name: String,
    pub version: String,
    /// Entry points now present in the bin directory, in declaration order.
    pub installed: Vec<PathBuf>,
    /// True when a previous registration of the same package was replaced.
    pub replaced: bool,
}

/// Installer rooted at one install root.
pub struct Installer<'a, R: Runtime> {
    runtime: &'a R,
    store: IndexStore<'a, R>,
}

impl<'a, R: Runtime> Installer<'a, R> {
    pub fn new(runtime: &'a R, install_root: PathBuf) -> Self {
        Self {
            runtime,
            store: IndexStore::new(runtime, install_root),
        }
    }

    /// Get reference to the underlying index store
    pub fn store(&self) -> &IndexStore<'a, R> {
        &self.store
    }

    /// Install the package a descriptor declares.
    ///
    /// Script paths in the descriptor are resolved relative to `source_dir`,
    /// normally the directory the descriptor was loaded from. Re-installing
    /// a registered name replaces its previous files and index entry.
    #[tracing::instrument(skip(self, manifest, source_dir))]
    pub fn install(&self, manifest: &Manifest, source_dir: &Path) -> Result<InstallReport> {
        manifest.validate()?;

        let mut index = self.store.load()?;

        let missing = index.missing_requirements(&manifest.requires);
        if !missing.is_empty() {
            anyhow::bail!(
                "Cannot install '{}': unresolved requirement(s): {}",
                manifest.name,
                missing.join(", ")
            );
        }

        // Resolve every script source before touching the bin directory.
        let mut sources: Vec<(PathBuf, String)> = Vec::with_capacity(manifest.scripts.len());
        for script in &manifest.scripts {
            let source = if script.is_absolute() {
                script.clone()
            } else {
                source_dir.join(script)
            };
            if !self.runtime.is_file(&source) {
                anyhow::bail!(
                    "Script file {:?} declared by '{}' does not exist",
                    source,
                    manifest.name
                );
            }
            let file_name = script
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("Script path {:?} has no usable file name", script))?
                .to_string();
            sources.push((source, file_name));
        }

        // An entry point name owned by another package is a conflict.
        for (_, file_name) in &sources {
            if let Some(owner) = index.packages.iter().find(|p| {
                !p.name.eq_ignore_ascii_case(&manifest.name)
                    && p.scripts.iter().any(|s| s == file_name)
            }) {
                anyhow::bail!(
                    "Entry point '{}' is already installed by package '{}'",
                    file_name,
                    owner.name
                );
            }
        }

        let bin_dir = self.store.bin_dir();
        if !self.runtime.exists(&bin_dir) {
            self.runtime.create_dir_all(&bin_dir)?;
        }

        // Drop entry points left over from a previous version of this package.
        let previous = index.remove(&manifest.name);
        if let Some(previous) = &previous {
            for stale in previous
                .scripts
                .iter()
                .filter(|s| !sources.iter().any(|(_, name)| name == *s))
            {
                let path = bin_dir.join(stale);
                if self.runtime.exists(&path) {
                    debug!("Removing stale entry point {:?}", path);
                    self.runtime.remove_file(&path)?;
                }
            }
        }

        let mut installed = Vec::with_capacity(sources.len());
        for (source, file_name) in &sources {
            let dest = bin_dir.join(file_name);
            debug!("Installing {:?} -> {:?}", source, dest);
            self.runtime
                .copy(source, &dest)
                .with_context(|| format!("Failed to install script {:?}", source))?;
            self.runtime.set_permissions(&dest, ENTRY_POINT_MODE)?;
            installed.push(dest);
        }

        index.register(InstalledPackage {
            name: manifest.name.clone(),
            version: manifest.version.clone(),
            requires: manifest
                .requires
                .iter()
                .map(|r| r.as_str().to_string())
                .collect(),
            scripts: sources.into_iter().map(|(_, name)| name).collect(),
        });
        self.store.save(&index)?;

        info!(
            "Installed {} {} ({} entry point(s))",
            manifest.name,
            manifest.version,
            installed.len()
        );

        Ok(InstallReport {
            name: manifest.name.clone(),
            version: manifest.version.clone(),
            installed,
            replaced: previous.is_some(),
        })
    }

    /// Remove an installed package: delete its entry points and unregister it.
    #[tracing::instrument(skip(self))]
    pub fn remove(&self, name: &str) -> Result<InstalledPackage> {
        let mut index = self.store.load()?;

        let dependent_names: Vec<String> = index
            .dependents(name)
            .iter()
            .map(|p| p.name.clone())
            .collect();

        let Some(package) = index.remove(name) else {
            anyhow::bail!("Package '{}' is not installed", name);
        };

        if !dependent_names.is_empty() {
            warn!(
                "Package '{}' is still required by: {}",
                package.name,
                dependent_names.join(", ")
            );
        }

        let bin_dir = self.store.bin_dir();
        for script in &package.scripts {
            let path = bin_dir.join(script);
            if self.runtime.exists(&path) {
                debug!("Removing entry point {:?}", path);
                self.runtime
                    .remove_file(&path)
                    .with_context(|| format!("Failed to remove entry point {:?}", path))?;
            }
        }

        self.store.save(&index)?;
        info!("Removed {} {}", package.name, package.version);

        Ok(package)
    }

    /// List installed packages, sorted by name.
    pub fn list(&self) -> Result<Vec<InstalledPackage>> {
        Ok(self.store.load()?.packages)
    }
}
