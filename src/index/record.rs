use serde::{Deserialize, Serialize};

use crate::descriptor::Requirement;

/// One installed package as recorded in the index.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct InstalledPackage {
    pub name: String,
    #[serde(default)]
    pub version: String,
    /// Requirement names as declared by the descriptor.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
    /// File names this package owns in the bin directory, in install order.
    #[serde(default)]
    pub scripts: Vec<String>,
}

/// The serialized package index: every package installed under one root.
///
/// Package names are unique within the index; registering a name again
/// replaces the previous entry. Entries are kept sorted by name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct IndexFile {
    #[serde(default)]
    pub packages: Vec<InstalledPackage>,
}

impl IndexFile {
    fn position(&self, name: &str) -> Option<usize> {
        self.packages
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, name: &str) -> Option<&InstalledPackage> {
        self.position(name).map(|i| &self.packages[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Register a package, replacing any entry with the same name.
    ///
    /// Returns the replaced entry when the registration was an upgrade.
    pub fn register(&mut self, package: InstalledPackage) -> Option<InstalledPackage> {
        let replaced = match self.position(&package.name) {
            Some(i) => Some(std::mem::replace(&mut self.packages[i], package)),
            None => {
                self.packages.push(package);
                None
            }
        };
        self.packages.sort_by(|a, b| a.name.cmp(&b.name));
        replaced
    }

    /// Remove a package entry by name.
    pub fn remove(&mut self, name: &str) -> Option<InstalledPackage> {
        self.position(name).map(|i| self.packages.remove(i))
    }

    /// Requirements with no matching package in the index,
    /// in declaration order.
    pub fn missing_requirements(&self, requires: &[Requirement]) -> Vec<String> {
        requires
            .iter()
            .filter(|r| !self.packages.iter().any(|p| r.matches(&p.name)))
            .map(|r| r.as_str().to_string())
            .collect()
    }

    /// Packages that declare a requirement on `name`.
    pub fn dependents(&self, name: &str) -> Vec<&InstalledPackage> {
        self.packages
            .iter()
            .filter(|p| p.requires.iter().any(|r| r.eq_ignore_ascii_case(name)))
            .collect()
    }
}
