use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use super::Requirement;
use crate::runtime::Runtime;

/// Deserialize a string that may be null as empty string
fn deserialize_nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

/// Installation metadata for exactly one script-based utility.
///
/// The descriptor is static configuration: written once, read by the install
/// tool, never mutated at runtime. On disk it is a JSON document whose keys
/// match the field names below.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Manifest {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub author_email: Option<String>,
    /// Packages that must be present for the installed scripts to function.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<Requirement>,
    /// Files installed as executable entry points, in declaration order.
    #[serde(default)]
    pub scripts: Vec<PathBuf>,
}

impl Manifest {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Manifest {
            name: name.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    #[tracing::instrument(skip(runtime, path))]
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content = runtime.read_to_string(path)?;
        let manifest: Manifest = serde_json::from_str(&content)
            .with_context(|| format!("Malformed package descriptor at {:?}", path))?;
        Ok(manifest)
    }

    pub fn save<R: Runtime>(&self, runtime: &R, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !runtime.exists(parent)
        {
            runtime.create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        runtime
            .write(path, content.as_bytes())
            .with_context(|| format!("Failed to save descriptor to {:?}", path))
    }

    /// Collect everything that makes this descriptor not installable.
    ///
    /// A meaningful descriptor declares a package name and at least one
    /// entry point. Requirement syntax is already enforced at parse time,
    /// so only duplicates are reported here.
    pub fn issues(&self) -> Vec<ManifestIssue> {
        let mut issues = Vec::new();

        if self.name.trim().is_empty() {
            issues.push(ManifestIssue::MissingName);
        }

        if self.scripts.is_empty() {
            issues.push(ManifestIssue::NothingToInstall);
        }
        for (position, script) in self.scripts.iter().enumerate() {
            if script.file_name().and_then(|n| n.to_str()).is_none() {
                issues.push(ManifestIssue::BadScriptPath(position));
            }
        }

        let mut seen = HashSet::new();
        for requirement in &self.requires {
            if !seen.insert(requirement.normalized()) {
                issues.push(ManifestIssue::DuplicateRequirement(
                    requirement.as_str().to_string(),
                ));
            }
        }

        issues
    }

    /// Fail with a combined message when the descriptor is not installable.
    pub fn validate(&self) -> Result<()> {
        let issues = self.issues();
        if issues.is_empty() {
            return Ok(());
        }

        let name = if self.name.trim().is_empty() {
            "(unnamed)"
        } else {
            self.name.as_str()
        };
        let details: Vec<String> = issues.iter().map(ToString::to_string).collect();
        anyhow::bail!(
            "Descriptor for '{}' is not installable: {}",
            name,
            details.join("; ")
        )
    }

    /// File names the entry points will have in the bin directory.
    ///
    /// Entries without a usable file name are skipped; `issues` reports them.
    pub fn script_file_names(&self) -> Vec<String> {
        self.scripts
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
            .collect()
    }
}

/// A problem that makes a descriptor not meaningful to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestIssue {
    /// The descriptor declares no package name.
    MissingName,
    /// The script list is empty.
    NothingToInstall,
    /// A script entry has no usable file name (0-based position).
    BadScriptPath(usize),
    /// The same requirement is declared more than once.
    DuplicateRequirement(String),
}

impl fmt::Display for ManifestIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestIssue::MissingName => write!(f, "descriptor has no package name"),
            ManifestIssue::NothingToInstall => {
                write!(f, "script list is empty, nothing to install")
            }
            ManifestIssue::BadScriptPath(position) => {
                write!(f, "script entry #{} has no usable file name", position + 1)
            }
            ManifestIssue::DuplicateRequirement(name) => {
                write!(f, "requirement '{}' is declared more than once", name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;

    fn spendfrom_manifest() -> Manifest {
        Manifest {
            name: "btcspendfrom".into(),
            version: "1.0".into(),
            description: Some("Command-line utility for bitcoin \"coin control\"".into()),
            author: Some("Gavin Andresen".into()),
            author_email: None,
            requires: vec!["jsonrpc".parse().unwrap()],
            scripts: vec![PathBuf::from("spendfrom.py")],
        }
    }

    #[test]
    fn test_manifest_round_trip() {
        let manifest = spendfrom_manifest();

        let json = serde_json::to_string_pretty(&manifest).unwrap();
        let deserialized: Manifest = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized, manifest);
        assert_eq!(deserialized.name, "btcspendfrom");
        assert_eq!(deserialized.version, "1.0");
        assert_eq!(deserialized.requires.len(), 1);
        assert_eq!(deserialized.scripts, vec![PathBuf::from("spendfrom.py")]);
    }

    #[test]
    fn test_manifest_defaults_for_missing_fields() {
        let manifest: Manifest = serde_json::from_str(r#"{"name": "tool"}"#).unwrap();

        assert_eq!(manifest.name, "tool");
        assert_eq!(manifest.version, "");
        assert_eq!(manifest.description, None);
        assert!(manifest.requires.is_empty());
        assert!(manifest.scripts.is_empty());
    }

    #[test]
    fn test_manifest_nullable_version() {
        let manifest: Manifest =
            serde_json::from_str(r#"{"name": "tool", "version": null}"#).unwrap();
        assert_eq!(manifest.version, "");
    }

    #[test]
    fn test_valid_manifest_has_no_issues() {
        let manifest = spendfrom_manifest();
        assert!(manifest.issues().is_empty());
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_empty_scripts_is_nothing_to_install() {
        let manifest = Manifest::new("btcspendfrom", "1.0");

        assert_eq!(manifest.issues(), vec![ManifestIssue::NothingToInstall]);

        let err = manifest.validate().unwrap_err().to_string();
        assert!(err.contains("nothing to install"));
    }

    #[test]
    fn test_missing_name_is_reported() {
        let mut manifest = spendfrom_manifest();
        manifest.name = "  ".into();

        assert_eq!(manifest.issues(), vec![ManifestIssue::MissingName]);
        assert!(
            manifest
                .validate()
                .unwrap_err()
                .to_string()
                .contains("no package name")
        );
    }

    #[test]
    fn test_bad_script_path_is_reported() {
        let mut manifest = spendfrom_manifest();
        manifest.scripts.push(PathBuf::from(""));

        assert_eq!(manifest.issues(), vec![ManifestIssue::BadScriptPath(1)]);
    }

    #[test]
    fn test_duplicate_requirement_is_reported() {
        let mut manifest = spendfrom_manifest();
        manifest.requires.push("JsonRPC".parse().unwrap());

        assert_eq!(
            manifest.issues(),
            vec![ManifestIssue::DuplicateRequirement("JsonRPC".into())]
        );
    }

    #[test]
    fn test_issues_accumulate() {
        let manifest = Manifest::default();
        let issues = manifest.issues();

        assert!(issues.contains(&ManifestIssue::MissingName));
        assert!(issues.contains(&ManifestIssue::NothingToInstall));
    }

    #[test]
    fn test_script_file_names() {
        let mut manifest = spendfrom_manifest();
        manifest.scripts.push(PathBuf::from("contrib/qrcode.py"));

        assert_eq!(
            manifest.script_file_names(),
            vec!["spendfrom.py".to_string(), "qrcode.py".to_string()]
        );
    }

    #[test]
    fn test_manifest_load() {
        let mut runtime = MockRuntime::new();
        let path = PathBuf::from("/test/package.json");

        runtime
            .expect_read_to_string()
            .with(eq(path.clone()))
            .returning(|_| {
                Ok(r#"{
                    "name": "btcspendfrom",
                    "version": "1.0",
                    "description": "Command-line utility for bitcoin \"coin control\"",
                    "author": "Gavin Andresen",
                    "requires": ["jsonrpc"],
                    "scripts": ["spendfrom.py"]
                }"#
                .into())
            });

        let manifest = Manifest::load(&runtime, &path).unwrap();
        assert_eq!(manifest.name, "btcspendfrom");
        assert_eq!(manifest.version, "1.0");
        assert_eq!(manifest.requires[0].as_str(), "jsonrpc");
    }

    #[test]
    fn test_manifest_load_malformed() {
        let mut runtime = MockRuntime::new();
        let path = PathBuf::from("/test/package.json");

        runtime
            .expect_read_to_string()
            .with(eq(path.clone()))
            .returning(|_| Ok("not json".into()));

        let err = Manifest::load(&runtime, &path).unwrap_err().to_string();
        assert!(err.contains("Malformed package descriptor"));
    }

    #[test]
    fn test_manifest_save_creates_parent() {
        let mut runtime = MockRuntime::new();
        let manifest = spendfrom_manifest();
        let path = PathBuf::from("/test/pkg/package.json");

        runtime
            .expect_exists()
            .with(eq(PathBuf::from("/test/pkg")))
            .returning(|_| false);
        runtime
            .expect_create_dir_all()
            .with(eq(PathBuf::from("/test/pkg")))
            .returning(|_| Ok(()));

        let expected = serde_json::to_string_pretty(&manifest).unwrap();
        runtime
            .expect_write()
            .withf(move |p, contents| p == path && contents == expected.as_bytes())
            .returning(|_, _| Ok(()));

        manifest
            .save(&runtime, &PathBuf::from("/test/pkg/package.json"))
            .unwrap();
    }
}
