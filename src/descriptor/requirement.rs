//! Requirement identifiers for declared runtime dependencies.

use anyhow::{Error, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A declared runtime dependency, named by package identifier.
///
/// Identifiers are letters, digits, `.`, `_` and `-`, starting with a letter
/// or digit. Comparison against the package index is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Requirement(String);

impl Requirement {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        name.into().parse()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased form used for index lookups.
    pub fn normalized(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    /// Case-insensitive match against a package name.
    pub fn matches(&self, package_name: &str) -> bool {
        self.0.eq_ignore_ascii_case(package_name)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Requirement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow!("Requirement name cannot be empty"));
        }
        if !s.chars().next().is_some_and(|c| c.is_ascii_alphanumeric()) {
            return Err(anyhow!(
                "Requirement name '{}' must start with a letter or digit",
                s
            ));
        }
        if let Some(bad) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        {
            return Err(anyhow!(
                "Invalid character {:?} in requirement name '{}'",
                bad,
                s
            ));
        }
        Ok(Requirement(s.to_string()))
    }
}

impl TryFrom<String> for Requirement {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Requirement> for String {
    fn from(r: Requirement) -> Self {
        r.0
    }
}
