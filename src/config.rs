//! The `rewit.yml` configuration document.
//!
//! ```yaml
//! user:
//!   name: Jane Doe
//!   email: jane@example.com
//! repos:
//!   - git@github.com:acme/widgets
//! ```

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Default document path for both modes.
pub const DEFAULT_CONFIG_FILE: &str = "rewit.yml";

/// Placeholder identity written by discovery when no override is given.
pub const PLACEHOLDER_NAME: &str = "John Doe";
pub const PLACEHOLDER_EMAIL: &str = "john.doe@mail.com";

/// Author/committer identity applied to every rewritten commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Replaces fields with non-empty overrides.
    pub fn with_overrides(mut self, name: Option<&str>, email: Option<&str>) -> Self {
        if let Some(n) = name.filter(|n| !n.trim().is_empty()) {
            self.name = n.trim().to_string();
        }
        if let Some(e) = email.filter(|e| !e.trim().is_empty()) {
            self.email = e.trim().to_string();
        }
        self
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// A single remote repository address, usually `git@host:owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoTarget(String);

impl RepoTarget {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RepoTarget {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The persisted document: one identity and an ordered list of targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub user: Identity,
    #[serde(default, alias = "bundles")]
    pub repos: Vec<RepoTarget>,
}

impl ConfigDocument {
    pub fn new(user: Identity, repos: Vec<RepoTarget>) -> Self {
        Self { user, repos }
    }

    /// Checks that the identity is complete and at least one target is listed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if self.user.name.trim().is_empty() {
            missing.push("user.name");
        }
        if self.user.email.trim().is_empty() {
            missing.push("user.email");
        }
        if self.repos.is_empty() {
            missing.push("at least one entry in repos");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(format!(
                "missing {}",
                missing.join(", ")
            )))
        }
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Writes the document to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let body = self.to_yaml()?;
        fs::write(path, body).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), repos = self.repos.len(), "wrote configuration");
        Ok(())
    }
}

/// Reads and parses the document without validating it.
pub fn read(path: &Path) -> Result<ConfigDocument, ConfigError> {
    let body = fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => ConfigError::NotFound {
            path: path.to_path_buf(),
        },
        _ => ConfigError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    // An empty file deserializes to unit, not a mapping.
    if body.trim().is_empty() {
        return Ok(ConfigDocument::default());
    }

    serde_yaml::from_str(&body).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads, parses, and validates the document at `path`.
pub fn load(path: &Path) -> Result<ConfigDocument, ConfigError> {
    load_with_overrides(path, None, None)
}

/// Like [`load`], applying identity overrides before validation.
pub fn load_with_overrides(
    path: &Path,
    name: Option<&str>,
    email: Option<&str>,
) -> Result<ConfigDocument, ConfigError> {
    let mut doc = read(path)?;
    doc.user = doc.user.with_overrides(name, email);
    doc.validate()?;
    debug!(path = %path.display(), repos = doc.repos.len(), "loaded configuration");
    Ok(doc)
}
