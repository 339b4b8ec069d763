//! Error types for each stage of a run.
//!
//! Discovery and configuration errors are fatal and surface before anything
//! destructive happens. Rewrite errors are scoped to a single repository and
//! are collected by the batch driver instead of aborting it.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading, validating, or writing the configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document does not exist at the given path.
    #[error("configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Any other I/O failure while reading or writing the document.
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML or has the wrong shape.
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The document parsed but is unusable for a rewrite.
    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error("cannot serialize configuration: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Errors raised while listing repositories from the hosting provider.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The credential is missing, or the provider rejected it.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Transport-level failure (DNS, TLS, connection, body decoding).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("GitHub API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// The async runtime backing the HTTP client could not be started.
    #[error("cannot start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Errors from invoking the `git` binary.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("`git` not found in PATH: {0}")]
    NotFound(#[from] which::Error),

    /// The process could not be started at all.
    #[error("cannot run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran and exited unsuccessfully.
    #[error("`{command}` exited with {status}")]
    CommandFailed { command: String, status: String },
}

/// A failure while processing a single repository target.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// No usable local directory name can be derived from the address.
    #[error("invalid repository address: {0:?}")]
    InvalidTarget(String),

    #[error("failed to clone {target}: {source}")]
    Clone {
        target: String,
        #[source]
        source: GitError,
    },

    #[error("failed to rewrite history for {target}: {source}")]
    History {
        target: String,
        #[source]
        source: GitError,
    },

    #[error("failed to force push {target}: {source}")]
    Push {
        target: String,
        #[source]
        source: GitError,
    },
}

impl RewriteError {
    /// Short name of the stage that failed, for summaries.
    pub fn stage(&self) -> &'static str {
        match self {
            RewriteError::InvalidTarget(_) => "address",
            RewriteError::Clone { .. } => "clone",
            RewriteError::History { .. } => "rewrite",
            RewriteError::Push { .. } => "push",
        }
    }
}
