//! # rewit
//!
//! A CLI tool to rewrite commit author identity across many GitHub repositories.
//!
//! This crate provides functionality to:
//! - List your repositories from the GitHub API and write them to `rewit.yml`
//! - Load and validate that document
//! - Bare-clone each repository, rewrite the author and committer of every
//!   commit on every branch and tag, and force push the result
//!
//! ## Usage
//!
//! ```bash
//! # Discovery: write rewit.yml from your repositories
//! GITHUB_TOKEN=... rewit --genyaml --include api --exclude archived
//!
//! # Rewrite: confirm, then rewrite and force push everything listed
//! GITHUB_TOKEN=... rewit --do --file rewit.yml
//! ```
//!
//! ## Modules
//!
//! - [`cli`] - Command-line interface and main entry point
//! - [`config`] - The configuration document
//! - [`discovery`] - GitHub repository listing and filtering
//! - [`address`] - SSH address normalization and clone directory names
//! - [`git`] - Git command wrappers behind the clone/push and rewrite seams
//! - [`rewrite`] - Per-repository orchestration and the batch driver
//! - [`prompt`] - Confirmation prompt
//! - [`progress`] - Discovery spinner
//! - [`banner`] - Pre-confirmation summary box
//! - [`error`] - Error types
//! - [`logging`] - Log subscriber setup

pub mod address;
pub mod banner;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod git;
pub mod logging;
pub mod progress;
pub mod prompt;
pub mod rewrite;
