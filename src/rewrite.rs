//! Per-repository clone, rewrite, and force push, plus the batch driver.

use std::path::PathBuf;

use console::style;
use tracing::{info, warn};

use crate::address::local_dir_name;
use crate::banner::print_banner;
use crate::config::{ConfigDocument, Identity, RepoTarget};
use crate::error::RewriteError;
use crate::git::{HistoryRewriter, RemoteOps};
use crate::prompt::{self, ConfirmPrompter};

/// What happens to the rest of the batch after a target fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Report the failure and move on to the next target.
    #[default]
    Continue,
    /// Stop at the first failure; remaining targets are not touched.
    Abort,
}

/// Outcome for one target.
#[derive(Debug)]
pub struct TargetOutcome {
    pub target: RepoTarget,
    /// The bare clone directory on success.
    pub result: Result<PathBuf, RewriteError>,
}

/// Outcomes for a whole batch, in document order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<TargetOutcome>,
    /// Targets never attempted because the batch aborted.
    pub skipped: Vec<RepoTarget>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.skipped.is_empty()
    }
}

/// Result of a confirmed-or-declined run.
#[derive(Debug)]
pub enum BatchOutcome {
    Cancelled,
    Completed(BatchReport),
}

/// Drives clone, rewrite, and push for each target under an explicit working root.
///
/// Every step receives its directory explicitly; the process working
/// directory is never changed.
pub struct Orchestrator<G> {
    git: G,
    work_root: PathBuf,
    policy: FailurePolicy,
}

impl<G: RemoteOps + HistoryRewriter> Orchestrator<G> {
    pub fn new(git: G, work_root: impl Into<PathBuf>) -> Self {
        Self {
            git,
            work_root: work_root.into(),
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[cfg(test)]
    fn git(&self) -> &G {
        &self.git
    }

    /// Processes one target and returns the bare clone directory.
    ///
    /// Nothing is rolled back on failure; a partial clone stays on disk.
    pub fn rewrite(
        &self,
        target: &RepoTarget,
        identity: &Identity,
    ) -> Result<PathBuf, RewriteError> {
        let remote = target.as_str();
        let stem = local_dir_name(remote)?;
        let dir = self.work_root.join(format!("{}.git", stem));

        self.git
            .clone_bare(remote, &dir)
            .map_err(|source| RewriteError::Clone {
                target: remote.to_string(),
                source,
            })?;

        self.git
            .rewrite_identity(&dir, identity)
            .map_err(|source| RewriteError::History {
                target: remote.to_string(),
                source,
            })?;

        self.git
            .force_push(&dir)
            .map_err(|source| RewriteError::Push {
                target: remote.to_string(),
                source,
            })?;

        Ok(dir)
    }

    /// Processes targets one at a time, in order.
    pub fn rewrite_all(&self, targets: &[RepoTarget], identity: &Identity) -> BatchReport {
        let mut report = BatchReport::default();

        for (index, target) in targets.iter().enumerate() {
            println!(
                "{}",
                style(format!("==> [{}/{}] {}", index + 1, targets.len(), target)).bold()
            );

            let result = self.rewrite(target, identity);
            match &result {
                Ok(dir) => {
                    info!(repo = %target, dir = %dir.display(), "rewrote repository");
                    println!("{}", style(format!("✅ Rewrote {}", target)).green());
                }
                Err(e) => {
                    warn!(repo = %target, stage = e.stage(), error = %e, "repository failed");
                    eprintln!("{}", style(format!("❌ {}", e)).red().bold());
                }
            }

            let failed = result.is_err();
            report.outcomes.push(TargetOutcome {
                target: target.clone(),
                result,
            });

            if failed && self.policy == FailurePolicy::Abort {
                report.skipped = targets[index + 1..].to_vec();
                break;
            }
        }

        report
    }
}

/// Shows the targets, asks for confirmation, and runs the batch.
///
/// `doc` must already be validated. Declining returns
/// [`BatchOutcome::Cancelled`] without touching any repository.
pub fn run_batch<G, P>(
    doc: &ConfigDocument,
    prompter: &mut P,
    orchestrator: &Orchestrator<G>,
) -> Result<BatchOutcome, String>
where
    G: RemoteOps + HistoryRewriter,
    P: ConfirmPrompter,
{
    let targets: Vec<&str> = doc.repos.iter().map(RepoTarget::as_str).collect();
    print_banner(&doc.user, &targets);

    if !prompt::confirm_rewrite(prompter)? {
        println!("{}", style("Operation cancelled.").yellow().bold());
        return Ok(BatchOutcome::Cancelled);
    }

    let report = orchestrator.rewrite_all(&doc.repos, &doc.user);
    print_summary(&report);
    Ok(BatchOutcome::Completed(report))
}

fn print_summary(report: &BatchReport) {
    println!();
    let line = format!(
        "{} succeeded, {} failed, {} skipped",
        report.succeeded(),
        report.failed(),
        report.skipped.len()
    );
    if report.is_success() {
        println!("{}", style(line).green().bold());
        return;
    }

    println!("{}", style(line).yellow().bold());
    for outcome in &report.outcomes {
        if let Err(e) = &outcome.result {
            println!("  {} ({}): {}", outcome.target, e.stage(), e);
        }
    }
    for target in &report.skipped {
        println!("  {} (not attempted)", target);
    }
}
