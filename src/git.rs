use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::config::Identity;
use crate::error::GitError;

/// Environment variables carrying the new identity into the env filter.
const NAME_VAR: &str = "REWIT_NAME";
const EMAIL_VAR: &str = "REWIT_EMAIL";

/// Remote recorded by `git clone`, with local paths already made absolute.
const ORIGIN: &str = "origin";

/// Shell snippet evaluated by `git filter-branch` for every commit.
///
/// The identity is read from the environment rather than interpolated, so
/// quotes and shell metacharacters in names or emails are safe.
pub(crate) const ENV_FILTER: &str = concat!(
    "export GIT_AUTHOR_NAME=\"$REWIT_NAME\" GIT_AUTHOR_EMAIL=\"$REWIT_EMAIL\" ",
    "GIT_COMMITTER_NAME=\"$REWIT_NAME\" GIT_COMMITTER_EMAIL=\"$REWIT_EMAIL\""
);

/// Clone and push operations against a remote.
pub trait RemoteOps {
    /// Bare-clones `remote` into `dest`, which must not exist yet.
    fn clone_bare(&self, remote: &str, dest: &Path) -> Result<(), GitError>;

    /// Force-pushes every branch and all tags from `repo_dir` back to the
    /// remote it was cloned from.
    fn force_push(&self, repo_dir: &Path) -> Result<(), GitError>;
}

/// Rewrites the author and committer of every commit reachable from any ref.
///
/// Implementations must keep trees, messages, timestamps, parents, and tag
/// names, and must operate only on `repo_dir`.
pub trait HistoryRewriter {
    fn rewrite_identity(&self, repo_dir: &Path, identity: &Identity) -> Result<(), GitError>;
}

/// Renders a command line for messages.
fn describe(cmd: &Command) -> String {
    let program = cmd.get_program().to_string_lossy();
    let name = Path::new(&*program)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string());
    let args: Vec<String> = cmd
        .get_args()
        .map(|a| {
            let a = a.to_string_lossy();
            if a.contains(' ') {
                format!("'{}'", a)
            } else {
                a.into_owned()
            }
        })
        .collect();
    if args.is_empty() {
        name
    } else {
        format!("{} {}", name, args.join(" "))
    }
}

/// Runs a command with inherited stdio and returns only its exit status.
///
/// # Returns
///
/// * `Ok(())` if the command exited with status `0`.
/// * `Err(GitError::CommandFailed)` if it exited non-zero.
/// * `Err(GitError::Spawn)` if the process failed to start.
fn run_status(mut cmd: Command) -> Result<(), GitError> {
    let command = describe(&cmd);
    debug!(%command, dir = ?cmd.get_current_dir(), "running");

    match cmd.status() {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(GitError::CommandFailed {
            command,
            status: status.to_string(),
        }),
        Err(source) => Err(GitError::Spawn { command, source }),
    }
}

/// `git` invoked as a subprocess; tool output passes straight through to the console.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl GitCli {
    /// Locates `git` on `PATH`.
    pub fn locate() -> Result<Self, GitError> {
        let program = which::which("git")?;
        debug!(program = %program.display(), "located git");
        Ok(Self { program })
    }

    #[cfg(test)]
    pub(crate) fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());
        cmd
    }
}

impl RemoteOps for GitCli {
    /// Runs `git clone --bare <remote> <dest>`.
    fn clone_bare(&self, remote: &str, dest: &Path) -> Result<(), GitError> {
        let mut cmd = self.command(["clone", "--bare"]);
        cmd.arg(remote).arg(dest);
        run_status(cmd)
    }

    /// Runs `git push --force --tags origin refs/heads/*` inside `repo_dir`.
    fn force_push(&self, repo_dir: &Path) -> Result<(), GitError> {
        let mut cmd = self.command(["push", "--force", "--tags", ORIGIN, "refs/heads/*"]);
        cmd.current_dir(repo_dir);
        run_status(cmd)
    }
}

impl HistoryRewriter for GitCli {
    /// Runs `git filter-branch --env-filter .. --tag-name-filter cat -- --all`
    /// inside `repo_dir`.
    ///
    /// `--tag-name-filter cat` rewrites annotated and lightweight tags onto
    /// the new commits under their existing names.
    fn rewrite_identity(&self, repo_dir: &Path, identity: &Identity) -> Result<(), GitError> {
        let mut cmd = self.command([
            "filter-branch",
            "--env-filter",
            ENV_FILTER,
            "--tag-name-filter",
            "cat",
            "--",
            "--all",
        ]);
        cmd.current_dir(repo_dir);
        cmd.env(NAME_VAR, &identity.name);
        cmd.env(EMAIL_VAR, &identity.email);
        cmd.env("FILTER_BRANCH_SQUELCH_WARNING", "1");
        run_status(cmd)
    }
}
