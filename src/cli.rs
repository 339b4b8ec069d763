use crate::address::ssh_host_for_api;
use crate::config::{self, DEFAULT_CONFIG_FILE, RepoTarget};
use crate::discovery::{
    self, Credential, DEFAULT_API_URL, DEFAULT_TOKEN_ENV, GitHubClient, RepoFilter,
};
use crate::error::DiscoveryError;
use crate::git::GitCli;
use crate::logging;
use crate::progress::Spinner;
use crate::prompt::DialoguerConfirmPrompter;
use crate::rewrite::{self, BatchOutcome, FailurePolicy, Orchestrator};

use clap::{Args, Parser};
use console::style;
use std::fmt::Display;
use std::path::PathBuf;

/// Rewrite commit author identity across your GitHub repositories.
#[derive(Parser, Debug)]
#[command(name = "rewit", version, about)]
pub struct Cli {
    #[command(flatten)]
    mode: Mode,

    /// Configuration document: read with --do, written with --genyaml.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    file: PathBuf,

    /// Author name to set (overrides the document with --do).
    #[arg(long)]
    name: Option<String>,

    /// Author email to set (overrides the document with --do).
    #[arg(long)]
    email: Option<String>,

    /// Only list repositories whose owner/name contains this string.
    #[arg(long)]
    include: Option<String>,

    /// Skip repositories whose owner/name contains this string.
    #[arg(long)]
    exclude: Option<String>,

    /// Environment variable holding the GitHub token.
    #[arg(long = "token-envar", default_value = DEFAULT_TOKEN_ENV)]
    token_envar: String,

    /// GitHub API base URL (use https://<host>/api/v3 for Enterprise).
    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Host used in generated SSH remotes (derived from --api-url if unset).
    #[arg(long)]
    ssh_host: Option<String>,

    /// Directory that receives the bare clones.
    #[arg(long, default_value = ".")]
    work_dir: PathBuf,

    /// Stop at the first repository that fails instead of skipping it.
    #[arg(long)]
    fail_fast: bool,

    /// Show debug logs on stderr.
    #[arg(short, long)]
    verbose: bool,
}

/// Exactly one of the two modes per invocation.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct Mode {
    /// Generate the configuration document from your repositories.
    #[arg(long)]
    genyaml: bool,

    /// Clone, rewrite, and force push every repository in the document.
    #[arg(long = "do")]
    do_rewrite: bool,
}

/// Prints an error line in the CLI's error style.
fn report_error(message: impl Display) {
    eprintln!("{}", style(format!("Error: {}", message)).red().bold());
}

/// Lists repositories behind a spinner; the spinner clears on every exit path.
async fn discover_with_spinner(
    cli: &Cli,
    credential: Credential,
    filter: &RepoFilter,
) -> Result<Vec<RepoTarget>, DiscoveryError> {
    let client = GitHubClient::new(&cli.api_url, credential)?;
    let host = match cli.ssh_host.as_deref().map(str::trim) {
        Some(host) if !host.is_empty() => host.to_string(),
        _ => ssh_host_for_api(&cli.api_url),
    };

    let spinner = Spinner::start("Listing repositories...");
    discovery::discover(&client, filter, &host, |name| {
        spinner.println(&format!("Evaluating {}", name));
    })
    .await
}

/// Discovery mode: list, filter, and write the document.
fn generate(cli: &Cli, credential: Credential) -> Result<i32, ()> {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            report_error(DiscoveryError::Runtime(e));
            return Err(());
        }
    };

    let filter = RepoFilter::new(cli.include.as_deref(), cli.exclude.as_deref());
    let repos = match runtime.block_on(discover_with_spinner(cli, credential, &filter)) {
        Ok(r) => r,
        Err(e) => {
            report_error(e);
            return Err(());
        }
    };

    let doc = discovery::build_document(cli.name.as_deref(), cli.email.as_deref(), repos);
    println!("Using user name: {}", doc.user.name);
    println!("Using email: {}", doc.user.email);
    println!("Processing {} repositories...", doc.repos.len());

    if let Err(e) = doc.save(&cli.file) {
        report_error(e);
        return Err(());
    }

    println!(
        "\n{}",
        style(format!("{} file has been generated", cli.file.display()))
            .green()
            .bold()
    );
    Ok(0)
}

/// Rewrite mode: load, confirm, and process every target.
fn rewrite_repos(cli: &Cli) -> Result<i32, ()> {
    // Validation happens before anything touches the filesystem or a remote.
    let doc = match config::load_with_overrides(
        &cli.file,
        cli.name.as_deref(),
        cli.email.as_deref(),
    ) {
        Ok(d) => d,
        Err(e) => {
            report_error(e);
            return Err(());
        }
    };

    let git = match GitCli::locate() {
        Ok(g) => g,
        Err(e) => {
            report_error(e);
            return Err(());
        }
    };

    let policy = if cli.fail_fast {
        FailurePolicy::Abort
    } else {
        FailurePolicy::Continue
    };
    let orchestrator = Orchestrator::new(git, &cli.work_dir).with_policy(policy);

    let mut prompter = DialoguerConfirmPrompter;
    match rewrite::run_batch(&doc, &mut prompter, &orchestrator) {
        Ok(BatchOutcome::Cancelled) => Ok(0),
        Ok(BatchOutcome::Completed(report)) if report.is_success() => Ok(0),
        Ok(BatchOutcome::Completed(_)) => Ok(1),
        Err(e) => {
            report_error(format!("prompt failed: {}", e));
            Err(())
        }
    }
}

/// Runs an already-parsed invocation.
///
/// # Exit Codes
///
/// * `0` – Every repository succeeded, the document was generated, or the
///   operator cancelled.
/// * `1` – At least one repository failed (returned as `Ok(1)`).
/// * `Err(())` – Missing credential, discovery failure, or an unusable
///   configuration document.
pub fn run(cli: Cli) -> Result<i32, ()> {
    logging::init_logger(cli.verbose);

    // The token is required in both modes.
    let credential = match Credential::from_env(&cli.token_envar) {
        Ok(c) => c,
        Err(e) => {
            report_error(e);
            return Err(());
        }
    };

    if cli.mode.genyaml {
        generate(&cli, credential)
    } else {
        rewrite_repos(&cli)
    }
}

/// Main CLI entry point for `rewit`.
///
/// Usage errors (both or neither of `--genyaml`/`--do`) are reported by
/// `clap`, which exits with status 2 before the environment or network is
/// touched.
pub fn entry() -> Result<i32, ()> {
    run(Cli::parse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::io::Write;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("rewit").chain(args.iter().copied()))
    }

    #[test]
    fn both_modes_is_usage_error() {
        let err = parse(&["--genyaml", "--do"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn no_mode_is_usage_error() {
        let err = parse(&["--file", "x.yml"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn defaults_match_documented_values() {
        let cli = parse(&["--do"]).unwrap();
        assert!(cli.mode.do_rewrite);
        assert!(!cli.mode.genyaml);
        assert_eq!(cli.file, PathBuf::from("rewit.yml"));
        assert_eq!(cli.token_envar, "GITHUB_TOKEN");
        assert_eq!(cli.api_url, "https://api.github.com");
        assert_eq!(cli.work_dir, PathBuf::from("."));
        assert!(!cli.fail_fast);
        assert_eq!(cli.ssh_host, None);
    }

    #[test]
    fn discovery_flags_are_parsed() {
        let cli = parse(&[
            "--genyaml",
            "--include",
            "api",
            "--exclude",
            "archived",
            "--name",
            "Jane Doe",
            "--email",
            "jane@example.com",
            "--token-envar",
            "MY_TOKEN",
        ])
        .unwrap();
        assert!(cli.mode.genyaml);
        assert_eq!(cli.include.as_deref(), Some("api"));
        assert_eq!(cli.exclude.as_deref(), Some("archived"));
        assert_eq!(cli.name.as_deref(), Some("Jane Doe"));
        assert_eq!(cli.email.as_deref(), Some("jane@example.com"));
        assert_eq!(cli.token_envar, "MY_TOKEN");
    }

    #[test]
    fn missing_credential_fails_before_discovery() {
        let cli = parse(&["--genyaml", "--token-envar", "REWIT_TEST_UNSET_TOKEN_VAR"]).unwrap();
        assert_eq!(run(cli), Err(()));
    }

    #[test]
    fn invalid_document_fails_without_side_effects() {
        let work = tempfile::tempdir().expect("failed to create temp dir");
        let mut doc = tempfile::NamedTempFile::new().expect("failed to create temp file");
        writeln!(doc, "user:\n  name: Jane Doe\nrepos:\n  - git@github.com:acme/widgets")
            .expect("failed to write doc");

        // PATH is always set, so it stands in for a token variable.
        let cli = parse(&[
            "--do",
            "--token-envar",
            "PATH",
            "--file",
            doc.path().to_str().unwrap(),
            "--work-dir",
            work.path().to_str().unwrap(),
        ])
        .unwrap();

        assert_eq!(run(cli), Err(()));
        let entries = std::fs::read_dir(work.path()).unwrap().count();
        assert_eq!(entries, 0);
    }

    fn genyaml_args(api_url: &str, file: &std::path::Path) -> Cli {
        // PATH is always set, so it stands in for a token variable.
        parse(&[
            "--genyaml",
            "--token-envar",
            "PATH",
            "--api-url",
            api_url,
            "--ssh-host",
            "github.com",
            "--include",
            "api",
            "--exclude",
            "archived",
            "--file",
            file.to_str().unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn genyaml_writes_filtered_remotes_with_placeholder_identity() {
        let server = MockServer::start();
        let listing = server.mock(|when, then| {
            when.method(GET)
                .path("/user/repos")
                .query_param("type", "all")
                .query_param("page", "1");
            then.status(200).json_body(json!([
                {"full_name": "acme/api-core"},
                {"full_name": "acme/api-archived"},
                {"full_name": "acme/webapp"}
            ]));
        });
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let file = dir.path().join("rewit.yml");

        assert_eq!(run(genyaml_args(&server.base_url(), &file)), Ok(0));
        listing.assert();

        let written = std::fs::read_to_string(&file).expect("document not written");
        assert!(!written.contains("webapp"));
        assert!(!written.contains("archived"));

        let doc = config::read(&file).expect("document should parse");
        assert_eq!(doc.user.name, "John Doe");
        assert_eq!(doc.user.email, "john.doe@mail.com");
        assert_eq!(doc.repos, vec![RepoTarget::from("git@github.com:acme/api-core")]);
    }

    #[test]
    fn genyaml_listing_failure_leaves_no_document() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/user/repos");
            then.status(502).body("bad gateway");
        });
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let file = dir.path().join("rewit.yml");

        assert_eq!(run(genyaml_args(&server.base_url(), &file)), Err(()));
        assert!(!file.exists());
    }
}
