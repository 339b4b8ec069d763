//! Remote address handling.
//!
//! Converts canonical `owner/name` or HTTPS addresses into SSH remotes and
//! derives the local directory name used for a bare clone.

use crate::error::RewriteError;

/// SSH host used when the address carries none.
pub const DEFAULT_SSH_HOST: &str = "github.com";

/// Converts a canonical address to `git@github.com:owner/name`.
///
/// See [`to_ssh_address_on`] for the accepted input forms.
pub fn to_ssh_address(canonical: &str) -> String {
    to_ssh_address_on(DEFAULT_SSH_HOST, canonical)
}

/// Converts a canonical address to an SSH-style remote on `default_host`.
///
/// Accepted inputs:
/// - `owner/name` (uses `default_host`)
/// - `https://host/owner/name[.git]` and `http://...` (keeps `host`)
/// - `ssh://[git@]host/owner/name[.git]` (keeps `host`)
/// - `git@host:owner/name[.git]` (already SSH-style; only `.git` is trimmed)
///
/// Exactly one trailing `.git` is removed, so the function is idempotent on
/// its own output.
///
/// # Examples
///
/// ```
/// use rewit::address::to_ssh_address;
///
/// assert_eq!(to_ssh_address("acme/widgets.git"), "git@github.com:acme/widgets");
/// assert_eq!(
///     to_ssh_address("https://github.com/acme/widgets.git"),
///     "git@github.com:acme/widgets"
/// );
/// assert_eq!(to_ssh_address("git@github.com:acme/widgets"), "git@github.com:acme/widgets");
/// ```
pub fn to_ssh_address_on(default_host: &str, canonical: &str) -> String {
    let (host, path) = split_host(default_host, canonical.trim());
    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    format!("git@{}:{}", host, path)
}

/// Splits an address into host and repository path.
fn split_host<'a>(default_host: &'a str, address: &'a str) -> (&'a str, &'a str) {
    if let Some(rest) = address.strip_prefix("git@") {
        if let Some((host, path)) = rest.split_once(':') {
            return (host, path);
        }
    }

    for scheme in ["https://", "http://", "ssh://git@", "ssh://"] {
        if let Some(rest) = address.strip_prefix(scheme) {
            if let Some((host, path)) = rest.split_once('/') {
                return (host, path);
            }
        }
    }

    (default_host, address)
}

/// Derives the local directory stem for `target`.
///
/// Takes the last `/`-delimited component and strips a trailing `.git`.
/// The bare clone goes into `<stem>.git`.
///
/// # Errors
///
/// Returns [`RewriteError::InvalidTarget`] when the stem is empty or is a
/// relative path component (`.`/`..`).
pub fn local_dir_name(target: &str) -> Result<String, RewriteError> {
    let last = target.trim().rsplit('/').next().unwrap_or_default();
    let stem = last.strip_suffix(".git").unwrap_or(last);

    if stem.is_empty() || stem == "." || stem == ".." {
        return Err(RewriteError::InvalidTarget(target.to_string()));
    }
    Ok(stem.to_string())
}

/// Derives the SSH host from a GitHub API base URL.
///
/// - `https://api.github.com` -> `github.com`
/// - `https://<host>/api/v3` -> `<host>`
/// - anything else -> the URL's host
///
/// A `:port` is dropped, since scp-style addresses cannot carry one.
pub fn ssh_host_for_api(api_url: &str) -> String {
    let url = api_url.trim().trim_end_matches('/');
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);

    if without_scheme.eq_ignore_ascii_case("api.github.com") {
        return DEFAULT_SSH_HOST.to_string();
    }

    let host = without_scheme
        .strip_suffix("/api/v3")
        .unwrap_or(without_scheme);
    let host = host.split('/').next().unwrap_or(host);
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name.to_string(),
        _ => host.to_string(),
    }
}
