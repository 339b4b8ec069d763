//! Repository discovery through the GitHub REST API.

use std::env;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, LINK, USER_AGENT};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::address::to_ssh_address_on;
use crate::config::{ConfigDocument, Identity, PLACEHOLDER_EMAIL, PLACEHOLDER_NAME, RepoTarget};
use crate::error::DiscoveryError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Access token for the hosting provider.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Reads the token from the environment variable `var`.
    ///
    /// An unset or blank variable is an authentication error.
    pub fn from_env(var: &str) -> Result<Self, DiscoveryError> {
        match env::var(var) {
            Ok(token) if !token.trim().is_empty() => Ok(Self(token.trim().to_string())),
            _ => Err(DiscoveryError::Authentication(format!(
                "no GitHub token found in environment variable {}",
                var
            ))),
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Substring filters applied to each repository's `owner/name`.
#[derive(Debug, Clone, Default)]
pub struct RepoFilter {
    include: Option<String>,
    exclude: Option<String>,
}

impl RepoFilter {
    /// Builds a filter; empty strings mean "not set".
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        let set = |s: Option<&str>| s.filter(|s| !s.is_empty()).map(str::to_string);
        Self {
            include: set(include),
            exclude: set(exclude),
        }
    }

    /// Keeps a name when it passes the include filter and does not match the
    /// exclude filter. Exclusion wins over inclusion.
    pub fn keeps(&self, full_name: &str) -> bool {
        let included = self
            .include
            .as_deref()
            .is_none_or(|inc| full_name.contains(inc));
        let excluded = self
            .exclude
            .as_deref()
            .is_some_and(|exc| full_name.contains(exc));
        included && !excluded
    }
}

#[derive(Debug, Deserialize)]
struct GitHubRepo {
    full_name: String,
}

/// Asynchronous client for the repository listing endpoint.
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    credential: Credential,
}

impl GitHubClient {
    pub fn new(api_url: impl Into<String>, credential: Credential) -> Result<Self, DiscoveryError> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("rewit/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        debug!(api_url = %api_url, "created GitHubClient");
        Ok(Self {
            http,
            api_url,
            credential,
        })
    }

    /// Lists the full names of all repositories visible to the token,
    /// following `Link: rel="next"` until exhausted. Names are reported to
    /// `on_repo` in listing order as they arrive.
    #[instrument(skip(self, on_repo))]
    pub async fn list_repos(
        &self,
        mut on_repo: impl FnMut(&str),
    ) -> Result<Vec<String>, DiscoveryError> {
        let first = format!("{}/user/repos", self.api_url);
        let mut request = self
            .http
            .get(&first)
            .query(&[("type", "all"), ("per_page", "100"), ("page", "1")]);

        let mut names = Vec::new();
        let mut page = 1usize;
        loop {
            let resp = request.bearer_auth(&self.credential.0).send().await?;
            let resp = check_response(resp).await?;
            let next = resp
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(next_page_url);

            let repos: Vec<GitHubRepo> = resp.json().await?;
            debug!(page, count = repos.len(), "fetched repository page");
            for repo in repos {
                on_repo(&repo.full_name);
                names.push(repo.full_name);
            }

            match next {
                Some(url) => {
                    request = self.http.get(url);
                    page += 1;
                }
                None => break,
            }
        }

        info!(total = names.len(), pages = page, "listed repositories");
        Ok(names)
    }
}

/// Maps non-success statuses to typed errors.
async fn check_response(resp: Response) -> Result<Response, DiscoveryError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(DiscoveryError::Authentication(format!(
            "HTTP {}: {}",
            status,
            body.trim()
        )));
    }
    Err(DiscoveryError::Api {
        status: status.as_u16(),
        body: body.trim().to_string(),
    })
}

/// Extracts the `rel="next"` target from an RFC 8288 `Link` header.
pub(crate) fn next_page_url(link: &str) -> Option<String> {
    link.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

/// Lists repositories, filters them, and converts survivors to SSH remotes.
///
/// `ssh_host` is the host placed in every generated remote; see
/// [`ssh_host_for_api`](crate::address::ssh_host_for_api). `on_evaluate`
/// receives every listed full name before filtering.
pub async fn discover(
    client: &GitHubClient,
    filter: &RepoFilter,
    ssh_host: &str,
    mut on_evaluate: impl FnMut(&str),
) -> Result<Vec<RepoTarget>, DiscoveryError> {
    let names = client.list_repos(|name| on_evaluate(name)).await?;

    let targets: Vec<RepoTarget> = names
        .iter()
        .filter(|name| filter.keeps(name))
        .map(|name| RepoTarget::new(to_ssh_address_on(ssh_host, name)))
        .collect();
    info!(kept = targets.len(), listed = names.len(), "filtered repositories");
    Ok(targets)
}

/// Builds the document written by discovery mode.
///
/// Missing identity fields fall back to placeholders the operator is
/// expected to edit before a rewrite.
pub fn build_document(
    name: Option<&str>,
    email: Option<&str>,
    repos: Vec<RepoTarget>,
) -> ConfigDocument {
    let user = Identity::new(PLACEHOLDER_NAME, PLACEHOLDER_EMAIL).with_overrides(name, email);
    ConfigDocument::new(user, repos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn filter_without_patterns_keeps_everything() {
        let f = RepoFilter::new(None, Some(""));
        assert!(f.keeps("acme/anything"));
    }

    #[test]
    fn filter_matches_boolean_definition() {
        let names = ["acme/api-core", "acme/api-archived-old", "acme/webapp", "x/archived"];
        let patterns = [None, Some(""), Some("api"), Some("archived"), Some("acme")];
        for inc in patterns {
            for exc in patterns {
                let f = RepoFilter::new(inc, exc);
                for name in names {
                    let inc_ok = inc.is_none_or(|i| i.is_empty() || name.contains(i));
                    let exc_hit = exc.is_some_and(|e| !e.is_empty() && name.contains(e));
                    assert_eq!(f.keeps(name), inc_ok && !exc_hit, "{inc:?} {exc:?} {name}");
                }
            }
        }
    }

    #[test]
    fn exclude_takes_precedence() {
        let f = RepoFilter::new(Some("api"), Some("api"));
        assert!(!f.keeps("acme/api-core"));
    }

    #[test]
    fn next_link_is_found_among_relations() {
        let link = "<https://api.github.com/user/repos?page=3>; rel=\"last\", \
                    <https://api.github.com/user/repos?page=2>; rel=\"next\"";
        assert_eq!(
            next_page_url(link).as_deref(),
            Some("https://api.github.com/user/repos?page=2")
        );
    }

    #[test]
    fn no_next_link_on_last_page() {
        let link = "<https://api.github.com/user/repos?page=1>; rel=\"prev\", \
                    <https://api.github.com/user/repos?page=1>; rel=\"first\"";
        assert_eq!(next_page_url(link), None);
        assert_eq!(next_page_url(""), None);
    }

    #[test]
    fn missing_token_variable_is_authentication_error() {
        let err = Credential::from_env("REWIT_TEST_TOKEN_THAT_IS_NEVER_SET").unwrap_err();
        assert!(matches!(err, DiscoveryError::Authentication(_)));
        assert!(err.to_string().contains("REWIT_TEST_TOKEN_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn credential_debug_hides_token() {
        let c = Credential::new("ghp_secret");
        assert!(!format!("{c:?}").contains("ghp_secret"));
    }

    #[test]
    fn build_document_uses_placeholders() {
        let doc = build_document(None, Some("me@example.com"), vec![]);
        assert_eq!(doc.user, Identity::new(PLACEHOLDER_NAME, "me@example.com"));
    }

    #[tokio::test]
    async fn discover_filters_and_normalizes() {
        let server = MockServer::start_async().await;
        let listing = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/user/repos")
                    .query_param("type", "all")
                    .query_param("page", "1")
                    .header("authorization", "Bearer t0ken");
                then.status(200).json_body(json!([
                    {"full_name": "acme/api-core"},
                    {"full_name": "acme/api-archived-old"},
                    {"full_name": "acme/webapp"}
                ]));
            })
            .await;

        let client = GitHubClient::new(server.base_url(), Credential::new("t0ken")).unwrap();
        let filter = RepoFilter::new(Some("api"), Some("archived"));
        let mut seen = Vec::new();
        let targets = discover(&client, &filter, "github.com", |n| seen.push(n.to_string()))
            .await
            .unwrap();

        listing.assert_async().await;
        assert_eq!(seen, ["acme/api-core", "acme/api-archived-old", "acme/webapp"]);
        assert_eq!(targets, vec![RepoTarget::from("git@github.com:acme/api-core")]);
    }

    #[tokio::test]
    async fn list_follows_pagination_in_order() {
        let server = MockServer::start_async().await;
        let next = server.url("/user/repos?type=all&per_page=100&page=2");
        let link = format!("<{}>; rel=\"next\", <{}>; rel=\"last\"", next, next);
        let page1 = server
            .mock_async(|when, then| {
                when.method(GET).path("/user/repos").query_param("page", "1");
                then.status(200)
                    .header("link", &link)
                    .json_body(json!([{"full_name": "acme/one"}, {"full_name": "acme/two"}]));
            })
            .await;
        let page2 = server
            .mock_async(|when, then| {
                when.method(GET).path("/user/repos").query_param("page", "2");
                then.status(200).json_body(json!([{"full_name": "acme/three"}]));
            })
            .await;

        let client = GitHubClient::new(server.base_url(), Credential::new("t")).unwrap();
        let names = client.list_repos(|_| {}).await.unwrap();

        page1.assert_async().await;
        page2.assert_async().await;
        assert_eq!(names, ["acme/one", "acme/two", "acme/three"]);
    }

    #[tokio::test]
    async fn unauthorized_maps_to_authentication_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/user/repos");
                then.status(401).body("{\"message\":\"Bad credentials\"}");
            })
            .await;

        let client = GitHubClient::new(server.base_url(), Credential::new("bad")).unwrap();
        let err = discover(&client, &RepoFilter::default(), "github.com", |_| {})
            .await
            .unwrap_err();
        match err {
            DiscoveryError::Authentication(msg) => assert!(msg.contains("Bad credentials")),
            other => panic!("expected authentication error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_aborts_without_partial_list() {
        let server = MockServer::start_async().await;
        let next = server.url("/user/repos?page=2");
        server
            .mock_async(|when, then| {
                when.method(GET).path("/user/repos").query_param("page", "1");
                then.status(200)
                    .header("link", format!("<{}>; rel=\"next\"", next))
                    .json_body(json!([{"full_name": "acme/one"}]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/user/repos").query_param("page", "2");
                then.status(502).body("bad gateway");
            })
            .await;

        let client = GitHubClient::new(server.base_url(), Credential::new("t")).unwrap();
        let result = discover(&client, &RepoFilter::default(), "github.com", |_| {}).await;
        match result {
            Err(DiscoveryError::Api { status, body }) => {
                assert_eq!(status, 502);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }
}
