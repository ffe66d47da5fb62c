//! GitHub repository tree discovery and dynamic job derivation.
//!
//! Tree enumeration hides behind the [`FileLister`] capability trait so the
//! hosting provider is swappable; [`GithubClient`] is the REST
//! implementation. [`derive_jobs`] turns a listed tree into concrete
//! [`Job`]s, independent of where the listing came from.

pub mod titles;

use std::time::Duration;

use async_trait::async_trait;
use mdxsync_shared::{Job, MdxSyncError, RepoSourceConfig, Result};
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

pub use titles::{humanize, title_from_path};

// ---------------------------------------------------------------------------
// Capability trait
// ---------------------------------------------------------------------------

/// Anything that can list the file paths under a repository ref.
#[async_trait]
pub trait FileLister {
    async fn list_files(&self, owner: &str, repo: &str, branch: &str) -> Result<Vec<String>>;
}

// ---------------------------------------------------------------------------
// GitHub REST implementation
// ---------------------------------------------------------------------------

/// Git trees API client (`GET /repos/{owner}/{repo}/git/trees/{ref}`).
pub struct GithubClient {
    http: reqwest::Client,
    api_base: Url,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

impl GithubClient {
    /// Build a client against `api_base` with the given request timeout.
    /// `token` is sent as a bearer credential when present.
    pub fn new(api_base: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let api_base = Url::parse(api_base)
            .map_err(|e| MdxSyncError::config(format!("invalid api_base {api_base:?}: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("mdxsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MdxSyncError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_base,
            token,
        })
    }
}

#[async_trait]
impl FileLister for GithubClient {
    #[instrument(skip(self))]
    async fn list_files(&self, owner: &str, repo: &str, branch: &str) -> Result<Vec<String>> {
        let url = self
            .api_base
            .join(&format!("repos/{owner}/{repo}/git/trees/{branch}?recursive=1"))
            .map_err(|e| MdxSyncError::parse(format!("tree URL: {e}")))?;

        let mut request = self
            .http
            .get(url.clone())
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MdxSyncError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MdxSyncError::Network(format!(
                "tree fetch for {owner}/{repo}@{branch} returned {status}"
            )));
        }

        let body: TreeResponse = response
            .json()
            .await
            .map_err(|e| MdxSyncError::parse(format!("tree payload: {e}")))?;

        if body.truncated {
            warn!(owner, repo, branch, "tree listing truncated by the API");
        }

        let files: Vec<String> = body
            .tree
            .into_iter()
            .filter(|entry| entry.kind == "blob")
            .map(|entry| entry.path)
            .collect();

        debug!(owner, repo, branch, count = files.len(), "listed tree");
        Ok(files)
    }
}

// ---------------------------------------------------------------------------
// Job derivation
// ---------------------------------------------------------------------------

/// Map the Markdown files of a listed tree to jobs.
///
/// Only `.md`/`.mdx` paths under the source's `path_prefix` qualify.
/// `README.md` becomes `index.mdx`; every other `.md` keeps its stem with
/// an `.mdx` extension.
pub fn derive_jobs(
    paths: &[String],
    source: &RepoSourceConfig,
    raw_base: &str,
) -> Result<Vec<Job>> {
    if source.owner.trim().is_empty() || source.repo.trim().is_empty() {
        return Err(MdxSyncError::validation(format!(
            "repository source needs both owner and repo, got {:?}/{:?}",
            source.owner, source.repo
        )));
    }

    let mut jobs = Vec::new();

    for path in paths {
        if !path.starts_with(&source.path_prefix) {
            continue;
        }
        if !(path.ends_with(".md") || path.ends_with(".mdx")) {
            continue;
        }

        let relative = &path[source.path_prefix.len()..];
        let output_path = output_path_for(relative.trim_start_matches('/'));

        let source_url = Url::parse(&format!(
            "{raw_base}/{}/{}/{}/{path}",
            source.owner, source.repo, source.branch
        ))
        .map_err(|e| MdxSyncError::parse(format!("source URL for {path:?}: {e}")))?;

        let title = title_from_path(path, &source.repo);
        let description = format!("{title} documentation");

        jobs.push(Job::new(source_url, output_path, title, description));
    }

    debug!(
        owner = source.owner,
        repo = source.repo,
        derived = jobs.len(),
        "derived jobs from tree"
    );
    Ok(jobs)
}

fn output_path_for(relative: &str) -> String {
    let (dir, file) = match relative.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, relative),
    };

    let renamed = if file.eq_ignore_ascii_case("readme.md") {
        "index.mdx".to_string()
    } else if let Some(stem) = file.strip_suffix(".md") {
        format!("{stem}.mdx")
    } else {
        file.to_string()
    };

    match dir {
        Some(dir) => format!("{dir}/{renamed}"),
        None => renamed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(prefix: &str) -> RepoSourceConfig {
        RepoSourceConfig {
            owner: "x".into(),
            repo: "avalanchego".into(),
            branch: "main".into(),
            path_prefix: prefix.into(),
        }
    }

    const RAW: &str = "https://raw.githubusercontent.com";

    #[test]
    fn derive_filters_non_markdown() {
        let paths = vec![
            "docs/guide.md".to_string(),
            "docs/diagram.png".to_string(),
            "src/main.go".to_string(),
        ];
        let jobs = derive_jobs(&paths, &source(""), RAW).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].output_path.to_str().unwrap(), "docs/guide.mdx");
    }

    #[test]
    fn derive_respects_path_prefix() {
        let paths = vec![
            "docs/guide.md".to_string(),
            "other/skip.md".to_string(),
        ];
        let jobs = derive_jobs(&paths, &source("docs/"), RAW).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].output_path.to_str().unwrap(), "guide.mdx");
    }

    #[test]
    fn readme_becomes_index() {
        let paths = vec!["docs/staking/README.md".to_string()];
        let jobs = derive_jobs(&paths, &source("docs/"), RAW).unwrap();
        assert_eq!(jobs[0].output_path.to_str().unwrap(), "staking/index.mdx");
        assert_eq!(jobs[0].title, "Staking");
    }

    #[test]
    fn source_url_points_at_raw_host() {
        let paths = vec!["docs/guide.md".to_string()];
        let jobs = derive_jobs(&paths, &source(""), RAW).unwrap();
        assert_eq!(
            jobs[0].source_url.as_str(),
            "https://raw.githubusercontent.com/x/avalanchego/main/docs/guide.md"
        );
        assert_eq!(jobs[0].content_url, jobs[0].source_url);
    }

    #[test]
    fn derive_rejects_blank_owner() {
        let paths = vec!["docs/guide.md".to_string()];
        let mut src = source("");
        src.owner = "  ".into();

        let result = derive_jobs(&paths, &src, RAW);
        assert!(matches!(result, Err(MdxSyncError::Validation { .. })));
    }

    #[test]
    fn mdx_files_pass_through_unrenamed() {
        let paths = vec!["docs/advanced.mdx".to_string()];
        let jobs = derive_jobs(&paths, &source(""), RAW).unwrap();
        assert_eq!(jobs[0].output_path.to_str().unwrap(), "docs/advanced.mdx");
    }

    #[tokio::test]
    async fn list_files_returns_blob_paths() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/x/avalanchego/git/trees/main"))
            .and(query_param("recursive", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tree": [
                    {"path": "docs", "type": "tree"},
                    {"path": "docs/guide.md", "type": "blob"},
                    {"path": "docs/img.png", "type": "blob"},
                ],
                "truncated": false,
            })))
            .mount(&server)
            .await;

        let client =
            GithubClient::new(&server.uri(), None, Duration::from_secs(5)).expect("client");
        let files = client.list_files("x", "avalanchego", "main").await.expect("list");

        assert_eq!(files, vec!["docs/guide.md", "docs/img.png"]);
    }

    #[tokio::test]
    async fn list_files_propagates_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client =
            GithubClient::new(&server.uri(), None, Duration::from_secs(5)).expect("client");
        let result = client.list_files("x", "missing", "main").await;

        assert!(matches!(result, Err(MdxSyncError::Network(_))));
    }
}
