//! Fetch/emit driver.
//!
//! Consumes a list of jobs: fetch each document over HTTP, run the
//! section's transform pipeline, apply the final repair pass, write the
//! result under the output root. Fetch failures skip the job and are
//! counted; filesystem failures abort the batch, since silently losing
//! documentation is worse than a visible failure.

pub mod ignore;

use std::path::PathBuf;
use std::time::Duration;

use mdxsync_shared::{Job, MdxSyncError, Result, TransformMeta, directory_url};
use mdxsync_transform::{Pipeline, repair};
use tracing::{debug, info, instrument, warn};
use url::Url;

pub use ignore::{merge_ignore_entries, update_ignore_file};

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// HTTP fetcher for raw document content. One attempt per job, no retries.
pub struct ContentFetcher {
    http: reqwest::Client,
}

impl ContentFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("mdxsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MdxSyncError::Network(e.to_string()))?;
        Ok(Self { http })
    }

    /// Fetch a document body, treating any non-2xx status as an error.
    pub async fn fetch(&self, url: &Url) -> Result<String> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| MdxSyncError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MdxSyncError::Network(format!("{url} returned {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| MdxSyncError::Network(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Edit URL derivation
// ---------------------------------------------------------------------------

/// Derive the browser edit URL for a source document, when the source is a
/// GitHub raw or blob URL. Other hosts get no edit link.
///
/// `raw.githubusercontent.com/o/r/branch/p` → `github.com/o/r/edit/branch/p`.
pub fn derive_edit_url(source: &Url) -> Option<Url> {
    match source.host_str()? {
        "raw.githubusercontent.com" => {
            let mut segments = source.path_segments()?;
            let owner = segments.next()?;
            let repo = segments.next()?;
            let branch = segments.next()?;
            let rest: Vec<&str> = segments.collect();
            if rest.is_empty() {
                return None;
            }
            Url::parse(&format!(
                "https://github.com/{owner}/{repo}/edit/{branch}/{}",
                rest.join("/")
            ))
            .ok()
        }
        "github.com" if source.path().contains("/blob/") => {
            Url::parse(&source.as_str().replacen("/blob/", "/edit/", 1)).ok()
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Batch driver
// ---------------------------------------------------------------------------

/// Outcome of one batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Jobs fetched, transformed, and written.
    pub succeeded: usize,
    /// Failed jobs as (source URL, error message).
    pub failed: Vec<(String, String)>,
    /// Paths written to disk (empty on a dry run).
    pub written: Vec<PathBuf>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed.len()
    }
}

/// Batch-level options.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Directory job output paths are resolved under.
    pub output_root: PathBuf,
    /// Fetch and transform but write nothing.
    pub dry_run: bool,
}

/// Run every job through `pipeline` and write the results.
///
/// `progress` is invoked with each job before it is processed. Fetch
/// failures are recorded and skipped; filesystem errors propagate.
#[instrument(skip_all, fields(jobs = jobs.len(), pipeline = pipeline.name))]
pub async fn run_batch(
    fetcher: &ContentFetcher,
    jobs: &[Job],
    pipeline: &Pipeline,
    options: &SyncOptions,
    mut progress: impl FnMut(&Job),
) -> Result<BatchSummary> {
    let mut summary = BatchSummary::default();

    for job in jobs {
        progress(job);

        let raw = match fetcher.fetch(&job.source_url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %job.source_url, error = %e, "fetch failed, skipping job");
                summary.failed.push((job.source_url.to_string(), e.to_string()));
                continue;
            }
        };

        let meta = TransformMeta::for_job(
            job,
            directory_url(&job.content_url),
            derive_edit_url(&job.source_url),
        );

        let transformed = pipeline.run(&raw, &meta);
        let output = repair(&transformed);

        let target = options.output_root.join(&job.output_path);
        if options.dry_run {
            debug!(path = ?target, "dry run, skipping write");
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| MdxSyncError::io(parent, e))?;
            }
            std::fs::write(&target, &output).map_err(|e| MdxSyncError::io(&target, e))?;
            debug!(path = ?target, bytes = output.len(), "wrote document");
            summary.written.push(target);
        }

        summary.succeeded += 1;
    }

    info!(
        succeeded = summary.succeeded,
        failed = summary.failed.len(),
        "batch complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdxsync_transform::pipeline;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn job_for(server_uri: &str, doc_path: &str, output: &str) -> Job {
        let url = Url::parse(&format!("{server_uri}{doc_path}")).unwrap();
        Job::new(url, output, "Guide", "A test guide")
    }

    #[test]
    fn edit_url_from_raw_host() {
        let source =
            Url::parse("https://raw.githubusercontent.com/x/y/main/docs/guide.md").unwrap();
        assert_eq!(
            derive_edit_url(&source).unwrap().as_str(),
            "https://github.com/x/y/edit/main/docs/guide.md"
        );
    }

    #[test]
    fn edit_url_from_blob_url() {
        let source = Url::parse("https://github.com/x/y/blob/main/docs/guide.md").unwrap();
        assert_eq!(
            derive_edit_url(&source).unwrap().as_str(),
            "https://github.com/x/y/edit/main/docs/guide.md"
        );
    }

    #[test]
    fn edit_url_absent_for_other_hosts() {
        let source = Url::parse("https://example.com/docs/guide.md").unwrap();
        assert!(derive_edit_url(&source).is_none());
    }

    #[test]
    fn edit_url_absent_for_bare_repo_path() {
        let source = Url::parse("https://raw.githubusercontent.com/x/y/main").unwrap();
        assert!(derive_edit_url(&source).is_none());
    }

    #[tokio::test]
    async fn batch_writes_transformed_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/x/y/main/docs/guide.md"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("# Guide\n\nHello ≤ world\n"),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let options = SyncOptions {
            output_root: dir.path().to_path_buf(),
            dry_run: false,
        };

        let fetcher = ContentFetcher::new(Duration::from_secs(5)).expect("fetcher");
        let jobs = vec![job_for(&server.uri(), "/x/y/main/docs/guide.md", "guide.mdx")];

        let summary = run_batch(&fetcher, &jobs, &pipeline("default"), &options, |_| {})
            .await
            .expect("batch");

        assert_eq!(summary.succeeded, 1);
        assert!(summary.failed.is_empty());

        let written = std::fs::read_to_string(dir.path().join("guide.mdx")).expect("read");
        assert!(written.starts_with("---\ntitle: \"Guide\""));
        assert!(written.contains("Hello &lt;= world"));
    }

    #[tokio::test]
    async fn fetch_failure_skips_job_and_continues() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.md"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ok.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# OK\n\nbody\n"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let options = SyncOptions {
            output_root: dir.path().to_path_buf(),
            dry_run: false,
        };

        let fetcher = ContentFetcher::new(Duration::from_secs(5)).expect("fetcher");
        let jobs = vec![
            job_for(&server.uri(), "/missing.md", "missing.mdx"),
            job_for(&server.uri(), "/ok.md", "ok.mdx"),
        ];

        let summary = run_batch(&fetcher, &jobs, &pipeline("default"), &options, |_| {})
            .await
            .expect("batch");

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed.len(), 1);
        assert!(summary.failed[0].0.contains("/missing.md"));
        assert!(dir.path().join("ok.mdx").exists());
        assert!(!dir.path().join("missing.mdx").exists());
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# Doc\n\nbody\n"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let options = SyncOptions {
            output_root: dir.path().to_path_buf(),
            dry_run: true,
        };

        let fetcher = ContentFetcher::new(Duration::from_secs(5)).expect("fetcher");
        let jobs = vec![job_for(&server.uri(), "/doc.md", "doc.mdx")];

        let summary = run_batch(&fetcher, &jobs, &pipeline("default"), &options, |_| {})
            .await
            .expect("batch");

        assert_eq!(summary.succeeded, 1);
        assert!(!dir.path().join("doc.mdx").exists());
    }

    #[tokio::test]
    async fn progress_called_per_job() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# A\n\nbody\n"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let options = SyncOptions {
            output_root: dir.path().to_path_buf(),
            dry_run: true,
        };

        let fetcher = ContentFetcher::new(Duration::from_secs(5)).expect("fetcher");
        let jobs = vec![
            job_for(&server.uri(), "/a.md", "a.mdx"),
            job_for(&server.uri(), "/b.md", "b.mdx"),
        ];

        let mut seen = Vec::new();
        run_batch(&fetcher, &jobs, &pipeline("default"), &options, |job| {
            seen.push(job.output_path.clone());
        })
        .await
        .expect("batch");

        assert_eq!(seen.len(), 2);
    }
}
