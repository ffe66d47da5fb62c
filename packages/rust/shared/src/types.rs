//! Core domain types for mdxsync content migration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// One declared (source, destination) content-migration unit.
///
/// Jobs are immutable once declared: either listed statically in the config
/// file or derived by enumerating a repository tree. Each job is consumed
/// exactly once by the sync driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Raw-content URL the document is fetched from.
    pub source_url: Url,
    /// Output path relative to the section's output root.
    pub output_path: PathBuf,
    /// Document title for the generated front-matter.
    pub title: String,
    /// Document description for the generated front-matter.
    pub description: String,
    /// URL used to resolve relative links inside the document.
    /// Usually equal to `source_url`; may differ for mirrored content.
    pub content_url: Url,
}

impl Job {
    /// A job whose content URL matches its source URL (the common case).
    pub fn new(
        source_url: Url,
        output_path: impl Into<PathBuf>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let content_url = source_url.clone();
        Self {
            source_url,
            output_path: output_path.into(),
            title: title.into(),
            description: description.into(),
            content_url,
        }
    }
}

// ---------------------------------------------------------------------------
// TransformMeta
// ---------------------------------------------------------------------------

/// Per-job metadata passed read-only to every transform in a pipeline.
#[derive(Debug, Clone)]
pub struct TransformMeta {
    /// Document title for front-matter.
    pub title: String,
    /// Document description for front-matter.
    pub description: String,
    /// Directory-level URL relative links are resolved against.
    pub source_base_url: Url,
    /// Browser-facing edit URL, if one could be derived from the source.
    pub edit_url: Option<Url>,
}

impl TransformMeta {
    /// Build metadata for a job, given its derived base and edit URLs.
    pub fn for_job(job: &Job, source_base_url: Url, edit_url: Option<Url>) -> Self {
        Self {
            title: job.title.clone(),
            description: job.description.clone(),
            source_base_url,
            edit_url,
        }
    }
}

/// The directory-level URL of a document URL (everything up to and
/// including the final `/`).
///
/// `https://host/a/b/README.md` → `https://host/a/b/`.
pub fn directory_url(url: &Url) -> Url {
    // Joining "." against a file URL drops the last path segment.
    url.join(".").unwrap_or_else(|_| url.clone())
}
