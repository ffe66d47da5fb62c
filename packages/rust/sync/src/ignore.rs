//! Generated ignore-list maintenance.
//!
//! Every output path mdxsync writes is recorded in a marker-delimited
//! section of the project ignore file. The section is sorted, deduplicated,
//! and merged non-destructively: entries from earlier runs and everything
//! outside the markers survive. Re-running with the same paths is a no-op.

use std::collections::BTreeSet;
use std::path::Path;

use mdxsync_shared::{MdxSyncError, Result};
use tracing::debug;

const BEGIN_MARKER: &str = "# BEGIN mdxsync generated files";
const END_MARKER: &str = "# END mdxsync generated files";

/// Merge `new_paths` into the managed section of `existing`, returning the
/// full rewritten file content.
pub fn merge_ignore_entries(existing: &str, new_paths: &[String]) -> String {
    let (before, current, after) = split_sections(existing);

    let mut entries: BTreeSet<String> = current
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();
    entries.extend(new_paths.iter().map(|p| p.trim().to_string()));

    let mut section = String::new();
    section.push_str(BEGIN_MARKER);
    section.push('\n');
    for entry in &entries {
        section.push_str(entry);
        section.push('\n');
    }
    section.push_str(END_MARKER);
    section.push('\n');

    let mut out = String::new();
    if !before.is_empty() {
        out.push_str(before);
        if !before.ends_with('\n') {
            out.push('\n');
        }
        // One blank line between prior content and the managed section.
        if !before.ends_with("\n\n") {
            out.push('\n');
        }
    }
    out.push_str(&section);
    out.push_str(after);
    out
}

/// Split `content` into (before, managed-section-body, after).
fn split_sections(content: &str) -> (&str, &str, &str) {
    let Some(begin) = content.find(BEGIN_MARKER) else {
        return (content, "", "");
    };
    let body_start = begin + BEGIN_MARKER.len();

    let Some(end_rel) = content[body_start..].find(END_MARKER) else {
        // Unterminated section: treat everything after the marker as body.
        return (&content[..begin], &content[body_start..], "");
    };
    let end = body_start + end_rel;

    let mut after_start = end + END_MARKER.len();
    if content[after_start..].starts_with('\n') {
        after_start += 1;
    }

    (
        &content[..begin],
        &content[body_start..end],
        &content[after_start..],
    )
}

/// Read, merge, and rewrite the ignore file at `path`. A missing file is
/// created. The file is only rewritten when the merge changed it.
pub fn update_ignore_file(path: &Path, new_paths: &[String]) -> Result<()> {
    let existing = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(MdxSyncError::io(path, e)),
    };

    let merged = merge_ignore_entries(&existing, new_paths);
    if merged == existing {
        debug!(?path, "ignore file already up to date");
        return Ok(());
    }

    std::fs::write(path, &merged).map_err(|e| MdxSyncError::io(path, e))?;
    debug!(?path, entries = new_paths.len(), "ignore file updated");
    Ok(())
}
