//! Generated front-matter for emitted MDX documents.

use std::sync::LazyLock;

use mdxsync_shared::TransformMeta;
use regex::Regex;
use url::Url;

static FRONTMATTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A---\r?\n.*?\r?\n---\r?\n?").expect("valid regex"));

/// Remove a pre-existing leading `--- … ---` block, if any.
pub fn strip_frontmatter(content: &str) -> String {
    FRONTMATTER_RE.replace(content, "").to_string()
}

/// Prepend generated front-matter, replacing any existing block.
///
/// The result always has exactly one front-matter header and ends with a
/// single trailing newline.
pub fn add_frontmatter(content: &str, meta: &TransformMeta) -> String {
    let body = strip_frontmatter(content);
    let body = body.trim_start_matches('\n').trim_end_matches('\n');

    let edit_url = meta
        .edit_url
        .as_ref()
        .map(Url::as_str)
        .unwrap_or_default();

    format!(
        "---\ntitle: \"{}\"\ndescription: \"{}\"\nedit_url: {}\n---\n\n{}\n",
        escape_quotes(&meta.title),
        escape_quotes(&meta.description),
        edit_url,
        body,
    )
}

/// Escape embedded double quotes in a YAML string value.
fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdxsync_shared::directory_url;

    fn meta() -> TransformMeta {
        TransformMeta {
            title: "Getting Started".into(),
            description: "A \"quoted\" description".into(),
            source_base_url: directory_url(
                &Url::parse("https://raw.githubusercontent.com/x/y/main/README.md").unwrap(),
            ),
            edit_url: Some(Url::parse("https://github.com/x/y/edit/main/README.md").unwrap()),
        }
    }

    #[test]
    fn frontmatter_fields_emitted() {
        let result = add_frontmatter("Body text.", &meta());
        assert!(result.starts_with("---\n"));
        assert!(result.contains("title: \"Getting Started\""));
        assert!(result.contains("description: \"A \\\"quoted\\\" description\""));
        assert!(result.contains("edit_url: https://github.com/x/y/edit/main/README.md"));
        assert!(result.ends_with("Body text.\n"));
    }

    #[test]
    fn missing_edit_url_left_empty() {
        let mut m = meta();
        m.edit_url = None;
        let result = add_frontmatter("Body.", &m);
        assert!(result.contains("edit_url: \n"));
    }

    #[test]
    fn existing_frontmatter_replaced_not_duplicated() {
        let input = "---\ntitle: old\n---\n\nBody.";
        let result = add_frontmatter(input, &meta());
        assert_eq!(result.matches("---\n").count(), 2);
        assert!(!result.contains("title: old"));
        assert!(result.contains("Body."));
    }

    #[test]
    fn add_frontmatter_is_idempotent() {
        let m = meta();
        let once = add_frontmatter("Body.", &m);
        let twice = add_frontmatter(&once, &m);
        assert_eq!(once, twice);
    }

    #[test]
    fn strip_frontmatter_ignores_mid_document_rules() {
        let input = "Text.\n\n---\n\nMore text.";
        assert_eq!(strip_frontmatter(input), input);
    }
}
