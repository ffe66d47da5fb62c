//! Link resolution pass.
//!
//! Rewrites relative Markdown links and `<img>` sources to absolute URLs
//! against a per-document base URL. GitHub "blob" URLs pointing at images
//! are rewritten to their raw-content equivalents, since the blob page is
//! an HTML viewer rather than the image bytes.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::vault::protect_code_spans;

static MD_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)]+)\)").expect("valid regex"));

static IMG_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<img\b([^>]*?)\bsrc\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)([^>]*?)/?>"#)
        .expect("valid regex")
});

// `github.com/{owner}/{repo}/blob/{branch}/{path}.{img-ext}`
static BLOB_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https://github\.com/([^/]+)/([^/]+)/blob/(\S+\.(?:png|jpe?g|gif|svg))$")
        .expect("valid regex")
});

/// Resolve every Markdown link target and `<img>` source in `content`
/// against `base`.
///
/// Absolute URLs and `#anchors` are never rewritten, except for the
/// blob→raw special case on GitHub image URLs. Link syntax inside code
/// spans and math is documentation, not a link, and stays verbatim.
pub fn resolve_links(content: &str, base: &Url) -> String {
    let (protected, vault) = protect_code_spans(content);

    let resolved = resolve_markdown_links(&protected, base);
    let resolved = resolve_img_tags(&resolved, base);

    vault.restore_all(&resolved)
}

// ---------------------------------------------------------------------------
// Markdown links
// ---------------------------------------------------------------------------

fn resolve_markdown_links(content: &str, base: &Url) -> String {
    MD_LINK_RE
        .replace_all(content, |caps: &regex::Captures| {
            let text = &caps[1];
            let target = caps[2].trim();

            match resolve_target(target, base) {
                Some(resolved) => format!("[{text}]({resolved})"),
                None => caps[0].to_string(),
            }
        })
        .to_string()
}

/// Resolve one link target. Returns `None` when the target must be left
/// exactly as written.
fn resolve_target(target: &str, base: &Url) -> Option<String> {
    // Same-document anchors stay put.
    if target.starts_with('#') {
        return None;
    }

    if has_scheme(target) {
        // Absolute — untouched unless it is a blob URL for an image.
        return blob_to_raw(target);
    }

    base.join(target).ok().map(|u| u.to_string())
}

fn has_scheme(target: &str) -> bool {
    target.starts_with("http://")
        || target.starts_with("https://")
        || target.starts_with("mailto:")
}

/// `github.com/o/r/blob/…img` → `raw.githubusercontent.com/o/r/…img`
/// (the `/blob` segment disappears on the raw host).
fn blob_to_raw(target: &str) -> Option<String> {
    BLOB_IMAGE_RE.captures(target).map(|caps| {
        format!(
            "https://raw.githubusercontent.com/{}/{}/{}",
            &caps[1], &caps[2], &caps[3]
        )
    })
}

// ---------------------------------------------------------------------------
// <img> tags
// ---------------------------------------------------------------------------

fn resolve_img_tags(content: &str, base: &Url) -> String {
    IMG_TAG_RE
        .replace_all(content, |caps: &regex::Captures| {
            let pre = caps[1].trim();
            let post = caps[3].trim();

            let src = clean_src(&caps[2]);
            let resolved = resolve_src(&src, base);

            let mut tag = String::from("<img");
            if !pre.is_empty() {
                tag.push(' ');
                tag.push_str(pre);
            }
            tag.push_str(&format!(" src=\"{resolved}\""));
            if !post.is_empty() {
                tag.push(' ');
                tag.push_str(post);
            }
            tag.push_str(" />");
            tag
        })
        .to_string()
}

/// Unquote a captured src value and strip whitespace/query artifacts that
/// show up in mechanically generated markup.
fn clean_src(raw: &str) -> String {
    let unquoted = raw
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .trim_end_matches('/');

    let compact: String = unquoted.chars().filter(|c| !c.is_whitespace()).collect();

    // Query strings on raw content (`?raw=true` and friends) break
    // resolution against directory bases; drop them.
    match compact.split_once('?') {
        Some((path, _)) => path.to_string(),
        None => compact,
    }
}

fn resolve_src(src: &str, base: &Url) -> String {
    if has_scheme(src) {
        return blob_to_raw(src).unwrap_or_else(|| src.to_string());
    }

    match base.join(src) {
        // A relative src resolved against a blob-browsing base lands on the
        // viewer page; github serves the bytes from the `/raw/` path.
        Ok(resolved) => {
            let s = resolved.to_string();
            if s.starts_with("https://github.com/") {
                s.replacen("/blob/", "/raw/", 1)
            } else {
                s
            }
        }
        Err(_) => src.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://raw.githubusercontent.com/x/y/main/docs/").unwrap()
    }

    #[test]
    fn relative_link_resolved() {
        let result = resolve_links("[guide](./guide.md)", &base());
        assert_eq!(
            result,
            "[guide](https://raw.githubusercontent.com/x/y/main/docs/guide.md)"
        );
    }

    #[test]
    fn parent_relative_link_resolved() {
        let result = resolve_links("[top](../README.md)", &base());
        assert_eq!(
            result,
            "[top](https://raw.githubusercontent.com/x/y/main/README.md)"
        );
    }

    #[test]
    fn absolute_link_untouched() {
        let input = "[site](https://example.com/page)";
        assert_eq!(resolve_links(input, &base()), input);
    }

    #[test]
    fn mailto_untouched() {
        let input = "[mail](mailto:dev@example.com)";
        assert_eq!(resolve_links(input, &base()), input);
    }

    #[test]
    fn anchor_untouched() {
        let input = "[section](#installation)";
        assert_eq!(resolve_links(input, &base()), input);
    }

    #[test]
    fn blob_image_link_rewritten_to_raw() {
        let input = "[diagram](https://github.com/x/y/blob/main/img/arch.png)";
        assert_eq!(
            resolve_links(input, &base()),
            "[diagram](https://raw.githubusercontent.com/x/y/main/img/arch.png)"
        );
    }

    #[test]
    fn blob_non_image_link_untouched() {
        let input = "[code](https://github.com/x/y/blob/main/src/lib.rs)";
        assert_eq!(resolve_links(input, &base()), input);
    }

    #[test]
    fn img_src_resolved_and_self_closed() {
        let result = resolve_links("<img src=\"./pic.png\">", &base());
        assert_eq!(
            result,
            "<img src=\"https://raw.githubusercontent.com/x/y/main/docs/pic.png\" />"
        );
    }

    #[test]
    fn img_src_against_blob_base_uses_raw_path() {
        let blob_base = Url::parse("https://github.com/x/y/blob/main/docs/").unwrap();
        let result = resolve_links("<img src=\"./pic.png\">", &blob_base);
        assert_eq!(
            result,
            "<img src=\"https://github.com/x/y/raw/main/docs/pic.png\" />"
        );
    }

    #[test]
    fn img_attributes_preserved() {
        let result = resolve_links("<img alt=\"a\" src=\"x.png\" width=\"40\"/>", &base());
        assert_eq!(
            result,
            "<img alt=\"a\" src=\"https://raw.githubusercontent.com/x/y/main/docs/x.png\" width=\"40\" />"
        );
    }

    #[test]
    fn img_src_whitespace_and_query_stripped() {
        let result = resolve_links("<img src=\"pic .png?raw=true\">", &base());
        assert_eq!(
            result,
            "<img src=\"https://raw.githubusercontent.com/x/y/main/docs/pic.png\" />"
        );
    }

    #[test]
    fn img_absolute_src_untouched() {
        let input = "<img src=\"https://cdn.example.com/a.png\" />";
        assert_eq!(resolve_links(input, &base()), input);
    }

    #[test]
    fn links_inside_code_fences_untouched() {
        let input = "```md\n[example](./a.md)\n```";
        assert_eq!(resolve_links(input, &base()), input);
    }

    #[test]
    fn links_inside_inline_code_untouched() {
        let input = "use `[x](./a.md)` for links";
        assert_eq!(resolve_links(input, &base()), input);
    }

    #[test]
    fn links_inside_tables_still_resolved() {
        let result = resolve_links("| [guide](./guide.md) |", &base());
        assert_eq!(
            result,
            "| [guide](https://raw.githubusercontent.com/x/y/main/docs/guide.md) |"
        );
    }

    #[test]
    fn markdown_image_target_resolved() {
        let result = resolve_links("![alt](assets/a.png)", &base());
        assert_eq!(
            result,
            "![alt](https://raw.githubusercontent.com/x/y/main/docs/assets/a.png)"
        );
    }
}
