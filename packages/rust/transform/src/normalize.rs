//! GitHub-flavored Markdown → MDX normalization passes.
//!
//! Each pass is an independent `&str -> String` rewrite. [`normalize`]
//! applies the full set with fragile regions vaulted, so code blocks,
//! math, and tables are never rewritten.

use std::sync::LazyLock;

use regex::Regex;

use crate::vault::protect_fragile;

/// Run every normalization pass with fragile regions protected.
pub fn normalize(content: &str) -> String {
    let (protected, vault) = protect_fragile(content);

    let mut result = convert_admonitions(&protected);
    result = convert_admonition_prefixes(&result);
    result = strip_stray_bangs(&result);
    result = convert_bare_images(&result);
    result = convert_comments(&result);
    result = convert_br(&result);
    result = normalize_headings(&result);
    result = normalize_directives(&result);

    vault.restore_all(&result)
}

// ---------------------------------------------------------------------------
// Pass 1: GitHub admonition quotes → directive blocks
// ---------------------------------------------------------------------------

static ADMONITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^>\s*\[!?(?i)(note|tip|warning|important|caution)\]\s*(.*)$")
        .expect("valid regex")
});

/// `> [!NOTE] text` (and following `>` quote lines) → `:::note … :::`.
pub fn convert_admonitions(content: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut lines = content.lines().peekable();

    while let Some(line) = lines.next() {
        let Some(caps) = ADMONITION_RE.captures(line.trim_start()) else {
            out.push(line.to_string());
            continue;
        };

        out.push(format!(":::{}", caps[1].to_lowercase()));

        let rest = caps[2].trim();
        if !rest.is_empty() {
            out.push(rest.to_string());
        }

        // Remaining quote lines belong to the admonition body.
        while let Some(next) = lines.peek() {
            let trimmed = next.trim_start();
            let Some(body) = trimmed.strip_prefix('>') else {
                break;
            };
            out.push(body.trim_start().to_string());
            lines.next();
        }

        out.push(":::".to_string());
    }

    out.join("\n")
}

// ---------------------------------------------------------------------------
// Pass 2: `!!!` / `!!` admonition prefixes
// ---------------------------------------------------------------------------

static TRIPLE_BANG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^!!!\s*([A-Za-z][\w-]*)").expect("valid regex"));

static DOUBLE_BANG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^!!\s*([A-Za-z][\w-]*)").expect("valid regex"));

/// `!!! warning` → `:::warning`, `!! info` → `::info`.
pub fn convert_admonition_prefixes(content: &str) -> String {
    let result = TRIPLE_BANG_RE.replace_all(content, ":::$1");
    DOUBLE_BANG_RE.replace_all(&result, "::$1").to_string()
}

static STRAY_BANG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^!([^!\[{\n])").expect("valid regex"));

/// Strip a leading `!` that is neither an image nor a directive prefix —
/// leftover GitHub syntax that MDX would render literally.
pub fn strip_stray_bangs(content: &str) -> String {
    STRAY_BANG_RE.replace_all(content, "$1").to_string()
}

// ---------------------------------------------------------------------------
// Pass 3: bare image syntax → <img>
// ---------------------------------------------------------------------------

static MD_IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)\s]+)\)").expect("valid regex"));

/// `![alt](src)` → `<img alt="alt" src="src" />`, except when the image is
/// itself the text of a link (`[![badge](…)](…)`), which stays Markdown.
pub fn convert_bare_images(content: &str) -> String {
    let bytes = content.as_bytes();
    MD_IMAGE_RE
        .replace_all(content, |caps: &regex::Captures| {
            let start = caps.get(0).expect("match").start();
            if start > 0 && bytes[start - 1] == b'[' {
                return caps[0].to_string();
            }
            format!("<img alt=\"{}\" src=\"{}\" />", &caps[1], &caps[2])
        })
        .to_string()
}

// ---------------------------------------------------------------------------
// Pass 4: HTML comments and <br>
// ---------------------------------------------------------------------------

static HTML_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--(.*?)-->").expect("valid regex"));

/// `<!-- text -->` → `{/* text */}` (the MDX comment form).
pub fn convert_comments(content: &str) -> String {
    HTML_COMMENT_RE.replace_all(content, "{/*$1*/}").to_string()
}

static BR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<br\s*>").expect("valid regex"));

/// `<br>` → `<br />` (JSX requires void tags to self-close).
pub fn convert_br(content: &str) -> String {
    BR_RE.replace_all(content, "<br />").to_string()
}

// ---------------------------------------------------------------------------
// Pass 5: heading levels
// ---------------------------------------------------------------------------

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").expect("valid regex"));

/// Remove the first `#` heading (the title lives in front-matter) and
/// shift every other heading down one level, capped at `######`.
pub fn normalize_headings(content: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut in_code_block = false;
    let mut removed_title = false;

    for line in content.lines() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            out.push(line.to_string());
            continue;
        }
        if in_code_block {
            out.push(line.to_string());
            continue;
        }

        let Some(caps) = HEADING_RE.captures(line) else {
            out.push(line.to_string());
            continue;
        };

        let hashes = &caps[1];
        if hashes == "#" && !removed_title {
            removed_title = true;
            continue;
        }

        let depth = (hashes.len() + 1).min(6);
        out.push(format!("{} {}", "#".repeat(depth), &caps[2]));
    }

    out.join("\n")
}

// ---------------------------------------------------------------------------
// Pass 6: directive line cleanup
// ---------------------------------------------------------------------------

static INDENTED_DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]+(:{2,3}.*)$").expect("valid regex"));

/// Directive openers/closers must start in column zero.
pub fn normalize_directives(content: &str) -> String {
    INDENTED_DIRECTIVE_RE.replace_all(content, "$1").to_string()
}
