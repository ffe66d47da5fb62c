//! Malformed-markup repair engine.
//!
//! GitHub Markdown reinterpreted as MDX produces recurring JSX-invalid
//! sequences: broken self-closing tags, attributes stranded outside their
//! tag, whitespace-torn URLs, Unicode comparison operators the JSX
//! tokenizer chokes on. This module is an ordered battery of textual
//! fix-ups for those patterns.
//!
//! The engine is best-effort: a rule that does not match leaves the text
//! unchanged, no rule ever fails, and re-applying the full battery is a
//! no-op (the post-processing pass re-runs rules already applied
//! mid-pipeline). Fragile regions are vaulted before the rules run, so
//! code spans, math, tables, and div blocks survive verbatim.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::vault::protect_fragile;

/// Lowercase tags that are real HTML elements; anything else lowercase is
/// presumed to be literal text that merely looks like a tag.
const ALLOWED_TAGS: [&str; 29] = [
    "a", "b", "blockquote", "br", "code", "details", "div", "em", "h1", "h2", "h3", "h4", "h5",
    "h6", "hr", "i", "img", "li", "ol", "p", "pre", "span", "strong", "summary", "table", "td",
    "th", "tr", "ul",
];

/// Run the full repair battery once.
pub fn repair(content: &str) -> String {
    // Fence aliasing must see the fences, so it runs before the vault.
    let aliased = alias_fence_languages(content);

    let (protected, vault) = protect_fragile(&aliased);

    let mut result = fix_broken_urls(&protected);
    result = convert_autolinks(&result);
    result = fix_tag_spacing(&result);
    result = drop_invalid_closing_tags(&result);
    result = close_unclosed_tags(&result);
    result = merge_split_attributes(&result);
    result = collapse_doubled_closings(&result);
    result = close_void_tags(&result);
    result = isolate_details_blocks(&result);
    result = escape_math_symbols(&result);
    result = escape_unknown_tags(&result);
    result = escape_stray_braces(&result);
    result = collapse_blank_lines(&result);

    trace!(len = result.len(), "repair pass complete");
    vault.restore_all(&result)
}

// ---------------------------------------------------------------------------
// Rule: code fence language aliasing
// ---------------------------------------------------------------------------

static GOLANG_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^```golang\b").expect("valid regex"));

/// ` ```golang ` → ` ```go ` so syntax highlighters stay targeted.
fn alias_fence_languages(content: &str) -> String {
    GOLANG_FENCE_RE.replace_all(content, "```go").to_string()
}

// ---------------------------------------------------------------------------
// Rule: URL corruption
// ---------------------------------------------------------------------------

static TORN_SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(https?):\s+//").expect("valid regex"));

static TRIPLE_SLASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(https?):///").expect("valid regex"));

/// `https:   //` → `https://`, `https:///` → `https://`.
fn fix_broken_urls(content: &str) -> String {
    let mut result = TORN_SCHEME_RE.replace_all(content, "$1://").to_string();
    for _ in 0..4 {
        if !TRIPLE_SLASH_RE.is_match(&result) {
            break;
        }
        result = TRIPLE_SLASH_RE.replace_all(&result, "$1://").to_string();
    }
    result
}

// ---------------------------------------------------------------------------
// Rule: angle-bracket raw URLs
// ---------------------------------------------------------------------------

static AUTOLINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(https?://[^>\s]+)>").expect("valid regex"));

/// `<http://…>` → `[http://…](http://…)` — MDX treats the angle form as a tag.
fn convert_autolinks(content: &str) -> String {
    AUTOLINK_RE.replace_all(content, "[$1]($1)").to_string()
}

// ---------------------------------------------------------------------------
// Rule: angle-bracket spacing
// ---------------------------------------------------------------------------

static SPACED_CLOSING_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\s*/\s*([A-Za-z][A-Za-z0-9]*)\s*>").expect("valid regex"));

static SPACED_BR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\s*br\s*/\s*>").expect("valid regex"));

/// `< / div >` → `</div>`, `< br / >` → `<br />`.
fn fix_tag_spacing(content: &str) -> String {
    let result = SPACED_BR_RE.replace_all(content, "<br />");
    SPACED_CLOSING_TAG_RE.replace_all(&result, "</$1>").to_string()
}

// ---------------------------------------------------------------------------
// Rule: invalid closing tags
// ---------------------------------------------------------------------------

static IMG_CLOSER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</img\s*>").expect("valid regex"));

/// `img` is void; a closing tag for it is always garbage.
fn drop_invalid_closing_tags(content: &str) -> String {
    IMG_CLOSER_RE.replace_all(content, "").to_string()
}

// ---------------------------------------------------------------------------
// Rule: unclosed tags
// ---------------------------------------------------------------------------

static OPEN_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([A-Za-z][A-Za-z0-9]*)((?:\s[^<>]*)?)>").expect("valid regex"));

/// Self-close an open tag whose name has no matching closing tag later in
/// the document: `<Embed src="x">` with no `</Embed>` becomes
/// `<Embed src="x" />`. Lowercase names outside the allow-list are left
/// alone; entity escaping handles those.
fn close_unclosed_tags(content: &str) -> String {
    OPEN_TAG_RE
        .replace_all(content, |caps: &regex::Captures| {
            let whole = caps.get(0).expect("match");
            let name = &caps[1];

            if caps[2].trim_end().ends_with('/') {
                return whole.as_str().to_string();
            }

            let first = name.chars().next().expect("non-empty tag name");
            if first.is_ascii_lowercase() && !ALLOWED_TAGS.contains(&name) {
                return whole.as_str().to_string();
            }

            let closer = format!("</{name}>");
            if content[whole.end()..].contains(&closer) {
                return whole.as_str().to_string();
            }

            let attrs = caps[2].trim();
            if attrs.is_empty() {
                format!("<{name} />")
            } else {
                format!("<{name} {attrs} />")
            }
        })
        .to_string()
}

// ---------------------------------------------------------------------------
// Rule: split attributes
// ---------------------------------------------------------------------------

static SPLIT_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(<img\b[^>]*?)\s*/>\s*((?:alt|src|width|height|title)\s*=\s*"[^"]*")\s*/?>"#)
        .expect("valid regex")
});

/// `<img src="x" /> alt="y" />` → `<img src="x" alt="y" />` — an attribute
/// stranded after the closing `/>` by naive string concatenation.
fn merge_split_attributes(content: &str) -> String {
    let mut result = content.to_string();
    for _ in 0..4 {
        if !SPLIT_ATTR_RE.is_match(&result) {
            break;
        }
        result = SPLIT_ATTR_RE.replace_all(&result, "$1 $2 />").to_string();
    }
    result
}

// ---------------------------------------------------------------------------
// Rule: doubled self-closing sequences
// ---------------------------------------------------------------------------

static DOUBLED_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/>\s*/>").expect("valid regex"));

static SLASH_SPACE_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\s+/>").expect("valid regex"));

static DOUBLE_SLASH_GT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"//\s*>").expect("valid regex"));

/// `/> />`, `/ />`, `// >` all collapse to a single `/>`.
fn collapse_doubled_closings(content: &str) -> String {
    let mut result = content.to_string();
    for _ in 0..4 {
        let collapsed = DOUBLED_CLOSE_RE.replace_all(&result, "/>").to_string();
        let collapsed = SLASH_SPACE_CLOSE_RE.replace_all(&collapsed, "/>").to_string();
        let collapsed = DOUBLE_SLASH_GT_RE.replace_all(&collapsed, "/>").to_string();
        if collapsed == result {
            break;
        }
        result = collapsed;
    }
    result
}

// ---------------------------------------------------------------------------
// Rule: void tag normalization
// ---------------------------------------------------------------------------

static IMG_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<img\b([^>]*?)\s*/?>").expect("valid regex"));

static BR_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<br\s*/?\s*>").expect("valid regex"));

static HR_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<hr\s*/?\s*>").expect("valid regex"));

/// Void tags always come out in canonical self-closed form.
fn close_void_tags(content: &str) -> String {
    let result = IMG_TAG_RE.replace_all(content, |caps: &regex::Captures| {
        let attrs = caps[1].trim().trim_end_matches('/').trim_end();
        if attrs.is_empty() {
            "<img />".to_string()
        } else {
            format!("<img {attrs} />")
        }
    });
    let result = BR_TAG_RE.replace_all(&result, "<br />");
    HR_TAG_RE.replace_all(&result, "<hr />").to_string()
}

// ---------------------------------------------------------------------------
// Rule: details/summary block isolation
// ---------------------------------------------------------------------------

static DETAILS_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*<details(\s[^>]*)?>\s*").expect("valid regex"));

static DETAILS_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*</details>\s*").expect("valid regex"));

static SUMMARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\s*(<summary>.*?</summary>)\s*").expect("valid regex"));

/// Block-level `<details>`/`<summary>` misread as inline is a common MDX
/// parse failure; force each onto its own line with blank lines around.
fn isolate_details_blocks(content: &str) -> String {
    let result = DETAILS_OPEN_RE.replace_all(content, "\n\n<details$1>\n\n");
    let result = SUMMARY_RE.replace_all(&result, "\n\n$1\n\n");
    DETAILS_CLOSE_RE.replace_all(&result, "\n\n</details>\n\n").to_string()
}

// ---------------------------------------------------------------------------
// Rule: Unicode and bare comparison operators
// ---------------------------------------------------------------------------

/// Symbols the JSX tokenizer trips over and their safe spellings.
const SYMBOL_MAP: [(&str, &str); 13] = [
    ("≤", "&lt;="),
    ("≥", "&gt;="),
    ("≠", "!="),
    ("≈", "~"),
    ("≡", "=="),
    ("±", "+/-"),
    ("×", "x"),
    ("÷", "/"),
    ("∞", "infinity"),
    ("∆", "delta"),
    ("∇", "nabla"),
    ("↔", "&lt;-&gt;"),
    ("⇔", "&lt;=&gt;"),
];

static BARE_LE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(^|\s)<=(\s|$)").expect("valid regex"));

static BARE_GE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(^|\s)>=(\s|$)").expect("valid regex"));

static BARE_ARROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(^|\s)<->(\s|$)").expect("valid regex"));

static BARE_ANGLE_PAIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(^|\s)<>(\s|$)").expect("valid regex"));

fn escape_math_symbols(content: &str) -> String {
    let mut result = content.to_string();
    for (symbol, replacement) in SYMBOL_MAP {
        if result.contains(symbol) {
            result = result.replace(symbol, replacement);
        }
    }

    result = BARE_LE_RE.replace_all(&result, "${1}&lt;=${2}").to_string();
    result = BARE_GE_RE.replace_all(&result, "${1}&gt;=${2}").to_string();
    result = BARE_ARROW_RE
        .replace_all(&result, "${1}&lt;-&gt;${2}")
        .to_string();
    BARE_ANGLE_PAIR_RE
        .replace_all(&result, "${1}&lt;&gt;${2}")
        .to_string()
}

// ---------------------------------------------------------------------------
// Rule: non-standard lowercase tags
// ---------------------------------------------------------------------------

static LOWERCASE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)([a-z][a-z0-9]*)((?:\s[^<>]*)?)(/?)>").expect("valid regex"));

/// `<foo>` → `&lt;foo&gt;` for tag names outside [`ALLOWED_TAGS`]:
/// almost always literal text that happens to look like markup.
fn escape_unknown_tags(content: &str) -> String {
    LOWERCASE_TAG_RE
        .replace_all(content, |caps: &regex::Captures| {
            let name = &caps[2];
            if ALLOWED_TAGS.contains(&name) {
                return caps[0].to_string();
            }
            let whole = &caps[0];
            format!("&lt;{}&gt;", &whole[1..whole.len() - 1])
        })
        .to_string()
}

// ---------------------------------------------------------------------------
// Rule: stray braces
// ---------------------------------------------------------------------------

/// Backslash-escape `{`/`}` that are neither already escaped nor part of an
/// MDX comment, so JSX does not evaluate plain text as an expression.
fn escape_stray_braces(content: &str) -> String {
    let mut out = String::with_capacity(content.len() + 8);
    let mut i = 0;

    while i < content.len() {
        let rest = &content[i..];

        if rest.starts_with("\\{") || rest.starts_with("\\}") {
            out.push_str(&rest[..2]);
            i += 2;
            continue;
        }

        if rest.starts_with("{/*") {
            if let Some(end) = rest.find("*/}") {
                out.push_str(&rest[..end + 3]);
                i += end + 3;
                continue;
            }
        }

        let ch = rest.chars().next().expect("in-bounds char");
        match ch {
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            other => out.push(other),
        }
        i += ch.len_utf8();
    }

    out
}

// ---------------------------------------------------------------------------
// Rule: blank line runs
// ---------------------------------------------------------------------------

static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{4,}").expect("valid regex"));

/// Collapse runs of 3+ blank lines to exactly 2.
fn collapse_blank_lines(content: &str) -> String {
    BLANK_RUN_RE.replace_all(content, "\n\n\n").to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
