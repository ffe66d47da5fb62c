//! Placeholder vault — keyed protection of fragile regions.
//!
//! Repair passes are blunt regex substitutions, so anything they must not
//! touch (code, math, tables, component blocks) is swapped for an opaque
//! indexed token first and swapped back afterwards. Round-trip identity:
//! `restore_all(protect(x)) == x` as long as no pass mutates the tokens.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// The kinds of regions the vault knows how to protect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Fenced ``` code blocks.
    CodeBlock,
    /// Inline `code` spans.
    InlineCode,
    /// `<Callout …>` component blocks with brace-valued attributes.
    Callout,
    /// Block math: `$$…$$` and `\[…\]`.
    BlockMath,
    /// Inline math: `$…$` and `\(…\)`.
    InlineMath,
    /// Fenced mermaid diagram blocks.
    Mermaid,
    /// Whole `<div>…</div>` blocks.
    DivBlock,
    /// Whole Markdown table rows (`|…|` lines).
    TableRow,
}

impl Category {
    /// All categories, in the order they are protected before repair runs.
    /// Restoration iterates this in reverse so that regions captured later
    /// (which may contain earlier tokens) are re-expanded first.
    pub const ALL: [Category; 8] = [
        Category::Mermaid,
        Category::CodeBlock,
        Category::InlineCode,
        Category::Callout,
        Category::BlockMath,
        Category::InlineMath,
        Category::DivBlock,
        Category::TableRow,
    ];

    fn tag(self) -> &'static str {
        match self {
            Category::CodeBlock => "CODEBLOCK",
            Category::InlineCode => "INLINECODE",
            Category::Callout => "CALLOUT",
            Category::BlockMath => "BLOCKMATH",
            Category::InlineMath => "INLINEMATH",
            Category::Mermaid => "MERMAID",
            Category::DivBlock => "DIVBLOCK",
            Category::TableRow => "TABLEROW",
        }
    }
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// Keyed store of protected substrings, addressed by (category, index).
#[derive(Debug, Default)]
pub struct PlaceholderVault {
    slots: HashMap<Category, Vec<String>>,
}

impl PlaceholderVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every non-overlapping match of `matcher` with an indexed
    /// token, storing the matched text under `category`.
    pub fn protect(&mut self, content: &str, matcher: &Regex, category: Category) -> String {
        let slots = self.slots.entry(category).or_default();
        matcher
            .replace_all(content, |caps: &regex::Captures| {
                slots.push(caps[0].to_string());
                token(category, slots.len() - 1)
            })
            .to_string()
    }

    /// Replace every token of `category` with its stored original text.
    pub fn restore(&self, content: &str, category: Category) -> String {
        let Some(slots) = self.slots.get(&category) else {
            return content.to_string();
        };

        let mut result = content.to_string();
        for (idx, original) in slots.iter().enumerate() {
            result = result.replacen(&token(category, idx), original, 1);
        }
        result
    }

    /// Restore every category, later-protected categories first.
    pub fn restore_all(&self, content: &str) -> String {
        let mut result = content.to_string();
        for category in Category::ALL.iter().rev() {
            result = self.restore(&result, *category);
        }
        result
    }

    /// Number of regions currently stored under `category`.
    pub fn count(&self, category: Category) -> usize {
        self.slots.get(&category).map_or(0, Vec::len)
    }
}

/// Token format: unique sentinel that survives every repair pass untouched
/// (no braces, no angle brackets, no markdown punctuation).
fn token(category: Category, idx: usize) -> String {
    format!("__MDX_PLACEHOLDER_{}_{idx}__", category.tag())
}

// ---------------------------------------------------------------------------
// Standard matchers
// ---------------------------------------------------------------------------

static CODE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("valid regex"));

static INLINE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`[^`\n]+`").expect("valid regex"));

static CALLOUT_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<Callout\b[^>]*>.*?</Callout>").expect("valid regex"));

static CALLOUT_SELF_CLOSED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Callout\b[^>]*/>").expect("valid regex"));

static BLOCK_MATH_DOLLAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\$\$.*?\$\$").expect("valid regex"));

static BLOCK_MATH_BRACKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\\[.*?\\\]").expect("valid regex"));

// Inline math must not span newlines; a single non-letter character is a
// legitimate expression (`$x$`, `$+$`).
static INLINE_MATH_DOLLAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[^$\n]+\$").expect("valid regex"));

static INLINE_MATH_PAREN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\\([^\n]*?\\\)").expect("valid regex"));

// Must run before the generic fence matcher, or every diagram would be
// swallowed as an ordinary code block.
static MERMAID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```mermaid.*?```").expect("valid regex"));

static DIV_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<div\b[^>]*>.*?</div>").expect("valid regex"));

static TABLE_ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\|.*\|[ \t]*$").expect("valid regex"));

/// Protect every fragile region in the standard category order, returning
/// the tokenized content and the vault needed to restore it.
pub fn protect_fragile(content: &str) -> (String, PlaceholderVault) {
    let mut vault = PlaceholderVault::new();

    let mut result = vault.protect(content, &MERMAID_RE, Category::Mermaid);
    result = vault.protect(&result, &CODE_FENCE_RE, Category::CodeBlock);
    result = vault.protect(&result, &INLINE_CODE_RE, Category::InlineCode);
    result = vault.protect(&result, &CALLOUT_BLOCK_RE, Category::Callout);
    result = vault.protect(&result, &CALLOUT_SELF_CLOSED_RE, Category::Callout);
    result = vault.protect(&result, &BLOCK_MATH_DOLLAR_RE, Category::BlockMath);
    result = vault.protect(&result, &BLOCK_MATH_BRACKET_RE, Category::BlockMath);
    result = vault.protect(&result, &INLINE_MATH_DOLLAR_RE, Category::InlineMath);
    result = vault.protect(&result, &INLINE_MATH_PAREN_RE, Category::InlineMath);
    result = vault.protect(&result, &DIV_BLOCK_RE, Category::DivBlock);
    result = vault.protect(&result, &TABLE_ROW_RE, Category::TableRow);

    (result, vault)
}

/// Protect only code and math regions.
///
/// Link resolution must still rewrite targets inside tables and div
/// blocks, so it uses this narrower set instead of [`protect_fragile`].
pub fn protect_code_spans(content: &str) -> (String, PlaceholderVault) {
    let mut vault = PlaceholderVault::new();

    let mut result = vault.protect(content, &MERMAID_RE, Category::Mermaid);
    result = vault.protect(&result, &CODE_FENCE_RE, Category::CodeBlock);
    result = vault.protect(&result, &INLINE_CODE_RE, Category::InlineCode);
    result = vault.protect(&result, &BLOCK_MATH_DOLLAR_RE, Category::BlockMath);
    result = vault.protect(&result, &BLOCK_MATH_BRACKET_RE, Category::BlockMath);
    result = vault.protect(&result, &INLINE_MATH_DOLLAR_RE, Category::InlineMath);
    result = vault.protect(&result, &INLINE_MATH_PAREN_RE, Category::InlineMath);

    (result, vault)
}
