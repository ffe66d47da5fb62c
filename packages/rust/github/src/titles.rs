//! Slug → human title derivation for dynamically discovered documents.

/// Lowercase slugs whose canonical form is an acronym or product casing.
const ACRONYMS: [(&str, &str); 14] = [
    ("acp", "ACP"),
    ("api", "API"),
    ("cli", "CLI"),
    ("evm", "EVM"),
    ("faq", "FAQ"),
    ("http", "HTTP"),
    ("id", "ID"),
    ("json", "JSON"),
    ("nft", "NFT"),
    ("p2p", "P2P"),
    ("rpc", "RPC"),
    ("sdk", "SDK"),
    ("url", "URL"),
    ("vm", "VM"),
];

/// Known suffixes glued onto product slugs without a separator
/// (`avalanchego`, `ethersjs`). Longest match wins.
const GLUED_SUFFIXES: [(&str, &str); 5] = [
    ("sdk", "SDK"),
    ("cli", "CLI"),
    ("api", "API"),
    ("go", "Go"),
    ("js", "JS"),
];

/// Derive a front-matter title from a repository file path.
///
/// `README.md` and `index.md` take their title from the containing
/// directory (falling back to `fallback`, typically the repo name).
pub fn title_from_path(path: &str, fallback: &str) -> String {
    let mut segments = path.rsplit('/');
    let file = segments.next().unwrap_or(path);
    let stem = file
        .rsplit_once('.')
        .map_or(file, |(stem, _ext)| stem);

    if stem.eq_ignore_ascii_case("readme") || stem.eq_ignore_ascii_case("index") {
        let dir = segments.next().unwrap_or(fallback);
        if dir.is_empty() {
            return humanize(fallback);
        }
        return humanize(dir);
    }

    humanize(stem)
}

/// Turn a file-name slug into a display title.
pub fn humanize(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(humanize_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn humanize_word(word: &str) -> String {
    let lower = word.to_lowercase();

    if let Some((_, canonical)) = ACRONYMS.iter().find(|(slug, _)| *slug == lower) {
        return (*canonical).to_string();
    }

    // Glued product suffixes keep their casing: `avalanchego` → `AvalancheGo`.
    for (suffix, canonical) in GLUED_SUFFIXES {
        if lower.len() > suffix.len() + 2 {
            if let Some(rest) = lower.strip_suffix(suffix) {
                return format!("{}{canonical}", capitalize(rest));
            }
        }
    }

    capitalize(&lower)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_slug_title_cased() {
        assert_eq!(humanize("getting-started"), "Getting Started");
        assert_eq!(humanize("deploy_contract"), "Deploy Contract");
    }

    #[test]
    fn acronyms_uppercased() {
        assert_eq!(humanize("json-rpc-api"), "JSON RPC API");
        assert_eq!(humanize("evm-compatibility"), "EVM Compatibility");
        assert_eq!(humanize("p2p"), "P2P");
    }

    #[test]
    fn glued_suffix_split() {
        assert_eq!(humanize("avalanchego"), "AvalancheGo");
        assert_eq!(humanize("ethersjs"), "EthersJS");
    }

    #[test]
    fn short_words_not_treated_as_glued() {
        // "go" alone is a word, not a glued suffix.
        assert_eq!(humanize("go"), "Go");
        assert_eq!(humanize("logo"), "Logo");
    }

    #[test]
    fn readme_takes_directory_name() {
        assert_eq!(title_from_path("docs/staking/README.md", "repo"), "Staking");
        assert_eq!(title_from_path("README.md", "avalanchego"), "AvalancheGo");
    }

    #[test]
    fn index_takes_directory_name() {
        assert_eq!(title_from_path("guides/index.md", "repo"), "Guides");
    }

    #[test]
    fn regular_file_uses_stem() {
        assert_eq!(
            title_from_path("docs/validator-nodes.md", "repo"),
            "Validator Nodes"
        );
    }
}
