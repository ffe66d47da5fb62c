//! Markdown → MDX transformation pipelines.
//!
//! A pipeline is an ordered list of named stages, each a pure
//! `(&str, &TransformMeta) -> String` function. Content flows left to
//! right through the stages; no stage performs I/O. Callers obtain a
//! pipeline by name via [`pipeline`] and typically follow it with a final
//! [`repair`] pass over the fully assembled document.

pub mod frontmatter;
pub mod links;
pub mod normalize;
pub mod repair;
pub mod vault;

use mdxsync_shared::TransformMeta;
use tracing::debug;

pub use frontmatter::{add_frontmatter, strip_frontmatter};
pub use links::resolve_links;
pub use normalize::normalize;
pub use repair::repair;
pub use vault::{Category, PlaceholderVault, protect_code_spans, protect_fragile};

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// A single content transformation step.
pub type Transform = fn(&str, &TransformMeta) -> String;

/// A named stage in a pipeline.
#[derive(Clone, Copy)]
pub struct Stage {
    pub name: &'static str,
    pub run: Transform,
}

/// An ordered sequence of stages applied to one document.
#[derive(Clone)]
pub struct Pipeline {
    pub name: &'static str,
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Apply every stage in order.
    pub fn run(&self, content: &str, meta: &TransformMeta) -> String {
        let mut result = content.to_string();
        for stage in &self.stages {
            result = (stage.run)(&result, meta);
            debug!(pipeline = self.name, stage = stage.name, len = result.len());
        }
        result
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name).collect()
    }
}

// ---------------------------------------------------------------------------
// Stage adapters
// ---------------------------------------------------------------------------

fn normalize_stage(content: &str, _meta: &TransformMeta) -> String {
    normalize(content)
}

fn links_stage(content: &str, meta: &TransformMeta) -> String {
    resolve_links(content, &meta.source_base_url)
}

fn repair_stage(content: &str, _meta: &TransformMeta) -> String {
    repair(content)
}

fn frontmatter_stage(content: &str, meta: &TransformMeta) -> String {
    add_frontmatter(content, meta)
}

const NORMALIZE: Stage = Stage {
    name: "normalize",
    run: normalize_stage,
};
const LINKS: Stage = Stage {
    name: "resolve-links",
    run: links_stage,
};
const REPAIR: Stage = Stage {
    name: "repair",
    run: repair_stage,
};
const FRONTMATTER: Stage = Stage {
    name: "frontmatter",
    run: frontmatter_stage,
};

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Look up a pipeline by section name. Unknown names fall back to the
/// default pipeline, so a new config section works without code changes.
pub fn pipeline(name: &str) -> Pipeline {
    match name {
        // Source trees with heavy hand-written HTML get an early repair
        // pass before front-matter assembly.
        "sdks" | "acps" => Pipeline {
            name: "repairing",
            stages: vec![NORMALIZE, LINKS, REPAIR, FRONTMATTER],
        },
        "default" | "primary-network" | "cross-chain" => default_pipeline(),
        other => {
            debug!(section = other, "no dedicated pipeline, using default");
            default_pipeline()
        }
    }
}

fn default_pipeline() -> Pipeline {
    Pipeline {
        name: "default",
        stages: vec![NORMALIZE, LINKS, FRONTMATTER],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn meta() -> TransformMeta {
        TransformMeta {
            title: "Guide".into(),
            description: "Test guide".into(),
            source_base_url: Url::parse("https://raw.githubusercontent.com/x/y/main/docs/")
                .unwrap(),
            edit_url: Some(Url::parse("https://github.com/x/y/edit/main/docs/guide.md").unwrap()),
        }
    }

    #[test]
    fn default_pipeline_stage_order() {
        let p = pipeline("default");
        assert_eq!(p.stage_names(), vec!["normalize", "resolve-links", "frontmatter"]);
    }

    #[test]
    fn repairing_pipeline_includes_repair_stage() {
        let p = pipeline("sdks");
        assert_eq!(
            p.stage_names(),
            vec!["normalize", "resolve-links", "repair", "frontmatter"]
        );
    }

    #[test]
    fn unknown_section_falls_back_to_default() {
        assert_eq!(pipeline("brand-new-section").name, "default");
    }

    #[test]
    fn pipeline_end_to_end() {
        let input = "# Guide\n\nSee [setup](./setup.md).\n\n> [!NOTE] read this first\n";
        let result = pipeline("default").run(input, &meta());

        assert!(result.starts_with("---\ntitle: \"Guide\""));
        assert!(result.contains("[setup](https://raw.githubusercontent.com/x/y/main/docs/setup.md)"));
        assert!(result.contains(":::note\nread this first\n:::"));
        // The H1 moved into front-matter.
        assert!(!result.contains("# Guide"));
    }

    #[test]
    fn code_samples_keep_relative_links() {
        let input = "# T\n\n```md\n[example](./a.md)\n```\n\nUse `[x](./a.md)` syntax.\n";
        let result = pipeline("default").run(input, &meta());

        assert!(result.contains("[example](./a.md)"));
        assert!(result.contains("`[x](./a.md)`"));
        assert!(!result.contains("raw.githubusercontent.com/x/y/main/docs/a.md"));
    }

    #[test]
    fn final_repair_after_pipeline_is_stable() {
        let input = "# Guide\n\nvalue is ≤ 10 and {x} is literal\n";
        let piped = pipeline("sdks").run(input, &meta());
        let repaired = repair(&piped);

        assert!(repaired.contains("&lt;= 10"));
        assert!(repaired.contains("\\{x\\}"));
        assert_eq!(repair(&repaired), repaired);
    }
}
