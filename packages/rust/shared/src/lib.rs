//! Shared types, error model, and configuration for mdxsync.
//!
//! This crate is the foundation depended on by all other mdxsync crates.
//! It provides:
//! - [`MdxSyncError`] — the unified error type
//! - Domain types ([`Job`], [`TransformMeta`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, GithubConfig, JobConfig, RepoSourceConfig, SectionConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{MdxSyncError, Result};
pub use types::{Job, TransformMeta, directory_url};
