//! Application configuration for mdxsync.
//!
//! User config lives at `~/.mdxsync/mdxsync.toml` or at an explicit path
//! passed on the command line. CLI flags override config file values,
//! which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MdxSyncError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "mdxsync.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".mdxsync";

// ---------------------------------------------------------------------------
// Config structs (matching mdxsync.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// GitHub endpoints.
    #[serde(default)]
    pub github: GithubConfig,

    /// Declared content sections.
    #[serde(default)]
    pub sections: Vec<SectionConfig>,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Root directory output paths are written under.
    #[serde(default = "default_output_root")]
    pub output_root: String,

    /// Project ignore-list file maintained with generated output paths.
    #[serde(default = "default_ignore_file")]
    pub ignore_file: String,

    /// HTTP timeout in seconds for content fetches.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            ignore_file: default_ignore_file(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_output_root() -> String {
    "content".into()
}
fn default_ignore_file() -> String {
    ".gitignore".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[github]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// REST API base URL (overridable for tests/mirrors).
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Raw-content host base URL.
    #[serde(default = "default_raw_base")]
    pub raw_base: String,

    /// Name of the env var holding an optional API token
    /// (never store the token itself).
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            raw_base: default_raw_base(),
            token_env: default_token_env(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.github.com".into()
}
fn default_raw_base() -> String {
    "https://raw.githubusercontent.com".into()
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".into()
}

/// `[[sections]]` entry — one documentation section with its own pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionConfig {
    /// Section name (used with `--section`).
    pub name: String,

    /// Named pipeline to run for this section (defaults to "default").
    #[serde(default = "default_pipeline")]
    pub pipeline: String,

    /// Directory under `output_root` this section writes into.
    #[serde(default)]
    pub output_dir: String,

    /// Statically declared jobs.
    #[serde(default)]
    pub jobs: Vec<JobConfig>,

    /// Dynamically enumerated repository sources.
    #[serde(default)]
    pub sources: Vec<RepoSourceConfig>,
}

fn default_pipeline() -> String {
    "default".into()
}

/// `[[sections.jobs]]` entry — a single declared document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Raw-content URL to fetch.
    pub source_url: String,
    /// Output path relative to the section output dir.
    pub output_path: String,
    /// Front-matter title.
    pub title: String,
    /// Front-matter description.
    #[serde(default)]
    pub description: String,
    /// Link-resolution URL; defaults to `source_url` when omitted.
    #[serde(default)]
    pub content_url: Option<String>,
}

/// `[[sections.sources]]` entry — a repository subtree to enumerate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoSourceConfig {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Branch (ref) to enumerate.
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Only files under this path prefix are considered.
    #[serde(default)]
    pub path_prefix: String,
}

fn default_branch() -> String {
    "main".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.mdxsync/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| MdxSyncError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.mdxsync/mdxsync.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| MdxSyncError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| MdxSyncError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| MdxSyncError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| MdxSyncError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| MdxSyncError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
