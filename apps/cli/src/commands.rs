//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use mdxsync_github::{FileLister, GithubClient, derive_jobs};
use mdxsync_shared::{
    AppConfig, Job, MdxSyncError, SectionConfig, init_config, load_config, load_config_from,
};
use mdxsync_sync::{BatchSummary, ContentFetcher, SyncOptions, run_batch, update_ignore_file};
use mdxsync_transform::pipeline;
use tracing::info;
use url::Url;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// mdxsync — pull remote Markdown into a local MDX content tree.
#[derive(Parser)]
#[command(
    name = "mdxsync",
    version,
    about = "Fetch remote Markdown, repair it for MDX, and write framework-ready content.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch, transform, and write every configured section.
    Sync {
        /// Sync only the named section.
        #[arg(short, long)]
        section: Option<String>,

        /// Config file path (defaults to ~/.mdxsync/mdxsync.toml).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output root override (defaults to the configured output_root).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Fetch and transform but write nothing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "mdxsync=info",
        1 => "mdxsync=debug",
        _ => "mdxsync=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Sync {
            section,
            config,
            out,
            dry_run,
        } => cmd_sync(section.as_deref(), config.as_deref(), out, dry_run).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// sync
// ---------------------------------------------------------------------------

async fn cmd_sync(
    section_filter: Option<&str>,
    config_path: Option<&std::path::Path>,
    out: Option<PathBuf>,
    dry_run: bool,
) -> Result<()> {
    let config = match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    let sections: Vec<&SectionConfig> = match section_filter {
        Some(name) => {
            let matched: Vec<&SectionConfig> =
                config.sections.iter().filter(|s| s.name == name).collect();
            if matched.is_empty() {
                return Err(eyre!("no section named '{name}' in the config"));
            }
            matched
        }
        None => config.sections.iter().collect(),
    };

    if sections.is_empty() {
        return Err(eyre!("no sections configured — run `mdxsync config init` and add some"));
    }

    let timeout = Duration::from_secs(config.defaults.timeout_secs);
    let fetcher = ContentFetcher::new(timeout)?;
    let output_root = out.unwrap_or_else(|| PathBuf::from(&config.defaults.output_root));

    let mut totals = BatchSummary::default();
    let mut written_paths: Vec<String> = Vec::new();

    for section in sections {
        let jobs = build_jobs(section, &config, timeout).await?;
        if jobs.is_empty() {
            info!(section = section.name, "section has no jobs, skipping");
            continue;
        }

        let section_root = output_root.join(&section.output_dir);
        let options = SyncOptions {
            output_root: section_root.clone(),
            dry_run,
        };

        info!(
            section = section.name,
            pipeline = section.pipeline,
            jobs = jobs.len(),
            "syncing section"
        );

        let spinner = sync_spinner();
        let total = jobs.len();
        let mut current = 0usize;
        let summary = run_batch(
            &fetcher,
            &jobs,
            &pipeline(&section.pipeline),
            &options,
            |job| {
                current += 1;
                spinner.set_message(format!(
                    "[{}] [{current}/{total}] {}",
                    section.name, job.source_url
                ));
            },
        )
        .await?;
        spinner.finish_and_clear();

        for path in &summary.written {
            written_paths.push(path.to_string_lossy().to_string());
        }

        totals.succeeded += summary.succeeded;
        totals.failed.extend(summary.failed);
    }

    if !dry_run {
        let ignore_path = PathBuf::from(&config.defaults.ignore_file);
        update_ignore_file(&ignore_path, &written_paths)?;
    }

    println!();
    println!("  Synced {}/{} documents", totals.succeeded, totals.total());
    if !totals.failed.is_empty() {
        println!("  Failed:");
        for (url, error) in &totals.failed {
            println!("    {url}: {error}");
        }
    }
    if dry_run {
        println!("  (dry run — nothing written)");
    }
    println!();

    Ok(())
}

/// Build the job list for one section: statically declared jobs first, then
/// jobs derived from each repository source. A tree-listing failure aborts
/// the whole run; there is nothing sensible to sync without it.
async fn build_jobs(
    section: &SectionConfig,
    config: &AppConfig,
    timeout: Duration,
) -> Result<Vec<Job>> {
    let mut jobs = Vec::new();

    for declared in &section.jobs {
        let source_url = Url::parse(&declared.source_url).map_err(|e| {
            MdxSyncError::validation(format!("bad source_url '{}': {e}", declared.source_url))
        })?;

        let content_url = match &declared.content_url {
            Some(raw) => Url::parse(raw)
                .map_err(|e| MdxSyncError::validation(format!("bad content_url '{raw}': {e}")))?,
            None => source_url.clone(),
        };

        let description = if declared.description.is_empty() {
            format!("{} documentation", declared.title)
        } else {
            declared.description.clone()
        };

        jobs.push(Job {
            source_url,
            output_path: PathBuf::from(&declared.output_path),
            title: declared.title.clone(),
            description,
            content_url,
        });
    }

    if !section.sources.is_empty() {
        let token = std::env::var(&config.github.token_env).ok();
        let client = GithubClient::new(&config.github.api_base, token, timeout)?;

        for source in &section.sources {
            let paths = client
                .list_files(&source.owner, &source.repo, &source.branch)
                .await?;
            jobs.extend(derive_jobs(&paths, source, &config.github.raw_base)?);
        }
    }

    Ok(jobs)
}

fn sync_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
