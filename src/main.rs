//! Learn-Archiver main entry point
//!
//! This is the command-line interface for the Learn-Archiver course mirror.

use anyhow::{Context, Result};
use clap::Parser;
use learn_archiver::config::{load_config_with_hash, Config};
use learn_archiver::crawler::{self, Coordinator, RetryPolicy};
use learn_archiver::output::{
    archive_statistics, print_run_summary, print_statistics, read_failure_list, RunTally,
};
use learn_archiver::storage::{open_store, StructureStore};
use learn_archiver::structure::ArchiveLayout;
use learn_archiver::url::{parse_absolute, unit_title_from_url};
use learn_archiver::CrawlTarget;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Learn-Archiver: an offline mirror for online course content
///
/// Learn-Archiver discovers the units of every configured learning path,
/// renders each unit in headless Chromium, keeps the main content with its
/// images cached locally, and records the course tree in a JSON manifest.
#[derive(Parser, Debug)]
#[command(name = "learn-archiver")]
#[command(version = "1.0.0")]
#[command(about = "An offline mirror for online course content", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["stats", "recrawl", "retry_failed", "unit"])]
    dry_run: bool,

    /// Show statistics for the existing archive and exit
    #[arg(long, conflicts_with_all = ["dry_run", "recrawl", "retry_failed", "unit"])]
    stats: bool,

    /// Re-crawl every unit recorded in the manifest, without rediscovery
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "retry_failed", "unit"])]
    recrawl: bool,

    /// Retry the units in a failure list (defaults to the configured one)
    #[arg(
        long,
        value_name = "FILE",
        num_args = 0..=1,
        conflicts_with_all = ["dry_run", "stats", "recrawl", "unit"]
    )]
    retry_failed: Option<Option<PathBuf>>,

    /// Re-crawl a single unit URL
    #[arg(long, value_name = "URL", requires = "output")]
    unit: Option<String>,

    /// Archive path of the unit given with --unit
    #[arg(long, value_name = "PATH", requires = "unit")]
    output: Option<String>,

    /// Title of the unit given with --unit (derived from the URL if omitted)
    #[arg(long, value_name = "TITLE", requires = "unit")]
    title: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }
    if cli.stats {
        return handle_stats(&config);
    }

    let mode = if let Some(file) = cli.retry_failed {
        Mode::Retry(file.unwrap_or_else(|| config.failures_path()))
    } else if cli.recrawl {
        Mode::Recrawl
    } else if let (Some(url), Some(path)) = (cli.unit, cli.output) {
        Mode::Single(single_target(&url, path, cli.title)?)
    } else {
        Mode::Full
    };

    let coordinator = crawler::launch(config)
        .await
        .context("Failed to start headless Chromium")?;
    let outcome = run(&coordinator, mode).await;
    coordinator.shutdown().await;

    let (tally, list_failures) = outcome?;
    print_run_summary(&tally, list_failures);
    Ok(())
}

/// The flow selected on the command line
enum Mode {
    Full,
    Recrawl,
    Retry(PathBuf),
    Single(CrawlTarget),
}

async fn run(coordinator: &Coordinator, mode: Mode) -> Result<(RunTally, bool)> {
    match mode {
        Mode::Full => {
            let (_structure, tally) = coordinator
                .run_full_crawl()
                .await
                .context("Full crawl aborted")?;
            coordinator.record_failures(&tally)?;
            Ok((tally, false))
        }
        Mode::Recrawl => {
            let tally = coordinator
                .recrawl_manifest()
                .await
                .context("Re-crawl from manifest aborted")?;
            coordinator.record_failures(&tally)?;
            Ok((tally, false))
        }
        Mode::Retry(file) => {
            let targets = read_failure_list(&file)
                .with_context(|| format!("Failed to read failure list {}", file.display()))?;
            if targets.is_empty() {
                tracing::info!("No failed units to retry in {}", file.display());
            }
            let tally = coordinator
                .retry_failed(&targets)
                .await
                .context("Retry aborted")?;
            coordinator.record_failures(&tally)?;
            Ok((tally, true))
        }
        Mode::Single(target) => {
            tracing::info!("Re-crawling {} into {}", target.url, target.path);
            let tally = coordinator
                .crawl_single(&target)
                .await
                .context("Unit crawl aborted")?;
            Ok((tally, true))
        }
    }
}

fn single_target(url: &str, path: String, title: Option<String>) -> Result<CrawlTarget> {
    let parsed = parse_absolute(url).context("--unit must be an absolute URL")?;
    let title = title.unwrap_or_else(|| unit_title_from_url(&parsed));

    Ok(CrawlTarget {
        url: parsed.to_string(),
        path,
        title,
    })
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("learn_archiver=info,warn"),
            1 => EnvFilter::new("learn_archiver=debug,info"),
            2 => EnvFilter::new("learn_archiver=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows what a full crawl would do
fn handle_dry_run(config: &Config) {
    println!("=== Learn-Archiver Dry Run ===\n");

    println!("Course:");
    println!("  Title: {}", config.course.title);
    println!("  URL: {}", config.course.url);
    println!("  Base URL: {}", config.course.base_url);

    println!("\nLearning Paths ({}):", config.learning_paths.len());
    for entry in &config.learning_paths {
        println!(
            "  - {} ({} modules expected)",
            entry.title, entry.expected_modules
        );
        println!("    * {}", entry.url);
    }

    println!("\nScheduling:");
    println!("  Batch size: {}", config.batch.batch_size);
    println!("  Batch delay: {}ms", config.batch.batch_delay);
    println!("  Unit delay: {}ms", config.batch.unit_delay);
    println!("  Module delay: {}ms", config.batch.module_delay);
    println!("  Learning path delay: {}ms", config.batch.learning_path_delay);

    let policy = RetryPolicy::from_config(&config.retry_tiers);
    println!("\nRetry Tiers ({} attempts total):", policy.total_attempts());
    for tier in policy.tiers() {
        println!("  - {} x {}ms", tier.retries, tier.wait.as_millis());
    }

    println!("\nOutput:");
    println!("  Archive root: {}", config.output.archive_root);
    println!("  Manifest: {}", config.manifest_path().display());
    println!("  Failure list: {}", config.failures_path().display());

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would discover units from {} learning paths",
        config.learning_paths.len()
    );
}

/// Handles the --stats mode: shows statistics for the manifest and archive
fn handle_stats(config: &Config) -> Result<()> {
    let store = open_store(config);
    println!("Manifest: {}\n", config.manifest_path().display());

    let structure = store.load().context("Failed to load manifest")?;
    let layout = ArchiveLayout::new(config.archive_root(), &config.output.locale);
    print_statistics(&archive_statistics(&structure, &layout));

    Ok(())
}
