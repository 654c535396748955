//! Estate-Sweep main entry point
//!
//! This is the command-line interface for the Estate-Sweep classifieds ingester.

use anyhow::Context;
use clap::Parser;
use estate_sweep::config::{load_config_with_hash, validate, Config};
use estate_sweep::crawler::{crawl, ShutdownCoordinator};
use estate_sweep::output::{
    generate_markdown_summary, load_statistics, print_run_summary, print_statistics, SweepReport,
};
use estate_sweep::storage::SqliteAdStore;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Estate-Sweep: a concurrent classifieds ingester
///
/// Estate-Sweep walks paginated real-estate listings, fetches every ad with
/// a bounded pool of workers, and stores each distinct ad once.
#[derive(Parser, Debug)]
#[command(name = "estate-sweep")]
#[command(version)]
#[command(about = "A concurrent real-estate classifieds ingester", long_about = None)]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Override the configured worker count
    #[arg(long, value_name = "N")]
    workers: Option<u32>,

    /// Override the configured ad limit per seed
    #[arg(long, value_name = "N")]
    max_ads: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(workers) = cli.workers {
        config.crawler.worker_count = workers;
    }
    if let Some(max_ads) = cli.max_ads {
        config.crawler.max_ad_count = Some(max_ads);
    }
    validate(&config).context("Invalid command-line override")?;

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(&config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("estate_sweep=info,warn"),
            1 => EnvFilter::new("estate_sweep=debug,info"),
            2 => EnvFilter::new("estate_sweep=trace,debug"),
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

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Estate-Sweep Dry Run ===\n");

    let crawler = &config.crawler;
    println!("Crawler Configuration:");
    println!("  Workers: {}", crawler.worker_count);
    match crawler.max_ad_count {
        Some(max) => println!("  Ad limit per seed: {}", max),
        None => println!("  Ad limit per seed: none"),
    }
    println!("  Frame budget: {}", crawler.frame_budget);
    println!("  Fetch timeout: {}ms", crawler.fetch_timeout_ms);
    if let Some(secs) = crawler.run_timeout_secs {
        println!("  Run timeout: {}s", secs);
    }
    println!("  Queue capacity: {}", crawler.queue_capacity);
    println!("  Stall policy: {:?}", crawler.stall_policy);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    if let Some(summary) = &config.output.summary_path {
        println!("  Summary: {}", summary);
    }

    println!("\nSources ({}):", config.sources.len());
    for source in &config.sources {
        println!(
            "  - {} [{}] ({} seeds)",
            source.name,
            source.category,
            source.seeds.len()
        );
        for seed in &source.seeds {
            println!("    * {}", seed);
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling with {} seed URLs",
        config.sources.iter().map(|s| s.seeds.len()).sum::<usize>()
    );
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let store = SqliteAdStore::new(Path::new(&config.output.database_path))
        .with_context(|| format!("Failed to open {}", config.output.database_path))?;
    let stats = load_statistics(&store)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, config_hash: &str) -> anyhow::Result<()> {
    let seed_count: usize = config.sources.iter().map(|s| s.seeds.len()).sum();
    tracing::info!(
        "Sources: {}, total seed URLs: {}",
        config.sources.len(),
        seed_count
    );

    let shutdown = ShutdownCoordinator::new();
    let listener = shutdown.listen_for_signals();

    let result = crawl(config, config_hash, &shutdown).await;
    listener.abort();

    let summaries = match result {
        Ok(summaries) => summaries,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    for summary in &summaries {
        print_run_summary(summary);
    }

    let report = SweepReport::new(config_hash, summaries);
    if let Some(path) = &config.output.summary_path {
        generate_markdown_summary(&report, Path::new(path))
            .with_context(|| format!("Failed to write summary to {}", path))?;
        println!("✓ Summary exported to: {}", path);
    }

    tracing::info!(
        "Crawl finished: {} ads stored across {} runs",
        report.total_success(),
        report.runs.len()
    );
    Ok(())
}
