//! FeedScout main entry point
//!
//! This is the command-line interface for the FeedScout feed crawler.

use clap::Parser;
use feedscout::config::{load_config_with_hash, Config};
use feedscout::crawler::Coordinator;
use feedscout::output::{print_report, JsonLinesSink};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// FeedScout: a breadth-first crawler that discovers RSS/Atom feeds
///
/// FeedScout crawls outward from seed URLs, collects every feed referenced
/// by the pages it visits, and writes each feed as JSON Feed to a JSON Lines
/// file.
#[derive(Parser, Debug)]
#[command(name = "feedscout")]
#[command(version)]
#[command(about = "A breadth-first feed discovery crawler", long_about = None)]
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
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        Ok(())
    } else {
        handle_crawl(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("feedscout=info,warn"),
            1 => EnvFilter::new("feedscout=debug,info"),
            2 => EnvFilter::new("feedscout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr so feeds written to stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== FeedScout Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Page workers: {}", config.crawler.page_workers);
    println!("  Feed workers: {}", config.crawler.feed_workers);
    println!("  Fetch timeout: {}s", config.crawler.fetch_timeout_secs);
    println!("  Max redirects: {}", config.crawler.max_redirects);
    println!(
        "  Retries: {} ({}ms apart)",
        config.crawler.max_retries, config.crawler.retry_delay_ms
    );
    match config.crawler.max_pages {
        Some(limit) => println!("  Max pages: {}", limit),
        None => println!("  Max pages: unlimited"),
    }

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Feeds: {}", config.output.feeds_path);

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Total seed URLs: {}", config.seeds.len());

    let feeds_on_stdout = config.output.feeds_path == "-";
    let sink = Arc::new(JsonLinesSink::open(&config.output.feeds_path)?);
    let coordinator = Coordinator::new(config, sink)?;

    let shutdown = coordinator.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.shutdown();
        }
    });

    match coordinator.run().await {
        Ok(report) => {
            tracing::info!("Crawl completed successfully");
            if feeds_on_stdout {
                tracing::info!("{:?}", report);
            } else {
                print_report(&report);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
