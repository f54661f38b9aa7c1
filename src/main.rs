//! follower-rank - rank a GitHub user's followers
//!
//! A CLI tool that fetches a user's followers and their account details
//! from the GitHub API and ranks them by a chosen metric.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (invalid options, GitHub API failure, I/O, etc.)

use anyhow::{Context, Result};
use chrono::Utc;
use follower_rank::cli::{Args, OutputFormat};
use follower_rank::config::{Config, CONFIG_FILE};
use follower_rank::models::{RankingReport, ReportMetadata};
use follower_rank::{report, ClientConfig, GitHubClient, RankError, RankOptions, Ranker};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("follower-rank v{}", env!("CARGO_PKG_VERSION"));
    debug!(
        "Arguments: username={:?} method={:?} order={:?} token={}",
        args.username,
        args.method,
        args.order,
        if args.token.is_some() { "set" } else { "unset" }
    );

    if let Err(e) = run_rank(args).await {
        error!("Ranking failed: {}", e);
        eprintln!("\n❌ Error: {}", e);
        if let Some(hint) = e.downcast_ref::<RankError>().and_then(RankError::hint) {
            eprintln!("   {}", hint);
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .follower-rank.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the method, order, API URL, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete ranking workflow.
async fn run_rank(args: Args) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let options = RankOptions {
        token: args.token.clone(),
        username: config.rank.username.clone(),
        user_agent: config.github.user_agent.clone(),
        method: config.rank.method,
        order: config.rank.order,
    };

    let client = Arc::new(
        GitHubClient::new(ClientConfig::from(&config.github))
            .context("Failed to create HTTP client")?,
    );
    let ranker = Ranker::new(options, client.clone(), client).map_err(RankError::from)?;

    let options = ranker.options();
    info!(
        "Ranking followers of {} by {} ({})",
        options.username.as_deref().unwrap_or("the authenticated user"),
        options.method,
        options.order
    );

    let output = ranker.run().await;

    if let Some(ref info) = output.rate_limit {
        eprintln!("GitHub rate limit: {}", info);
    }

    let ranking = output.result.map_err(RankError::from)?;

    let report = RankingReport {
        metadata: ReportMetadata {
            username: config.rank.username.clone(),
            method: config.rank.method,
            order: config.rank.order,
            generated_at: Utc::now(),
            total: ranking.len(),
        },
        ranking,
        rate_limit: output.rate_limit,
    };

    let rendered = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, config.report.top),
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !args.quiet {
                eprintln!("✅ Ranking saved to: {}", path.display());
            }
        }
        None => println!("{}", rendered),
    }

    info!(
        "Ranked {} followers in {:.1}s",
        report.metadata.total,
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
