//! topicwatch CLI
//!
//! Local execution entry point for the topic change-detection cycle.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use topicwatch::{
    error::Result,
    messaging::LogPublisher,
    models::{Config, TrackedTopic},
    pipeline,
    services::{
        FetchOutcome, Fetcher, TopicFetcher, check_visibility, classify_title, extract_title,
        fingerprint, normalize,
    },
    storage::{LocalStore, TopicStore},
};

/// topicwatch - forum topic change detection
#[derive(Parser, Debug)]
#[command(
    name = "topicwatch",
    version,
    about = "Search-topic first-post change detection"
)]
struct Cli {
    /// Path to storage directory containing config and data files
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one full cycle: visibility refresh, then first-post check
    Run,

    /// Fetch and classify a single topic, without touching the store
    Check {
        /// Forum topic id
        topic_id: u64,
    },

    /// Start tracking a topic
    Track {
        /// Forum topic id
        topic_id: u64,

        /// Forum folder the topic lives in
        #[arg(long, default_value_t = 1)]
        folder: u32,
    },

    /// Validate configuration files
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("topicwatch starting...");

    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);
    config.validate()?;

    log::info!("Loaded configuration from {}", cli.storage_dir.display());

    match cli.command {
        Command::Run => {
            let fetcher = TopicFetcher::new(&config.fetcher)?;
            let store = LocalStore::new(&cli.storage_dir);
            let publisher = LogPublisher;

            let stats = pipeline::run_cycle(&config, &fetcher, &store, &publisher).await?;

            log::info!(
                "Cycle complete: {} first posts checked, {} changed, {} visibility updates",
                stats.first_posts_checked,
                stats.first_posts_changed,
                stats.visibility_updates
            );
            if stats.transient_failures > 0 {
                log::warn!("{} transient fetch failures", stats.transient_failures);
            }
            if stats.persistence_failures > 0 {
                log::warn!("{} persistence failures", stats.persistence_failures);
            }
        }

        Command::Check { topic_id } => {
            let fetcher = TopicFetcher::new(&config.fetcher)?;
            log::info!("Fetching {}", fetcher.topic_url(topic_id));

            let content = match fetcher.fetch(topic_id).await {
                FetchOutcome::Success(content) => content,
                FetchOutcome::Transient(reason) => {
                    log::error!("Fetch failed: {}", reason);
                    return Err(topicwatch::error::AppError::fetch(reason));
                }
            };

            log::info!("Visibility: {}", check_visibility(&content));
            match extract_title(&content) {
                Some(title) => {
                    log::info!("Title: {}", title);
                    match classify_title(&title) {
                        Some(status) => log::info!("Status: {}", status),
                        None => log::info!("Status: unrecognized"),
                    }
                }
                None => log::info!("Title: not found"),
            }

            let normalized = normalize(&content);
            if normalized.degraded {
                log::warn!("Normalization degraded: content markers missing");
            }
            log::info!("Fingerprint: {}", fingerprint(&normalized.text));
        }

        Command::Track { topic_id, folder } => {
            let store = LocalStore::new(&cli.storage_dir);
            store
                .upsert_topic(TrackedTopic {
                    topic_id,
                    start_time: Utc::now(),
                    folder_id: folder,
                })
                .await?;
            log::info!("Tracking topic {} (folder {})", topic_id, folder);
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            config.validate()?;
            log::info!("✓ Config OK (fetcher, selection weights, visibility)");
        }
    }

    log::info!("Done!");

    Ok(())
}
