use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use codehound_common::Config;
use codehound_scout::maintenance::Maintenance;
use codehound_scout::moderation::ModerationSummary;
use codehound_scout::pipeline::orchestrator::ScrapeOrchestrator;
use codehound_scout::registration::ChannelRegistry;
use codehound_scout::store::PgStore;
use youtube_client::YouTubeClient;

#[derive(Parser)]
#[command(name = "codehound", about = "Promo code scraper for YouTube channels")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape the most recent videos of every active channel
    Sweep,
    /// Scrape one channel on demand
    Channel {
        /// Internal channel id
        channel_id: String,
    },
    /// Register a YouTube channel so the sweep visits it
    AddChannel {
        /// YouTube channel id (`UC...`)
        youtube_id: String,
        /// Category the channel is filed under
        #[arg(long)]
        category: String,
    },
    /// Expire past-due codes and deactivate heavily reported ones
    Cleanup,
    /// Print the moderation summary
    Summary,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("codehound=info".parse()?))
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    config.log_redacted();

    let store = Arc::new(
        PgStore::connect(&config.database_url)
            .await
            .context("Failed to connect to Postgres")?,
    );

    match cli.command {
        Command::Sweep => {
            let source = Arc::new(YouTubeClient::new(config.youtube_api_key.clone()));
            let orchestrator = ScrapeOrchestrator::new(source, store, config.scrape.clone());
            let stats = orchestrator.sweep_active_channels().await?;
            print_json(&stats)?;
        }
        Command::Channel { channel_id } => {
            let source = Arc::new(YouTubeClient::new(config.youtube_api_key.clone()));
            let orchestrator = ScrapeOrchestrator::new(source, store, config.scrape.clone());
            let stats = orchestrator.scrape_channel(&channel_id).await?;
            info!("{stats}");
            print_json(&stats)?;
        }
        Command::AddChannel {
            youtube_id,
            category,
        } => {
            let source = Arc::new(YouTubeClient::new(config.youtube_api_key.clone()));
            let channel = ChannelRegistry::new(source, store)
                .register(&youtube_id, &category)
                .await?;
            print_json(&channel)?;
        }
        Command::Cleanup => {
            let stats = Maintenance::new(store, config.report_threshold)
                .run(Utc::now())
                .await?;
            print_json(&stats)?;
        }
        Command::Summary => {
            let summary =
                ModerationSummary::build(store.as_ref(), Utc::now(), config.moderation_queue_size)
                    .await?;
            print_json(&summary)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
