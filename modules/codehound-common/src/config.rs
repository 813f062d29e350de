use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Largest `maxResults` the platform's search listing accepts.
pub const MAX_VIDEO_LIMIT: u32 = 50;

/// Limits and pacing for the scrape orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeSettings {
    /// Videos fetched when a single channel is scraped on demand.
    pub channel_video_limit: u32,
    /// Videos fetched per channel during the scheduled sweep.
    pub sweep_video_limit: u32,
    /// Pause between two channels of a sweep, to stay under the API rate limit.
    pub channel_delay: Duration,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            channel_video_limit: 20,
            sweep_video_limit: 10,
            channel_delay: Duration::from_millis(1000),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // YouTube Data API
    pub youtube_api_key: String,

    pub scrape: ScrapeSettings,

    // Maintenance / moderation
    pub report_threshold: u32,
    pub moderation_queue_size: u32,
}

impl Config {
    /// Load configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ScrapeSettings::default();
        let delay_ms = parse_or(
            &lookup,
            "SWEEP_CHANNEL_DELAY_MS",
            defaults.channel_delay.as_millis() as u64,
        )?;

        Ok(Self {
            database_url: required(&lookup, "DATABASE_URL")?,
            youtube_api_key: required(&lookup, "YOUTUBE_API_KEY")?,
            scrape: ScrapeSettings {
                channel_video_limit: video_limit(
                    &lookup,
                    "CHANNEL_VIDEO_LIMIT",
                    defaults.channel_video_limit,
                )?,
                sweep_video_limit: video_limit(
                    &lookup,
                    "SWEEP_VIDEO_LIMIT",
                    defaults.sweep_video_limit,
                )?,
                channel_delay: Duration::from_millis(delay_ms),
            },
            report_threshold: parse_or(&lookup, "REPORT_DEACTIVATION_THRESHOLD", 3)?,
            moderation_queue_size: parse_or(&lookup, "MODERATION_QUEUE_SIZE", 10)?,
        })
    }

    pub fn log_redacted(&self) {
        fn preview(val: &str) -> String {
            let head: String = val.chars().take(5).collect();
            format!("{}...({} chars)", head, val.chars().count())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  DATABASE_URL: {}", preview(&self.database_url));
        tracing::info!("  YOUTUBE_API_KEY: {}", preview(&self.youtube_api_key));
        tracing::info!(
            channel_video_limit = self.scrape.channel_video_limit,
            sweep_video_limit = self.scrape.sweep_video_limit,
            channel_delay_ms = self.scrape.channel_delay.as_millis() as u64,
            report_threshold = self.report_threshold,
            moderation_queue_size = self.moderation_queue_size,
            "  Scrape settings"
        );
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn video_limit<F>(lookup: &F, key: &'static str, default: u32) -> Result<u32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let limit = parse_or(lookup, key, default)?;
    if !(1..=MAX_VIDEO_LIMIT).contains(&limit) {
        return Err(ConfigError::Invalid {
            key,
            value: limit.to_string(),
            reason: format!("must be between 1 and {MAX_VIDEO_LIMIT}"),
        });
    }
    Ok(limit)
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
