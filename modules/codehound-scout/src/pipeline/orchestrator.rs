use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use codehound_common::{
    ChannelRecord, NewPromoCode, NewVideo, ScrapeError, ScrapeSettings, VideoMetadata,
};

use crate::detection::detect_codes;
use crate::pipeline::stats::{ChannelScrapeStats, SweepStats};
use crate::pipeline::traits::{PromoStore, VideoSource, METADATA_BATCH_LIMIT};

/// Drives fetch → detect → persist for one channel or every active channel.
///
/// Channels and videos are visited strictly sequentially. A video's codes are
/// committed in the same store operation that flips its `has_been_scraped`
/// flag, so a re-run (or a run after a failed write) never duplicates codes.
pub struct ScrapeOrchestrator {
    source: Arc<dyn VideoSource>,
    store: Arc<dyn PromoStore>,
    settings: ScrapeSettings,
}

impl ScrapeOrchestrator {
    pub fn new(
        source: Arc<dyn VideoSource>,
        store: Arc<dyn PromoStore>,
        settings: ScrapeSettings,
    ) -> Self {
        Self {
            source,
            store,
            settings,
        }
    }

    /// On-demand trigger for one channel, using the on-demand video limit.
    pub async fn scrape_channel(&self, channel_id: &str) -> Result<ChannelScrapeStats, ScrapeError> {
        let channel = self
            .store
            .find_channel(channel_id)
            .await?
            .ok_or_else(|| ScrapeError::ChannelNotFound(channel_id.to_string()))?;

        self.process_channel(&channel, self.settings.channel_video_limit)
            .await
    }

    /// Process up to `limit` of the channel's most recent videos.
    pub async fn process_channel(
        &self,
        channel: &ChannelRecord,
        limit: u32,
    ) -> Result<ChannelScrapeStats, ScrapeError> {
        let mut stats = ChannelScrapeStats::new(channel);
        self.run_channel(channel, limit, &mut stats).await?;
        Ok(stats)
    }

    /// Scheduled sweep over every active channel.
    ///
    /// A failing channel is recorded and the sweep moves on. Only fatal
    /// errors (storage unreachable, credentials rejected) abort the sweep.
    pub async fn sweep_active_channels(&self) -> Result<SweepStats, ScrapeError> {
        let channels = self.store.active_channels().await?;
        let mut sweep = SweepStats::default();

        if channels.is_empty() {
            info!("No active channels to scrape");
            return Ok(sweep);
        }

        info!(channels = channels.len(), "Starting sweep");

        for (i, channel) in channels.iter().enumerate() {
            if i > 0 && !self.settings.channel_delay.is_zero() {
                tokio::time::sleep(self.settings.channel_delay).await;
            }

            let mut stats = ChannelScrapeStats::new(channel);
            match self
                .run_channel(channel, self.settings.sweep_video_limit, &mut stats)
                .await
            {
                Ok(()) => {
                    info!("{stats}");
                    sweep.record_success(&stats);
                }
                Err(e) if e.is_fatal() => {
                    error!(channel = %channel.name, error = %e, "Fatal error, aborting sweep");
                    return Err(e);
                }
                Err(e) => {
                    warn!(channel = %channel.name, error = %e, "Channel failed");
                    sweep.record_failure(&stats, &e);
                }
            }
        }

        info!("{sweep}");
        Ok(sweep)
    }

    /// Counters are written into `stats` as work is persisted, so a caller
    /// still sees partial progress when this returns an error.
    async fn run_channel(
        &self,
        channel: &ChannelRecord,
        limit: u32,
        stats: &mut ChannelScrapeStats,
    ) -> Result<(), ScrapeError> {
        info!(channel = %channel.name, limit, "Processing channel");

        let ids = self
            .source
            .recent_video_ids(&channel.youtube_id, limit)
            .await?;
        stats.videos_found = ids.len() as u32;

        if ids.is_empty() {
            info!(channel = %channel.name, "No videos found");
            return Ok(());
        }

        let videos = self.fetch_metadata(&ids).await?;
        for meta in &videos {
            self.process_video(channel, meta, stats).await?;
        }

        self.store
            .mark_channel_scraped(&channel.id, Utc::now())
            .await?;
        Ok(())
    }

    async fn fetch_metadata(&self, ids: &[String]) -> Result<Vec<VideoMetadata>, ScrapeError> {
        let mut videos = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(METADATA_BATCH_LIMIT) {
            videos.extend(self.source.video_metadata(chunk).await?);
        }
        Ok(videos)
    }

    async fn process_video(
        &self,
        channel: &ChannelRecord,
        meta: &VideoMetadata,
        stats: &mut ChannelScrapeStats,
    ) -> Result<(), ScrapeError> {
        let video = match self.store.find_video(&meta.id).await? {
            Some(video) => video,
            None => {
                self.store
                    .create_video(&NewVideo::from_metadata(meta, &channel.id))
                    .await?
            }
        };

        if video.has_been_scraped {
            stats.videos_skipped += 1;
            return Ok(());
        }

        let codes: Vec<NewPromoCode> = detect_codes(&meta.description)
            .iter()
            .map(|code| NewPromoCode::from_detected(code, &video.id, &channel.id))
            .collect();

        if !self.store.commit_video_scrape(&video.id, &codes).await? {
            warn!(video = %meta.id, "Video was claimed by another run, skipping");
            stats.videos_skipped += 1;
            return Ok(());
        }

        stats.codes_detected += codes.len() as u32;
        stats.videos_processed += 1;
        Ok(())
    }
}
