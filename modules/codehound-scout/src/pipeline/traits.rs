// Trait abstractions for the scrape orchestrator's collaborators.
//
// VideoSource: the video platform. YouTubeClient in production.
// PromoStore: every read and write the pipeline performs.
// ModerationStore: read-side aggregates plus the maintenance updates.
//
// These enable deterministic testing with MockVideoSource and MockPromoStore:
// no network, no database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use codehound_common::{
    ChannelMetadata, ChannelRecord, NewChannel, NewPromoCode, NewVideo, PendingCode,
    PlatformError, StatusCounts, StoreError, VideoMetadata, VideoRecord,
};
use youtube_client::{YouTubeClient, YouTubeError, MAX_VIDEO_BATCH};

/// Most ids a single `video_metadata` call may receive. Callers chunk.
pub const METADATA_BATCH_LIMIT: usize = MAX_VIDEO_BATCH;

// ---------------------------------------------------------------------------
// VideoSource
// ---------------------------------------------------------------------------

#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Ids of a channel's most recent videos, newest first. May be empty.
    async fn recent_video_ids(
        &self,
        channel_youtube_id: &str,
        max_results: u32,
    ) -> Result<Vec<String>, PlatformError>;

    /// Metadata for at most [`METADATA_BATCH_LIMIT`] ids. Ids that no longer
    /// exist are omitted; the batch never partially fails.
    async fn video_metadata(&self, ids: &[String]) -> Result<Vec<VideoMetadata>, PlatformError>;

    /// Channel metadata, `None` when the id does not resolve to a channel.
    async fn channel_metadata(
        &self,
        channel_youtube_id: &str,
    ) -> Result<Option<ChannelMetadata>, PlatformError>;
}

#[async_trait]
impl VideoSource for YouTubeClient {
    async fn recent_video_ids(
        &self,
        channel_youtube_id: &str,
        max_results: u32,
    ) -> Result<Vec<String>, PlatformError> {
        let videos = self
            .recent_videos(channel_youtube_id, max_results)
            .await
            .map_err(platform_error)?;
        Ok(videos.into_iter().map(|v| v.id).collect())
    }

    async fn video_metadata(&self, ids: &[String]) -> Result<Vec<VideoMetadata>, PlatformError> {
        let videos = self.videos_by_ids(ids).await.map_err(platform_error)?;
        Ok(videos
            .into_iter()
            .map(|v| VideoMetadata {
                id: v.id,
                title: v.title,
                description: v.description,
                published_at: v.published_at,
                thumbnail_url: v.thumbnail_url,
            })
            .collect())
    }

    async fn channel_metadata(
        &self,
        channel_youtube_id: &str,
    ) -> Result<Option<ChannelMetadata>, PlatformError> {
        let info = self
            .channel_info(channel_youtube_id)
            .await
            .map_err(platform_error)?;
        Ok(info.map(|c| ChannelMetadata {
            id: c.id,
            title: c.title,
            description: c.description,
            custom_url: c.custom_url,
            thumbnail_url: c.thumbnail_url,
        }))
    }
}

fn platform_error(err: YouTubeError) -> PlatformError {
    if err.is_auth_failure() {
        return PlatformError::Unauthorized(err.to_string());
    }
    if err.is_transient() {
        return PlatformError::Unavailable(err.to_string());
    }
    match err {
        YouTubeError::BatchTooLarge { requested, max } => {
            PlatformError::BatchTooLarge { requested, max }
        }
        YouTubeError::Api { status, message } => PlatformError::Rejected { status, message },
        YouTubeError::Parse(msg) => PlatformError::Malformed(msg),
        YouTubeError::Network(msg) => PlatformError::Unavailable(msg),
    }
}

// ---------------------------------------------------------------------------
// PromoStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PromoStore: Send + Sync {
    async fn find_channel(&self, channel_id: &str) -> Result<Option<ChannelRecord>, StoreError>;

    async fn find_channel_by_youtube_id(
        &self,
        youtube_id: &str,
    ) -> Result<Option<ChannelRecord>, StoreError>;

    async fn create_channel(&self, channel: &NewChannel) -> Result<ChannelRecord, StoreError>;

    /// Channels flagged active, in a stable order.
    async fn active_channels(&self) -> Result<Vec<ChannelRecord>, StoreError>;

    /// Look up a video by its external YouTube id.
    async fn find_video(&self, youtube_id: &str) -> Result<Option<VideoRecord>, StoreError>;

    /// Insert a video with `has_been_scraped = false`.
    async fn create_video(&self, video: &NewVideo) -> Result<VideoRecord, StoreError>;

    /// Atomically claim the video (`has_been_scraped` false → true) and insert
    /// its codes as `PENDING`, active rows. Either both happen or neither does.
    /// Returns `false`, writing nothing, when another run already claimed it.
    async fn commit_video_scrape(
        &self,
        video_id: &str,
        codes: &[NewPromoCode],
    ) -> Result<bool, StoreError>;

    /// Stamp the channel checkpoint.
    async fn mark_channel_scraped(
        &self,
        channel_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// ModerationStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ModerationStore: Send + Sync {
    async fn count_codes_by_status(&self) -> Result<StatusCounts, StoreError>;

    async fn count_codes_created_since(&self, since: DateTime<Utc>) -> Result<u64, StoreError>;

    async fn count_channels(&self, active_only: bool) -> Result<u64, StoreError>;

    async fn count_videos(&self) -> Result<u64, StoreError>;

    /// Most recently created `PENDING` codes, newest first.
    async fn pending_codes(&self, limit: u32) -> Result<Vec<PendingCode>, StoreError>;

    /// Expire every code whose expiry date is before `now` and that is not
    /// already `EXPIRED`. Returns the number of codes changed.
    async fn expire_codes_before(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Expire and deactivate every active code with at least `threshold`
    /// user reports. Returns the number of codes changed.
    async fn deactivate_reported_codes(&self, threshold: u32) -> Result<u64, StoreError>;
}
