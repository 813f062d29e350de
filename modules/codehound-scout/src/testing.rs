// Test doubles for the scrape pipeline.
//
// Two mocks matching the collaborator traits:
// - MockVideoSource (VideoSource): channel → videos map, records batch sizes
// - MockPromoStore (PromoStore + ModerationStore): stateful in-memory tables
//
// Plus helpers for building ChannelRecord / VideoMetadata fixtures.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use codehound_common::{
    ChannelMetadata, ChannelRecord, NewChannel, NewPromoCode, NewVideo, PendingCode,
    PlatformError, PromoCodeRecord, PromoStatus, StatusCounts, StoreError, VideoMetadata,
    VideoRecord,
};

use crate::pipeline::traits::{ModerationStore, PromoStore, VideoSource, METADATA_BATCH_LIMIT};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// An active channel whose internal id is `id` and YouTube id is `yt-{id}`.
pub fn channel(id: &str, name: &str) -> ChannelRecord {
    ChannelRecord {
        id: id.to_string(),
        name: name.to_string(),
        youtube_id: format!("yt-{id}"),
        is_active: true,
        last_scraped_at: None,
    }
}

pub fn video(id: &str, description: &str) -> VideoMetadata {
    VideoMetadata {
        id: id.to_string(),
        title: format!("Video {id}"),
        description: description.to_string(),
        published_at: fixed_time(),
        thumbnail_url: None,
    }
}

pub fn channel_metadata(youtube_id: &str, title: &str) -> ChannelMetadata {
    ChannelMetadata {
        id: youtube_id.to_string(),
        title: title.to_string(),
        description: format!("La chaîne {title}"),
        custom_url: Some(format!("@{}", title.to_lowercase())),
        thumbnail_url: None,
    }
}

/// 2025-01-15T12:00:00Z
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
}

// ---------------------------------------------------------------------------
// MockVideoSource
// ---------------------------------------------------------------------------

/// Channel-keyed video source. Unregistered channels have no videos.
/// Builder pattern: `.on_channel()`, `.on_channel_info()`, `.failing_channel()`.
pub struct MockVideoSource {
    channels: HashMap<String, Vec<VideoMetadata>>,
    channel_infos: HashMap<String, ChannelMetadata>,
    failures: HashMap<String, PlatformError>,
    batches: Mutex<Vec<usize>>,
}

impl MockVideoSource {
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
            channel_infos: HashMap::new(),
            failures: HashMap::new(),
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Register a channel's videos, newest first.
    pub fn on_channel(mut self, youtube_id: &str, videos: Vec<VideoMetadata>) -> Self {
        self.channels.insert(youtube_id.to_string(), videos);
        self
    }

    /// Make `channel_metadata` resolve this channel.
    pub fn on_channel_info(mut self, info: ChannelMetadata) -> Self {
        self.channel_infos.insert(info.id.clone(), info);
        self
    }

    /// Make listing this channel's videos fail.
    pub fn failing_channel(mut self, youtube_id: &str, error: PlatformError) -> Self {
        self.failures.insert(youtube_id.to_string(), error);
        self
    }

    /// Sizes of every `video_metadata` call, in call order.
    pub fn metadata_batches(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }
}

impl Default for MockVideoSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VideoSource for MockVideoSource {
    async fn recent_video_ids(
        &self,
        channel_youtube_id: &str,
        max_results: u32,
    ) -> Result<Vec<String>, PlatformError> {
        if let Some(err) = self.failures.get(channel_youtube_id) {
            return Err(err.clone());
        }
        Ok(self
            .channels
            .get(channel_youtube_id)
            .map(|videos| {
                videos
                    .iter()
                    .take(max_results as usize)
                    .map(|v| v.id.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn video_metadata(&self, ids: &[String]) -> Result<Vec<VideoMetadata>, PlatformError> {
        if ids.len() > METADATA_BATCH_LIMIT {
            return Err(PlatformError::BatchTooLarge {
                requested: ids.len(),
                max: METADATA_BATCH_LIMIT,
            });
        }
        self.batches.lock().unwrap().push(ids.len());

        Ok(ids
            .iter()
            .filter_map(|id| {
                self.channels
                    .values()
                    .flatten()
                    .find(|v| &v.id == id)
                    .cloned()
            })
            .collect())
    }

    async fn channel_metadata(
        &self,
        channel_youtube_id: &str,
    ) -> Result<Option<ChannelMetadata>, PlatformError> {
        if let Some(err) = self.failures.get(channel_youtube_id) {
            return Err(err.clone());
        }
        Ok(self.channel_infos.get(channel_youtube_id).cloned())
    }
}

// ---------------------------------------------------------------------------
// MockPromoStore
// ---------------------------------------------------------------------------

struct MockPromoStoreInner {
    channels: Vec<ChannelRecord>,
    videos: Vec<VideoRecord>,
    codes: Vec<PromoCodeRecord>,
    /// promo code id → number of user reports
    reports: HashMap<String, u32>,
    /// channel id → error returned by writes touching that channel
    channel_failures: HashMap<String, StoreError>,
    /// channel id → number of checkpoint stamps
    checkpoints: HashMap<String, u32>,
    /// returned, once, by the next `commit_video_scrape`
    next_commit_failure: Option<StoreError>,
    unavailable: bool,
}

/// Stateful in-memory store. Thread-safe via interior Mutex.
pub struct MockPromoStore {
    inner: Mutex<MockPromoStoreInner>,
}

impl MockPromoStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MockPromoStoreInner {
                channels: Vec::new(),
                videos: Vec::new(),
                codes: Vec::new(),
                reports: HashMap::new(),
                channel_failures: HashMap::new(),
                checkpoints: HashMap::new(),
                next_commit_failure: None,
                unavailable: false,
            }),
        }
    }

    pub fn with_channel(self, channel: ChannelRecord) -> Self {
        self.inner.lock().unwrap().channels.push(channel);
        self
    }

    pub fn with_video(self, video: VideoRecord) -> Self {
        self.inner.lock().unwrap().videos.push(video);
        self
    }

    pub fn with_code(self, code: PromoCodeRecord) -> Self {
        self.inner.lock().unwrap().codes.push(code);
        self
    }

    pub fn with_report_count(self, code_id: &str, reports: u32) -> Self {
        self.inner
            .lock()
            .unwrap()
            .reports
            .insert(code_id.to_string(), reports);
        self
    }

    /// Make `create_video` and `mark_channel_scraped` fail for this channel.
    pub fn fail_on_channel(self, channel_id: &str, error: StoreError) -> Self {
        self.inner
            .lock()
            .unwrap()
            .channel_failures
            .insert(channel_id.to_string(), error);
        self
    }

    /// Make the next `commit_video_scrape` fail, writing nothing.
    pub fn fail_next_commit(self, error: StoreError) -> Self {
        self.inner.lock().unwrap().next_commit_failure = Some(error);
        self
    }

    /// Make every call fail with `StoreError::Unavailable`.
    pub fn unavailable(self) -> Self {
        self.inner.lock().unwrap().unavailable = true;
        self
    }

    // --- Assertion helpers ---

    pub fn codes(&self) -> Vec<PromoCodeRecord> {
        self.inner.lock().unwrap().codes.clone()
    }

    pub fn code(&self, id: &str) -> Option<PromoCodeRecord> {
        self.inner
            .lock()
            .unwrap()
            .codes
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    pub fn codes_for_channel(&self, channel_id: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .codes
            .iter()
            .filter(|c| c.channel_id == channel_id)
            .count()
    }

    pub fn videos(&self) -> Vec<VideoRecord> {
        self.inner.lock().unwrap().videos.clone()
    }

    pub fn video(&self, youtube_id: &str) -> Option<VideoRecord> {
        self.inner
            .lock()
            .unwrap()
            .videos
            .iter()
            .find(|v| v.youtube_id == youtube_id)
            .cloned()
    }

    pub fn channel(&self, id: &str) -> Option<ChannelRecord> {
        self.inner
            .lock()
            .unwrap()
            .channels
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    pub fn checkpoint_count(&self, channel_id: &str) -> u32 {
        self.inner
            .lock()
            .unwrap()
            .checkpoints
            .get(channel_id)
            .copied()
            .unwrap_or(0)
    }
}

impl Default for MockPromoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPromoStoreInner {
    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    fn check_channel(&self, channel_id: &str) -> Result<(), StoreError> {
        self.check_available()?;
        match self.channel_failures.get(channel_id) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PromoStore for MockPromoStore {
    async fn find_channel(&self, channel_id: &str) -> Result<Option<ChannelRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_available()?;
        Ok(inner.channels.iter().find(|c| c.id == channel_id).cloned())
    }

    async fn find_channel_by_youtube_id(
        &self,
        youtube_id: &str,
    ) -> Result<Option<ChannelRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_available()?;
        Ok(inner
            .channels
            .iter()
            .find(|c| c.youtube_id == youtube_id)
            .cloned())
    }

    async fn create_channel(&self, channel: &NewChannel) -> Result<ChannelRecord, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_available()?;
        let record = ChannelRecord {
            id: Uuid::new_v4().to_string(),
            name: channel.name.clone(),
            youtube_id: channel.youtube_id.clone(),
            is_active: true,
            last_scraped_at: None,
        };
        inner.channels.push(record.clone());
        Ok(record)
    }

    async fn active_channels(&self) -> Result<Vec<ChannelRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_available()?;
        Ok(inner
            .channels
            .iter()
            .filter(|c| c.is_active)
            .cloned()
            .collect())
    }

    async fn find_video(&self, youtube_id: &str) -> Result<Option<VideoRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_available()?;
        Ok(inner
            .videos
            .iter()
            .find(|v| v.youtube_id == youtube_id)
            .cloned())
    }

    async fn create_video(&self, video: &NewVideo) -> Result<VideoRecord, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_channel(&video.channel_id)?;
        let record = VideoRecord {
            id: Uuid::new_v4().to_string(),
            youtube_id: video.youtube_id.clone(),
            title: video.title.clone(),
            description: video.description.clone(),
            published_at: video.published_at,
            channel_id: video.channel_id.clone(),
            thumbnail_url: video.thumbnail_url.clone(),
            has_been_scraped: false,
        };
        inner.videos.push(record.clone());
        Ok(record)
    }

    async fn commit_video_scrape(
        &self,
        video_id: &str,
        codes: &[NewPromoCode],
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_available()?;
        if let Some(err) = inner.next_commit_failure.take() {
            return Err(err);
        }

        let video = inner
            .videos
            .iter_mut()
            .find(|v| v.id == video_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "Video",
                id: video_id.to_string(),
            })?;
        if video.has_been_scraped {
            return Ok(false);
        }
        video.has_been_scraped = true;

        let created_at = Utc::now();
        inner.codes.extend(codes.iter().map(|code| PromoCodeRecord {
            id: Uuid::new_v4().to_string(),
            code: code.code.clone(),
            brand: code.brand.clone(),
            product: code.product.clone(),
            discount: code.discount.clone(),
            description: Some(code.description.clone()),
            extracted_text: code.extracted_text.clone(),
            video_id: code.video_id.clone(),
            channel_id: code.channel_id.clone(),
            status: PromoStatus::Pending,
            is_active: true,
            expires_at: code.expires_at,
            created_at,
        }));
        Ok(true)
    }

    async fn mark_channel_scraped(
        &self,
        channel_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_channel(channel_id)?;
        let channel = inner
            .channels
            .iter_mut()
            .find(|c| c.id == channel_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "Channel",
                id: channel_id.to_string(),
            })?;
        channel.last_scraped_at = Some(at);
        *inner.checkpoints.entry(channel_id.to_string()).or_default() += 1;
        Ok(())
    }
}

#[async_trait]
impl ModerationStore for MockPromoStore {
    async fn count_codes_by_status(&self) -> Result<StatusCounts, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_available()?;
        let mut counts = StatusCounts::default();
        for code in &inner.codes {
            match code.status {
                PromoStatus::Pending => counts.pending += 1,
                PromoStatus::Approved => counts.approved += 1,
                PromoStatus::Rejected => counts.rejected += 1,
                PromoStatus::Expired => counts.expired += 1,
            }
        }
        Ok(counts)
    }

    async fn count_codes_created_since(&self, since: DateTime<Utc>) -> Result<u64, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_available()?;
        Ok(inner.codes.iter().filter(|c| c.created_at >= since).count() as u64)
    }

    async fn count_channels(&self, active_only: bool) -> Result<u64, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_available()?;
        Ok(inner
            .channels
            .iter()
            .filter(|c| !active_only || c.is_active)
            .count() as u64)
    }

    async fn count_videos(&self) -> Result<u64, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_available()?;
        Ok(inner.videos.len() as u64)
    }

    async fn pending_codes(&self, limit: u32) -> Result<Vec<PendingCode>, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.check_available()?;

        let mut pending: Vec<&PromoCodeRecord> = inner
            .codes
            .iter()
            .filter(|c| c.status == PromoStatus::Pending)
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(pending
            .into_iter()
            .take(limit as usize)
            .filter_map(|code| {
                let channel = inner.channels.iter().find(|c| c.id == code.channel_id)?;
                let video = inner.videos.iter().find(|v| v.id == code.video_id)?;
                Some(PendingCode {
                    id: code.id.clone(),
                    code: code.code.clone(),
                    brand: code.brand.clone(),
                    description: code.description.clone(),
                    channel_name: channel.name.clone(),
                    video_title: video.title.clone(),
                    video_youtube_id: video.youtube_id.clone(),
                    created_at: code.created_at,
                })
            })
            .collect())
    }

    async fn expire_codes_before(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_available()?;
        let mut changed = 0;
        for code in inner.codes.iter_mut() {
            let past_due = code.expires_at.is_some_and(|at| at < now);
            if past_due && code.status != PromoStatus::Expired {
                code.status = PromoStatus::Expired;
                code.is_active = false;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn deactivate_reported_codes(&self, threshold: u32) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_available()?;
        let MockPromoStoreInner { codes, reports, .. } = &mut *inner;
        let mut changed = 0;
        for code in codes.iter_mut().filter(|c| c.is_active) {
            if reports.get(&code.id).copied().unwrap_or(0) >= threshold {
                code.status = PromoStatus::Expired;
                code.is_active = false;
                changed += 1;
            }
        }
        Ok(changed)
    }
}
