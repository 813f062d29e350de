use std::sync::Arc;

use tracing::info;

use codehound_common::{ChannelRecord, NewChannel, ScrapeError};

use crate::pipeline::traits::{PromoStore, VideoSource};

/// Adds YouTube channels to the set the sweep visits.
pub struct ChannelRegistry {
    source: Arc<dyn VideoSource>,
    store: Arc<dyn PromoStore>,
}

impl ChannelRegistry {
    pub fn new(source: Arc<dyn VideoSource>, store: Arc<dyn PromoStore>) -> Self {
        Self { source, store }
    }

    /// Look the channel up on the platform and store it as active.
    pub async fn register(
        &self,
        youtube_id: &str,
        category_id: &str,
    ) -> Result<ChannelRecord, ScrapeError> {
        if self
            .store
            .find_channel_by_youtube_id(youtube_id)
            .await?
            .is_some()
        {
            return Err(ScrapeError::ChannelAlreadyRegistered(youtube_id.to_string()));
        }

        let meta = self
            .source
            .channel_metadata(youtube_id)
            .await?
            .ok_or_else(|| ScrapeError::ChannelNotOnPlatform(youtube_id.to_string()))?;

        let channel = self
            .store
            .create_channel(&NewChannel::from_metadata(&meta, category_id))
            .await?;
        info!(channel = %channel.name, id = %channel.id, youtube_id, "Channel registered");
        Ok(channel)
    }
}
