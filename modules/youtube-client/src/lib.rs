pub mod error;
pub mod types;

pub use error::{Result, YouTubeError};
pub use types::{ChannelInfo, VideoDetails, VideoSummary};

use serde::de::DeserializeOwned;
use types::{ListResponse, ResourceItem, SearchItem};

const BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Hard cap on ids per `videos.list` call, imposed by the API.
pub const MAX_VIDEO_BATCH: usize = 50;

pub struct YouTubeClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Point the client at another host (a local stub server, a proxy).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Most recent uploads of a channel, newest first.
    pub async fn recent_videos(&self, channel_id: &str, max_results: u32) -> Result<Vec<VideoSummary>> {
        let max_results = max_results.to_string();
        let resp: ListResponse<SearchItem> = self
            .get(
                "search",
                &[
                    ("part", "snippet"),
                    ("channelId", channel_id),
                    ("maxResults", max_results.as_str()),
                    ("order", "date"),
                    ("type", "video"),
                ],
            )
            .await?;

        let videos: Vec<VideoSummary> = resp
            .items
            .into_iter()
            .filter_map(SearchItem::into_summary)
            .collect();
        tracing::debug!(channel_id, count = videos.len(), "Fetched recent videos");
        Ok(videos)
    }

    /// Full metadata for up to [`MAX_VIDEO_BATCH`] videos. Ids that no longer
    /// exist are silently absent from the result.
    pub async fn videos_by_ids(&self, ids: &[String]) -> Result<Vec<VideoDetails>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        if ids.len() > MAX_VIDEO_BATCH {
            return Err(YouTubeError::BatchTooLarge {
                requested: ids.len(),
                max: MAX_VIDEO_BATCH,
            });
        }

        let joined = ids.join(",");
        let resp: ListResponse<ResourceItem> = self
            .get("videos", &[("part", "snippet"), ("id", joined.as_str())])
            .await?;

        let videos: Vec<VideoDetails> = resp
            .items
            .into_iter()
            .filter_map(ResourceItem::into_video)
            .collect();
        tracing::debug!(requested = ids.len(), returned = videos.len(), "Fetched video details");
        Ok(videos)
    }

    /// Channel metadata, or `None` if the id does not resolve to a channel.
    pub async fn channel_info(&self, channel_id: &str) -> Result<Option<ChannelInfo>> {
        let resp: ListResponse<ResourceItem> = self
            .get("channels", &[("part", "snippet"), ("id", channel_id)])
            .await?;
        Ok(resp.items.into_iter().next().map(ResourceItem::into_channel))
    }

    async fn get<T: DeserializeOwned>(&self, resource: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, resource);
        let resp = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(YouTubeError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
