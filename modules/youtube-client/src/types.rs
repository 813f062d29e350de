use chrono::{DateTime, Utc};
use serde::Deserialize;

// --- Public results ---

/// A video as listed by the channel search endpoint. No description.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub thumbnail_url: Option<String>,
}

/// Full video metadata, including the untruncated description.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoDetails {
    pub id: String,
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub channel_id: String,
    pub channel_title: String,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub custom_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

// --- Wire types ---

/// Wrapper for YouTube list responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    pub id: SearchItemId,
    pub snippet: Option<Snippet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchItemId {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceItem {
    pub id: String,
    pub snippet: Option<Snippet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snippet {
    #[serde(rename = "publishedAt")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(rename = "channelId")]
    pub channel_id: Option<String>,
    #[serde(rename = "channelTitle")]
    pub channel_title: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "customUrl")]
    pub custom_url: Option<String>,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Thumbnails {
    pub default: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

impl Thumbnails {
    /// Prefer the high-resolution thumbnail, fall back to the default one.
    pub fn best_url(&self) -> Option<String> {
        self.high
            .as_ref()
            .or(self.default.as_ref())
            .map(|t| t.url.clone())
    }
}

impl SearchItem {
    /// Items that are not videos (playlists, channels) carry no `videoId`.
    pub fn into_summary(self) -> Option<VideoSummary> {
        let id = self.id.video_id?;
        let snippet = self.snippet?;
        Some(VideoSummary {
            id,
            title: snippet.title.unwrap_or_default(),
            published_at: snippet.published_at.unwrap_or_else(Utc::now),
            thumbnail_url: snippet.thumbnails.best_url(),
        })
    }
}

impl ResourceItem {
    pub fn into_video(self) -> Option<VideoDetails> {
        let snippet = self.snippet?;
        Some(VideoDetails {
            id: self.id,
            title: snippet.title.unwrap_or_default(),
            description: snippet.description.unwrap_or_default(),
            published_at: snippet.published_at.unwrap_or_else(Utc::now),
            channel_id: snippet.channel_id.unwrap_or_default(),
            channel_title: snippet.channel_title.unwrap_or_default(),
            thumbnail_url: snippet.thumbnails.best_url(),
        })
    }

    pub fn into_channel(self) -> ChannelInfo {
        let snippet = self.snippet.unwrap_or_default();
        ChannelInfo {
            id: self.id,
            title: snippet.title.unwrap_or_default(),
            description: snippet.description.unwrap_or_default(),
            custom_url: snippet.custom_url,
            thumbnail_url: snippet.thumbnails.best_url(),
        }
    }
}
