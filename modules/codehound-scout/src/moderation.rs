//! Read-only snapshot of stored candidates for a human reviewer.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use codehound_common::{PendingCode, StatusCounts, StoreError};

use crate::pipeline::traits::ModerationStore;

/// Window for the "recent codes" overview figure.
pub const RECENT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_codes: u64,
    pub total_channels: u64,
    pub active_channels: u64,
    pub total_videos: u64,
    pub recent_codes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationSummary {
    pub overview: Overview,
    pub codes_by_status: StatusCounts,
    pub needs_moderation: Vec<PendingCode>,
    pub generated_at: DateTime<Utc>,
}

impl ModerationSummary {
    pub async fn build(
        store: &dyn ModerationStore,
        now: DateTime<Utc>,
        queue_size: u32,
    ) -> Result<Self, StoreError> {
        let codes_by_status = store.count_codes_by_status().await?;
        let overview = Overview {
            total_codes: codes_by_status.total(),
            total_channels: store.count_channels(false).await?,
            active_channels: store.count_channels(true).await?,
            total_videos: store.count_videos().await?,
            recent_codes: store
                .count_codes_created_since(now - Duration::days(RECENT_WINDOW_DAYS))
                .await?,
        };
        let needs_moderation = store.pending_codes(queue_size).await?;

        Ok(Self {
            overview,
            codes_by_status,
            needs_moderation,
            generated_at: now,
        })
    }
}
