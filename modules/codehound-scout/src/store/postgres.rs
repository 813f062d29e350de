//! Postgres adapter over the web app's schema.
//!
//! Tables are the app's mapped snake_case relations (`channels`, `videos`,
//! `promo_codes`, `user_reports`) with snake_case columns. The schema itself
//! is owned by the web app's migrations, never created here. `status` is a
//! Postgres enum; it is read back as text and written only through string
//! literals so no enum type name is hard-coded.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use codehound_common::{
    ChannelRecord, NewChannel, NewPromoCode, NewVideo, PendingCode, PromoStatus, StatusCounts,
    StoreError, VideoRecord,
};

use crate::pipeline::traits::{ModerationStore, PromoStore};
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url).await.map_err(store_error)?;
        Ok(Self::new(pool))
    }
}

/// Connection-level failures are fatal to a sweep; everything else is
/// charged to the unit of work that hit it.
fn store_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound {
            entity: "row",
            id: String::new(),
        },
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_) => StoreError::Unavailable(err.to_string()),
        other => StoreError::Query(other.to_string()),
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(sqlx::FromRow)]
struct ChannelRow {
    id: String,
    name: String,
    youtube_id: String,
    is_active: bool,
    last_scraped_at: Option<DateTime<Utc>>,
}

impl From<ChannelRow> for ChannelRecord {
    fn from(row: ChannelRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            youtube_id: row.youtube_id,
            is_active: row.is_active,
            last_scraped_at: row.last_scraped_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct VideoRow {
    id: String,
    youtube_id: String,
    title: String,
    description: Option<String>,
    published_at: DateTime<Utc>,
    channel_id: String,
    thumbnail_url: Option<String>,
    has_been_scraped: bool,
}

impl From<VideoRow> for VideoRecord {
    fn from(row: VideoRow) -> Self {
        Self {
            id: row.id,
            youtube_id: row.youtube_id,
            title: row.title,
            description: row.description.unwrap_or_default(),
            published_at: row.published_at,
            channel_id: row.channel_id,
            thumbnail_url: row.thumbnail_url,
            has_been_scraped: row.has_been_scraped,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PendingRow {
    id: String,
    code: String,
    brand: Option<String>,
    description: Option<String>,
    channel_name: String,
    video_title: String,
    video_youtube_id: String,
    created_at: DateTime<Utc>,
}

impl From<PendingRow> for PendingCode {
    fn from(row: PendingRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            brand: row.brand,
            description: row.description,
            channel_name: row.channel_name,
            video_title: row.video_title,
            video_youtube_id: row.video_youtube_id,
            created_at: row.created_at,
        }
    }
}

const CHANNEL_COLUMNS: &str = "id, name, youtube_id, is_active, last_scraped_at";

const VIDEO_COLUMNS: &str =
    "id, youtube_id, title, description, published_at, channel_id, thumbnail_url, has_been_scraped";

// ---------------------------------------------------------------------------
// PromoStore
// ---------------------------------------------------------------------------

#[async_trait]
impl PromoStore for PgStore {
    async fn find_channel(&self, channel_id: &str) -> Result<Option<ChannelRecord>, StoreError> {
        let sql = format!("SELECT {CHANNEL_COLUMNS} FROM channels WHERE id = $1");
        let row = sqlx::query_as::<_, ChannelRow>(&sql)
            .bind(channel_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(row.map(ChannelRecord::from))
    }

    async fn find_channel_by_youtube_id(
        &self,
        youtube_id: &str,
    ) -> Result<Option<ChannelRecord>, StoreError> {
        let sql = format!("SELECT {CHANNEL_COLUMNS} FROM channels WHERE youtube_id = $1");
        let row = sqlx::query_as::<_, ChannelRow>(&sql)
            .bind(youtube_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(row.map(ChannelRecord::from))
    }

    async fn create_channel(&self, channel: &NewChannel) -> Result<ChannelRecord, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO channels (id, youtube_id, name, description, custom_url,
                                  thumbnail_url, category_id, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, true)
            RETURNING {CHANNEL_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ChannelRow>(&sql)
            .bind(new_id())
            .bind(&channel.youtube_id)
            .bind(&channel.name)
            .bind(&channel.description)
            .bind(&channel.custom_url)
            .bind(&channel.thumbnail_url)
            .bind(&channel.category_id)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(row.into())
    }

    async fn active_channels(&self) -> Result<Vec<ChannelRecord>, StoreError> {
        let sql = format!(
            "SELECT {CHANNEL_COLUMNS} FROM channels WHERE is_active = true ORDER BY name, id"
        );
        let rows = sqlx::query_as::<_, ChannelRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(ChannelRecord::from).collect())
    }

    async fn find_video(&self, youtube_id: &str) -> Result<Option<VideoRecord>, StoreError> {
        let sql = format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE youtube_id = $1");
        let row = sqlx::query_as::<_, VideoRow>(&sql)
            .bind(youtube_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(row.map(VideoRecord::from))
    }

    async fn create_video(&self, video: &NewVideo) -> Result<VideoRecord, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO videos (id, youtube_id, title, description, published_at,
                                channel_id, thumbnail_url, has_been_scraped)
            VALUES ($1, $2, $3, $4, $5, $6, $7, false)
            RETURNING {VIDEO_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, VideoRow>(&sql)
            .bind(new_id())
            .bind(&video.youtube_id)
            .bind(&video.title)
            .bind(&video.description)
            .bind(video.published_at)
            .bind(&video.channel_id)
            .bind(&video.thumbnail_url)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(row.into())
    }

    async fn commit_video_scrape(
        &self,
        video_id: &str,
        codes: &[NewPromoCode],
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let claim = sqlx::query(
            "UPDATE videos SET has_been_scraped = true WHERE id = $1 AND has_been_scraped = false",
        )
        .bind(video_id)
        .execute(&mut *tx)
        .await
        .map_err(store_error)?;

        if claim.rows_affected() == 0 {
            tx.rollback().await.map_err(store_error)?;
            return Ok(false);
        }

        for code in codes {
            sqlx::query(
                r#"
                INSERT INTO promo_codes (id, code, brand, product, discount, description,
                                         extracted_text, video_id, channel_id, status,
                                         is_active, expires_at, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'PENDING', true, $10, NOW())
                "#,
            )
            .bind(new_id())
            .bind(&code.code)
            .bind(&code.brand)
            .bind(&code.product)
            .bind(&code.discount)
            .bind(&code.description)
            .bind(&code.extracted_text)
            .bind(&code.video_id)
            .bind(&code.channel_id)
            .bind(code.expires_at)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;
        }

        tx.commit().await.map_err(store_error)?;
        Ok(true)
    }

    async fn mark_channel_scraped(
        &self,
        channel_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE channels SET last_scraped_at = $2 WHERE id = $1")
            .bind(channel_id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "Channel",
                id: channel_id.to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ModerationStore
// ---------------------------------------------------------------------------

#[async_trait]
impl ModerationStore for PgStore {
    async fn count_codes_by_status(&self) -> Result<StatusCounts, StoreError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status::text, COUNT(*) FROM promo_codes GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        let mut counts = StatusCounts::default();
        for (status, n) in rows {
            let n = n as u64;
            match status.parse::<PromoStatus>().map_err(StoreError::Query)? {
                PromoStatus::Pending => counts.pending = n,
                PromoStatus::Approved => counts.approved = n,
                PromoStatus::Rejected => counts.rejected = n,
                PromoStatus::Expired => counts.expired = n,
            }
        }
        Ok(counts)
    }

    async fn count_codes_created_since(&self, since: DateTime<Utc>) -> Result<u64, StoreError> {
        let (n,) =
            sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM promo_codes WHERE created_at >= $1")
                .bind(since)
                .fetch_one(&self.pool)
                .await
                .map_err(store_error)?;
        Ok(n as u64)
    }

    async fn count_channels(&self, active_only: bool) -> Result<u64, StoreError> {
        let (n,) = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM channels WHERE ($1 = false OR is_active = true)",
        )
        .bind(active_only)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(n as u64)
    }

    async fn count_videos(&self) -> Result<u64, StoreError> {
        let (n,) = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM videos")
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(n as u64)
    }

    async fn pending_codes(&self, limit: u32) -> Result<Vec<PendingCode>, StoreError> {
        let rows = sqlx::query_as::<_, PendingRow>(
            r#"
            SELECT p.id, p.code, p.brand, p.description,
                   c.name AS channel_name,
                   v.title AS video_title,
                   v.youtube_id AS video_youtube_id,
                   p.created_at
            FROM promo_codes p
            JOIN channels c ON c.id = p.channel_id
            JOIN videos v ON v.id = p.video_id
            WHERE p.status = 'PENDING'
            ORDER BY p.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(rows.into_iter().map(PendingCode::from).collect())
    }

    async fn expire_codes_before(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE promo_codes
            SET status = 'EXPIRED', is_active = false
            WHERE expires_at < $1 AND status <> 'EXPIRED'
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(result.rows_affected())
    }

    async fn deactivate_reported_codes(&self, threshold: u32) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE promo_codes p
            SET status = 'EXPIRED', is_active = false
            WHERE p.is_active = true
              AND (SELECT COUNT(*) FROM user_reports r WHERE r.promo_code_id = p.id) >= $1
            "#,
        )
        .bind(threshold as i64)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_failures_are_unavailable() {
        assert!(matches!(
            store_error(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            store_error(sqlx::Error::Protocol("bad frame".into())),
            StoreError::Unavailable(_)
        ));
    }

    #[test]
    fn missing_rows_and_bad_queries_are_distinct() {
        assert!(matches!(
            store_error(sqlx::Error::RowNotFound),
            StoreError::NotFound { .. }
        ));
        assert!(matches!(
            store_error(sqlx::Error::ColumnNotFound("youtube_id".into())),
            StoreError::Query(_)
        ));
    }
}
