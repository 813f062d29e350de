use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

// --- Detection ---

/// A promotional code candidate found in one piece of text, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedCode {
    /// Alphanumeric token as it appeared in the text, 4–20 chars.
    pub code: String,
    pub brand: Option<String>,
    pub product: Option<String>,
    pub discount: Option<String>,
    /// Slice of the source text around the code, kept for moderators.
    pub extracted_text: String,
    pub expires_at: Option<NaiveDate>,
    /// Heuristic score in [0, 1]. Not a probability.
    pub confidence: f64,
}

impl DetectedCode {
    /// Deduplication key: codes are compared case-insensitively.
    pub fn normalized_code(&self) -> String {
        self.code.to_uppercase()
    }
}

// --- Moderation status ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromoStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
}

impl PromoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromoStatus::Pending => "PENDING",
            PromoStatus::Approved => "APPROVED",
            PromoStatus::Rejected => "REJECTED",
            PromoStatus::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for PromoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromoStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PromoStatus::Pending),
            "APPROVED" => Ok(PromoStatus::Approved),
            "REJECTED" => Ok(PromoStatus::Rejected),
            "EXPIRED" => Ok(PromoStatus::Expired),
            other => Err(format!("unknown promo code status: {other}")),
        }
    }
}

// --- Persisted records ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRecord {
    pub id: String,
    pub name: String,
    /// External YouTube channel id (`UC...`).
    pub youtube_id: String,
    pub is_active: bool,
    pub last_scraped_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: String,
    /// External YouTube video id, unique.
    pub youtube_id: String,
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub channel_id: String,
    pub thumbnail_url: Option<String>,
    /// Flips false → true once, after detection ran. Never reset.
    pub has_been_scraped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCodeRecord {
    pub id: String,
    pub code: String,
    pub brand: Option<String>,
    pub product: Option<String>,
    pub discount: Option<String>,
    pub description: Option<String>,
    pub extracted_text: String,
    pub video_id: String,
    pub channel_id: String,
    pub status: PromoStatus,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// --- Inputs for new records ---

/// Channel metadata as returned by the platform, used to register a channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMetadata {
    pub id: String,
    pub title: String,
    pub description: String,
    pub custom_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// A channel to register. Created active.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChannel {
    pub youtube_id: String,
    pub name: String,
    pub description: String,
    pub custom_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub category_id: String,
}

impl NewChannel {
    pub fn from_metadata(meta: &ChannelMetadata, category_id: &str) -> Self {
        Self {
            youtube_id: meta.id.clone(),
            name: meta.title.clone(),
            description: meta.description.clone(),
            custom_url: meta.custom_url.clone(),
            thumbnail_url: meta.thumbnail_url.clone(),
            category_id: category_id.to_string(),
        }
    }
}

/// Metadata of one video as returned by the platform's batch lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewVideo {
    pub youtube_id: String,
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub channel_id: String,
    pub thumbnail_url: Option<String>,
}

impl NewVideo {
    pub fn from_metadata(meta: &VideoMetadata, channel_id: &str) -> Self {
        Self {
            youtube_id: meta.id.clone(),
            title: meta.title.clone(),
            description: meta.description.clone(),
            published_at: meta.published_at,
            channel_id: channel_id.to_string(),
            thumbnail_url: meta.thumbnail_url.clone(),
        }
    }
}

/// A detected code accepted into storage. Always created `PENDING` and active.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPromoCode {
    pub code: String,
    pub brand: Option<String>,
    pub product: Option<String>,
    pub discount: Option<String>,
    pub description: String,
    pub extracted_text: String,
    pub video_id: String,
    pub channel_id: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewPromoCode {
    pub fn from_detected(detected: &DetectedCode, video_id: &str, channel_id: &str) -> Self {
        Self {
            code: detected.code.clone(),
            brand: detected.brand.clone(),
            product: detected.product.clone(),
            discount: detected.discount.clone(),
            description: confidence_label(detected.confidence),
            extracted_text: detected.extracted_text.clone(),
            video_id: video_id.to_string(),
            channel_id: channel_id.to_string(),
            expires_at: detected.expires_at.map(start_of_day_utc),
        }
    }
}

/// Moderation-facing description carrying the detector's confidence.
pub fn confidence_label(confidence: f64) -> String {
    format!("Confidence: {:.0}%", confidence * 100.0)
}

fn start_of_day_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

// --- Moderation views ---

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub expired: u64,
}

impl StatusCounts {
    pub fn total(&self) -> u64 {
        self.pending + self.approved + self.rejected + self.expired
    }
}

/// A `PENDING` code joined with where it was found.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCode {
    pub id: String,
    pub code: String,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub channel_name: String,
    pub video_title: String,
    pub video_youtube_id: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detected(confidence: f64, expires_at: Option<NaiveDate>) -> DetectedCode {
        DetectedCode {
            code: "nord20".to_string(),
            brand: Some("NordVPN".to_string()),
            product: Some("vpn".to_string()),
            discount: Some("-20%".to_string()),
            extracted_text: "avec le code nord20".to_string(),
            expires_at,
            confidence,
        }
    }

    #[test]
    fn confidence_is_rendered_as_rounded_percentage() {
        assert_eq!(confidence_label(0.7 + 0.1), "Confidence: 80%");
        assert_eq!(confidence_label(1.0), "Confidence: 100%");
        assert_eq!(confidence_label(0.3), "Confidence: 30%");
    }

    #[test]
    fn new_promo_code_keeps_expiry_at_midnight_utc() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let new = NewPromoCode::from_detected(&detected(0.9, Some(date)), "v1", "c1");

        let expires = new.expires_at.unwrap();
        assert_eq!(expires.to_rfc3339(), "2025-03-15T00:00:00+00:00");
        assert_eq!(new.description, "Confidence: 90%");
        assert_eq!(new.code, "nord20");
    }

    #[test]
    fn status_round_trips_through_its_storage_name() {
        for status in [
            PromoStatus::Pending,
            PromoStatus::Approved,
            PromoStatus::Rejected,
            PromoStatus::Expired,
        ] {
            assert_eq!(status.as_str().parse::<PromoStatus>(), Ok(status));
        }
        assert!("LIVE".parse::<PromoStatus>().is_err());
    }

    #[test]
    fn normalized_code_is_uppercase() {
        assert_eq!(detected(0.7, None).normalized_code(), "NORD20");
    }
}
