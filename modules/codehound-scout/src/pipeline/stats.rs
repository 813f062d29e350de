use serde::Serialize;

use codehound_common::{ChannelRecord, ScrapeError};

/// Stats from processing one channel.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelScrapeStats {
    pub channel_id: String,
    pub channel_name: String,
    pub videos_found: u32,
    pub videos_processed: u32,
    pub videos_skipped: u32,
    pub codes_detected: u32,
}

impl ChannelScrapeStats {
    pub fn new(channel: &ChannelRecord) -> Self {
        Self {
            channel_id: channel.id.clone(),
            channel_name: channel.name.clone(),
            ..Default::default()
        }
    }
}

impl std::fmt::Display for ChannelScrapeStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} found, {} processed, {} already scraped, {} codes",
            self.channel_name,
            self.videos_found,
            self.videos_processed,
            self.videos_skipped,
            self.codes_detected
        )
    }
}

/// Stats from a sweep over every active channel.
///
/// Built incrementally by one sweep and returned by value; never shared.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepStats {
    pub channels_processed: u32,
    pub channels_succeeded: u32,
    pub channels_failed: u32,
    pub videos_processed: u32,
    pub codes_detected: u32,
    pub errors: Vec<String>,
}

impl SweepStats {
    pub fn record_success(&mut self, channel: &ChannelScrapeStats) {
        self.channels_processed += 1;
        self.channels_succeeded += 1;
        self.add_counts(channel);
    }

    /// Work persisted before the failure still counts.
    pub fn record_failure(&mut self, channel: &ChannelScrapeStats, error: &ScrapeError) {
        self.channels_processed += 1;
        self.channels_failed += 1;
        self.add_counts(channel);
        self.errors.push(format!("{}: {}", channel.channel_name, error));
    }

    fn add_counts(&mut self, channel: &ChannelScrapeStats) {
        self.videos_processed += channel.videos_processed;
        self.codes_detected += channel.codes_detected;
    }
}

impl std::fmt::Display for SweepStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Sweep Complete ===")?;
        writeln!(f, "Channels processed: {}", self.channels_processed)?;
        writeln!(f, "Channels succeeded: {}", self.channels_succeeded)?;
        writeln!(f, "Channels failed:    {}", self.channels_failed)?;
        writeln!(f, "Videos processed:   {}", self.videos_processed)?;
        writeln!(f, "Codes detected:     {}", self.codes_detected)?;
        if !self.errors.is_empty() {
            writeln!(f, "\nErrors:")?;
            for error in &self.errors {
                writeln!(f, "  {}", error)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use codehound_common::StoreError;

    use super::*;

    fn channel_stats(name: &str, videos: u32, codes: u32) -> ChannelScrapeStats {
        ChannelScrapeStats {
            channel_id: format!("id-{name}"),
            channel_name: name.to_string(),
            videos_found: videos,
            videos_processed: videos,
            videos_skipped: 0,
            codes_detected: codes,
        }
    }

    #[test]
    fn failures_keep_partial_counts_and_name_the_channel() {
        let mut sweep = SweepStats::default();
        sweep.record_success(&channel_stats("Underscore_", 3, 2));
        sweep.record_failure(
            &channel_stats("Micode", 1, 1),
            &ScrapeError::Store(StoreError::Query("deadlock".into())),
        );

        assert_eq!(sweep.channels_processed, 2);
        assert_eq!(sweep.channels_succeeded, 1);
        assert_eq!(sweep.channels_failed, 1);
        assert_eq!(sweep.videos_processed, 4);
        assert_eq!(sweep.codes_detected, 3);
        assert_eq!(sweep.errors.len(), 1);
        assert!(sweep.errors[0].starts_with("Micode: "));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(SweepStats::default()).unwrap();
        assert_eq!(json["channelsProcessed"], 0);
        assert_eq!(json["codesDetected"], 0);
        assert!(json["errors"].as_array().unwrap().is_empty());
    }

    #[test]
    fn display_lists_errors() {
        let mut sweep = SweepStats::default();
        sweep.record_failure(
            &channel_stats("Micode", 0, 0),
            &ScrapeError::ChannelNotFound("x".into()),
        );
        let out = sweep.to_string();
        assert!(out.contains("Channels failed:    1"));
        assert!(out.contains("Micode: Channel not found: x"));
    }
}
