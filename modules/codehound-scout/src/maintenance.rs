use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use codehound_common::StoreError;

use crate::pipeline::traits::ModerationStore;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupStats {
    pub expired_codes: u64,
    pub reported_codes: u64,
}

impl std::fmt::Display for CleanupStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cleanup: {} expired, {} deactivated by reports",
            self.expired_codes, self.reported_codes
        )
    }
}

/// Retires codes that are past their expiry date or were reported too often.
pub struct Maintenance {
    store: Arc<dyn ModerationStore>,
    report_threshold: u32,
}

impl Maintenance {
    pub fn new(store: Arc<dyn ModerationStore>, report_threshold: u32) -> Self {
        Self {
            store,
            report_threshold,
        }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> Result<CleanupStats, StoreError> {
        let expired_codes = self.store.expire_codes_before(now).await?;
        let reported_codes = self
            .store
            .deactivate_reported_codes(self.report_threshold)
            .await?;

        let stats = CleanupStats {
            expired_codes,
            reported_codes,
        };
        info!(
            expired = stats.expired_codes,
            reported = stats.reported_codes,
            threshold = self.report_threshold,
            "Cleanup complete"
        );
        Ok(stats)
    }
}
