use thiserror::Error;

/// Failures reported by the storage collaborator.
///
/// `NotFound` is a normal lookup outcome at the call site; `Unavailable`
/// means the database could not be reached at all.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage query failed: {0}")]
    Query(String),
}

/// Failures reported by the video platform collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlatformError {
    #[error("Video platform rejected credentials: {0}")]
    Unauthorized(String),

    #[error("Video platform unavailable: {0}")]
    Unavailable(String),

    #[error("Video platform error (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Batch of {requested} video ids exceeds the platform limit of {max}")]
    BatchTooLarge { requested: usize, max: usize },

    #[error("Malformed video platform response: {0}")]
    Malformed(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScrapeError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("No YouTube channel with id {0}")]
    ChannelNotOnPlatform(String),

    #[error("Channel {0} is already registered")]
    ChannelAlreadyRegistered(String),
}

impl ScrapeError {
    /// Fatal errors abort a whole sweep instead of being charged to one channel.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScrapeError::Store(StoreError::Unavailable(_))
                | ScrapeError::Platform(PlatformError::Unauthorized(_))
        )
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{key} has an invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_storage_is_fatal() {
        let err = ScrapeError::from(StoreError::Unavailable("connection refused".into()));
        assert!(err.is_fatal());
    }

    #[test]
    fn failed_query_is_isolated() {
        let err = ScrapeError::from(StoreError::Query("deadlock detected".into()));
        assert!(!err.is_fatal());
    }

    #[test]
    fn platform_auth_failure_is_fatal_but_outage_is_not() {
        assert!(ScrapeError::from(PlatformError::Unauthorized("bad key".into())).is_fatal());
        assert!(!ScrapeError::from(PlatformError::Unavailable("503".into())).is_fatal());
    }
}
