use thiserror::Error;

pub type Result<T> = std::result::Result<T, YouTubeError>;

#[derive(Debug, Error)]
pub enum YouTubeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Batch of {requested} video ids exceeds the API limit of {max}")]
    BatchTooLarge { requested: usize, max: usize },
}

impl YouTubeError {
    /// The API key was missing, invalid, or out of quota.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, YouTubeError::Api { status: 401 | 403, .. })
    }

    /// Network failures and 5xx responses; retrying later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            YouTubeError::Network(_) => true,
            YouTubeError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for YouTubeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            YouTubeError::Parse(err.to_string())
        } else {
            YouTubeError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for YouTubeError {
    fn from(err: serde_json::Error) -> Self {
        YouTubeError::Parse(err.to_string())
    }
}
