pub mod config;
pub mod error;
pub mod patterns;
pub mod types;

pub use config::{Config, ScrapeSettings};
pub use error::{ConfigError, PlatformError, ScrapeError, StoreError};
pub use types::*;
