//! Error types shared by the scraper components.

use thiserror::Error;

/// Failures raised while talking to the metadata provider or the video host.
///
/// None of these reach the HTTP caller: the orchestrator degrades every one of
/// them to an empty result and records it in the run report.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Transport-level failure (DNS, TLS, connection reset, timeout, body read).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream answered with a status we do not accept.
    #[error("unexpected HTTP status {status} from {url}")]
    Status {
        /// URL that was requested
        url: String,
        /// Status code returned
        status: reqwest::StatusCode,
    },

    /// A configured CSS selector could not be parsed.
    #[error("invalid selector '{selector}': {reason}")]
    Selector {
        /// Selector source text
        selector: String,
        /// Parser message
        reason: String,
    },

    /// A configured request header has an invalid name or value.
    #[error("invalid header '{name}'")]
    Header {
        /// Header name as configured
        name: String,
    },

    /// A configuration value is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The configuration file exists but could not be read.
    #[error("failed to read config file: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// The configuration file is not valid JSON for [`crate::config::ScraperConfig`].
    #[error("failed to parse config file: {0}")]
    ConfigJson(#[from] serde_json::Error),
}

/// Convenience alias used across the library.
pub type Result<T> = std::result::Result<T, ScrapeError>;
