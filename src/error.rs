//! Error kinds surfaced by the feed.
//!
//! The `Display` text of each variant is what the reader shows in its error
//! banner, so the wording is part of the user-facing behavior.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors produced while fetching or paginating the feed.
#[derive(Error, Debug)]
pub enum FeedError {
    /// HTTP 401 from the upstream API.
    #[error("Invalid API key")]
    Unauthorized,

    /// HTTP 403 from the upstream API.
    #[error("Access forbidden - API key may not have access to this endpoint")]
    Forbidden,

    /// HTTP 429 from the upstream API.
    #[error("Rate limit exceeded. Please wait before making another request.")]
    RateLimited,

    /// Any other non-2xx status.
    #[error("HTTP error! status: {0}")]
    Status(u16),

    /// The section cursor is already at the end of the section list.
    #[error("No more sections available")]
    NoMoreSections,

    /// The request never produced a response (DNS, TLS, connection reset...).
    #[error("Network error: {0}")]
    Request(#[from] reqwest::Error),

    /// The response body was not the JSON we expected.
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl FeedError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => FeedError::Unauthorized,
            StatusCode::FORBIDDEN => FeedError::Forbidden,
            StatusCode::TOO_MANY_REQUESTS => FeedError::RateLimited,
            other => FeedError::Status(other.as_u16()),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FeedError::RateLimited)
    }
}
