//! Error types for portrait generation.

use crate::image::PredictionStatus;
use std::time::Duration;

/// Maximum length of an API error body kept in an error message.
const MAX_ERROR_MESSAGE_LEN: usize = 512;

/// Errors that can occur while generating a portrait.
#[derive(Debug, thiserror::Error)]
pub enum PortraitGenError {
    /// API token missing or rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Invalid provider configuration or request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Polling exceeded the configured bound.
    #[error("prediction did not finish within {0:?}")]
    Timeout(Duration),

    /// Output URL no longer serves the asset.
    #[error("download URL expired")]
    UrlExpired,

    /// Create response carried no status URL to poll.
    #[error("no prediction URL returned")]
    MissingPollUrl,

    /// Prediction finished without an image to download.
    #[error("prediction {status}: {detail}")]
    NoOutput {
        status: PredictionStatus,
        detail: String,
    },

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error (e.g., writing the portrait file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for portrait generation operations.
pub type Result<T> = std::result::Result<T, PortraitGenError>;

/// Trims an API error body for logging and masks Replicate tokens in it.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let redacted = text
        .split_inclusive(|c: char| c.is_whitespace() || c == '"' || c == ',')
        .map(|chunk| {
            let word_len = chunk
                .find(|c: char| c.is_whitespace() || c == '"' || c == ',')
                .unwrap_or(chunk.len());
            let (word, rest) = chunk.split_at(word_len);
            if word.starts_with("r8_") {
                format!("r8_***{rest}")
            } else {
                chunk.to_string()
            }
        })
        .collect::<String>();

    let trimmed = redacted.trim();
    if trimmed.chars().count() <= MAX_ERROR_MESSAGE_LEN {
        return trimmed.to_string();
    }
    let mut truncated: String = trimmed.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
    truncated.push_str("...");
    truncated
}
