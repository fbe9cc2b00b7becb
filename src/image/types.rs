//! Core types for portrait generation.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Image formats the provider is known to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// Aspect ratios accepted by the portrait model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1 square, used for every portrait.
    #[default]
    #[serde(rename = "1:1")]
    Square,
    /// 3:4 portrait.
    #[serde(rename = "3:4")]
    StandardPortrait,
    /// 9:16 tall portrait.
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    /// Returns the aspect ratio as a string (e.g., "1:1").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::StandardPortrait => "3:4",
            Self::Portrait => "9:16",
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A request to generate one portrait.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The text prompt describing the desired image.
    pub prompt: String,
    /// Aspect ratio of the generated image.
    pub aspect_ratio: AspectRatio,
}

impl GenerationRequest {
    /// Creates a new square request with the given prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            aspect_ratio: AspectRatio::Square,
        }
    }

    /// Sets the aspect ratio.
    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = ratio;
        self
    }
}

/// Lifecycle status of a remote prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    /// Queued, waiting for a worker.
    Starting,
    /// Running on a worker.
    Processing,
    /// Finished with output.
    Succeeded,
    /// Finished with an error.
    Failed,
    /// Canceled before finishing.
    Canceled,
    /// Any status this client does not know about.
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    /// Returns true once the prediction will no longer change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for PredictionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// URLs attached to a prediction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionUrls {
    /// Status URL polled until the prediction is terminal.
    #[serde(default)]
    pub get: Option<String>,
    /// URL that cancels the prediction.
    #[serde(default)]
    pub cancel: Option<String>,
}

/// Prediction resource as returned by the create and poll endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Provider-assigned prediction id.
    #[serde(default)]
    pub id: Option<String>,
    /// Current status. Absent statuses are treated as still running.
    #[serde(default)]
    pub status: Option<PredictionStatus>,
    /// Generated output, present once succeeded.
    #[serde(default)]
    pub output: Option<PredictionOutput>,
    /// Provider-supplied error detail for failed predictions.
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    /// Related URLs.
    #[serde(default)]
    pub urls: PredictionUrls,
}

impl Prediction {
    /// Returns the URL to poll for status, if the provider sent one.
    pub fn poll_url(&self) -> Option<&str> {
        self.urls.get.as_deref().filter(|url| !url.is_empty())
    }

    /// Returns the error detail as display text.
    pub fn error_detail(&self) -> String {
        match &self.error {
            None | Some(serde_json::Value::Null) => "unknown error".to_string(),
            Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
            Some(serde_json::Value::String(_)) => "unknown error".to_string(),
            Some(other) => other.to_string(),
        }
    }
}

/// Output of a succeeded prediction: one URL or an ordered list of URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionOutput {
    /// A single asset URL.
    Single(String),
    /// Several asset URLs; the first one is the portrait.
    Many(Vec<String>),
}

impl PredictionOutput {
    /// Resolves the asset URL to download.
    pub fn first_url(&self) -> Option<&str> {
        let url = match self {
            Self::Single(url) => Some(url.as_str()),
            Self::Many(urls) => urls.first().map(String::as_str),
        };
        url.filter(|u| !u.is_empty())
    }
}

/// Terminal state of a polled prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictionResult {
    /// Succeeded. The output may still be missing.
    Succeeded(Option<PredictionOutput>),
    /// Failed or canceled.
    Unsuccessful {
        /// Terminal status reported by the provider.
        status: PredictionStatus,
        /// Provider-supplied error detail.
        detail: String,
    },
}

/// Metadata about the generation process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// Provider-assigned prediction id.
    pub prediction_id: Option<String>,
    /// Wall-clock duration of submit, poll and download in milliseconds.
    pub duration_ms: Option<u64>,
}

/// A downloaded portrait with its metadata.
#[derive(Debug, Clone)]
#[must_use = "generated image should be saved or processed"]
pub struct GeneratedImage {
    /// Raw image bytes exactly as served.
    pub data: Vec<u8>,
    /// Generation metadata.
    pub metadata: GenerationMetadata,
}

impl GeneratedImage {
    /// Creates a new generated image.
    pub fn new(data: Vec<u8>, metadata: GenerationMetadata) -> Self {
        Self { data, metadata }
    }

    /// Returns the format detected from magic bytes.
    pub fn detected_format(&self) -> Option<ImageFormat> {
        ImageFormat::from_magic_bytes(&self.data)
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Writes the bytes verbatim to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        tokio::fs::write(path, &self.data).await?;
        Ok(())
    }
}
