//! Image provider trait.

use crate::error::Result;
use crate::image::types::{GenerationRequest, Prediction, PredictionResult};
use async_trait::async_trait;

/// The three remote operations a portrait needs: submit, poll, download.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Submits a generation request and returns the new prediction.
    async fn create_prediction(&self, request: &GenerationRequest) -> Result<Prediction>;

    /// Polls `prediction_url` until the prediction is terminal.
    ///
    /// A failed or canceled prediction is a normal result, not an error.
    async fn poll_prediction(&self, prediction_url: &str) -> Result<PredictionResult>;

    /// Downloads the raw bytes behind an output URL.
    async fn download(&self, url: &str) -> Result<Vec<u8>>;

    /// Model identifier used for generation.
    fn model(&self) -> &str;
}
