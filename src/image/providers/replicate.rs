//! Replicate image generation provider.

use crate::error::{sanitize_error_message, PortraitGenError, Result};
use crate::image::provider::ImageProvider;
use crate::image::types::{GenerationRequest, Prediction, PredictionResult, PredictionStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Default Replicate API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.replicate.com/v1";

/// Model used for every portrait (Gemini 2.5 Flash Image).
pub const DEFAULT_MODEL: &str = "google/nano-banana";

/// Environment variable holding the API token.
pub const API_TOKEN_ENV: &str = "REPLICATE_API_TOKEN";

/// Environment variable overriding the API base URL.
pub const API_BASE_ENV: &str = "REPLICATE_API_BASE";

/// Builder for [`ReplicateProvider`].
#[derive(Debug, Clone)]
pub struct ReplicateProviderBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    model: String,
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl Default for ReplicateProviderBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            poll_interval: Duration::from_secs(2),
            timeout: None,
        }
    }
}

impl ReplicateProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API token. Falls back to `REPLICATE_API_TOKEN`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the API base URL. Falls back to `REPLICATE_API_BASE`, then the public API.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model, as `owner/name`.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the fixed wait between status polls.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Bounds how long a single prediction may be polled. Unbounded by default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the provider, resolving credentials.
    pub fn build(self) -> Result<ReplicateProvider> {
        let api_key = self
            .api_key
            .or_else(|| non_empty_env(API_TOKEN_ENV))
            .ok_or_else(|| {
                PortraitGenError::Auth(format!("{API_TOKEN_ENV} not set and no API token provided"))
            })?;

        let base_url = self
            .base_url
            .or_else(|| non_empty_env(API_BASE_ENV))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        if self.model.trim().is_empty() || !self.model.contains('/') {
            return Err(PortraitGenError::InvalidRequest(format!(
                "model must be given as owner/name, got {:?}",
                self.model
            )));
        }

        Ok(ReplicateProvider {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            model: self.model,
            poll_interval: self.poll_interval,
            timeout: self.timeout,
        })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Replicate prediction client.
///
/// Creates predictions through the model endpoint and follows the returned
/// `urls.get` link until the prediction settles.
pub struct ReplicateProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl ReplicateProvider {
    /// Creates a new [`ReplicateProviderBuilder`].
    pub fn builder() -> ReplicateProviderBuilder {
        ReplicateProviderBuilder::new()
    }

    /// Model predictions endpoint.
    fn predictions_endpoint(&self) -> String {
        format!("{}/models/{}/predictions", self.base_url, self.model)
    }

    fn parse_error(&self, status: u16, text: &str) -> PortraitGenError {
        let message = match serde_json::from_str::<ReplicateErrorResponse>(text) {
            Ok(resp) => sanitize_error_message(&resp.detail),
            Err(_) => sanitize_error_message(text),
        };

        if status == 401 || status == 403 {
            return PortraitGenError::Auth(message);
        }

        PortraitGenError::Api { status, message }
    }

    async fn read_prediction(&self, response: reqwest::Response) -> Result<Prediction> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(self.parse_error(status.as_u16(), &text));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl ImageProvider for ReplicateProvider {
    async fn create_prediction(&self, request: &GenerationRequest) -> Result<Prediction> {
        let body = ReplicateRequest::from_generation_request(request);

        let response = self
            .client
            .post(self.predictions_endpoint())
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let prediction = self.read_prediction(response).await?;
        tracing::debug!(
            prediction_id = prediction.id.as_deref().unwrap_or("-"),
            model = %self.model,
            "created prediction"
        );
        Ok(prediction)
    }

    async fn poll_prediction(&self, prediction_url: &str) -> Result<PredictionResult> {
        let start = Instant::now();

        loop {
            if let Some(timeout) = self.timeout {
                if start.elapsed() > timeout {
                    return Err(PortraitGenError::Timeout(timeout));
                }
            }

            let response = self
                .client
                .get(prediction_url)
                .bearer_auth(&self.api_key)
                .send()
                .await?;
            let prediction = self.read_prediction(response).await?;

            match prediction.status {
                Some(PredictionStatus::Succeeded) => {
                    if prediction.output.is_none() {
                        tracing::warn!("prediction succeeded without output");
                    }
                    return Ok(PredictionResult::Succeeded(prediction.output));
                }
                Some(status @ (PredictionStatus::Failed | PredictionStatus::Canceled)) => {
                    let detail = prediction.error_detail();
                    tracing::warn!(status = %status, "Prediction {}: {}", status, detail);
                    return Ok(PredictionResult::Unsuccessful { status, detail });
                }
                status => {
                    tracing::debug!(
                        prediction_id = prediction.id.as_deref().unwrap_or("-"),
                        status = status.map(|s| s.as_str()).unwrap_or("missing"),
                        elapsed_secs = start.elapsed().as_secs(),
                        "polling prediction"
                    );
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            if response.status().as_u16() == 403 || response.status().as_u16() == 410 {
                return Err(PortraitGenError::UrlExpired);
            }
            return Err(PortraitGenError::Api {
                status: response.status().as_u16(),
                message: "Failed to download image".into(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// -- Request types --

#[derive(Debug, Serialize)]
struct ReplicateRequest {
    input: ReplicateInput,
}

#[derive(Debug, Serialize)]
struct ReplicateInput {
    prompt: String,
    aspect_ratio: &'static str,
}

impl ReplicateRequest {
    fn from_generation_request(req: &GenerationRequest) -> Self {
        Self {
            input: ReplicateInput {
                prompt: req.prompt.clone(),
                aspect_ratio: req.aspect_ratio.as_str(),
            },
        }
    }
}

// -- Response types --

#[derive(Debug, Deserialize)]
struct ReplicateErrorResponse {
    detail: String,
}
