//! Sequential batch driver: skip, submit, poll, download for each work item.

use crate::error::{PortraitGenError, Result};
use crate::image::{
    AspectRatio, GeneratedImage, GenerationMetadata, GenerationRequest, ImageProvider,
    PredictionResult, PredictionStatus,
};
use crate::roster::{WorkItem, ENEMY_ROSTER};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "assets/portraits";

/// What happened to one work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ItemOutcome {
    /// Portrait downloaded and written.
    Generated {
        /// Bytes written to disk.
        size_bytes: usize,
    },
    /// Destination already existed; nothing was requested.
    Skipped,
    /// Submission, polling or download failed.
    Failed {
        /// Human-readable failure.
        reason: String,
    },
}

/// Outcome of one work item.
#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    /// Work item id.
    pub id: u32,
    /// Destination file name.
    pub filename: &'static str,
    /// Result of processing.
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

/// Outcome of a whole batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Directory portraits were written to.
    pub output_dir: PathBuf,
    /// One entry per work item, in processing order.
    pub items: Vec<ItemReport>,
}

impl BatchReport {
    /// Number of portraits written in this run.
    pub fn generated(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Generated { .. }))
    }

    /// Number of items skipped because their file already existed.
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Skipped))
    }

    /// Number of items that failed.
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.items.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Runs work items one after another against a provider.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    output_dir: PathBuf,
    items: Vec<WorkItem>,
    aspect_ratio: AspectRatio,
}

impl BatchRunner {
    /// Creates a runner for the full enemy roster.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self::with_items(output_dir, ENEMY_ROSTER.to_vec())
    }

    /// Creates a runner for an explicit list of work items.
    pub fn with_items(output_dir: impl Into<PathBuf>, items: Vec<WorkItem>) -> Self {
        Self {
            output_dir: output_dir.into(),
            items,
            aspect_ratio: AspectRatio::Square,
        }
    }

    /// Sets the aspect ratio requested for every portrait.
    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = ratio;
        self
    }

    /// Directory portraits are written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Processes every item in order.
    ///
    /// Only a failure to create the output directory is returned as an
    /// error; per-item failures are logged and recorded in the report.
    pub async fn run(&self, provider: &dyn ImageProvider) -> Result<BatchReport> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        tracing::info!("Generating {} enemy portraits...", self.items.len());
        tracing::info!("Output directory: {}", self.output_dir.display());

        let mut items = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let outcome = self.process_item(provider, item).await;
            items.push(ItemReport {
                id: item.id,
                filename: item.filename,
                outcome,
            });
        }

        let report = BatchReport {
            output_dir: self.output_dir.clone(),
            items,
        };
        tracing::info!(
            generated = report.generated(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Done! Portraits saved to {}",
            self.output_dir.display()
        );
        Ok(report)
    }

    async fn process_item(&self, provider: &dyn ImageProvider, item: &WorkItem) -> ItemOutcome {
        let path = self.output_dir.join(item.filename);
        let label = format!("[{}/{}]", item.id, ENEMY_ROSTER.len());

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!("{label} {} already exists, skipping.", item.filename);
            return ItemOutcome::Skipped;
        }

        tracing::info!("{label} Generating {}...", item.filename);

        match generate(provider, item, self.aspect_ratio).await {
            Ok(image) => match image.save(&path).await {
                Ok(()) => {
                    tracing::info!(
                        format = image.detected_format().map(|f| f.extension()).unwrap_or("unknown"),
                        prediction_id = image.metadata.prediction_id.as_deref().unwrap_or("-"),
                        duration_ms = image.metadata.duration_ms.unwrap_or_default(),
                        "  Saved to {}",
                        item.filename
                    );
                    ItemOutcome::Generated {
                        size_bytes: image.size(),
                    }
                }
                Err(e) => failed(item, e),
            },
            Err(e) => failed(item, e),
        }
    }
}

fn failed(item: &WorkItem, err: PortraitGenError) -> ItemOutcome {
    tracing::error!(item = item.id, "  {err}");
    ItemOutcome::Failed {
        reason: err.to_string(),
    }
}

/// Submits, polls and downloads one portrait.
async fn generate(
    provider: &dyn ImageProvider,
    item: &WorkItem,
    aspect_ratio: AspectRatio,
) -> Result<GeneratedImage> {
    let start = Instant::now();
    let request = GenerationRequest::new(item.prompt).with_aspect_ratio(aspect_ratio);

    let prediction = provider.create_prediction(&request).await?;
    let poll_url = prediction
        .poll_url()
        .ok_or(PortraitGenError::MissingPollUrl)?;

    tracing::info!(
        prediction_id = prediction.id.as_deref().unwrap_or("-"),
        "  Waiting for generation..."
    );
    let output = match provider.poll_prediction(poll_url).await? {
        PredictionResult::Succeeded(output) => output,
        PredictionResult::Unsuccessful { status, detail } => {
            return Err(PortraitGenError::NoOutput { status, detail });
        }
    };

    let image_url = output
        .as_ref()
        .and_then(|o| o.first_url())
        .ok_or_else(|| PortraitGenError::NoOutput {
            status: PredictionStatus::Succeeded,
            detail: "no output received".into(),
        })?;

    tracing::info!("  Downloading...");
    let data = provider.download(image_url).await?;

    Ok(GeneratedImage::new(
        data,
        GenerationMetadata {
            model: Some(provider.model().to_string()),
            prediction_id: prediction.id.clone(),
            duration_ms: Some(start.elapsed().as_millis() as u64),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{Prediction, PredictionOutput, PredictionUrls};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted provider that records every call.
    #[derive(Default)]
    struct FakeProvider {
        calls: Mutex<Vec<String>>,
        no_poll_url_for: Vec<&'static str>,
        fail_create_for: Vec<&'static str>,
        failed_prediction_for: Vec<&'static str>,
        output: Option<PredictionOutput>,
    }

    impl FakeProvider {
        fn succeeding(output: PredictionOutput) -> Self {
            Self {
                output: Some(output),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    fn item_key(prompt: &str) -> &'static str {
        ENEMY_ROSTER
            .iter()
            .find(|i| i.prompt == prompt)
            .map(|i| i.filename)
            .unwrap()
    }

    #[async_trait]
    impl ImageProvider for FakeProvider {
        async fn create_prediction(&self, request: &GenerationRequest) -> Result<Prediction> {
            let key = item_key(&request.prompt);
            self.record(format!("create {key}"));
            if self.fail_create_for.contains(&key) {
                return Err(PortraitGenError::Api {
                    status: 500,
                    message: "Internal Server Error".into(),
                });
            }
            let get = (!self.no_poll_url_for.contains(&key)).then(|| format!("poll/{key}"));
            Ok(Prediction {
                id: Some(format!("id-{key}")),
                status: None,
                output: None,
                error: None,
                urls: PredictionUrls { get, cancel: None },
            })
        }

        async fn poll_prediction(&self, url: &str) -> Result<PredictionResult> {
            self.record(format!("poll {url}"));
            let key = url.trim_start_matches("poll/");
            if self.failed_prediction_for.iter().any(|k| *k == key) {
                return Ok(PredictionResult::Unsuccessful {
                    status: PredictionStatus::Failed,
                    detail: "E005: content flagged".into(),
                });
            }
            Ok(PredictionResult::Succeeded(self.output.clone()))
        }

        async fn download(&self, url: &str) -> Result<Vec<u8>> {
            self.record(format!("download {url}"));
            Ok(format!("bytes from {url}").into_bytes())
        }

        fn model(&self) -> &str {
            "test/fake"
        }
    }

    fn first_three() -> Vec<WorkItem> {
        ENEMY_ROSTER[..3].to_vec()
    }

    #[tokio::test]
    async fn test_existing_file_is_skipped_without_requests() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("enemy-2.webp"), b"done").unwrap();

        let provider = FakeProvider::succeeding(PredictionOutput::Single("https://x/a.webp".into()));
        let report = BatchRunner::with_items(dir.path(), first_three())
            .run(&provider)
            .await
            .unwrap();

        assert_eq!(report.skipped(), 1);
        assert_eq!(report.generated(), 2);
        assert!(provider.calls().iter().all(|c| !c.contains("enemy-2.webp")));
        assert_eq!(std::fs::read(dir.path().join("enemy-2.webp")).unwrap(), b"done");
    }

    #[tokio::test]
    async fn test_missing_poll_url_moves_on() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FakeProvider {
            no_poll_url_for: vec!["enemy-1.webp"],
            ..FakeProvider::succeeding(PredictionOutput::Single("https://x/a.webp".into()))
        };

        let report = BatchRunner::with_items(dir.path(), first_three())
            .run(&provider)
            .await
            .unwrap();

        assert_eq!(
            report.items[0].outcome,
            ItemOutcome::Failed {
                reason: "no prediction URL returned".into()
            }
        );
        assert_eq!(report.generated(), 2);
        assert!(!dir.path().join("enemy-1.webp").exists());
        assert!(dir.path().join("enemy-2.webp").exists());
    }

    #[tokio::test]
    async fn test_failed_prediction_never_downloads() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FakeProvider {
            failed_prediction_for: vec!["enemy-1.webp"],
            ..FakeProvider::succeeding(PredictionOutput::Single("https://x/a.webp".into()))
        };

        let report = BatchRunner::with_items(dir.path(), ENEMY_ROSTER[..1].to_vec())
            .run(&provider)
            .await
            .unwrap();

        assert_eq!(
            report.items[0].outcome,
            ItemOutcome::Failed {
                reason: "prediction failed: E005: content flagged".into()
            }
        );
        assert!(provider.calls().iter().all(|c| !c.starts_with("download")));
        assert!(!dir.path().join("enemy-1.webp").exists());
    }

    #[tokio::test]
    async fn test_list_output_downloads_first_url() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FakeProvider::succeeding(PredictionOutput::Many(vec![
            "https://x/first.webp".into(),
            "https://x/second.webp".into(),
        ]));

        BatchRunner::with_items(dir.path(), ENEMY_ROSTER[..1].to_vec())
            .run(&provider)
            .await
            .unwrap();

        let downloads: Vec<_> = provider
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("download"))
            .collect();
        assert_eq!(downloads, vec!["download https://x/first.webp"]);
        assert_eq!(
            std::fs::read(dir.path().join("enemy-1.webp")).unwrap(),
            b"bytes from https://x/first.webp"
        );
    }

    #[tokio::test]
    async fn test_empty_output_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FakeProvider::succeeding(PredictionOutput::Many(vec![]));

        let report = BatchRunner::with_items(dir.path(), ENEMY_ROSTER[..1].to_vec())
            .run(&provider)
            .await
            .unwrap();

        assert_eq!(
            report.items[0].outcome,
            ItemOutcome::Failed {
                reason: "prediction succeeded: no output received".into()
            }
        );
    }

    #[tokio::test]
    async fn test_create_error_isolated_to_item() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FakeProvider {
            fail_create_for: vec!["enemy-2.webp"],
            ..FakeProvider::succeeding(PredictionOutput::Single("https://x/a.webp".into()))
        };

        let report = BatchRunner::new(dir.path()).run(&provider).await.unwrap();

        assert_eq!(report.items.len(), 10);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.generated(), 9);
        assert!(!dir.path().join("enemy-2.webp").exists());
        assert!(dir.path().join("enemy-10.webp").exists());
    }

    #[tokio::test]
    async fn test_creates_missing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("assets").join("portraits");
        let provider = FakeProvider::succeeding(PredictionOutput::Single("https://x/a.webp".into()));

        let runner = BatchRunner::with_items(&nested, ENEMY_ROSTER[..1].to_vec());
        let report = runner.run(&provider).await.unwrap();

        assert_eq!(runner.output_dir(), nested.as_path());
        assert_eq!(report.generated(), 1);
        assert!(nested.join("enemy-1.webp").is_file());
    }

    #[test]
    fn test_report_serializes_outcomes() {
        let report = BatchReport {
            output_dir: PathBuf::from("out"),
            items: vec![
                ItemReport {
                    id: 1,
                    filename: "enemy-1.webp",
                    outcome: ItemOutcome::Generated { size_bytes: 12 },
                },
                ItemReport {
                    id: 2,
                    filename: "enemy-2.webp",
                    outcome: ItemOutcome::Failed {
                        reason: "boom".into(),
                    },
                },
            ],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["items"][0]["outcome"], "generated");
        assert_eq!(json["items"][0]["size_bytes"], 12);
        assert_eq!(json["items"][1]["outcome"], "failed");
        assert_eq!(json["items"][1]["reason"], "boom");
    }
}
