#![warn(missing_docs)]
//! portraitgen - enemy commander portraits for the WarZones campaign.
//!
//! Generates a fixed roster of ten portraits through Replicate's
//! `google/nano-banana` model. Each portrait is submitted, polled until the
//! prediction settles, and downloaded into the output directory. Files that
//! already exist are skipped, so an interrupted run can simply be restarted.
//!
//! # Quick Start
//!
//! ```no_run
//! use portraitgen::{BatchRunner, ReplicateProvider};
//!
//! #[tokio::main]
//! async fn main() -> portraitgen::Result<()> {
//!     let provider = ReplicateProvider::builder().build()?;
//!     let report = BatchRunner::new("assets/portraits").run(&provider).await?;
//!     println!("{} generated, {} failed", report.generated(), report.failed());
//!     Ok(())
//! }
//! ```
//!
//! # Environment
//!
//! - `REPLICATE_API_TOKEN`: API token (required)
//! - `REPLICATE_API_BASE`: API base URL override

mod error;

pub mod batch;
pub mod image;
pub mod roster;

// Re-export error types at crate root
pub use error::{PortraitGenError, Result};

pub use batch::{BatchReport, BatchRunner, ItemOutcome, ItemReport, DEFAULT_OUTPUT_DIR};
pub use image::providers::{ReplicateProvider, ReplicateProviderBuilder};
pub use image::{
    AspectRatio, GeneratedImage, GenerationMetadata, GenerationRequest, ImageFormat, ImageProvider,
    Prediction, PredictionOutput, PredictionResult, PredictionStatus,
};
pub use roster::{WorkItem, ENEMY_ROSTER};
