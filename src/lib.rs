// THEORY:
// This file is the entry point for the `image_insight` library crate. It exposes
// the pixel-analysis engine behind a dashboard-style image inspector: hand it a
// decoded RGBA buffer plus the encoded file's metadata and it returns plain,
// serializable metric records.
//
// `pipeline` is the high-level API (`AnalysisPipeline`) for running one or all
// analyses synchronously. `parallel_pipeline` runs the same analyses on a tokio
// worker pool and discards results for images that have since been replaced.
// The individual analyzers live in `core_modules`, one per file, and can be used
// directly when only one metric is needed.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use config::AnalysisConfig;
pub use core_modules::image_stats::ImageMetadata;
pub use core_modules::pixel::pixel::{Color, Pixel, PixelBuffer};
pub use error::{AnalysisError, Result};
pub use pipeline::{AnalysisKind, AnalysisOutcome, AnalysisPipeline, ImageReport};
