// THEORY:
// The `pipeline` module is the top-level, synchronous API of the analysis engine.
// An `AnalysisPipeline` owns a validated `AnalysisConfig` and runs any of the six
// analyses on one image: a `PixelBuffer` snapshot plus the `ImageMetadata` of the
// encoded file it was decoded from.
//
// Every analysis is independent. `run` executes exactly one of them, which is what
// a view that only shows one panel wants; `analyze_all` runs all of them and
// bundles the records into an `ImageReport`. Nothing is cached between calls, so
// recomputation is the only way to refresh a result.

use crate::config::AnalysisConfig;
use crate::core_modules::color_clusterer::{self, ColorAnalysisResult};
use crate::core_modules::compression_estimator::{CompressionAnalysis, CompressionEstimator};
use crate::core_modules::image_stats::{ImageMetadata, ImageStatistics};
use crate::core_modules::luminance_analyzer::{LuminanceAnalysis, LuminanceAnalyzer};
use crate::core_modules::performance_projector::{PerformanceAnalysis, PerformanceProjector};
use crate::core_modules::pixel::pixel::PixelBuffer;
use crate::core_modules::structure_analyzer::{StructureAnalysis, StructureAnalyzer};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// One of the independent analyses the pipeline can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisKind {
    Statistics,
    Color,
    Luminance,
    Compression,
    Structure,
    Performance,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 6] = [
        AnalysisKind::Statistics,
        AnalysisKind::Color,
        AnalysisKind::Luminance,
        AnalysisKind::Compression,
        AnalysisKind::Structure,
        AnalysisKind::Performance,
    ];
}

/// The record produced by a single analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisOutcome {
    Statistics(ImageStatistics),
    Color(ColorAnalysisResult),
    Luminance(LuminanceAnalysis),
    Compression(CompressionAnalysis),
    Structure(StructureAnalysis),
    Performance(PerformanceAnalysis),
}

impl AnalysisOutcome {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisOutcome::Statistics(_) => AnalysisKind::Statistics,
            AnalysisOutcome::Color(_) => AnalysisKind::Color,
            AnalysisOutcome::Luminance(_) => AnalysisKind::Luminance,
            AnalysisOutcome::Compression(_) => AnalysisKind::Compression,
            AnalysisOutcome::Structure(_) => AnalysisKind::Structure,
            AnalysisOutcome::Performance(_) => AnalysisKind::Performance,
        }
    }
}

/// Every analysis for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReport {
    pub statistics: ImageStatistics,
    pub color: ColorAnalysisResult,
    pub luminance: LuminanceAnalysis,
    pub compression: CompressionAnalysis,
    pub structure: StructureAnalysis,
    pub performance: PerformanceAnalysis,
}

/// The main, top-level struct for the analysis engine.
#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    config: AnalysisConfig,
}

impl AnalysisPipeline {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Runs a single analysis.
    pub fn run(
        &self,
        kind: AnalysisKind,
        buffer: &PixelBuffer,
        metadata: &ImageMetadata,
    ) -> Result<AnalysisOutcome> {
        let started = Instant::now();
        log::debug!(
            "{:?} analysis started on {}x{} image",
            kind,
            buffer.width(),
            buffer.height()
        );

        let outcome = match kind {
            AnalysisKind::Statistics => {
                AnalysisOutcome::Statistics(ImageStatistics::collect(buffer, metadata))
            }
            AnalysisKind::Color => {
                AnalysisOutcome::Color(color_clusterer::analyze_colors(buffer, &self.config)?)
            }
            AnalysisKind::Luminance => {
                AnalysisOutcome::Luminance(LuminanceAnalyzer::new(buffer).get_analysis())
            }
            AnalysisKind::Compression => {
                let estimator =
                    CompressionEstimator::new(buffer, metadata.size_bytes, self.config.color_depth)?;
                AnalysisOutcome::Compression(
                    estimator.analyze(self.config.target_compression_level)?,
                )
            }
            AnalysisKind::Structure => {
                AnalysisOutcome::Structure(StructureAnalyzer::new(buffer).analyze())
            }
            AnalysisKind::Performance => {
                let projector =
                    PerformanceProjector::from_metadata(buffer.width(), buffer.height(), metadata)?;
                AnalysisOutcome::Performance(projector.analyze())
            }
        };

        log::debug!("{:?} analysis finished in {:?}", kind, started.elapsed());
        Ok(outcome)
    }

    /// Runs every analysis in sequence.
    pub fn analyze_all(&self, buffer: &PixelBuffer, metadata: &ImageMetadata) -> Result<ImageReport> {
        let started = Instant::now();
        let luminance = LuminanceAnalyzer::new(buffer).get_analysis();
        let estimator =
            CompressionEstimator::new(buffer, metadata.size_bytes, self.config.color_depth)?;

        let report = ImageReport {
            statistics: ImageStatistics::collect(buffer, metadata),
            color: color_clusterer::analyze_colors(buffer, &self.config)?,
            luminance,
            compression: estimator.analyze(self.config.target_compression_level)?,
            structure: StructureAnalyzer::new(buffer).analyze(),
            performance: PerformanceProjector::from_metadata(
                buffer.width(),
                buffer.height(),
                metadata,
            )?
            .analyze(),
        };

        log::debug!(
            "full report for {}x{} image built in {:?}",
            buffer.width(),
            buffer.height(),
            started.elapsed()
        );
        Ok(report)
    }
}
