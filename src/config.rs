// THEORY:
// `AnalysisConfig` holds the handful of knobs the analyzers expose. Every field
// has a default, so a JSON file only needs the keys it wants to change and an
// empty object is a valid configuration.

use crate::core_modules::color_clusterer::{DEFAULT_CLUSTER_COUNT, DEFAULT_MAX_ITERATIONS};
use crate::core_modules::compression_estimator::DEFAULT_COLOR_DEPTH;
use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Number of k-means clusters for dominant colors.
    pub dominant_color_count: usize,
    pub max_kmeans_iterations: u32,
    /// Fixes the k-means initialization. `None` seeds from the OS.
    pub kmeans_seed: Option<u64>,
    /// Assumed bits per pixel of the uncompressed image.
    pub color_depth: u32,
    /// Compression level (0-100) the quality-impact prediction targets.
    pub target_compression_level: f64,
    pub worker_pool_size: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dominant_color_count: DEFAULT_CLUSTER_COUNT,
            max_kmeans_iterations: DEFAULT_MAX_ITERATIONS,
            kmeans_seed: None,
            color_depth: DEFAULT_COLOR_DEPTH,
            target_compression_level: 80.0,
            worker_pool_size: num_cpus::get().max(1),
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| AnalysisError::config("could not parse analysis config", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::config(format!("could not read {}", path.display()), e)
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dominant_color_count == 0 {
            return Err(AnalysisError::invalid_parameter("dominant_color_count", 0));
        }
        if self.color_depth == 0 {
            return Err(AnalysisError::invalid_parameter("color_depth", 0));
        }
        if self.worker_pool_size == 0 {
            return Err(AnalysisError::invalid_parameter("worker_pool_size", 0));
        }
        if !(0.0..=100.0).contains(&self.target_compression_level) {
            return Err(AnalysisError::invalid_parameter(
                "target_compression_level",
                self.target_compression_level,
            ));
        }
        Ok(())
    }
}
