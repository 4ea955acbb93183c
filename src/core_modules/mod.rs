pub mod color_clusterer;
pub mod compression_estimator;
pub mod histogram;
pub mod histogram_engine;
pub mod image_stats;
pub mod luminance_analyzer;
pub mod performance_projector;
pub mod pixel;
pub mod structure_analyzer;
