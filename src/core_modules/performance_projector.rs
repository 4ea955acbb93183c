// THEORY:
// The `PerformanceProjector` never looks at pixels. It turns three facts about an
// image (dimensions, encoded size, MIME type) into delivery estimates:
//
// - size per megapixel and how well that is optimized,
// - download time on five connection classes,
// - decoded memory footprint,
// - a 0-100 rendering cost score,
// - browser support for the format,
// - bandwidth for a few usage scenarios.
//
// Format, browser, support level and connection class are closed enums. Anything
// the tables don't know about becomes `ImageFormat::Other` and reports `Unknown`
// support instead of failing.
//
// `QualitySummary` is the short form shown next to the basic statistics.

use crate::core_modules::image_stats::{ImageMetadata, round_to};
use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

const BYTES_PER_KB: f64 = 1024.0;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const PIXELS_PER_MEGAPIXEL: f64 = 1_000_000.0;
const BYTES_PER_PIXEL: f64 = 4.0;

const RENDERING_PIXEL_BASELINE: f64 = 4_000_000.0;
const RENDERING_SIZE_BASELINE: f64 = 2.0 * BYTES_PER_MB;
const WIDESCREEN_ASPECT: f64 = 1.78;

/// 1.5 Mbit/s in bytes per second.
const QUICK_LOAD_SPEED: f64 = 1.5 * BYTES_PER_MB / 8.0;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    #[serde(rename = "JPEG")]
    Jpeg,
    #[serde(rename = "PNG")]
    Png,
    #[serde(rename = "WEBP")]
    Webp,
    #[serde(rename = "AVIF")]
    Avif,
    #[serde(untagged)]
    Other(String),
}

impl ImageFormat {
    /// Parses the subtype of a MIME type, e.g. `image/webp`.
    pub fn from_mime_type(mime_type: &str) -> Self {
        let subtype = mime_type
            .split_once('/')
            .map_or(mime_type, |(_, subtype)| subtype)
            .to_uppercase();
        match subtype.as_str() {
            "JPEG" => ImageFormat::Jpeg,
            "PNG" => ImageFormat::Png,
            "WEBP" => ImageFormat::Webp,
            "AVIF" => ImageFormat::Avif,
            _ => ImageFormat::Other(subtype),
        }
    }

    pub fn support_in(&self, browser: Browser) -> SupportLevel {
        match (self, browser) {
            (ImageFormat::Jpeg | ImageFormat::Png, _) => SupportLevel::Full,
            (ImageFormat::Webp, Browser::Safari) => SupportLevel::Partial,
            (ImageFormat::Webp, _) => SupportLevel::Full,
            (ImageFormat::Avif, Browser::Chrome) => SupportLevel::Full,
            (ImageFormat::Avif, Browser::Safari) => SupportLevel::None,
            (ImageFormat::Avif, Browser::Firefox | Browser::Edge) => SupportLevel::Partial,
            (ImageFormat::Other(_), _) => SupportLevel::Unknown,
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "Widely supported format, good for photographs",
            ImageFormat::Png => "Widely supported, best for images with transparency",
            ImageFormat::Webp => "Modern format with good compression, consider JPEG fallback",
            ImageFormat::Avif => "Next-gen format, requires fallback for broad support",
            ImageFormat::Other(_) => "Consider using a more widely supported format",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageFormat::Jpeg => f.write_str("JPEG"),
            ImageFormat::Png => f.write_str("PNG"),
            ImageFormat::Webp => f.write_str("WEBP"),
            ImageFormat::Avif => f.write_str("AVIF"),
            ImageFormat::Other(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Browser {
    Chrome,
    Firefox,
    Safari,
    Edge,
}

impl Browser {
    pub const ALL: [Browser; 4] = [Browser::Chrome, Browser::Firefox, Browser::Safari, Browser::Edge];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupportLevel {
    Full,
    Partial,
    None,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionClass {
    #[serde(rename = "2G")]
    TwoG,
    #[serde(rename = "3G")]
    ThreeG,
    #[serde(rename = "4G")]
    FourG,
    #[serde(rename = "5G")]
    FiveG,
    Fiber,
}

impl ConnectionClass {
    pub const ALL: [ConnectionClass; 5] = [
        ConnectionClass::TwoG,
        ConnectionClass::ThreeG,
        ConnectionClass::FourG,
        ConnectionClass::FiveG,
        ConnectionClass::Fiber,
    ];

    pub fn bytes_per_second(&self) -> f64 {
        match self {
            ConnectionClass::TwoG => 50.0 * BYTES_PER_KB,
            ConnectionClass::ThreeG => 750.0 * BYTES_PER_KB,
            ConnectionClass::FourG => 4.0 * BYTES_PER_MB,
            ConnectionClass::FiveG => 20.0 * BYTES_PER_MB,
            ConnectionClass::Fiber => 50.0 * BYTES_PER_MB,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionAssessment {
    Optimal,
    Average,
    Poor,
}

impl ResolutionAssessment {
    /// Lower bounds belong to the worse band: 0.5 is Average, 1.5 is Poor.
    pub fn for_ratio(ratio: f64) -> Self {
        if ratio >= 1.5 {
            ResolutionAssessment::Poor
        } else if ratio >= 0.5 {
            ResolutionAssessment::Average
        } else {
            ResolutionAssessment::Optimal
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            ResolutionAssessment::Optimal => "Current file size is well-optimized for the resolution",
            ResolutionAssessment::Average => "Minor optimization possible - consider light compression",
            ResolutionAssessment::Poor => {
                "Consider applying stronger compression - file size is too large for the resolution"
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionAnalysis {
    /// MB per megapixel.
    pub ratio: f64,
    pub assessment: ResolutionAssessment,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadingTime {
    pub connection: ConnectionClass,
    /// Seconds.
    pub time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadingTimeAnalysis {
    pub times: Vec<LoadingTime>,
    pub assessment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryComponent {
    pub name: String,
    /// MB.
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsageAnalysis {
    #[serde(rename = "totalMB")]
    pub total_mb: f64,
    pub components: Vec<MemoryComponent>,
    pub assessment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderingFactor {
    pub name: String,
    pub impact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderingImpactAnalysis {
    pub score: f64,
    pub factors: Vec<RenderingFactor>,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserSupport {
    pub browser: Browser,
    pub support: SupportLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserCompatibilityAnalysis {
    pub format: ImageFormat,
    pub compatibility: Vec<BrowserSupport>,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandwidthRequirement {
    pub scenario: String,
    /// Mbps.
    pub bandwidth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandwidthRequirementsAnalysis {
    pub requirements: Vec<BandwidthRequirement>,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderingTier {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualitySummary {
    pub file_size_ratio: f64,
    /// Seconds at 1.5 Mbit/s.
    pub loading_time: f64,
    /// MB of raw RGBA.
    pub memory_usage: f64,
    pub rendering_impact: RenderingTier,
    /// Mbps for a one second load.
    pub bandwidth: f64,
    /// KB.
    pub network_transfer: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceAnalysis {
    pub resolution: ResolutionAnalysis,
    pub loading_time: LoadingTimeAnalysis,
    pub memory_usage: MemoryUsageAnalysis,
    pub rendering_impact: RenderingImpactAnalysis,
    pub browser_compatibility: BrowserCompatibilityAnalysis,
    pub bandwidth_requirements: BandwidthRequirementsAnalysis,
    pub quality_summary: QualitySummary,
}

/// Delivery and runtime cost estimates from size, dimensions and format.
pub struct PerformanceProjector {
    width: u32,
    height: u32,
    file_size: u64,
    format: ImageFormat,
}

impl PerformanceProjector {
    pub fn new(width: u32, height: u32, file_size: u64, mime_type: &str) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(AnalysisError::InvalidDimensions { width, height });
        }
        let format = ImageFormat::from_mime_type(mime_type);
        if let ImageFormat::Other(name) = &format {
            log::warn!("no compatibility data for format {name:?}, reporting Unknown");
        }
        Ok(Self {
            width,
            height,
            file_size,
            format,
        })
    }

    pub fn from_metadata(width: u32, height: u32, metadata: &ImageMetadata) -> Result<Self> {
        Self::new(width, height, metadata.size_bytes, &metadata.mime_type)
    }

    fn total_pixels(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    fn file_size(&self) -> f64 {
        self.file_size as f64
    }

    fn file_size_ratio(&self) -> f64 {
        let megapixels = self.total_pixels() / PIXELS_PER_MEGAPIXEL;
        round_to(self.file_size() / BYTES_PER_MB / megapixels, 2)
    }

    pub fn calculate_resolution_ratio(&self) -> ResolutionAnalysis {
        let ratio = self.file_size_ratio();
        let assessment = ResolutionAssessment::for_ratio(ratio);
        ResolutionAnalysis {
            ratio,
            assessment,
            recommendation: assessment.recommendation().to_string(),
        }
    }

    pub fn analyze_loading_time(&self) -> LoadingTimeAnalysis {
        let times = ConnectionClass::ALL
            .iter()
            .map(|&connection| LoadingTime {
                connection,
                time: round_to(self.file_size() / connection.bytes_per_second(), 2),
            })
            .collect();

        let assessment = if self.file_size() > BYTES_PER_MB {
            "Loading time may be problematic on slower connections"
        } else {
            "Loading time is acceptable across most connection types"
        };

        LoadingTimeAnalysis {
            times,
            assessment: assessment.to_string(),
        }
    }

    pub fn calculate_memory_usage(&self) -> MemoryUsageAnalysis {
        let raw_size = self.total_pixels() * BYTES_PER_PIXEL;
        let decoded_size = raw_size * 1.2;
        let buffer_size = raw_size * 0.5;
        let total_mb = round_to((raw_size + decoded_size + buffer_size) / BYTES_PER_MB, 2);

        let components = [
            ("Raw Pixel Data", raw_size),
            ("Decoded Buffer", decoded_size),
            ("Processing Buffers", buffer_size),
        ]
        .into_iter()
        .map(|(name, bytes)| MemoryComponent {
            name: name.to_string(),
            size: round_to(bytes / BYTES_PER_MB, 2),
        })
        .collect();

        let assessment = if total_mb > 100.0 {
            "High memory impact - consider resizing"
        } else if total_mb > 50.0 {
            "Moderate memory impact"
        } else {
            "Low memory impact"
        };

        MemoryUsageAnalysis {
            total_mb,
            components,
            assessment: assessment.to_string(),
        }
    }

    pub fn evaluate_rendering_impact(&self) -> RenderingImpactAnalysis {
        let aspect_ratio = self.width as f64 / self.height as f64;
        let factors = vec![
            RenderingFactor {
                name: "Resolution Impact".to_string(),
                impact: (self.total_pixels() / RENDERING_PIXEL_BASELINE * 100.0).min(100.0),
            },
            RenderingFactor {
                name: "Aspect Ratio Complexity".to_string(),
                impact: (aspect_ratio - WIDESCREEN_ASPECT).abs() * 50.0,
            },
            RenderingFactor {
                name: "Size Impact".to_string(),
                impact: (self.file_size() / RENDERING_SIZE_BASELINE * 100.0).min(100.0),
            },
        ];

        let score = factors.iter().map(|factor| factor.impact).sum::<f64>() / factors.len() as f64;
        let recommendation = if score > 75.0 {
            "Consider optimizing image dimensions and file size"
        } else if score > 50.0 {
            "Minor optimizations recommended"
        } else {
            "Image should render efficiently"
        };

        RenderingImpactAnalysis {
            score,
            factors,
            recommendation: recommendation.to_string(),
        }
    }

    pub fn assess_browser_compatibility(&self) -> BrowserCompatibilityAnalysis {
        BrowserCompatibilityAnalysis {
            format: self.format.clone(),
            compatibility: Browser::ALL
                .iter()
                .map(|&browser| BrowserSupport {
                    browser,
                    support: self.format.support_in(browser),
                })
                .collect(),
            recommendation: self.format.recommendation().to_string(),
        }
    }

    pub fn calculate_bandwidth_requirements(&self) -> BandwidthRequirementsAnalysis {
        let base_bandwidth = self.file_size() * 8.0 / BYTES_PER_MB;
        let requirements = [
            ("Single Load", 1.0),
            ("Multiple Instances", 3.0),
            ("With Caching", 0.2),
            ("Peak Usage", 5.0),
        ]
        .into_iter()
        .map(|(scenario, multiplier)| BandwidthRequirement {
            scenario: scenario.to_string(),
            bandwidth: round_to(base_bandwidth * multiplier, 2),
        })
        .collect();

        let recommendation = if base_bandwidth > 5.0 {
            "Consider implementing lazy loading and caching strategies"
        } else if base_bandwidth > 2.0 {
            "Image size is acceptable but monitor usage patterns"
        } else {
            "Bandwidth requirements are minimal"
        };

        BandwidthRequirementsAnalysis {
            requirements,
            recommendation: recommendation.to_string(),
        }
    }

    pub fn quality_summary(&self) -> QualitySummary {
        let total_pixels = self.total_pixels();
        let rendering_impact = if total_pixels > 4_000_000.0 {
            RenderingTier::High
        } else if total_pixels > 1_000_000.0 {
            RenderingTier::Medium
        } else {
            RenderingTier::Low
        };

        QualitySummary {
            file_size_ratio: self.file_size_ratio(),
            loading_time: round_to(self.file_size() / QUICK_LOAD_SPEED, 2),
            memory_usage: round_to(total_pixels * BYTES_PER_PIXEL / BYTES_PER_MB, 2),
            rendering_impact,
            bandwidth: round_to(self.file_size() * 8.0 / BYTES_PER_MB, 2),
            network_transfer: round_to(self.file_size() / BYTES_PER_KB, 2),
        }
    }

    pub fn analyze(&self) -> PerformanceAnalysis {
        PerformanceAnalysis {
            resolution: self.calculate_resolution_ratio(),
            loading_time: self.analyze_loading_time(),
            memory_usage: self.calculate_memory_usage(),
            rendering_impact: self.evaluate_rendering_impact(),
            browser_compatibility: self.assess_browser_compatibility(),
            bandwidth_requirements: self.calculate_bandwidth_requirements(),
            quality_summary: self.quality_summary(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    #[test]
    fn resolution_band_boundaries() {
        assert_eq!(ResolutionAssessment::for_ratio(0.49), ResolutionAssessment::Optimal);
        assert_eq!(ResolutionAssessment::for_ratio(0.5), ResolutionAssessment::Average);
        assert_eq!(ResolutionAssessment::for_ratio(1.49), ResolutionAssessment::Average);
        assert_eq!(ResolutionAssessment::for_ratio(1.5), ResolutionAssessment::Poor);
    }

    #[test]
    fn ratio_of_half_a_megabyte_per_megapixel_is_average() {
        // 1000x1000 = 1 MP, 0.5 MB file.
        let projector = PerformanceProjector::new(1000, 1000, MB / 2, "image/jpeg").unwrap();
        let resolution = projector.calculate_resolution_ratio();
        assert_eq!(resolution.ratio, 0.5);
        assert_eq!(resolution.assessment, ResolutionAssessment::Average);

        let poor = PerformanceProjector::new(1000, 1000, 3 * MB / 2, "image/jpeg").unwrap();
        assert_eq!(poor.calculate_resolution_ratio().assessment, ResolutionAssessment::Poor);
    }

    #[test]
    fn loading_times_per_connection() {
        let projector = PerformanceProjector::new(100, 100, 2 * MB, "image/png").unwrap();
        let loading = projector.analyze_loading_time();
        assert_eq!(loading.times.len(), 5);
        assert_eq!(loading.times[0].connection, ConnectionClass::TwoG);
        assert_eq!(loading.times[0].time, 40.96);
        assert_eq!(loading.times[2].time, 0.5);
        assert_eq!(loading.times[4].time, 0.04);
        assert_eq!(loading.assessment, "Loading time may be problematic on slower connections");
    }

    #[test]
    fn memory_components_and_tiers() {
        // 1024 x 1024 x 4 = 4 MB raw.
        let projector = PerformanceProjector::new(1024, 1024, 1, "image/png").unwrap();
        let memory = projector.calculate_memory_usage();
        assert_eq!(memory.total_mb, 10.8);
        assert_eq!(memory.components[0].size, 4.0);
        assert_eq!(memory.components[1].size, 4.8);
        assert_eq!(memory.components[2].size, 2.0);
        assert_eq!(memory.assessment, "Low memory impact");

        let huge = PerformanceProjector::new(4096, 4096, 1, "image/png").unwrap();
        assert_eq!(huge.calculate_memory_usage().assessment, "High memory impact - consider resizing");
    }

    #[test]
    fn rendering_impact_averages_three_factors() {
        // 2000x2000 is 4 MP (100), aspect 1 (39), 2 MB file (100).
        let projector = PerformanceProjector::new(2000, 2000, 2 * MB, "image/png").unwrap();
        let rendering = projector.evaluate_rendering_impact();
        assert_eq!(rendering.factors.len(), 3);
        assert!((rendering.score - 79.66666666666667).abs() < 1e-9);
        assert_eq!(rendering.recommendation, "Consider optimizing image dimensions and file size");
    }

    #[test]
    fn browser_table_and_unknown_formats() {
        let avif = PerformanceProjector::new(10, 10, 100, "image/avif").unwrap();
        let compatibility = avif.assess_browser_compatibility();
        assert_eq!(compatibility.format, ImageFormat::Avif);
        let levels: Vec<SupportLevel> = compatibility.compatibility.iter().map(|c| c.support).collect();
        assert_eq!(
            levels,
            vec![SupportLevel::Full, SupportLevel::Partial, SupportLevel::None, SupportLevel::Partial]
        );

        let gif = PerformanceProjector::new(10, 10, 100, "image/gif").unwrap();
        let compatibility = gif.assess_browser_compatibility();
        assert_eq!(compatibility.format, ImageFormat::Other("GIF".to_string()));
        assert!(compatibility.compatibility.iter().all(|c| c.support == SupportLevel::Unknown));
        assert_eq!(compatibility.recommendation, "Consider using a more widely supported format");
    }

    #[test]
    fn format_serializes_as_display_name() {
        assert_eq!(serde_json::to_string(&ImageFormat::Webp).unwrap(), "\"WEBP\"");
        assert_eq!(serde_json::to_string(&ImageFormat::Other("GIF".into())).unwrap(), "\"GIF\"");
        assert_eq!(serde_json::to_string(&ConnectionClass::TwoG).unwrap(), "\"2G\"");
    }

    #[test]
    fn bandwidth_scenarios() {
        let projector = PerformanceProjector::new(10, 10, MB, "image/webp").unwrap();
        let bandwidth = projector.calculate_bandwidth_requirements();
        let values: Vec<f64> = bandwidth.requirements.iter().map(|r| r.bandwidth).collect();
        assert_eq!(values, vec![8.0, 24.0, 1.6, 40.0]);
        assert_eq!(bandwidth.recommendation, "Consider implementing lazy loading and caching strategies");
    }

    #[test]
    fn quality_summary_values() {
        let projector = PerformanceProjector::new(1500, 1000, 1_234_567, "image/jpeg").unwrap();
        let summary = projector.quality_summary();
        assert_eq!(summary.rendering_impact, RenderingTier::Medium);
        assert_eq!(summary.network_transfer, 1205.63);
        assert_eq!(summary.loading_time, 6.28);
        assert_eq!(summary.memory_usage, 5.72);
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(PerformanceProjector::new(0, 10, 100, "image/png").is_err());
    }
}
