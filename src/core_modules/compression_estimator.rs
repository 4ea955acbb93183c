// THEORY:
// The `CompressionEstimator` reasons about how an image is, and could be, encoded.
// It needs the decoded pixels plus the size of the original encoded file, and it
// produces five estimates:
//
// 1.  **Current compression**: encoded size against the theoretical raw size at the
//     assumed color depth, as a ratio, a 0-100 level and bits per pixel.
// 2.  **Format potential**: projected size for each target format. Every format has
//     a base compression factor that is inflated for busy images; busyness comes
//     from a single raster-order scan of neighbor color differences.
// 3.  **Block artifacts**: a blockiness score for every 8x8 block. Only the block's
//     first row and first column are sampled (red channel only); this is a proxy,
//     not a full-block scan, and every downstream severity number depends on it.
// 4.  **Quality impact**: rough PSNR / SSIM figures for moving to a target level.
//     These are heuristics of the level difference, not measurements.
// 5.  **Lossless potential**: Shannon entropy of the pooled R, G and B value
//     distribution, used as a lower bound for bits per channel.

use crate::core_modules::histogram::ChannelHistograms;
use crate::core_modules::pixel::pixel::{Pixel, PixelBuffer};
use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_COLOR_DEPTH: u32 = 24;
pub const BLOCK_SIZE: u32 = 8;
const ARTIFACT_THRESHOLD: f64 = 20.0;
const EDGE_DIFFERENCE_THRESHOLD: u32 = 30;

/// Encodings the estimator can project sizes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetFormat {
    #[serde(rename = "JPEG")]
    Jpeg,
    #[serde(rename = "WebP")]
    WebP,
    #[serde(rename = "AVIF")]
    Avif,
    #[serde(rename = "JPEG 2000")]
    Jpeg2000,
    #[serde(rename = "JPEG XR")]
    JpegXr,
}

impl TargetFormat {
    pub const ALL: [TargetFormat; 5] = [
        TargetFormat::Jpeg,
        TargetFormat::WebP,
        TargetFormat::Avif,
        TargetFormat::Jpeg2000,
        TargetFormat::JpegXr,
    ];

    /// Fraction of the original size this format typically needs.
    pub fn compression_factor(&self) -> f64 {
        match self {
            TargetFormat::Jpeg => 0.25,
            TargetFormat::WebP => 0.2,
            TargetFormat::Avif => 0.15,
            TargetFormat::Jpeg2000 => 0.22,
            TargetFormat::JpegXr => 0.23,
        }
    }

    /// Typical quality loss, 0-1.
    pub fn quality_impact(&self) -> f64 {
        match self {
            TargetFormat::Jpeg => 0.15,
            TargetFormat::WebP => 0.1,
            TargetFormat::Avif => 0.12,
            TargetFormat::Jpeg2000 => 0.08,
            TargetFormat::JpegXr => 0.09,
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetFormat::Jpeg => "JPEG",
            TargetFormat::WebP => "WebP",
            TargetFormat::Avif => "AVIF",
            TargetFormat::Jpeg2000 => "JPEG 2000",
            TargetFormat::JpegXr => "JPEG XR",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionMetrics {
    /// 0 (no compression) to 100.
    pub current_level: u8,
    pub bits_per_pixel: f64,
    pub compression_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatAnalysis {
    pub format: TargetFormat,
    /// Percent of the original size saved.
    pub potential_savings: i64,
    /// Bytes.
    pub estimated_file_size: u64,
    /// 0-100.
    pub quality_tradeoff: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLocation {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactAnalysis {
    /// Flagged blocks as a percentage of all blocks, capped at 100.
    pub severity: f64,
    pub blockiness: f64,
    pub locations: Vec<BlockLocation>,
    /// Fraction of the image area covered by flagged blocks.
    pub affected_area: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualImpact {
    Minimal,
    Noticeable,
    Moderate,
    Severe,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    pub psnr: f64,
    pub ssim: f64,
    pub visual_impact: VisualImpact,
    pub quality_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LosslessAnalysis {
    /// 0-100.
    pub potential: f64,
    /// Bits per channel value.
    pub entropy: f64,
    pub recommendation: String,
    /// Bytes.
    pub estimated_savings: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionAnalysis {
    pub current_compression: CompressionMetrics,
    pub format_potential: Vec<FormatAnalysis>,
    pub artifacts: ArtifactAnalysis,
    pub quality_impact: QualityMetrics,
    pub lossless_potential: LosslessAnalysis,
}

/// Compression estimates for one decoded image and its encoded size.
pub struct CompressionEstimator<'a> {
    buffer: &'a PixelBuffer,
    original_size: u64,
    color_depth: u32,
}

impl<'a> CompressionEstimator<'a> {
    /// `original_size` is the encoded file size in bytes; `color_depth` is in bits per pixel.
    pub fn new(buffer: &'a PixelBuffer, original_size: u64, color_depth: u32) -> Result<Self> {
        if original_size == 0 {
            return Err(AnalysisError::invalid_parameter("original_size", original_size));
        }
        if color_depth == 0 {
            return Err(AnalysisError::invalid_parameter("color_depth", color_depth));
        }
        Ok(Self {
            buffer,
            original_size,
            color_depth,
        })
    }

    fn pixel_count(&self) -> f64 {
        self.buffer.pixel_count() as f64
    }

    fn bits_per_pixel(&self) -> f64 {
        self.original_size as f64 * 8.0 / self.pixel_count()
    }

    pub fn analyze_current_compression(&self) -> CompressionMetrics {
        let uncompressed_size = self.pixel_count() * (self.color_depth as f64 / 8.0);
        let compression_ratio = self.original_size as f64 / uncompressed_size;
        let current_level = ((1.0 - compression_ratio) * 100.0).round().clamp(0.0, 100.0);

        CompressionMetrics {
            current_level: current_level as u8,
            bits_per_pixel: self.bits_per_pixel(),
            compression_ratio,
        }
    }

    pub fn analyze_format_potential(&self) -> Vec<FormatAnalysis> {
        let image_complexity = self.calculate_image_complexity();
        let original = self.original_size as f64;

        TargetFormat::ALL
            .iter()
            .map(|&format| {
                let adjusted_factor = format.compression_factor() * (1.0 + image_complexity * 0.2);
                let estimated_size = original * adjusted_factor;
                let savings = (original - estimated_size) / original * 100.0;

                FormatAnalysis {
                    format,
                    potential_savings: savings.round() as i64,
                    estimated_file_size: estimated_size.round() as u64,
                    quality_tradeoff: (format.quality_impact() * 100.0).round() as i64,
                }
            })
            .collect()
    }

    /// Mean neighbor color difference (scaled to 0-1) blended with edge density.
    pub fn calculate_image_complexity(&self) -> f64 {
        let mut total_variance = 0u64;
        let mut edge_count = 0u64;
        let mut previous: Option<Pixel> = None;

        for pixel in self.buffer.pixels() {
            if let Some(previous) = previous {
                let color_difference = pixel.channel_difference(&previous);
                total_variance += color_difference as u64;
                if color_difference > EDGE_DIFFERENCE_THRESHOLD {
                    edge_count += 1;
                }
            }
            previous = Some(pixel);
        }

        let average_variance = total_variance as f64 / self.pixel_count();
        let edge_density = edge_count as f64 / self.pixel_count();
        (average_variance / 255.0 + edge_density) / 2.0
    }

    pub fn analyze_artifacts(&self) -> ArtifactAnalysis {
        let width = self.buffer.width();
        let height = self.buffer.height();
        let mut locations = Vec::new();
        let mut total_blockiness = 0.0;

        // A block is only scored when the sample one past its edge exists.
        let mut y = 0;
        while y + BLOCK_SIZE < height {
            let mut x = 0;
            while x + BLOCK_SIZE < width {
                let score = self.block_artifact_score(x, y);
                if score > ARTIFACT_THRESHOLD {
                    locations.push(BlockLocation { x, y });
                    total_blockiness += score;
                }
                x += BLOCK_SIZE;
            }
            y += BLOCK_SIZE;
        }

        let block_area = (BLOCK_SIZE * BLOCK_SIZE) as f64;
        let total_blocks = self.pixel_count() / block_area;
        let severity = (locations.len() as f64 / total_blocks * 100.0).min(100.0);

        ArtifactAnalysis {
            severity,
            blockiness: total_blockiness / total_blocks,
            affected_area: locations.len() as f64 * block_area / self.pixel_count(),
            locations,
        }
    }

    /// Mean red-channel step along the block's first row and first column.
    fn block_artifact_score(&self, x: u32, y: u32) -> f64 {
        let bytes = self.buffer.as_bytes();
        let mut score = 0u32;

        for i in 0..BLOCK_SIZE {
            let current = bytes[self.buffer.byte_index(x + i, y)];
            let next = bytes[self.buffer.byte_index(x + i + 1, y)];
            score += current.abs_diff(next) as u32;
        }

        for i in 0..BLOCK_SIZE {
            let current = bytes[self.buffer.byte_index(x, y + i)];
            let next = bytes[self.buffer.byte_index(x, y + i + 1)];
            score += current.abs_diff(next) as u32;
        }

        score as f64 / (2 * BLOCK_SIZE) as f64
    }

    /// `target_compression_level` is a 0-100 level like `current_level`.
    pub fn predict_quality_impact(&self, target_compression_level: f64) -> Result<QualityMetrics> {
        if !(0.0..=100.0).contains(&target_compression_level) {
            return Err(AnalysisError::invalid_parameter(
                "target_compression_level",
                target_compression_level,
            ));
        }

        let current = self.analyze_current_compression().current_level as f64;
        let compression_diff = target_compression_level - current;

        let psnr = (50.0 - compression_diff * 0.3).max(20.0);
        let ssim = (1.0 - compression_diff * 0.005).max(0.5);

        let (visual_impact, quality_score) = if compression_diff > 30.0 {
            (VisualImpact::Severe, (100.0 - compression_diff).max(0.0))
        } else if compression_diff > 20.0 {
            (VisualImpact::Moderate, (100.0 - compression_diff * 1.5).max(40.0))
        } else if compression_diff > 10.0 {
            (VisualImpact::Noticeable, (100.0 - compression_diff * 1.2).max(70.0))
        } else {
            (VisualImpact::Minimal, 100.0)
        };

        Ok(QualityMetrics {
            psnr,
            ssim,
            visual_impact,
            quality_score,
        })
    }

    /// Shannon entropy (bits) of R, G and B values pooled into one distribution.
    pub fn calculate_image_entropy(&self) -> f64 {
        let mut histograms = ChannelHistograms::new();
        for pixel in self.buffer.pixels() {
            histograms.red.record(pixel.red);
            histograms.green.record(pixel.green);
            histograms.blue.record(pixel.blue);
        }
        let pooled = histograms.pooled();
        pooled.entropy(self.buffer.pixel_count() as u64 * 3)
    }

    /// A single-value image has zero entropy, so it reports 100% potential
    /// whenever the encoded file spends any bits at all.
    pub fn analyze_lossless_potential(&self) -> LosslessAnalysis {
        let entropy = self.calculate_image_entropy();
        let current_bpp = self.bits_per_pixel();
        let theoretical_min_bpp = entropy / 3.0;

        let potential =
            ((current_bpp - theoretical_min_bpp) / current_bpp * 100.0).clamp(0.0, 100.0);
        let original = self.original_size as f64;

        let (recommendation, estimated_savings) = if potential > 20.0 {
            ("Significant lossless compression possible", original * (potential / 100.0))
        } else if potential > 10.0 {
            ("Moderate lossless compression possible", original * (potential / 150.0))
        } else if potential > 5.0 {
            ("Minor lossless compression possible", original * (potential / 200.0))
        } else {
            ("Current compression is optimal", 0.0)
        };

        LosslessAnalysis {
            potential,
            entropy,
            recommendation: recommendation.to_string(),
            estimated_savings: estimated_savings.round() as u64,
        }
    }

    pub fn analyze(&self, target_compression_level: f64) -> Result<CompressionAnalysis> {
        Ok(CompressionAnalysis {
            quality_impact: self.predict_quality_impact(target_compression_level)?,
            current_compression: self.analyze_current_compression(),
            format_potential: self.analyze_format_potential(),
            artifacts: self.analyze_artifacts(),
            lossless_potential: self.analyze_lossless_potential(),
        })
    }
}
