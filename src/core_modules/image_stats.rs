// THEORY:
// Basic facts about an image that need no real analysis: reduced aspect ratio,
// a human-readable file size and the mean NTSC luma. Also home to the file
// metadata record the caller hands in next to the pixels, and to the display
// rounding helper shared by the analyzers.

use crate::core_modules::pixel::pixel::PixelBuffer;
use serde::{Deserialize, Serialize};

const BYTES_IN_KB: f64 = 1024.0;
const SIZE_UNITS: [&str; 3] = ["B", "KB", "MB"];

/// What the caller knows about the encoded file the pixels came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    pub size_bytes: u64,
    pub mime_type: String,
    /// Milliseconds since the Unix epoch.
    pub last_modified: Option<u64>,
}

/// Width and height divided by their greatest common divisor, e.g. 16:9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStatistics {
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: AspectRatio,
    pub file_size: String,
    pub mime_type: String,
    pub last_modified: Option<u64>,
    /// Mean NTSC luma in [0, 1].
    pub average_luminance: f64,
}

impl ImageStatistics {
    pub fn collect(buffer: &PixelBuffer, metadata: &ImageMetadata) -> Self {
        Self {
            width: buffer.width(),
            height: buffer.height(),
            aspect_ratio: calculate_aspect_ratio(buffer.width(), buffer.height()),
            file_size: format_file_size(metadata.size_bytes),
            mime_type: metadata.mime_type.clone(),
            last_modified: metadata.last_modified,
            average_luminance: calculate_average_luminance(buffer),
        }
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { gcd(b, a % b) }
}

pub fn calculate_aspect_ratio(width: u32, height: u32) -> AspectRatio {
    let divisor = gcd(width, height).max(1);
    AspectRatio {
        width: width / divisor,
        height: height / divisor,
    }
}

/// Two-decimal size in B, KB or MB; anything larger stays in MB.
pub fn format_file_size(size_in_bytes: u64) -> String {
    let mut size = size_in_bytes as f64;
    let mut unit_index = 0;
    while size >= BYTES_IN_KB && unit_index < SIZE_UNITS.len() - 1 {
        size /= BYTES_IN_KB;
        unit_index += 1;
    }
    format!("{:.2} {}", size, SIZE_UNITS[unit_index])
}

pub fn calculate_average_luminance(buffer: &PixelBuffer) -> f64 {
    let sum: f64 = buffer.pixels().map(|pixel| pixel.luma_ntsc()).sum();
    sum / buffer.pixel_count() as f64 / 255.0
}

/// Rounds to `decimals` places for display.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::pixel::Pixel;

    #[test]
    fn aspect_ratio_is_reduced() {
        assert_eq!(calculate_aspect_ratio(1920, 1080), AspectRatio { width: 16, height: 9 });
        assert_eq!(calculate_aspect_ratio(7, 3).to_string(), "7:3");
    }

    #[test]
    fn file_size_units() {
        assert_eq!(format_file_size(512), "512.00 B");
        assert_eq!(format_file_size(2048), "2.00 KB");
        assert_eq!(format_file_size(1_234_567), "1.18 MB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024), "5120.00 MB");
    }

    #[test]
    fn average_luminance_of_white_is_one() {
        let buffer = PixelBuffer::filled(3, 2, Pixel::new(255, 255, 255, 255)).unwrap();
        assert!((calculate_average_luminance(&buffer) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn statistics_carry_metadata() {
        let buffer = PixelBuffer::filled(4, 2, Pixel::default()).unwrap();
        let metadata = ImageMetadata {
            size_bytes: 100,
            mime_type: "image/png".to_string(),
            last_modified: Some(1_700_000_000_000),
        };
        let stats = ImageStatistics::collect(&buffer, &metadata);
        assert_eq!(stats.aspect_ratio, AspectRatio { width: 2, height: 1 });
        assert_eq!(stats.file_size, "100.00 B");
        assert_eq!(stats.average_luminance, 0.0);
        assert_eq!(stats.last_modified, Some(1_700_000_000_000));
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(2.2124, 2), 2.21);
        assert_eq!(round_to(12.35, 0), 12.0);
    }
}
