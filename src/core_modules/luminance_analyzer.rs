// THEORY:
// The `LuminanceAnalyzer` is the tone-analysis layer. It converts an image into one
// BT.709 luminance value per pixel exactly once, at construction, and then derives
// six independent views from that single array:
//
// 1.  **Brightness distribution**: mean luminance and occupancy of five 51-wide bands.
// 2.  **Histogram**: 256 bins of rounded luminance, as a percentage of all pixels.
// 3.  **Regions**: how much of the frame is dark (< 64) or light (> 192).
// 4.  **Dynamic range**: absolute min-to-max range and the effective range between
//     the 1st and 99th percentiles. Percentiles come from a histogram walk from each
//     end, never from sorting millions of floats.
// 5.  **Gamma estimate**: the average of mid-gray pixels (117 < Y < 137) mapped back
//     through `ln(avg / 255) / ln(0.5)`.
// 6.  **Clipping**: shadow (< 5) and highlight (> 250) loss, with recommendations.
//
// Luminance values are kept as unclamped floats; only the histogram and the
// percentile search round them to integer bins.

use crate::core_modules::histogram::Histogram;
use crate::core_modules::image_stats::round_to;
use crate::core_modules::pixel::pixel::{Luminance, PixelBuffer};
use serde::{Deserialize, Serialize};

const BAND_WIDTH: f64 = 51.0;
const BAND_LABELS: [&str; 5] = ["Very Dark", "Dark", "Medium", "Bright", "Very Bright"];
const ZONE_NAMES: [&str; 5] = [
    "Shadows",
    "Dark Mid-tones",
    "Mid-tones",
    "Light Mid-tones",
    "Highlights",
];

const DARK_MEAN_THRESHOLD: f64 = 85.0;
const BRIGHT_MEAN_THRESHOLD: f64 = 170.0;

const DARK_REGION_THRESHOLD: f64 = 64.0;
const LIGHT_REGION_THRESHOLD: f64 = 192.0;

const MID_GRAY_LOW: f64 = 117.0;
const MID_GRAY_HIGH: f64 = 137.0;
pub const IDEAL_GAMMA: f64 = 2.2;

const SHADOW_CLIP_THRESHOLD: f64 = 5.0;
const HIGHLIGHT_CLIP_THRESHOLD: f64 = 250.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandShare {
    pub range: String,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrightnessDistribution {
    pub mean_brightness: f64,
    pub distribution: Vec<BandShare>,
    pub assessment: String,
}

/// One luminance level and the share of pixels that round to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramPoint {
    pub value: u8,
    /// Percentage of all pixels.
    pub count: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionShare {
    pub percentage: f64,
    pub significance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionAnalysis {
    pub dark_regions: RegionShare,
    pub light_regions: RegionShare,
    pub assessment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZonePresence {
    pub zone: String,
    pub presence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicRangeAnalysis {
    /// Max minus min luminance.
    pub range: f64,
    /// 99th minus 1st percentile, never larger than `range`.
    pub effective_range: f64,
    pub percentile_low: u8,
    pub percentile_high: u8,
    pub assessment: String,
    pub zones: Vec<ZonePresence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GammaCurveAnalysis {
    pub estimated_gamma: f64,
    pub ideal_gamma: f64,
    pub correction: f64,
    /// Number of mid-gray pixels the estimate is based on.
    pub sample_count: usize,
    pub assessment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClippingAnalysis {
    pub shadow_clipping: f64,
    pub highlight_clipping: f64,
    pub assessment: String,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LuminanceAnalysis {
    pub brightness_distribution: BrightnessDistribution,
    pub histogram: Vec<HistogramPoint>,
    pub regions: RegionAnalysis,
    pub dynamic_range_analysis: DynamicRangeAnalysis,
    pub gamma_curve_analysis: GammaCurveAnalysis,
    pub clipping_analysis: ClippingAnalysis,
}

/// Holds the per-pixel luminance of one image and derives every tone analysis from it.
pub struct LuminanceAnalyzer {
    luminance_values: Vec<Luminance>,
}

impl LuminanceAnalyzer {
    pub fn new(buffer: &PixelBuffer) -> Self {
        let luminance_values = buffer.pixels().map(|pixel| pixel.luminance()).collect();
        Self { luminance_values }
    }

    pub fn luminance_values(&self) -> &[Luminance] {
        &self.luminance_values
    }

    fn total(&self) -> f64 {
        self.luminance_values.len() as f64
    }

    fn percentage_where(&self, predicate: impl Fn(f64) -> bool) -> f64 {
        let count = self.luminance_values.iter().filter(|&&v| predicate(v)).count();
        count as f64 / self.total() * 100.0
    }

    /// 256 bins of rounded luminance counts.
    fn rounded_histogram(&self) -> Histogram {
        let mut histogram = Histogram::new();
        for &value in &self.luminance_values {
            histogram.record(value.round().clamp(0.0, 255.0) as u8);
        }
        histogram
    }

    pub fn analyze_brightness_distribution(&self) -> BrightnessDistribution {
        let mean_brightness = self.luminance_values.iter().sum::<f64>() / self.total();

        let mut counts = [0usize; 5];
        for &value in &self.luminance_values {
            counts[band_index(value)] += 1;
        }

        let distribution = BAND_LABELS
            .iter()
            .zip(counts.iter())
            .map(|(label, &count)| BandShare {
                range: label.to_string(),
                percentage: round_to(count as f64 / self.total() * 100.0, 1),
            })
            .collect();

        let assessment = if mean_brightness < DARK_MEAN_THRESHOLD {
            "The image tends to be dark, which might affect visibility in low-light conditions."
        } else if mean_brightness > BRIGHT_MEAN_THRESHOLD {
            "The image is generally bright, which might cause eye strain in dark environments."
        } else {
            "The image has a balanced brightness distribution."
        };

        BrightnessDistribution {
            mean_brightness: round_to(mean_brightness, 1),
            distribution,
            assessment: assessment.to_string(),
        }
    }

    pub fn generate_histogram(&self) -> Vec<HistogramPoint> {
        self.rounded_histogram()
            .percentages(self.luminance_values.len() as u64)
            .into_iter()
            .enumerate()
            .map(|(value, count)| HistogramPoint {
                value: value as u8,
                count,
            })
            .collect()
    }

    pub fn analyze_regions(&self) -> RegionAnalysis {
        let dark_percentage = self.percentage_where(|v| v < DARK_REGION_THRESHOLD);
        let light_percentage = self.percentage_where(|v| v > LIGHT_REGION_THRESHOLD);

        let dark_significance = if dark_percentage > 40.0 {
            "Dominant dark regions may obscure details"
        } else if dark_percentage > 20.0 {
            "Balanced dark areas provide good contrast"
        } else {
            "Limited dark areas maintain good visibility"
        };

        let light_significance = if light_percentage > 40.0 {
            "Large bright areas might cause glare"
        } else if light_percentage > 20.0 {
            "Well-balanced highlight areas"
        } else {
            "Conservative use of bright regions"
        };

        let assessment = if dark_percentage > 40.0 && light_percentage > 40.0 {
            "High contrast image with potential loss of mid-tone details"
        } else if dark_percentage < 10.0 && light_percentage < 10.0 {
            "Low contrast image that might appear flat"
        } else {
            "Well-balanced distribution of dark and light regions"
        };

        RegionAnalysis {
            dark_regions: RegionShare {
                percentage: round_to(dark_percentage, 1),
                significance: dark_significance.to_string(),
            },
            light_regions: RegionShare {
                percentage: round_to(light_percentage, 1),
                significance: light_significance.to_string(),
            },
            assessment: assessment.to_string(),
        }
    }

    pub fn calculate_dynamic_range(&self) -> DynamicRangeAnalysis {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut zones = [0usize; 5];
        for &value in &self.luminance_values {
            min = min.min(value);
            max = max.max(value);
            zones[band_index(value)] += 1;
        }

        let histogram = self.rounded_histogram();
        let tail = self.total() * 0.01;

        let mut cumulative = 0u64;
        let mut percentile_low = 0u8;
        for (level, &count) in histogram.bins().iter().enumerate() {
            cumulative += count as u64;
            if cumulative as f64 >= tail {
                percentile_low = level as u8;
                break;
            }
        }

        // The top tail uses the same 1% pixel count as the bottom one.
        cumulative = 0;
        let mut percentile_high = 255u8;
        for (level, &count) in histogram.bins().iter().enumerate().rev() {
            cumulative += count as u64;
            if cumulative as f64 >= tail {
                percentile_high = level as u8;
                break;
            }
        }

        let absolute_range = max - min;
        // Rounding to bins can stretch a very narrow range; the effective range
        // is a sub-range of the absolute one.
        let effective_range =
            (percentile_high as f64 - percentile_low as f64).min(absolute_range);

        let assessment = if effective_range > 200.0 {
            "Very high dynamic range - ensure display capability matches"
        } else if effective_range > 150.0 {
            "Good dynamic range for most displays"
        } else if effective_range > 100.0 {
            "Moderate dynamic range - suitable for web display"
        } else {
            "Limited dynamic range - consider contrast enhancement"
        };

        DynamicRangeAnalysis {
            range: round_to(absolute_range, 1),
            effective_range: round_to(effective_range, 1),
            percentile_low,
            percentile_high,
            assessment: assessment.to_string(),
            zones: ZONE_NAMES
                .iter()
                .zip(zones.iter())
                .map(|(zone, &count)| ZonePresence {
                    zone: zone.to_string(),
                    presence: round_to(count as f64 / self.total() * 100.0, 1),
                })
                .collect(),
        }
    }

    pub fn analyze_gamma_curve(&self) -> GammaCurveAnalysis {
        let (sum, sample_count) = self
            .luminance_values
            .iter()
            .filter(|&&v| v > MID_GRAY_LOW && v < MID_GRAY_HIGH)
            .fold((0.0, 0usize), |(sum, count), &v| (sum + v, count + 1));

        if sample_count == 0 {
            log::warn!("No mid-gray pixels; falling back to ideal gamma");
            return GammaCurveAnalysis {
                estimated_gamma: IDEAL_GAMMA,
                ideal_gamma: IDEAL_GAMMA,
                correction: 1.0,
                sample_count,
                assessment: "Not enough mid-tone pixels to estimate gamma".to_string(),
            };
        }

        let average_middle_gray = sum / sample_count as f64;
        let estimated_gamma = (average_middle_gray / 255.0).ln() / 0.5f64.ln();
        let correction = IDEAL_GAMMA / estimated_gamma;

        let assessment = if estimated_gamma < 1.8 {
            "Image appears dark - gamma correction might improve visibility"
        } else if estimated_gamma > 2.6 {
            "Image appears bright - consider reducing gamma"
        } else {
            "Gamma is well-balanced for standard displays"
        };

        GammaCurveAnalysis {
            estimated_gamma: round_to(estimated_gamma, 2),
            ideal_gamma: IDEAL_GAMMA,
            correction: round_to(correction, 2),
            sample_count,
            assessment: assessment.to_string(),
        }
    }

    pub fn detect_clipping(&self) -> ClippingAnalysis {
        let shadow_percentage = self.percentage_where(|v| v < SHADOW_CLIP_THRESHOLD);
        let highlight_percentage = self.percentage_where(|v| v > HIGHLIGHT_CLIP_THRESHOLD);

        let mut recommendations = Vec::new();
        if shadow_percentage > 5.0 {
            recommendations.push("Consider lifting shadows to recover detail".to_string());
        }
        if highlight_percentage > 5.0 {
            recommendations.push("Reduce exposure to recover highlight detail".to_string());
        }
        if shadow_percentage > 2.0 && highlight_percentage > 2.0 {
            recommendations.push("Consider using HDR techniques to preserve detail".to_string());
        }

        let assessment = match (shadow_percentage > 5.0, highlight_percentage > 5.0) {
            (true, true) => "Significant detail loss in both shadows and highlights",
            (true, false) => "Notable shadow detail loss",
            (false, true) => "Significant highlight clipping",
            (false, false) => "Good detail preservation across tonal range",
        };

        ClippingAnalysis {
            shadow_clipping: round_to(shadow_percentage, 1),
            highlight_clipping: round_to(highlight_percentage, 1),
            assessment: assessment.to_string(),
            recommendations,
        }
    }

    pub fn get_analysis(&self) -> LuminanceAnalysis {
        LuminanceAnalysis {
            brightness_distribution: self.analyze_brightness_distribution(),
            histogram: self.generate_histogram(),
            regions: self.analyze_regions(),
            dynamic_range_analysis: self.calculate_dynamic_range(),
            gamma_curve_analysis: self.analyze_gamma_curve(),
            clipping_analysis: self.detect_clipping(),
        }
    }
}

/// Band / zone index for a luminance value; the top band includes 255.
#[inline]
fn band_index(value: f64) -> usize {
    ((value / BAND_WIDTH).floor().max(0.0) as usize).min(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::pixel::Pixel;

    fn gray(width: u32, height: u32, level: u8) -> PixelBuffer {
        PixelBuffer::filled(width, height, Pixel::new(level, level, level, 255)).unwrap()
    }

    #[test]
    fn all_white_scenario() {
        let analysis = LuminanceAnalyzer::new(&gray(2, 2, 255)).get_analysis();

        assert_eq!(analysis.histogram[255].count, 100.0);
        assert_eq!(analysis.histogram.len(), 256);

        let brightness = &analysis.brightness_distribution;
        assert_eq!(brightness.mean_brightness, 255.0);
        let very_bright = brightness
            .distribution
            .iter()
            .find(|band| band.range == "Very Bright")
            .unwrap();
        assert_eq!(very_bright.percentage, 100.0);

        assert_eq!(analysis.clipping_analysis.shadow_clipping, 0.0);
        assert_eq!(analysis.clipping_analysis.highlight_clipping, 100.0);
        assert_eq!(
            analysis.clipping_analysis.recommendations,
            vec!["Reduce exposure to recover highlight detail".to_string()]
        );
    }

    #[test]
    fn uniform_luminance_has_zero_range() {
        let range = LuminanceAnalyzer::new(&gray(5, 5, 90)).calculate_dynamic_range();
        assert_eq!(range.range, 0.0);
        assert_eq!(range.effective_range, 0.0);
    }

    #[test]
    fn effective_range_never_exceeds_absolute_range() {
        // Two neighboring levels whose luminance rounds into different bins.
        let data: Vec<u8> = vec![10, 10, 10, 255, 11, 11, 11, 255];
        let buffer = PixelBuffer::new(2, 1, data).unwrap();
        let range = LuminanceAnalyzer::new(&buffer).calculate_dynamic_range();
        assert!(range.effective_range <= range.range);

        let mut data = Vec::new();
        for i in 0..=255u8 {
            data.extend_from_slice(&[i, i, i, 255]);
        }
        let ramp = PixelBuffer::new(256, 1, data).unwrap();
        let range = LuminanceAnalyzer::new(&ramp).calculate_dynamic_range();
        assert!(range.effective_range <= range.range);
        // 1% of 256 px is 2.56, reached after three bins from either end.
        assert_eq!(range.percentile_low, 2);
        assert_eq!(range.percentile_high, 253);
        assert_eq!(range.effective_range, 251.0);
        assert_eq!(range.range, 255.0);
        assert_eq!(range.zones.len(), 5);
    }

    /// 100 px of mid gray with one pixel replaced by `outlier`.
    fn gray_with_outlier(outlier: u8) -> PixelBuffer {
        let mut data: Vec<u8> = [128, 128, 128, 255].repeat(100);
        data[..4].copy_from_slice(&[outlier, outlier, outlier, 255]);
        PixelBuffer::new(10, 10, data).unwrap()
    }

    #[test]
    fn a_tail_of_exactly_one_percent_sets_the_percentile() {
        let dark = LuminanceAnalyzer::new(&gray_with_outlier(0)).calculate_dynamic_range();
        assert_eq!(dark.percentile_low, 0);
        assert_eq!(dark.percentile_high, 128);
        assert_eq!(dark.effective_range, 128.0);

        let bright = LuminanceAnalyzer::new(&gray_with_outlier(255)).calculate_dynamic_range();
        assert_eq!(bright.percentile_low, 128);
        assert_eq!(bright.percentile_high, 255);
    }

    #[test]
    fn gamma_falls_back_without_mid_gray_pixels() {
        let gamma = LuminanceAnalyzer::new(&gray(3, 3, 0)).analyze_gamma_curve();
        assert_eq!(gamma.sample_count, 0);
        assert_eq!(gamma.estimated_gamma, IDEAL_GAMMA);
        assert_eq!(gamma.correction, 1.0);
        assert!(gamma.estimated_gamma.is_finite());
    }

    #[test]
    fn gamma_of_mid_gray_is_close_to_one() {
        // Y = 127.5 would be exactly gamma 1; 128 is a hair above.
        let gamma = LuminanceAnalyzer::new(&gray(2, 2, 128)).analyze_gamma_curve();
        assert_eq!(gamma.sample_count, 4);
        assert_eq!(gamma.estimated_gamma, 0.99);
        assert_eq!(gamma.correction, 2.21);
    }

    #[test]
    fn dark_and_light_halves_are_high_contrast() {
        let mut data = Vec::new();
        for i in 0..8 {
            let level = if i < 4 { 0 } else { 255 };
            data.extend_from_slice(&[level, level, level, 255]);
        }
        let buffer = PixelBuffer::new(4, 2, data).unwrap();
        let analyzer = LuminanceAnalyzer::new(&buffer);

        let regions = analyzer.analyze_regions();
        assert_eq!(regions.dark_regions.percentage, 50.0);
        assert_eq!(regions.light_regions.percentage, 50.0);
        assert_eq!(
            regions.assessment,
            "High contrast image with potential loss of mid-tone details"
        );

        let clipping = analyzer.detect_clipping();
        assert_eq!(clipping.recommendations.len(), 3);
    }

    #[test]
    fn histogram_percentages_sum_to_one_hundred() {
        let mut data = Vec::new();
        for i in 0..100u32 {
            data.extend_from_slice(&[(i * 2) as u8, (i * 3 % 256) as u8, 40, 255]);
        }
        let buffer = PixelBuffer::new(10, 10, data).unwrap();
        let histogram = LuminanceAnalyzer::new(&buffer).generate_histogram();
        let sum: f64 = histogram.iter().map(|point| point.count).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }
}
