// THEORY:
// The histogram engine answers "how are the raw channel values distributed?" in a
// single O(n) pass over the buffer:
//
// - three 256-bin histograms, one per RGB channel;
// - the color balance, i.e. each channel's share of the total channel energy;
// - a grayscale estimate using NTSC luma weights, as a percentage of white.
//
// The NTSC weighting here is deliberately different from the BT.709 weighting in
// the luminance analyzer; see `pixel::LUMA_WEIGHTS_NTSC`.

use crate::core_modules::histogram::ChannelHistograms;
use crate::core_modules::pixel::pixel::PixelBuffer;
use serde::{Deserialize, Serialize};

/// Each channel's share of the summed R+G+B energy, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorBalance {
    pub red_percentage: f64,
    pub green_percentage: f64,
    pub blue_percentage: f64,
}

/// Output of `analyze_image_colors`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorDistribution {
    pub histograms: ChannelHistograms,
    pub balance: ColorBalance,
    /// Mean NTSC luma relative to white, in percent (0-100).
    pub grayscale_percentage: f64,
}

/// Builds channel histograms, color balance and grayscale estimate in one pass.
pub fn analyze_image_colors(buffer: &PixelBuffer) -> ColorDistribution {
    let mut histograms = ChannelHistograms::new();
    let mut total_red = 0u64;
    let mut total_green = 0u64;
    let mut total_blue = 0u64;
    let mut total_gray = 0.0f64;

    for pixel in buffer.pixels() {
        histograms.red.record(pixel.red);
        histograms.green.record(pixel.green);
        histograms.blue.record(pixel.blue);

        total_red += pixel.red as u64;
        total_green += pixel.green as u64;
        total_blue += pixel.blue as u64;
        total_gray += pixel.luma_ntsc();
    }

    let pixel_count = buffer.pixel_count() as f64;
    ColorDistribution {
        histograms,
        balance: color_balance(total_red, total_green, total_blue),
        grayscale_percentage: total_gray / pixel_count / 255.0 * 100.0,
    }
}

/// Splits channel totals into percentages. An all-black image has no channel
/// energy at all and reports 0% for every channel.
fn color_balance(total_red: u64, total_green: u64, total_blue: u64) -> ColorBalance {
    let total_all = (total_red + total_green + total_blue) as f64;
    if total_all == 0.0 {
        return ColorBalance::default();
    }
    ColorBalance {
        red_percentage: total_red as f64 / total_all * 100.0,
        green_percentage: total_green as f64 / total_all * 100.0,
        blue_percentage: total_blue as f64 / total_all * 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::pixel::Pixel;

    fn gradient_buffer() -> PixelBuffer {
        let (width, height) = (16u32, 9u32);
        let mut data = Vec::new();
        for i in 0..(width * height) {
            let value = (i * 7 % 256) as u8;
            data.extend_from_slice(&[value, value / 2, 255 - value, 255]);
        }
        PixelBuffer::new(width, height, data).unwrap()
    }

    #[test]
    fn histogram_bins_sum_to_pixel_count() {
        let buffer = gradient_buffer();
        let result = analyze_image_colors(&buffer);
        let pixels = buffer.pixel_count() as u64;
        assert_eq!(result.histograms.red.total(), pixels);
        assert_eq!(result.histograms.green.total(), pixels);
        assert_eq!(result.histograms.blue.total(), pixels);
    }

    #[test]
    fn balance_sums_to_one_hundred() {
        let result = analyze_image_colors(&gradient_buffer());
        let sum = result.balance.red_percentage
            + result.balance.green_percentage
            + result.balance.blue_percentage;
        assert!((sum - 100.0).abs() < 1e-9, "balance summed to {sum}");
    }

    #[test]
    fn all_black_balance_is_zero() {
        let buffer = PixelBuffer::filled(4, 4, Pixel::new(0, 0, 0, 255)).unwrap();
        let result = analyze_image_colors(&buffer);
        assert_eq!(result.balance, ColorBalance::default());
        assert_eq!(result.grayscale_percentage, 0.0);
    }

    #[test]
    fn pure_red_is_all_red() {
        let buffer = PixelBuffer::filled(2, 2, Pixel::new(200, 0, 0, 255)).unwrap();
        let result = analyze_image_colors(&buffer);
        assert_eq!(result.balance.red_percentage, 100.0);
        assert_eq!(result.histograms.red.count(200), 4);
        // 0.299 * 200 / 255 * 100
        assert!((result.grayscale_percentage - 23.450980392156865).abs() < 1e-9);
    }

    #[test]
    fn white_is_full_grayscale() {
        let buffer = PixelBuffer::filled(3, 3, Pixel::new(255, 255, 255, 255)).unwrap();
        let result = analyze_image_colors(&buffer);
        assert!((result.grayscale_percentage - 100.0).abs() < 1e-9);
    }
}
