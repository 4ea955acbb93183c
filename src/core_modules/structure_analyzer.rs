// THEORY:
// The `StructureAnalyzer` looks at spatial structure rather than color. All of its
// measures run on the unweighted channel mean `(R + G + B) / 3`:
//
// - **Pixel density**: histogram of the floored mean.
// - **Adjacent variation**: mean absolute difference between each pixel and the
//   next one in raster order (a 1D neighborhood, so the step from the end of one
//   row to the start of the next is counted too). It is reported twice, once as
//   the noise level and once as texture complexity; both names read the same
//   primitive so they can never drift apart.
// - **Edges**: a two-tap central-difference gradient on interior pixels,
//   `gx = right - left`, `gy = below - above`, magnitude `sqrt(gx^2 + gy^2)`.
//   Pixels above the edge threshold are counted and their magnitudes averaged.
// - **Solid regions**: share of pixels whose next pixel is within a small
//   per-channel tolerance.
// - **Resolution adequacy**: a plain size check.

use crate::core_modules::histogram::Histogram;
use crate::core_modules::pixel::pixel::{Brightness, PixelBuffer};
use serde::{Deserialize, Serialize};

pub const EDGE_MAGNITUDE_THRESHOLD: f64 = 30.0;
pub const SOLID_CHANNEL_TOLERANCE: u8 = 5;
pub const MIN_ADEQUATE_WIDTH: u32 = 800;
pub const MIN_ADEQUATE_HEIGHT: u32 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeDetection {
    pub edges: u64,
    /// Mean gradient magnitude over edge pixels; 0 when there are none.
    pub strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureAnalysis {
    pub pixel_density: Histogram,
    pub noise_level: f64,
    pub edge_detection: EdgeDetection,
    pub texture_complexity: f64,
    /// Percent of pixels.
    pub solid_regions: f64,
    pub resolution_adequate: bool,
}

pub struct StructureAnalyzer<'a> {
    buffer: &'a PixelBuffer,
}

impl<'a> StructureAnalyzer<'a> {
    pub fn new(buffer: &'a PixelBuffer) -> Self {
        Self { buffer }
    }

    pub fn pixel_density(&self) -> Histogram {
        let mut histogram = Histogram::new();
        for pixel in self.buffer.pixels() {
            histogram.record((pixel.channel_sum() / 3) as u8);
        }
        histogram
    }

    /// Sum of |mean(i) - mean(i + 1)| over raster-order neighbors, divided by the pixel count.
    pub fn adjacent_brightness_variation(&self) -> f64 {
        let mut pixels = self.buffer.pixels();
        let Some(first) = pixels.next() else {
            return 0.0;
        };

        let mut previous: Brightness = first.brightness();
        let mut total_variation = 0.0;
        for pixel in pixels {
            let current = pixel.brightness();
            total_variation += (previous - current).abs();
            previous = current;
        }
        total_variation / self.buffer.pixel_count() as f64
    }

    pub fn noise_level(&self) -> f64 {
        self.adjacent_brightness_variation()
    }

    pub fn texture_complexity(&self) -> f64 {
        self.adjacent_brightness_variation()
    }

    pub fn detect_edges(&self) -> EdgeDetection {
        let width = self.buffer.width();
        let height = self.buffer.height();
        let mut edges = 0u64;
        let mut total_strength = 0.0;

        for y in 1..height.saturating_sub(1) {
            for x in 1..width.saturating_sub(1) {
                let magnitude = self.gradient_magnitude(x, y);
                if magnitude > EDGE_MAGNITUDE_THRESHOLD {
                    edges += 1;
                    total_strength += magnitude;
                }
            }
        }

        let strength = if edges == 0 {
            0.0
        } else {
            total_strength / edges as f64
        };
        EdgeDetection { edges, strength }
    }

    #[inline]
    fn gradient_magnitude(&self, x: u32, y: u32) -> f64 {
        let brightness_at = |x: u32, y: u32| self.buffer.pixel_at(x, y).brightness();
        let gx = brightness_at(x + 1, y) - brightness_at(x - 1, y);
        let gy = brightness_at(x, y + 1) - brightness_at(x, y - 1);
        (gx * gx + gy * gy).sqrt()
    }

    /// Percent of pixels whose raster-order successor matches within the channel tolerance.
    pub fn solid_regions(&self) -> f64 {
        let mut pixels = self.buffer.pixels();
        let Some(mut previous) = pixels.next() else {
            return 0.0;
        };

        let mut solid_pixels = 0u64;
        for pixel in pixels {
            if previous.is_similar(&pixel, SOLID_CHANNEL_TOLERANCE) {
                solid_pixels += 1;
            }
            previous = pixel;
        }
        solid_pixels as f64 / self.buffer.pixel_count() as f64 * 100.0
    }

    pub fn resolution_adequate(&self) -> bool {
        self.buffer.width() >= MIN_ADEQUATE_WIDTH && self.buffer.height() >= MIN_ADEQUATE_HEIGHT
    }

    pub fn analyze(&self) -> StructureAnalysis {
        let variation = self.adjacent_brightness_variation();
        StructureAnalysis {
            pixel_density: self.pixel_density(),
            noise_level: variation,
            edge_detection: self.detect_edges(),
            texture_complexity: variation,
            solid_regions: self.solid_regions(),
            resolution_adequate: self.resolution_adequate(),
        }
    }
}
