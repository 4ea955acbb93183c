// THEORY:
// The `pixel` module is the leaf of the whole engine. It owns the two data types
// every analyzer reads from:
//
// - `PixelBuffer`: an immutable view over one decoded image (width, height and
//   row-major RGBA bytes). The bytes live behind an `Arc<[u8]>`, so cloning a
//   buffer to hand it to another worker never copies pixel data, and nothing can
//   mutate it while analyses are in flight.
// - `Pixel`: a "dumb" container for one RGBA sample plus the single-pixel
//   heuristics (luminance, luma, brightness, saturation) that the analyzers build on.
//
// Key principles:
// 1) Validate once: a `PixelBuffer` can only be constructed with non-zero
//    dimensions and a byte length of exactly width * height * 4. Analyzers can
//    therefore assume at least one pixel and never re-check.
// 2) Single-pixel scope: heuristics here never look at neighbors. Adjacency
//    metrics (gradients, noise, blockiness) live in the analyzers.
// 3) Two brightness weightings coexist on purpose. The luminance analyzer uses
//    ITU-R BT.709 weights, the color statistics use NTSC (Rec. 601) weights.
//    Both are kept as separately named constants because downstream numbers
//    depend on each exact formula.

pub mod pixel {
    use crate::error::{AnalysisError, Result};
    use serde::{Deserialize, Serialize};
    use std::sync::Arc;

    pub type Byte = u8;
    pub type Channel = Byte;
    pub type Luminance = f64;
    pub type Brightness = f64;
    pub type SaturationHSV = f64;

    /// Bytes per pixel in every buffer (R, G, B, A).
    pub const CHANNELS: usize = 4;

    /// ITU-R BT.709 luminance weights for (R, G, B).
    pub const LUMINANCE_WEIGHTS_BT709: [f64; 3] = [0.2126, 0.7152, 0.0722];

    /// NTSC / Rec. 601 luma weights for (R, G, B).
    pub const LUMA_WEIGHTS_NTSC: [f64; 3] = [0.299, 0.587, 0.114];

    /// An opaque RGB color, as returned by the dominant-color analyses.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Color {
        pub r: u8,
        pub g: u8,
        pub b: u8,
    }

    impl Color {
        pub fn new(r: u8, g: u8, b: u8) -> Self {
            Self { r, g, b }
        }

        /// `#RRGGBB` representation for display.
        pub fn to_hex(&self) -> String {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        }
    }

    /// A "dumb" data container representing a single RGBA pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha channel value (0-255). Ignored by every analysis.
        pub alpha: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Self {
                red,
                green,
                blue,
                alpha,
            }
        }

        /// =================================Heuristics==================================

        /// Relative luminance with BT.709 weights, unclamped, range [0, 255].
        pub fn luminance(&self) -> Luminance {
            Self::weighted(self, &LUMINANCE_WEIGHTS_BT709)
        }

        /// Luma with NTSC weights, range [0, 255].
        pub fn luma_ntsc(&self) -> Luminance {
            Self::weighted(self, &LUMA_WEIGHTS_NTSC)
        }

        #[inline]
        fn weighted(&self, weights: &[f64; 3]) -> Luminance {
            weights[0] * self.red as f64
                + weights[1] * self.green as f64
                + weights[2] * self.blue as f64
        }

        /// Unweighted channel mean `(R + G + B) / 3`.
        pub fn brightness(&self) -> Brightness {
            self.channel_sum() as f64 / 3.0
        }

        /// Raw RGB channel sum (0..=765).
        pub fn channel_sum(&self) -> u32 {
            self.red as u32 + self.green as u32 + self.blue as u32
        }

        /// HSV saturation `(max - min) / max` on normalized channels; 0 for black.
        pub fn saturation_hsv(&self) -> SaturationHSV {
            let red = self.red as f64 / 255.0;
            let green = self.green as f64 / 255.0;
            let blue = self.blue as f64 / 255.0;

            let maximum_channel = red.max(green).max(blue);
            let minimum_channel = red.min(green).min(blue);
            if maximum_channel == 0.0 {
                return 0.0;
            }
            (maximum_channel - minimum_channel) / maximum_channel
        }

        /// Sum of absolute per-channel RGB differences against another pixel.
        pub fn channel_difference(&self, other: &Pixel) -> u32 {
            self.red.abs_diff(other.red) as u32
                + self.green.abs_diff(other.green) as u32
                + self.blue.abs_diff(other.blue) as u32
        }

        /// True when every RGB channel differs from `other` by at most `tolerance`.
        pub fn is_similar(&self, other: &Pixel, tolerance: u8) -> bool {
            self.red.abs_diff(other.red) <= tolerance
                && self.green.abs_diff(other.green) <= tolerance
                && self.blue.abs_diff(other.blue) <= tolerance
        }

        pub fn color(&self) -> Color {
            Color::new(self.red, self.green, self.blue)
        }
    }

    impl From<&[Byte]> for Pixel {
        fn from(bytes: &[Byte]) -> Self {
            if bytes.len() != CHANNELS {
                panic!("Cannot convert {} bytes into pixel.", bytes.len());
            }
            Pixel::new(bytes[0], bytes[1], bytes[2], bytes[3])
        }
    }

    /// An immutable, cheaply clonable view over one decoded RGBA image.
    #[derive(Debug, Clone)]
    pub struct PixelBuffer {
        width: u32,
        height: u32,
        data: Arc<[u8]>,
    }

    impl PixelBuffer {
        /// Wraps decoded RGBA bytes, rejecting zero dimensions and length mismatches.
        pub fn new(width: u32, height: u32, data: impl Into<Arc<[u8]>>) -> Result<Self> {
            if width == 0 || height == 0 {
                return Err(AnalysisError::InvalidDimensions { width, height });
            }
            let data = data.into();
            let expected = width as usize * height as usize * CHANNELS;
            if data.len() != expected {
                return Err(AnalysisError::InvalidBuffer {
                    expected,
                    actual: data.len(),
                });
            }
            Ok(Self {
                width,
                height,
                data,
            })
        }

        /// Builds a buffer where every pixel has the same value.
        pub fn filled(width: u32, height: u32, pixel: Pixel) -> Result<Self> {
            let count = width as usize * height as usize;
            let mut data = Vec::with_capacity(count * CHANNELS);
            for _ in 0..count {
                data.extend_from_slice(&[pixel.red, pixel.green, pixel.blue, pixel.alpha]);
            }
            Self::new(width, height, data)
        }

        pub fn width(&self) -> u32 {
            self.width
        }

        pub fn height(&self) -> u32 {
            self.height
        }

        /// Number of pixels; always at least 1.
        pub fn pixel_count(&self) -> usize {
            self.width as usize * self.height as usize
        }

        pub fn as_bytes(&self) -> &[u8] {
            &self.data
        }

        /// Streams pixels in raster order without copying the buffer.
        pub fn pixels(&self) -> impl ExactSizeIterator<Item = Pixel> + '_ {
            self.data.chunks_exact(CHANNELS).map(Pixel::from)
        }

        /// Byte offset of the red channel of pixel (x, y).
        #[inline]
        pub fn byte_index(&self, x: u32, y: u32) -> usize {
            (y as usize * self.width as usize + x as usize) * CHANNELS
        }

        /// The pixel at (x, y). Callers must stay inside the image.
        #[inline]
        pub fn pixel_at(&self, x: u32, y: u32) -> Pixel {
            let index = self.byte_index(x, y);
            Pixel::from(&self.data[index..index + CHANNELS])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pixel::*;
    use crate::error::AnalysisError;

    #[test]
    fn rejects_zero_dimensions() {
        let err = PixelBuffer::new(0, 4, Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InvalidDimensions {
                width: 0,
                height: 4
            }
        ));
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = PixelBuffer::new(2, 2, vec![0u8; 12]).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InvalidBuffer {
                expected: 16,
                actual: 12
            }
        ));
    }

    #[test]
    fn clones_share_pixel_storage() {
        let buffer = PixelBuffer::filled(3, 2, Pixel::new(10, 20, 30, 255)).unwrap();
        let copy = buffer.clone();
        assert_eq!(buffer.as_bytes().as_ptr(), copy.as_bytes().as_ptr());
        assert_eq!(copy.pixel_count(), 6);
        assert_eq!(copy.pixel_at(2, 1), Pixel::new(10, 20, 30, 255));
    }

    #[test]
    fn gray_pixels_have_no_saturation() {
        assert_eq!(Pixel::new(128, 128, 128, 255).saturation_hsv(), 0.0);
        assert_eq!(Pixel::new(0, 0, 0, 255).saturation_hsv(), 0.0);
        assert!((Pixel::new(255, 0, 0, 255).saturation_hsv() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn weightings_differ_for_colored_pixels() {
        let green = Pixel::new(0, 255, 0, 255);
        assert!((green.luminance() - 0.7152 * 255.0).abs() < 1e-9);
        assert!((green.luma_ntsc() - 0.587 * 255.0).abs() < 1e-9);
    }

    #[test]
    fn color_hex_is_uppercase() {
        assert_eq!(Color::new(255, 128, 0).to_hex(), "#FF8000");
    }
}
