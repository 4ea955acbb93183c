// THEORY:
// The `ColorClusterer` finds the colors that best summarize an image. It offers two
// lenses:
//
// 1.  **k-means in RGB space** (`find_dominant_colors`): every pixel is a point
//     (R, G, B); alpha is ignored. Centroids start as k pixels sampled uniformly at
//     random, then alternate between assignment (nearest centroid by Euclidean
//     distance, ties to the lowest index) and update (integer-rounded mean of the
//     assigned points) until the centroids stop moving or the iteration cap is hit.
//     A cluster that attracts no points takes the previous iteration's first
//     centroid. The randomness comes from a caller-supplied RNG so runs can be
//     reproduced with a seed.
// 2.  **Exact frequency** (`most_frequent_colors`): counts identical RGB triples and
//     returns the most common ones. Cheap and deterministic, but noisy on photos.
//
// Memory: pixels are streamed straight from the buffer on every pass. Clusters are
// kept as running sums and counts, so no per-pixel copy of the image is ever made.
//
// The module also hosts `calculate_saturation` and the combined
// `ColorAnalysisResult` that the color view consumes.

use crate::config::AnalysisConfig;
use crate::core_modules::histogram::ChannelHistograms;
use crate::core_modules::histogram_engine::{self, ColorBalance};
use crate::core_modules::pixel::pixel::{Color, PixelBuffer};
use crate::error::{AnalysisError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_CLUSTER_COUNT: usize = 5;
pub const DEFAULT_MAX_ITERATIONS: u32 = 20;

type Centroid = [f64; 3];

/// Everything the color view shows for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorAnalysisResult {
    pub dominant_colors: Vec<Color>,
    /// Mean HSV saturation in [0, 1].
    pub saturation: f64,
    pub histograms: ChannelHistograms,
    pub color_balance: ColorBalance,
    pub grayscale_percentage: f64,
}

/// Runs k-means, saturation and the histogram engine for one image.
pub fn analyze_colors(buffer: &PixelBuffer, config: &AnalysisConfig) -> Result<ColorAnalysisResult> {
    let mut rng = rng_for(config.kmeans_seed);
    let dominant_colors = find_dominant_colors(
        buffer,
        config.dominant_color_count,
        config.max_kmeans_iterations,
        &mut rng,
    )?;
    let distribution = histogram_engine::analyze_image_colors(buffer);

    Ok(ColorAnalysisResult {
        dominant_colors,
        saturation: calculate_saturation(buffer),
        histograms: distribution.histograms,
        color_balance: distribution.balance,
        grayscale_percentage: distribution.grayscale_percentage,
    })
}

/// A seeded generator when a seed is configured, otherwise one seeded from the OS.
pub fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Finds `k` dominant colors by k-means clustering in RGB space.
///
/// Returns exactly `k` colors. Duplicates are possible when the image has fewer
/// distinct colors than `k` or when a cluster ends up empty.
pub fn find_dominant_colors<R: Rng + ?Sized>(
    buffer: &PixelBuffer,
    k: usize,
    max_iterations: u32,
    rng: &mut R,
) -> Result<Vec<Color>> {
    if k == 0 {
        return Err(AnalysisError::invalid_parameter("k", k));
    }

    let pixel_count = buffer.pixel_count();
    let width = buffer.width() as usize;
    let mut centroids: Vec<Centroid> = (0..k)
        .map(|_| {
            let index = rng.gen_range(0..pixel_count);
            let pixel = buffer.pixel_at((index % width) as u32, (index / width) as u32);
            point_of(pixel.red, pixel.green, pixel.blue)
        })
        .collect();

    let mut sums = vec![[0.0f64; 3]; k];
    let mut counts = vec![0u64; k];

    for iteration in 0..max_iterations {
        sums.iter_mut().for_each(|sum| *sum = [0.0; 3]);
        counts.iter_mut().for_each(|count| *count = 0);

        for pixel in buffer.pixels() {
            let point = point_of(pixel.red, pixel.green, pixel.blue);
            let closest = nearest_centroid(&point, &centroids);
            let sum = &mut sums[closest];
            sum[0] += point[0];
            sum[1] += point[1];
            sum[2] += point[2];
            counts[closest] += 1;
        }

        let new_centroids: Vec<Centroid> = sums
            .iter()
            .zip(counts.iter())
            .map(|(sum, &count)| {
                if count == 0 {
                    centroids[0]
                } else {
                    let count = count as f64;
                    [
                        (sum[0] / count).round(),
                        (sum[1] / count).round(),
                        (sum[2] / count).round(),
                    ]
                }
            })
            .collect();

        if new_centroids == centroids {
            log::debug!("k-means converged after {} iterations", iteration + 1);
            break;
        }
        centroids = new_centroids;
    }

    Ok(centroids
        .iter()
        .map(|centroid| Color::new(centroid[0] as u8, centroid[1] as u8, centroid[2] as u8))
        .collect())
}

#[inline]
fn point_of(red: u8, green: u8, blue: u8) -> Centroid {
    [red as f64, green as f64, blue as f64]
}

/// Index of the closest centroid; the first minimum wins ties.
#[inline]
fn nearest_centroid(point: &Centroid, centroids: &[Centroid]) -> usize {
    let mut min_distance = f64::INFINITY;
    let mut closest_index = 0;
    for (index, centroid) in centroids.iter().enumerate() {
        // Squared distance orders points exactly like the Euclidean distance.
        let distance = (point[0] - centroid[0]).powi(2)
            + (point[1] - centroid[1]).powi(2)
            + (point[2] - centroid[2]).powi(2);
        if distance < min_distance {
            min_distance = distance;
            closest_index = index;
        }
    }
    closest_index
}

/// The `n` most frequent exact RGB triples, most common first.
/// Ties keep the order in which the colors first appear in the image.
pub fn most_frequent_colors(buffer: &PixelBuffer, n: usize) -> Vec<Color> {
    let mut counts: HashMap<Color, (u64, usize)> = HashMap::new();
    for (index, pixel) in buffer.pixels().enumerate() {
        counts
            .entry(pixel.color())
            .and_modify(|(count, _)| *count += 1)
            .or_insert((1, index));
    }

    let mut ranked: Vec<(Color, u64, usize)> = counts
        .into_iter()
        .map(|(color, (count, first_seen))| (color, count, first_seen))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.into_iter().take(n).map(|(color, _, _)| color).collect()
}

/// Mean HSV saturation over all pixels, in [0, 1].
pub fn calculate_saturation(buffer: &PixelBuffer) -> f64 {
    let total: f64 = buffer.pixels().map(|pixel| pixel.saturation_hsv()).sum();
    total / buffer.pixel_count() as f64
}
