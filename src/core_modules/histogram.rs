// THEORY:
// A `Histogram` is the shared currency of the color, luminance, compression and
// structure analyzers: 256 counters indexed by an 8-bit intensity. It is always
// exactly 256 bins long and, when filled from one channel of a buffer, its bins
// sum to that buffer's pixel count.
//
// Bins are stored in a `Vec` rather than a fixed array so the type serializes as
// a plain JSON array (serde only derives for arrays up to 32 elements).

use serde::{Deserialize, Serialize};

/// Number of intensity levels in an 8-bit channel.
pub const BINS: usize = 256;

/// A 256-bin frequency count over 8-bit intensities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Histogram {
    bins: Vec<u32>,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    pub fn new() -> Self {
        Self {
            bins: vec![0; BINS],
        }
    }

    #[inline]
    pub fn record(&mut self, value: u8) {
        self.bins[value as usize] += 1;
    }

    pub fn bins(&self) -> &[u32] {
        &self.bins
    }

    pub fn count(&self, value: u8) -> u32 {
        self.bins[value as usize]
    }

    /// Sum of all bins.
    pub fn total(&self) -> u64 {
        self.bins.iter().map(|&count| count as u64).sum()
    }

    /// Each bin as a percentage of `total`. A zero total yields all zeros.
    pub fn percentages(&self, total: u64) -> Vec<f64> {
        if total == 0 {
            return vec![0.0; BINS];
        }
        self.bins
            .iter()
            .map(|&count| count as f64 / total as f64 * 100.0)
            .collect()
    }

    /// Shannon entropy in bits of the distribution `bins / total`.
    pub fn entropy(&self, total: u64) -> f64 {
        if total == 0 {
            return 0.0;
        }
        self.bins
            .iter()
            .filter(|&&count| count > 0)
            .map(|&count| {
                let probability = count as f64 / total as f64;
                -probability * probability.log2()
            })
            .sum()
    }

    /// Adds another histogram's counts into this one.
    pub fn merge(&mut self, other: &Histogram) {
        for (bin, &count) in self.bins.iter_mut().zip(other.bins.iter()) {
            *bin += count;
        }
    }
}

/// Per-channel histograms for R, G and B.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelHistograms {
    pub red: Histogram,
    pub green: Histogram,
    pub blue: Histogram,
}

impl ChannelHistograms {
    pub fn new() -> Self {
        Self {
            red: Histogram::new(),
            green: Histogram::new(),
            blue: Histogram::new(),
        }
    }

    /// All three channels pooled into one 256-bin histogram (total = 3 * pixels).
    pub fn pooled(&self) -> Histogram {
        let mut pooled = self.red.clone();
        pooled.merge(&self.green);
        pooled.merge(&self.blue);
        pooled
    }
}

impl Default for ChannelHistograms {
    fn default() -> Self {
        Self::new()
    }
}
