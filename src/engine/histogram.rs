//! Coarse-resolution aggregation of any interval-shaped feature into bins.

use super::interval::GenomicInterval;
use serde::Serialize;

/// Anything with an inclusive 1-based span and an optional score.
pub trait Feature {
    fn start(&self) -> u64;
    fn end(&self) -> u64;
    fn score(&self) -> Option<f64> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: u64,
    pub end: u64,
    pub count: u64,
    /// Mean score of the scored features overlapping the bin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

/// Partitions a window into equal-width bins, the last one taking what is
/// left, and counts each feature in every bin it overlaps.
#[derive(Debug)]
pub struct HistogramBinner {
    start: u64,
    end: u64,
    width: u64,
    counts: Vec<u64>,
    score_sums: Vec<f64>,
    scored: Vec<u64>,
}

impl HistogramBinner {
    /// `requested_bins` is clamped to `1..=window.len()`. Width is
    /// `ceil(len / bins)`; when that width would leave trailing bins empty the
    /// bin count shrinks to `ceil(len / width)`.
    pub fn new(window: &GenomicInterval, requested_bins: u64) -> Self {
        let len = window.len();
        let requested = requested_bins.clamp(1, len);
        let width = len.div_ceil(requested);
        let bins = len.div_ceil(width) as usize;
        Self {
            start: window.start(),
            end: window.end(),
            width,
            counts: vec![0; bins],
            score_sums: vec![0.0; bins],
            scored: vec![0; bins],
        }
    }

    pub fn bin_width(&self) -> u64 {
        self.width
    }

    pub fn bin_count(&self) -> usize {
        self.counts.len()
    }

    fn bin_of(&self, position: u64) -> usize {
        ((position - self.start) / self.width) as usize
    }

    pub fn add(&mut self, start: u64, end: u64, score: Option<f64>) {
        if end < self.start || start > self.end {
            return;
        }
        let first = self.bin_of(start.max(self.start));
        let last = self.bin_of(end.min(self.end));
        for i in first..=last {
            self.counts[i] += 1;
            if let Some(score) = score {
                self.score_sums[i] += score;
                self.scored[i] += 1;
            }
        }
    }

    pub fn add_feature<F: Feature + ?Sized>(&mut self, feature: &F) {
        self.add(feature.start(), feature.end(), feature.score());
    }

    pub fn finish(self) -> Vec<HistogramBin> {
        let last = self.counts.len() - 1;
        (0..self.counts.len())
            .map(|i| {
                let start = self.start + i as u64 * self.width;
                let end = if i == last {
                    self.end
                } else {
                    start + self.width - 1
                };
                HistogramBin {
                    start,
                    end,
                    count: self.counts[i],
                    value: (self.scored[i] > 0)
                        .then(|| self.score_sums[i] / self.scored[i] as f64),
                }
            })
            .collect()
    }
}

/// Bins an entire feature stream over `window`.
pub fn bin_features<F, I>(window: &GenomicInterval, bins: u64, features: I) -> Vec<HistogramBin>
where
    F: Feature,
    I: IntoIterator<Item = F>,
{
    let mut binner = HistogramBinner::new(window, bins);
    for feature in features {
        binner.add_feature(&feature);
    }
    binner.finish()
}
