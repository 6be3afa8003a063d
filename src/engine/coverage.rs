//! Per-position coverage and splice junction tallies for item mode.
//!
//! Fed with every admitted read, whether or not the sifter keeps it, so the
//! client can draw accurate depth next to a downsampled pile.

use super::extract::{ReadAnnotations, Span};
use super::interval::GenomicInterval;
use super::read::Strand;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BaseCoverage {
    pub position: u64,
    pub depth: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub a: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub c: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub g: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub t: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub n: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub insertions: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub deletions: u32,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

#[derive(Debug, Clone, Default)]
struct MismatchCounts {
    a: u32,
    c: u32,
    g: u32,
    t: u32,
    n: u32,
}

/// Difference-array depth accumulator over a fixed window.
#[derive(Debug)]
pub struct CoverageAccumulator {
    start: u64,
    end: u64,
    depth: Vec<i64>,
    deletions: Vec<i64>,
    mismatches: Vec<MismatchCounts>,
    insertions: Vec<u32>,
}

impl CoverageAccumulator {
    pub fn new(window: &GenomicInterval) -> Self {
        let len = window.len() as usize;
        Self {
            start: window.start(),
            end: window.end(),
            depth: vec![0; len + 1],
            deletions: vec![0; len + 1],
            mismatches: vec![MismatchCounts::default(); len],
            insertions: vec![0; len],
        }
    }

    /// Adds `delta` over `[start, end]` clipped to the window.
    fn add_span(diff: &mut [i64], window: (u64, u64), start: u64, end: u64, delta: i64) {
        let (w_start, w_end) = window;
        if end < w_start || start > w_end {
            return;
        }
        let from = start.max(w_start) - w_start;
        let to = end.min(w_end) - w_start;
        diff[from as usize] += delta;
        diff[to as usize + 1] -= delta;
    }

    fn offset(&self, position: u64) -> Option<usize> {
        (position >= self.start && position <= self.end).then(|| (position - self.start) as usize)
    }

    pub fn add(&mut self, start: u64, end: u64, annotations: &ReadAnnotations) {
        let window = (self.start, self.end);
        Self::add_span(&mut self.depth, window, start, end, 1);

        for &Span { start, end } in &annotations.skips {
            Self::add_span(&mut self.depth, window, start, end, -1);
        }
        for &Span { start, end } in &annotations.deletions {
            Self::add_span(&mut self.deletions, window, start, end, 1);
        }
        for diff in &annotations.differences {
            if let Some(i) = self.offset(diff.position) {
                let counts = &mut self.mismatches[i];
                match diff.base {
                    'A' => counts.a += 1,
                    'C' => counts.c += 1,
                    'G' => counts.g += 1,
                    'T' => counts.t += 1,
                    'N' => counts.n += 1,
                    _ => {}
                }
            }
        }
        for &position in &annotations.insertions {
            if let Some(i) = self.offset(position) {
                self.insertions[i] += 1;
            }
        }
    }

    /// Positions with non-zero effective depth (reads minus deletions).
    pub fn finish(self) -> Vec<BaseCoverage> {
        let mut coverage = Vec::new();
        let mut depth = 0i64;
        let mut deleted = 0i64;
        for i in 0..self.mismatches.len() {
            depth += self.depth[i];
            deleted += self.deletions[i];
            let effective = depth - deleted;
            if effective <= 0 {
                continue;
            }
            let counts = &self.mismatches[i];
            coverage.push(BaseCoverage {
                position: self.start + i as u64,
                depth: effective as u32,
                a: counts.a,
                c: counts.c,
                g: counts.g,
                t: counts.t,
                n: counts.n,
                insertions: self.insertions[i],
                deletions: deleted as u32,
            });
        }
        coverage
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpliceJunction {
    /// Last aligned base before the skipped region.
    pub start: u64,
    /// Last skipped base.
    pub end: u64,
    pub strand: Strand,
    pub count: u32,
}

#[derive(Debug, Default)]
pub struct JunctionCounter {
    junctions: BTreeMap<(u64, u64, Strand), u32>,
}

impl JunctionCounter {
    pub fn add(&mut self, strand: Strand, annotations: &ReadAnnotations) {
        for skip in &annotations.skips {
            *self
                .junctions
                .entry((skip.start.saturating_sub(1), skip.end, strand))
                .or_insert(0) += 1;
        }
    }

    pub fn finish(self) -> Vec<SpliceJunction> {
        self.junctions
            .into_iter()
            .map(|((start, end, strand), count)| SpliceJunction {
                start,
                end,
                strand,
                count,
            })
            .collect()
    }
}
