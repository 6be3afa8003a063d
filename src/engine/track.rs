//! Window query entry point.
//!
//! Picks histogram or item resolution for a window, then streams the
//! alignment source once: validity and flag filters, the boundary filter,
//! mismatch/clip extraction against a lazily grown reference buffer, and
//! finally the downsampling sifter. Coverage and splice junctions are
//! tallied from every admitted read along the way.

use super::cancel::CancelToken;
use super::coverage::{BaseCoverage, CoverageAccumulator, JunctionCounter, SpliceJunction};
use super::extract::{ClipAnnotation, ReferenceSlice, extract};
use super::filter::{BoundaryFilter, TrackDirection};
use super::histogram::{HistogramBin, HistogramBinner};
use super::interval::{GenomicInterval, ScaleFactor};
use super::read::FlagFilter;
use super::sifter::{AlignedRead, DownsampledRange, DownsamplingSifter};
use crate::formats::{
    AlignmentSource, FeatureRecord, FeatureSource, ReferenceSource, chromosome_alias,
};
use crate::{Error, Result};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Scales strictly below this select histogram mode.
    pub item_scale_threshold: f64,
    /// Windows longer than this always select histogram mode.
    pub max_item_span: u64,
    /// Upper bound on histogram bins per window, whatever the scale.
    pub max_bins: u64,
    /// Growth increment of the reference buffer.
    pub reference_step: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            item_scale_threshold: 0.01,
            max_item_span: 100_000,
            max_bins: 10_000,
            reference_step: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Items,
    Histogram { bins: u64 },
}

/// Everything one window query needs besides its data sources.
#[derive(Debug, Clone)]
pub struct WindowRequest {
    pub interval: GenomicInterval,
    pub scale: ScaleFactor,
    pub budget: usize,
    pub frame: u64,
    pub direction: TrackDirection,
    pub show_clipping: bool,
    pub show_splice_junctions: bool,
    pub flag_filter: FlagFilter,
}

impl WindowRequest {
    pub fn new(interval: GenomicInterval, scale: ScaleFactor, budget: usize) -> Self {
        Self {
            interval,
            scale,
            budget,
            frame: 1,
            direction: TrackDirection::Middle,
            show_clipping: false,
            show_splice_junctions: false,
            flag_filter: FlagFilter::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadTrack {
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
    pub reads: Vec<AlignedRead>,
    pub downsampled: Vec<DownsampledRange>,
    pub coverage: Vec<BaseCoverage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub splice_junctions: Vec<SpliceJunction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramTrack {
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
    pub bin_width: u64,
    pub bins: Vec<HistogramBin>,
}

/// Either detailed reads or histogram bins, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum TrackResult {
    Reads(ReadTrack),
    Histogram(HistogramTrack),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureTrack {
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
    pub features: Vec<FeatureRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum FeatureTrackResult {
    Features(FeatureTrack),
    Histogram(HistogramTrack),
}

/// Reference bases around the window, grown in whole steps on demand.
struct ReferenceBuffer<'a> {
    source: &'a mut dyn ReferenceSource,
    chromosome: String,
    length: u64,
    step: u64,
    slice: ReferenceSlice,
}

impl<'a> ReferenceBuffer<'a> {
    fn new(
        source: &'a mut dyn ReferenceSource,
        window: &GenomicInterval,
        length: u64,
        step: u64,
    ) -> Result<Self> {
        let step = step.max(1);
        let end = (window.end() + step).min(length).max(window.start());
        let fetch = GenomicInterval::new(window.chromosome(), window.start(), end)?;
        let bases = source.reference_slice(&fetch)?;
        Ok(Self {
            source,
            chromosome: window.chromosome().to_string(),
            length,
            step,
            slice: ReferenceSlice::new(window.start(), bases),
        })
    }

    fn fetch(&mut self, start: u64, end: u64) -> Result<Vec<u8>> {
        let interval = GenomicInterval::new(self.chromosome.as_str(), start, end)?;
        self.source.reference_slice(&interval)
    }

    /// Slice covering `[start, end]` where the chromosome allows it.
    fn covering(&mut self, start: u64, end: u64) -> Result<&ReferenceSlice> {
        while start < self.slice.start() && self.slice.start() > 1 {
            let head_end = self.slice.start() - 1;
            let head_start = head_end.saturating_sub(self.step - 1).max(1);
            let bases = self.fetch(head_start, head_end)?;
            if bases.is_empty() {
                break;
            }
            let head_start = self.slice.start() - bases.len() as u64;
            self.slice.extend_head(head_start, bases);
        }

        while end > self.slice.end() && self.slice.end() < self.length {
            let tail_start = self.slice.end() + 1;
            let tail_end = (self.slice.end() + self.step).min(self.length);
            let bases = self.fetch(tail_start, tail_end)?;
            if bases.is_empty() {
                break;
            }
            self.slice.extend_tail(&bases);
        }

        Ok(&self.slice)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrackAssembler {
    config: EngineConfig,
}

impl TrackAssembler {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn select_mode(&self, interval: &GenomicInterval, scale: ScaleFactor) -> Resolution {
        if scale.get() < self.config.item_scale_threshold
            || interval.len() > self.config.max_item_span
        {
            let bins = scale.bin_count(interval.len());
            Resolution::Histogram {
                bins: bins.min(self.config.max_bins.max(1)),
            }
        } else {
            Resolution::Items
        }
    }

    /// Runs one window query. `reference` is only consulted in item mode,
    /// where it is required.
    pub fn window_query<A: AlignmentSource>(
        &self,
        reads: &mut A,
        reference: Option<&mut dyn ReferenceSource>,
        request: &WindowRequest,
        cancel: &CancelToken,
    ) -> Result<TrackResult> {
        if request.budget == 0 {
            return Err(Error::InvalidInput(
                "budget must be at least 1".to_string(),
            ));
        }
        cancel.check()?;

        let (window, length) = resolve_chromosome(reads, &request.interval)?;
        if window.end() > length {
            return Err(Error::OutOfRange {
                chromosome: request.interval.chromosome().to_string(),
                start: window.start(),
                end: window.end(),
                length,
            });
        }

        let resolution = self.select_mode(&window, request.scale);
        debug!(
            interval = %request.interval,
            resolved = window.chromosome(),
            ?resolution,
            budget = request.budget,
            "window query"
        );

        match resolution {
            Resolution::Histogram { bins } => {
                let track = self.read_histogram(reads, &window, bins, request, cancel)?;
                Ok(TrackResult::Histogram(HistogramTrack {
                    chromosome: request.interval.chromosome().to_string(),
                    ..track
                }))
            }
            Resolution::Items => {
                let reference = reference.ok_or_else(|| {
                    Error::NotFound("reference sequence required for read detail".to_string())
                })?;
                let track = self.read_items(reads, reference, &window, length, request, cancel)?;
                Ok(TrackResult::Reads(ReadTrack {
                    chromosome: request.interval.chromosome().to_string(),
                    ..track
                }))
            }
        }
    }

    fn read_histogram<A: AlignmentSource>(
        &self,
        reads: &mut A,
        window: &GenomicInterval,
        bins: u64,
        request: &WindowRequest,
        cancel: &CancelToken,
    ) -> Result<HistogramTrack> {
        let filter = BoundaryFilter::for_window(request.direction, window);
        let mut binner = HistogramBinner::new(window, bins);

        for result in reads.query_overlapping(window)? {
            cancel.check()?;
            let read = result?;
            if !read.is_displayable() || request.flag_filter.rejects(&read) {
                continue;
            }
            let end = read.end();
            if filter.admit(read.start, end) {
                binner.add(read.start, end, None);
            }
        }

        Ok(HistogramTrack {
            chromosome: window.chromosome().to_string(),
            start: window.start(),
            end: window.end(),
            bin_width: binner.bin_width(),
            bins: binner.finish(),
        })
    }

    fn read_items<A: AlignmentSource>(
        &self,
        reads: &mut A,
        reference: &mut dyn ReferenceSource,
        window: &GenomicInterval,
        length: u64,
        request: &WindowRequest,
        cancel: &CancelToken,
    ) -> Result<ReadTrack> {
        let filter = BoundaryFilter::for_window(request.direction, window);
        let mut buffer = ReferenceBuffer::new(reference, window, length, self.config.reference_step)?;
        let mut sifter = DownsamplingSifter::new(request.budget, request.frame);
        let mut coverage = CoverageAccumulator::new(window);
        let mut junctions = JunctionCounter::default();
        let mut admitted = 0u64;

        for result in reads.query_overlapping(window)? {
            cancel.check()?;
            let read = result?;
            if !read.is_displayable() || request.flag_filter.rejects(&read) {
                continue;
            }
            let end = read.end();
            if !filter.admit(read.start, end) {
                continue;
            }
            admitted += 1;

            let mut annotations = extract(&read, buffer.covering(read.start, end)?)?;
            coverage.add(read.start, end, &annotations);
            if request.show_splice_junctions {
                junctions.add(read.junction_strand(), &annotations);
            }

            let (shown_start, shown_end) = if request.show_clipping {
                (
                    read.start
                        .saturating_sub(u64::from(read.leading_soft_clip()))
                        .max(1),
                    end + u64::from(read.trailing_soft_clip()),
                )
            } else {
                annotations.clip = ClipAnnotation::default();
                (read.start, end)
            };
            sifter.add(&read, shown_start, shown_end, annotations);
        }

        let sifted = sifter.finish();
        debug!(
            admitted,
            retained = sifted.reads.len(),
            downsampled_buckets = sifted.downsampled.len(),
            "item query finished"
        );

        Ok(ReadTrack {
            chromosome: window.chromosome().to_string(),
            start: window.start(),
            end: window.end(),
            reads: sifted.reads,
            downsampled: sifted.downsampled,
            coverage: coverage.finish(),
            splice_junctions: junctions.finish(),
        })
    }

    /// Features overlapping `interval` at fine scale, binned counts and mean
    /// scores at coarse scale.
    pub fn feature_query<S: FeatureSource>(
        &self,
        source: &mut S,
        interval: &GenomicInterval,
        scale: ScaleFactor,
        cancel: &CancelToken,
    ) -> Result<FeatureTrackResult> {
        cancel.check()?;
        let resolution = self.select_mode(interval, scale);
        debug!(%interval, ?resolution, "feature query");

        match resolution {
            Resolution::Histogram { bins } => {
                let mut binner = HistogramBinner::new(interval, bins);
                for feature in source.query_overlapping(interval)? {
                    cancel.check()?;
                    binner.add_feature(&feature?);
                }
                Ok(FeatureTrackResult::Histogram(HistogramTrack {
                    chromosome: interval.chromosome().to_string(),
                    start: interval.start(),
                    end: interval.end(),
                    bin_width: binner.bin_width(),
                    bins: binner.finish(),
                }))
            }
            Resolution::Items => {
                let mut features = Vec::new();
                for feature in source.query_overlapping(interval)? {
                    cancel.check()?;
                    features.push(feature?);
                }
                Ok(FeatureTrackResult::Features(FeatureTrack {
                    chromosome: interval.chromosome().to_string(),
                    start: interval.start(),
                    end: interval.end(),
                    features,
                }))
            }
        }
    }
}

/// The interval renamed to whatever the source calls its chromosome, and
/// that chromosome's length.
fn resolve_chromosome<A: AlignmentSource>(
    reads: &mut A,
    interval: &GenomicInterval,
) -> Result<(GenomicInterval, u64)> {
    if let Some(length) = reads.chromosome_length(interval.chromosome())? {
        return Ok((interval.clone(), length));
    }
    let alias = chromosome_alias(interval.chromosome());
    if let Some(length) = reads.chromosome_length(&alias)? {
        return Ok((interval.with_chromosome(alias), length));
    }
    Err(Error::NotFound(format!(
        "chromosome not found: {}",
        interval.chromosome()
    )))
}
