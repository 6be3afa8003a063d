//! Window query engine.
//!
//! Everything here is query-scoped: a [`TrackAssembler`] call builds its
//! buckets, coverage and bins from scratch and drops them once the
//! [`TrackResult`] is returned. Reads enter as owned [`RawRead`] copies, so
//! nothing borrows from the file readers past a query.

mod cancel;
mod coverage;
mod extract;
mod filter;
mod histogram;
mod interval;
pub(crate) mod read;
mod sifter;
mod track;

pub use cancel::{CancelOnDrop, CancelToken};
pub use coverage::{BaseCoverage, CoverageAccumulator, JunctionCounter, SpliceJunction};
pub use extract::{
    ClipAnnotation, DifferingBase, ReadAnnotations, ReferenceSlice, Span, extract,
};
pub use filter::{BoundaryFilter, Partition, TrackDirection, plan_partitions};
pub use histogram::{Feature, HistogramBin, HistogramBinner, bin_features};
pub use interval::{GenomicInterval, ScaleFactor};
pub use read::{
    CigarKind, CigarOp, FLAG_DUPLICATE, FLAG_QC_FAIL, FLAG_REVERSE, FLAG_SECONDARY,
    FLAG_SUPPLEMENTARY, FLAG_UNMAPPED, FlagFilter, RawRead, Strand,
};
pub use sifter::{AlignedRead, Bucket, DownsampledRange, DownsamplingSifter, SiftedReads};
pub use track::{
    EngineConfig, FeatureTrack, FeatureTrackResult, HistogramTrack, ReadTrack, Resolution,
    TrackAssembler, TrackResult, WindowRequest,
};
