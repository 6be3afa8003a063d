//! Readers the engine pulls data from.
//!
//! The engine only sees the [`AlignmentSource`], [`ReferenceSource`] and
//! [`FeatureSource`] traits; file formats are decoded here with noodles and
//! copied into owned records before they cross into the engine.
//!
//! # Implementations
//!
//! - [`BamSource`] - indexed BAM (`.bai`)
//! - [`FastaReference`] - FAI-indexed FASTA reference slices
//! - [`BedSource`] - plain BED feature files
//! - [`MemorySource`] / [`MemoryReference`] - in-memory reads and reference,
//!   for tests and embedding

mod bam;
mod bed;
mod fasta;
mod memory;

pub use bam::BamSource;
pub use bed::{BedSource, FeatureRecord};
pub use fasta::FastaReference;
pub use memory::{MemoryReference, MemorySource};

use crate::Result;
use crate::engine::{GenomicInterval, RawRead};

pub type ReadIter<'a> = Box<dyn Iterator<Item = Result<RawRead>> + 'a>;
pub type FeatureIter<'a> = Box<dyn Iterator<Item = Result<FeatureRecord>> + 'a>;

/// Alignment file reader.
pub trait AlignmentSource {
    /// Length of `chromosome`, or `None` if the source does not know it.
    fn chromosome_length(&mut self, chromosome: &str) -> Result<Option<u64>>;

    /// Reads whose aligned span overlaps `interval`, in coordinate order.
    fn query_overlapping(&mut self, interval: &GenomicInterval) -> Result<ReadIter<'_>>;
}

/// Reference sequence the alignments were made against. Kept apart from
/// [`AlignmentSource`] so reference bases can be fetched while a read stream
/// is open.
pub trait ReferenceSource {
    /// Reference bases for `interval`, one byte per position. May be shorter
    /// than requested only when the interval runs past the chromosome end.
    fn reference_slice(&mut self, interval: &GenomicInterval) -> Result<Vec<u8>>;
}

/// Feature file reader for non-alignment tracks.
pub trait FeatureSource {
    fn query_overlapping(&mut self, interval: &GenomicInterval) -> Result<FeatureIter<'_>>;
}

/// `chr1` <-> `1` style alias used when a file names chromosomes differently.
pub fn chromosome_alias(name: &str) -> String {
    match name.strip_prefix("chr") {
        Some(stripped) => stripped.to_string(),
        None => format!("chr{}", name),
    }
}
