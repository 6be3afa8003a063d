use super::{AlignmentSource, ReadIter, ReferenceSource};
use crate::engine::{GenomicInterval, RawRead};
use crate::{Error, Result};
use std::collections::HashMap;

/// Alignment source backed by vectors, reads kept sorted by start the way an
/// indexed file would return them.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    chromosomes: HashMap<String, Chromosome>,
    fail_after: Option<usize>,
}

#[derive(Debug, Default, Clone)]
struct Chromosome {
    reference: Vec<u8>,
    reads: Vec<RawRead>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a chromosome; its length is the reference length.
    pub fn with_chromosome(mut self, name: &str, reference: impl Into<Vec<u8>>) -> Self {
        self.chromosomes.entry(name.to_string()).or_default().reference = reference.into();
        self
    }

    pub fn with_read(mut self, chromosome: &str, read: RawRead) -> Self {
        let entry = self.chromosomes.entry(chromosome.to_string()).or_default();
        let at = entry.reads.partition_point(|r| r.start <= read.start);
        entry.reads.insert(at, read);
        self
    }

    /// Makes every query fail with a source error after yielding `n` reads.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Reference sequences of all registered chromosomes.
    pub fn reference(&self) -> MemoryReference {
        MemoryReference {
            sequences: self
                .chromosomes
                .iter()
                .map(|(name, c)| (name.clone(), c.reference.clone()))
                .collect(),
        }
    }
}

impl AlignmentSource for MemorySource {
    fn chromosome_length(&mut self, chromosome: &str) -> Result<Option<u64>> {
        Ok(self
            .chromosomes
            .get(chromosome)
            .map(|c| c.reference.len() as u64))
    }

    fn query_overlapping(&mut self, interval: &GenomicInterval) -> Result<ReadIter<'_>> {
        let Some(chromosome) = self.chromosomes.get(interval.chromosome()) else {
            return Ok(Box::new(std::iter::empty()));
        };
        let window = interval.clone();
        let fail_after = self.fail_after;

        let reads = chromosome
            .reads
            .iter()
            .filter(move |r| window.overlaps(r.start, r.end()))
            .enumerate()
            .map(move |(i, r)| match fail_after {
                Some(n) if i >= n => Err(Error::SourceRead("simulated read failure".to_string())),
                _ => Ok(r.clone()),
            });
        Ok(Box::new(reads))
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryReference {
    sequences: HashMap<String, Vec<u8>>,
}

impl MemoryReference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sequence(mut self, name: &str, bases: impl Into<Vec<u8>>) -> Self {
        self.sequences.insert(name.to_string(), bases.into());
        self
    }
}

impl ReferenceSource for MemoryReference {
    fn reference_slice(&mut self, interval: &GenomicInterval) -> Result<Vec<u8>> {
        let bases = self.sequences.get(interval.chromosome()).ok_or_else(|| {
            Error::NotFound(format!("sequence not found: {}", interval.chromosome()))
        })?;
        let len = bases.len() as u64;
        let from = (interval.start() - 1).min(len) as usize;
        let to = interval.end().min(len) as usize;
        Ok(bases[from..to.max(from)].to_vec())
    }
}
