//! Bounded-memory retention of detailed reads.
//!
//! Admitted reads are grouped into buckets by alignment start (or by a fixed
//! width frame of starts). Each bucket keeps at most `budget` reads in full
//! detail, in the order they arrived, and counts every read it saw. Reads
//! over budget are not an error; they only show up in the bucket total.

use super::extract::{ClipAnnotation, DifferingBase, ReadAnnotations};
use super::read::{RawRead, Strand};
use serde::Serialize;
use std::collections::BTreeMap;

/// A read as emitted to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignedRead {
    pub name: String,
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
    pub cigar: String,
    pub flags: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping_quality: Option<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub differing_bases: Vec<DifferingBase>,
    #[serde(skip_serializing_if = "ClipAnnotation::is_empty")]
    pub clip: ClipAnnotation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    position: u64,
    total: u64,
    retained: Vec<AlignedRead>,
}

impl Bucket {
    fn new(position: u64) -> Self {
        Self {
            position,
            total: 0,
            retained: Vec::new(),
        }
    }

    /// First start position covered by the bucket.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Every read that mapped to the bucket, retained or not.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn retained(&self) -> &[AlignedRead] {
        &self.retained
    }

    pub fn dropped(&self) -> u64 {
        self.total - self.retained.len() as u64
    }
}

/// Start range of a bucket that dropped reads, and how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DownsampledRange {
    pub start: u64,
    pub end: u64,
    pub dropped: u64,
}

#[derive(Debug, Default, PartialEq)]
pub struct SiftedReads {
    pub reads: Vec<AlignedRead>,
    pub downsampled: Vec<DownsampledRange>,
}

#[derive(Debug)]
pub struct DownsamplingSifter {
    budget: usize,
    frame: u64,
    buckets: BTreeMap<u64, Bucket>,
}

impl DownsamplingSifter {
    /// `frame` is the width of start positions sharing one bucket; values
    /// below 1 are treated as 1.
    pub fn new(budget: usize, frame: u64) -> Self {
        Self {
            budget,
            frame: frame.max(1),
            buckets: BTreeMap::new(),
        }
    }

    fn bucket_key(&self, start: u64) -> u64 {
        start - start % self.frame
    }

    /// Counts `read` in its bucket and keeps it in detail while the bucket is
    /// under budget. `start`/`end` are the displayed coordinates. Returns
    /// whether the read was retained.
    pub fn add(
        &mut self,
        read: &RawRead,
        start: u64,
        end: u64,
        annotations: ReadAnnotations,
    ) -> bool {
        let key = self.bucket_key(read.start);
        let budget = self.budget;
        let bucket = self
            .buckets
            .entry(key)
            .or_insert_with(|| Bucket::new(key));

        bucket.total += 1;
        if bucket.retained.len() >= budget {
            return false;
        }

        bucket.retained.push(AlignedRead {
            name: read.name.clone(),
            start,
            end,
            strand: read.strand(),
            cigar: read.cigar_string(),
            flags: read.flags,
            mapping_quality: read.mapping_quality,
            differing_bases: annotations.differences,
            clip: annotations.clip,
        });
        true
    }

    pub fn buckets(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.values()
    }

    pub fn bucket(&self, position: u64) -> Option<&Bucket> {
        self.buckets.get(&self.bucket_key(position))
    }

    pub fn total_seen(&self) -> u64 {
        self.buckets.values().map(|b| b.total).sum()
    }

    /// Flattens buckets in position order, keeping admission order within
    /// each bucket.
    pub fn finish(self) -> SiftedReads {
        let frame = self.frame;
        let mut sifted = SiftedReads::default();
        for bucket in self.buckets.into_values() {
            let dropped = bucket.dropped();
            if dropped > 0 {
                sifted.downsampled.push(DownsampledRange {
                    start: bucket.position,
                    end: bucket.position + frame - 1,
                    dropped,
                });
            }
            sifted.reads.extend(bucket.retained);
        }
        sifted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::read::tests::read;

    fn add(sifter: &mut DownsamplingSifter, r: &RawRead) -> bool {
        sifter.add(r, r.start, r.end(), ReadAnnotations::default())
    }

    #[test]
    fn test_budget_caps_bucket_and_counts_all() {
        let mut sifter = DownsamplingSifter::new(2, 1);
        for name in ["a", "b", "c"] {
            add(&mut sifter, &read(name, 1500, "50M", ""));
        }

        let bucket = sifter.bucket(1500).unwrap();
        assert_eq!(bucket.retained().len(), 2);
        assert_eq!(bucket.total(), 3);
        assert_eq!(bucket.dropped(), 1);
    }

    #[test]
    fn test_first_seen_first_kept() {
        let mut sifter = DownsamplingSifter::new(2, 1);
        let kept: Vec<bool> = ["first", "second", "third", "fourth"]
            .iter()
            .map(|name| add(&mut sifter, &read(name, 10, "5M", "")))
            .collect();
        assert_eq!(kept, vec![true, true, false, false]);

        let names: Vec<&str> = sifter
            .bucket(10)
            .unwrap()
            .retained()
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_buckets_are_independent() {
        let mut sifter = DownsamplingSifter::new(1, 1);
        add(&mut sifter, &read("a", 10, "5M", ""));
        add(&mut sifter, &read("b", 10, "5M", ""));
        add(&mut sifter, &read("c", 11, "5M", ""));

        let sifted = sifter.finish();
        let names: Vec<&str> = sifted.reads.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(
            sifted.downsampled,
            vec![DownsampledRange {
                start: 10,
                end: 10,
                dropped: 1
            }]
        );
    }

    #[test]
    fn test_frame_groups_neighbouring_starts() {
        let mut sifter = DownsamplingSifter::new(2, 10);
        for (i, start) in [20, 23, 29, 30].into_iter().enumerate() {
            add(&mut sifter, &read(&format!("r{}", i), start, "5M", ""));
        }

        let bucket = sifter.bucket(25).unwrap();
        assert_eq!(bucket.position(), 20);
        assert_eq!(bucket.total(), 3);
        assert_eq!(bucket.retained().len(), 2);
        assert_eq!(sifter.bucket(30).unwrap().total(), 1);

        let sifted = sifter.finish();
        assert_eq!(sifted.downsampled[0].end, 29);
    }

    #[test]
    fn test_invariants_hold_under_load() {
        let budget = 3;
        let mut sifter = DownsamplingSifter::new(budget, 1);
        for i in 0..500u64 {
            add(&mut sifter, &read(&format!("r{}", i), 100 + i % 7, "20M", ""));
        }
        assert_eq!(sifter.total_seen(), 500);
        for bucket in sifter.buckets() {
            assert!(bucket.retained().len() <= budget);
            assert!(bucket.total() >= bucket.retained().len() as u64);
        }
    }

    #[test]
    fn test_emitted_record_carries_annotations() {
        let mut sifter = DownsamplingSifter::new(5, 1);
        let mut r = read("r1", 40, "2S8M", "AAACGTACGT");
        r.flags = crate::engine::read::FLAG_REVERSE;
        let annotations = ReadAnnotations {
            differences: vec![DifferingBase {
                position: 42,
                base: 'T',
            }],
            clip: ClipAnnotation {
                head: Some("AA".to_string()),
                tail: None,
            },
            ..Default::default()
        };
        assert!(sifter.add(&r, 38, 47, annotations));

        let sifted = sifter.finish();
        let emitted = &sifted.reads[0];
        assert_eq!(emitted.start, 38);
        assert_eq!(emitted.end, 47);
        assert_eq!(emitted.strand, Strand::Reverse);
        assert_eq!(emitted.cigar, "2S8M");
        assert_eq!(emitted.differing_bases.len(), 1);
        assert_eq!(emitted.clip.head.as_deref(), Some("AA"));
    }
}
