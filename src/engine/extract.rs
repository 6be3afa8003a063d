//! Per-read annotations: bases differing from the reference, soft-clipped
//! head/tail strings and the reference-level gaps (deletions, skips,
//! insertion points) that feed base coverage.

use super::read::{CigarKind, RawRead};
use crate::{Error, Result};
use serde::Serialize;

/// Contiguous reference bases starting at a 1-based position. Bases are
/// stored upper-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSlice {
    start: u64,
    bases: Vec<u8>,
}

impl ReferenceSlice {
    pub fn new(start: u64, mut bases: Vec<u8>) -> Self {
        bases.make_ascii_uppercase();
        Self { start, bases }
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    /// Inclusive end; `start - 1` for an empty slice.
    pub fn end(&self) -> u64 {
        (self.start + self.bases.len() as u64).saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    pub fn covers(&self, start: u64, end: u64) -> bool {
        !self.bases.is_empty() && start >= self.start && end <= self.end()
    }

    #[inline]
    fn base_at(&self, position: u64) -> u8 {
        self.bases[(position - self.start) as usize]
    }

    /// Prepends bases that end right before the current start.
    pub fn extend_head(&mut self, start: u64, bases: Vec<u8>) {
        let mut head = bases;
        head.make_ascii_uppercase();
        head.extend_from_slice(&self.bases);
        self.bases = head;
        self.start = start;
    }

    /// Appends bases that begin right after the current end.
    pub fn extend_tail(&mut self, bases: &[u8]) {
        let from = self.bases.len();
        self.bases.extend_from_slice(bases);
        self.bases[from..].make_ascii_uppercase();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DifferingBase {
    pub position: u64,
    pub base: char,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClipAnnotation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail: Option<String>,
}

impl ClipAnnotation {
    pub fn is_empty(&self) -> bool {
        self.head.is_none() && self.tail.is_none()
    }
}

/// Inclusive reference span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: u64,
    pub end: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadAnnotations {
    pub differences: Vec<DifferingBase>,
    pub clip: ClipAnnotation,
    pub deletions: Vec<Span>,
    pub skips: Vec<Span>,
    /// Reference position of the base preceding each insertion.
    pub insertions: Vec<u64>,
}

/// Walks the read's CIGAR against `reference`.
///
/// The reference must cover the read's whole aligned span; anything else
/// means the coordinates handed in upstream disagree with the reference.
pub fn extract(read: &RawRead, reference: &ReferenceSlice) -> Result<ReadAnnotations> {
    let end = read.end();
    if !reference.covers(read.start, end) {
        return Err(Error::ReferenceMismatch(format!(
            "read {} spans {}-{} but reference covers {}-{}",
            read.name,
            read.start,
            end,
            reference.start(),
            reference.end()
        )));
    }

    let mut annotations = ReadAnnotations {
        clip: clip_annotation(read),
        ..Default::default()
    };

    let bases = read.bases.as_slice();
    let mut ref_pos = read.start;
    let mut read_idx = 0usize;

    for op in &read.cigar {
        let len = op.len as usize;
        match op.kind {
            CigarKind::Match | CigarKind::SequenceMatch | CigarKind::SequenceMismatch => {
                for j in 0..len {
                    let Some(&observed) = bases.get(read_idx + j) else {
                        break;
                    };
                    let observed = observed.to_ascii_uppercase();
                    let position = ref_pos + j as u64;
                    if observed != b'=' && observed != reference.base_at(position) {
                        annotations.differences.push(DifferingBase {
                            position,
                            base: observed as char,
                        });
                    }
                }
                ref_pos += op.len as u64;
                read_idx += len;
            }
            CigarKind::Insertion => {
                annotations.insertions.push(ref_pos.saturating_sub(1));
                read_idx += len;
            }
            CigarKind::Deletion => {
                annotations.deletions.push(Span {
                    start: ref_pos,
                    end: ref_pos + op.len as u64 - 1,
                });
                ref_pos += op.len as u64;
            }
            CigarKind::Skip => {
                annotations.skips.push(Span {
                    start: ref_pos,
                    end: ref_pos + op.len as u64 - 1,
                });
                ref_pos += op.len as u64;
            }
            CigarKind::SoftClip => read_idx += len,
            CigarKind::HardClip | CigarKind::Pad => {}
        }
    }

    Ok(annotations)
}

fn clip_annotation(read: &RawRead) -> ClipAnnotation {
    let bases = read.bases.as_slice();
    let head_len = read.leading_soft_clip() as usize;
    let tail_len = read.trailing_soft_clip() as usize;

    let head = (head_len > 0 && head_len <= bases.len())
        .then(|| String::from_utf8_lossy(&bases[..head_len]).into_owned());
    let tail = (tail_len > 0 && tail_len <= bases.len())
        .then(|| String::from_utf8_lossy(&bases[bases.len() - tail_len..]).into_owned());

    ClipAnnotation { head, tail }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::read::tests::read;

    fn reference(start: u64, bases: &str) -> ReferenceSlice {
        ReferenceSlice::new(start, bases.as_bytes().to_vec())
    }

    #[test]
    fn test_perfect_match_has_no_differences() {
        let r = read("r1", 3, "5M", "gtacg");
        let annotations = extract(&r, &reference(1, "ACGTACGTAC")).unwrap();
        assert!(annotations.differences.is_empty());
        assert!(annotations.clip.is_empty());
    }

    #[test]
    fn test_mismatches_reported_at_reference_positions() {
        // reference 1..=10: A C G T A C G T A C
        let r = read("r1", 2, "6M", "CGTTCC");
        let annotations = extract(&r, &reference(1, "ACGTACGTAC")).unwrap();
        assert_eq!(
            annotations.differences,
            vec![
                DifferingBase {
                    position: 5,
                    base: 'T'
                },
                DifferingBase {
                    position: 7,
                    base: 'C'
                },
            ]
        );
    }

    #[test]
    fn test_soft_clips_and_indels() {
        // 2S 3M 1I 2M 2D 2M 3S, aligned at 3
        let r = read("r1", 3, "2S3M1I2M2D2M3S", "TTGTAGCTCGTTT");
        let annotations = extract(&r, &reference(1, "ACGTACGTACGT")).unwrap();

        assert_eq!(annotations.clip.head.as_deref(), Some("TT"));
        assert_eq!(annotations.clip.tail.as_deref(), Some("TTT"));
        // 3M at 3..=5 matches; insertion after 5; 2M at 6..=7 reads CT over CG
        assert_eq!(annotations.insertions, vec![5]);
        assert_eq!(
            annotations.differences,
            vec![DifferingBase {
                position: 7,
                base: 'T'
            }]
        );
        assert_eq!(annotations.deletions, vec![Span { start: 8, end: 9 }]);
        assert!(annotations.skips.is_empty());
        assert_eq!(r.end(), 11);
    }

    #[test]
    fn test_skip_spans() {
        let r = read("r1", 1, "2M3N2M", "ACCG");
        let annotations = extract(&r, &reference(1, "ACGTACG")).unwrap();
        assert_eq!(annotations.skips, vec![Span { start: 3, end: 5 }]);
        assert!(annotations.differences.is_empty());
    }

    #[test]
    fn test_equals_sign_never_differs() {
        let r = read("r1", 1, "4=", "====");
        let annotations = extract(&r, &reference(1, "ACGT")).unwrap();
        assert!(annotations.differences.is_empty());
    }

    #[test]
    fn test_reference_not_covering_read_fails() {
        let r = read("r1", 8, "5M", "ACGTA");
        let err = extract(&r, &reference(1, "ACGTACGTAC")).unwrap_err();
        assert!(matches!(err, Error::ReferenceMismatch(_)));

        let before = read("r2", 1, "3M", "ACG");
        assert!(extract(&before, &reference(2, "CGTACGT")).is_err());
    }

    #[test]
    fn test_missing_sequence_yields_no_differences() {
        let r = read("r1", 1, "4M", "");
        let annotations = extract(&r, &reference(1, "ACGT")).unwrap();
        assert!(annotations.differences.is_empty());
        assert!(annotations.clip.is_empty());
    }

    #[test]
    fn test_reference_slice_extension() {
        let mut slice = reference(11, "acgt");
        slice.extend_head(8, b"ttt".to_vec());
        slice.extend_tail(b"gg");
        assert_eq!(slice.start(), 8);
        assert_eq!(slice.end(), 16);
        assert!(slice.covers(8, 16));
        assert_eq!(slice.base_at(8), b'T');
        assert_eq!(slice.base_at(16), b'G');
    }
}
