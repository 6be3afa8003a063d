//! Owned read representation copied out of the alignment reader.
//!
//! Sources convert their native records into [`RawRead`] at ingestion time so
//! that nothing the engine keeps borrows from the reader's buffers.

use serde::{Deserialize, Serialize};

pub const FLAG_UNMAPPED: u16 = 0x4;
pub const FLAG_REVERSE: u16 = 0x10;
pub const FLAG_SECONDARY: u16 = 0x100;
pub const FLAG_QC_FAIL: u16 = 0x200;
pub const FLAG_DUPLICATE: u16 = 0x400;
pub const FLAG_SUPPLEMENTARY: u16 = 0x800;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strand {
    Forward,
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarKind {
    Match,
    Insertion,
    Deletion,
    Skip,
    SoftClip,
    HardClip,
    Pad,
    SequenceMatch,
    SequenceMismatch,
}

impl CigarKind {
    pub fn consumes_reference(self) -> bool {
        matches!(
            self,
            CigarKind::Match
                | CigarKind::Deletion
                | CigarKind::Skip
                | CigarKind::SequenceMatch
                | CigarKind::SequenceMismatch
        )
    }

    pub fn consumes_read(self) -> bool {
        matches!(
            self,
            CigarKind::Match
                | CigarKind::Insertion
                | CigarKind::SoftClip
                | CigarKind::SequenceMatch
                | CigarKind::SequenceMismatch
        )
    }

    fn symbol(self) -> char {
        match self {
            CigarKind::Match => 'M',
            CigarKind::Insertion => 'I',
            CigarKind::Deletion => 'D',
            CigarKind::Skip => 'N',
            CigarKind::SoftClip => 'S',
            CigarKind::HardClip => 'H',
            CigarKind::Pad => 'P',
            CigarKind::SequenceMatch => '=',
            CigarKind::SequenceMismatch => 'X',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CigarOp {
    pub kind: CigarKind,
    pub len: u32,
}

impl CigarOp {
    pub fn new(kind: CigarKind, len: u32) -> Self {
        Self { kind, len }
    }
}

/// An aligned read as handed over by an alignment source.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRead {
    pub name: String,
    pub flags: u16,
    /// 1-based position of the first aligned (non-clipped) base.
    pub start: u64,
    pub mapping_quality: Option<u8>,
    pub cigar: Vec<CigarOp>,
    pub bases: Vec<u8>,
    /// Transcript strand from the aligner's `XS` tag, when present.
    pub xs_strand: Option<Strand>,
}

impl RawRead {
    /// Bases of reference covered by the alignment, clips excluded.
    pub fn reference_span(&self) -> u64 {
        self.cigar
            .iter()
            .filter(|op| op.kind.consumes_reference())
            .map(|op| u64::from(op.len))
            .sum()
    }

    /// Inclusive 1-based end of the aligned span. Equal to `start` for reads
    /// that consume no reference.
    pub fn end(&self) -> u64 {
        (self.start + self.reference_span()).saturating_sub(1).max(self.start)
    }

    pub fn strand(&self) -> Strand {
        if self.has_flag(FLAG_REVERSE) {
            Strand::Reverse
        } else {
            Strand::Forward
        }
    }

    /// Strand a splice junction is counted under. The `XS` tag wins over the
    /// alignment orientation, which only reflects the library protocol.
    pub fn junction_strand(&self) -> Strand {
        self.xs_strand.unwrap_or_else(|| self.strand())
    }

    #[inline]
    pub fn has_flag(&self, flag: u16) -> bool {
        self.flags & flag == flag
    }

    /// Unmapped reads, reads without CIGAR and reads whose end does not pass
    /// their start never reach the filters.
    pub fn is_displayable(&self) -> bool {
        !self.has_flag(FLAG_UNMAPPED) && !self.cigar.is_empty() && self.end() > self.start
    }

    pub fn leading_soft_clip(&self) -> u32 {
        self.cigar
            .iter()
            .take_while(|op| op.kind == CigarKind::HardClip || op.kind == CigarKind::SoftClip)
            .filter(|op| op.kind == CigarKind::SoftClip)
            .map(|op| op.len)
            .sum()
    }

    pub fn trailing_soft_clip(&self) -> u32 {
        self.cigar
            .iter()
            .rev()
            .take_while(|op| op.kind == CigarKind::HardClip || op.kind == CigarKind::SoftClip)
            .filter(|op| op.kind == CigarKind::SoftClip)
            .map(|op| op.len)
            .sum()
    }

    pub fn cigar_string(&self) -> String {
        if self.cigar.is_empty() {
            return "*".to_string();
        }
        self.cigar
            .iter()
            .map(|op| format!("{}{}", op.len, op.kind.symbol()))
            .collect()
    }
}

/// Optional flag-based exclusions applied before boundary filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagFilter {
    pub duplicates: bool,
    pub secondary: bool,
    pub qc_fail: bool,
    pub supplementary: bool,
}

impl FlagFilter {
    pub fn rejects(&self, read: &RawRead) -> bool {
        (self.duplicates && read.has_flag(FLAG_DUPLICATE))
            || (self.secondary && read.has_flag(FLAG_SECONDARY))
            || (self.qc_fail && read.has_flag(FLAG_QC_FAIL))
            || (self.supplementary && read.has_flag(FLAG_SUPPLEMENTARY))
    }
}
