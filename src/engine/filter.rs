//! Window edge policies.
//!
//! A window may be one piece of a larger view that was split for staged
//! loading. The edge policy decides which piece owns a read that straddles a
//! cut, so that each read is attributed to exactly one piece.

use super::interval::GenomicInterval;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Which piece of a split view a window represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackDirection {
    Left,
    #[default]
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryFilter {
    /// Admits reads ending strictly before `border`.
    Left { border: u64 },
    /// Admits everything.
    Middle,
    /// Admits reads starting strictly after `border`.
    Right { border: u64 },
}

impl BoundaryFilter {
    /// Filter for a window of the given direction: left pieces are bounded by
    /// their own end, right pieces by their own start.
    pub fn for_window(direction: TrackDirection, window: &GenomicInterval) -> Self {
        match direction {
            TrackDirection::Left => BoundaryFilter::Left {
                border: window.end(),
            },
            TrackDirection::Middle => BoundaryFilter::Middle,
            TrackDirection::Right => BoundaryFilter::Right {
                border: window.start(),
            },
        }
    }

    #[inline]
    pub fn admit(&self, start: u64, end: u64) -> bool {
        match *self {
            BoundaryFilter::Left { border } => end < border,
            BoundaryFilter::Middle => true,
            BoundaryFilter::Right { border } => start > border,
        }
    }

    pub fn direction(&self) -> TrackDirection {
        match self {
            BoundaryFilter::Left { .. } => TrackDirection::Left,
            BoundaryFilter::Middle => TrackDirection::Middle,
            BoundaryFilter::Right { .. } => TrackDirection::Right,
        }
    }
}

/// One piece of a split window together with its edge policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub window: GenomicInterval,
    pub filter: BoundaryFilter,
}

/// Splits `interval` into left `[start, left_cut]`, middle
/// `[left_cut, right_cut]` and right `[right_cut, end]` pieces. Neighbouring
/// pieces share their cut position; combined with the edge policies every
/// read overlapping `interval` is admitted by exactly one piece.
///
/// `left_cut == right_cut` gives a two-way split with a single-position
/// middle piece.
pub fn plan_partitions(
    interval: &GenomicInterval,
    left_cut: u64,
    right_cut: u64,
) -> Result<[Partition; 3]> {
    if left_cut < interval.start() || right_cut > interval.end() || left_cut > right_cut {
        return Err(Error::InvalidInput(format!(
            "cuts {}..{} do not lie within {}",
            left_cut, right_cut, interval
        )));
    }
    let chromosome = interval.chromosome();
    let left = GenomicInterval::new(chromosome, interval.start(), left_cut)?;
    let middle = GenomicInterval::new(chromosome, left_cut, right_cut)?;
    let right = GenomicInterval::new(chromosome, right_cut, interval.end())?;

    Ok([
        Partition {
            filter: BoundaryFilter::for_window(TrackDirection::Left, &left),
            window: left,
        },
        Partition {
            filter: BoundaryFilter::Middle,
            window: middle,
        },
        Partition {
            filter: BoundaryFilter::for_window(TrackDirection::Right, &right),
            window: right,
        },
    ])
}
