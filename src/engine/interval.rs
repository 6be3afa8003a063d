//! Query window and resolution value types.

use crate::{Error, Result};
use serde::Serialize;
use std::fmt;

/// A chromosome-relative window. Coordinates are 1-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GenomicInterval {
    chromosome: String,
    start: u64,
    end: u64,
}

impl GenomicInterval {
    /// Validates and builds a window; rejects `start == 0` and `start > end`.
    pub fn new(chromosome: impl Into<String>, start: u64, end: u64) -> Result<Self> {
        let chromosome = chromosome.into();
        if chromosome.is_empty() {
            return Err(Error::InvalidInterval("empty chromosome name".to_string()));
        }
        if start == 0 {
            return Err(Error::InvalidInterval(format!(
                "start must be >= 1, got {}",
                start
            )));
        }
        if start > end {
            return Err(Error::InvalidInterval(format!(
                "start {} is greater than end {}",
                start, end
            )));
        }
        Ok(Self {
            chromosome,
            start,
            end,
        })
    }

    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of positions covered, always at least 1.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn overlaps(&self, start: u64, end: u64) -> bool {
        start <= self.end && end >= self.start
    }

    #[inline]
    pub fn contains(&self, position: u64) -> bool {
        position >= self.start && position <= self.end
    }

    /// Same coordinates on a differently named chromosome.
    pub fn with_chromosome(&self, chromosome: impl Into<String>) -> Self {
        Self {
            chromosome: chromosome.into(),
            start: self.start,
            end: self.end,
        }
    }
}

impl fmt::Display for GenomicInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chromosome, self.start, self.end)
    }
}

/// Visual units per base. Small values ask for coarse views, large values
/// for base-level detail.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || value <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "scale factor must be a positive number, got {}",
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> f64 {
        self.0
    }

    /// Number of histogram bins a window of `length` positions occupies at
    /// this scale, clamped to `1..=length`.
    pub fn bin_count(self, length: u64) -> u64 {
        let bins = (length as f64 * self.0).round();
        if bins < 1.0 {
            1
        } else if bins >= length as f64 {
            length
        } else {
            bins as u64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_rejects_zero_start() {
        let err = GenomicInterval::new("chr1", 0, 10).unwrap_err();
        assert!(matches!(err, Error::InvalidInterval(_)));
    }

    #[test]
    fn test_interval_rejects_inverted_bounds() {
        let err = GenomicInterval::new("chr1", 20, 10).unwrap_err();
        assert!(matches!(err, Error::InvalidInterval(_)));
    }

    #[test]
    fn test_single_position_interval() {
        let interval = GenomicInterval::new("chr1", 5, 5).unwrap();
        assert_eq!(interval.len(), 1);
        assert!(interval.contains(5));
        assert!(interval.overlaps(1, 5));
        assert!(!interval.overlaps(6, 9));
        assert_eq!(interval.to_string(), "chr1:5-5");
    }

    #[test]
    fn test_scale_factor_validation() {
        assert!(ScaleFactor::new(0.0).is_err());
        assert!(ScaleFactor::new(-1.0).is_err());
        assert!(ScaleFactor::new(f64::NAN).is_err());
        assert!(ScaleFactor::new(0.5).is_ok());
    }

    #[test]
    fn test_bin_count_clamps() {
        let scale = ScaleFactor::new(0.1).unwrap();
        assert_eq!(scale.bin_count(100), 10);
        assert_eq!(scale.bin_count(3), 1);

        let fine = ScaleFactor::new(4.0).unwrap();
        assert_eq!(fine.bin_count(50), 50);
    }
}
