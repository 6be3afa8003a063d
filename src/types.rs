use crate::Result;
use crate::engine::{FlagFilter, GenomicInterval, ScaleFactor, TrackDirection, WindowRequest};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Track file formats served from the data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Format {
    Bam,
    Bed,
    Fasta,
}

impl Format {
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Bam => "bam",
            Format::Bed => "bed",
            Format::Fasta => "fa",
        }
    }

    pub fn index_extension(&self) -> Option<&'static str> {
        match self {
            Format::Bam => Some("bai"),
            Format::Fasta => Some("fai"),
            Format::Bed => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Bam => write!(f, "BAM"),
            Format::Bed => write!(f, "BED"),
            Format::Fasta => write!(f, "FASTA"),
        }
    }
}

/// Query parameters for `GET /reads/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadsQuery {
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
    pub scale: f64,
    pub budget: Option<usize>,
    pub frame: Option<u64>,
    #[serde(default)]
    pub direction: TrackDirection,
    #[serde(default)]
    pub show_clipping: bool,
    #[serde(default)]
    pub show_splice_junctions: bool,
    #[serde(default)]
    pub filter_duplicates: bool,
    #[serde(default)]
    pub filter_secondary: bool,
    #[serde(default)]
    pub filter_qc_fail: bool,
    #[serde(default)]
    pub filter_supplementary: bool,
    /// Reference FASTA id; defaults to the track id.
    pub reference: Option<String>,
}

impl ReadsQuery {
    pub fn window_request(&self, default_budget: usize, default_frame: u64) -> Result<WindowRequest> {
        let interval = GenomicInterval::new(self.chromosome.as_str(), self.start, self.end)?;
        let scale = ScaleFactor::new(self.scale)?;
        Ok(WindowRequest {
            frame: self.frame.unwrap_or(default_frame),
            direction: self.direction,
            show_clipping: self.show_clipping,
            show_splice_junctions: self.show_splice_junctions,
            flag_filter: FlagFilter {
                duplicates: self.filter_duplicates,
                secondary: self.filter_secondary,
                qc_fail: self.filter_qc_fail,
                supplementary: self.filter_supplementary,
            },
            ..WindowRequest::new(interval, scale, self.budget.unwrap_or(default_budget))
        })
    }
}

/// Query parameters for `GET /features/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct FeaturesQuery {
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
    pub scale: f64,
}

impl FeaturesQuery {
    pub fn window(&self) -> Result<(GenomicInterval, ScaleFactor)> {
        Ok((
            GenomicInterval::new(self.chromosome.as_str(), self.start, self.end)?,
            ScaleFactor::new(self.scale)?,
        ))
    }
}

/// Service info response, GA4GH service-info shaped.
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub id: String,
    pub name: String,
    pub r#type: ServiceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub organization: Organization,
    pub version: String,
    pub tracks: TrackCapabilities,
}

#[derive(Debug, Serialize)]
pub struct ServiceType {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct Organization {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackCapabilities {
    pub formats: Vec<Format>,
    pub item_scale_threshold: f64,
    pub max_item_span: u64,
    pub max_bins: u64,
    pub default_budget: usize,
    pub default_frame: u64,
    pub query_timeout_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn reads_query(start: u64, end: u64, scale: f64) -> ReadsQuery {
        ReadsQuery {
            chromosome: "chr1".to_string(),
            start,
            end,
            scale,
            budget: None,
            frame: None,
            direction: TrackDirection::Middle,
            show_clipping: false,
            show_splice_junctions: false,
            filter_duplicates: true,
            filter_secondary: false,
            filter_qc_fail: false,
            filter_supplementary: false,
            reference: None,
        }
    }

    #[test]
    fn test_window_request_defaults() {
        let request = reads_query(100, 200, 1.0).window_request(30, 5).unwrap();
        assert_eq!(request.budget, 30);
        assert_eq!(request.frame, 5);
        assert!(request.flag_filter.duplicates);
        assert!(!request.flag_filter.secondary);
        assert_eq!(request.interval.len(), 101);
    }

    #[test]
    fn test_window_request_validation() {
        assert!(matches!(
            reads_query(200, 100, 1.0).window_request(30, 1),
            Err(Error::InvalidInterval(_))
        ));
        assert!(matches!(
            reads_query(0, 100, 1.0).window_request(30, 1),
            Err(Error::InvalidInterval(_))
        ));
        assert!(matches!(
            reads_query(1, 100, 0.0).window_request(30, 1),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_format_extensions() {
        assert_eq!(Format::Bam.index_extension(), Some("bai"));
        assert_eq!(Format::Bed.index_extension(), None);
        assert_eq!(Format::Fasta.to_string(), "FASTA");
    }
}
