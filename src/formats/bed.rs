use super::{FeatureIter, FeatureSource};
use crate::engine::{Feature, GenomicInterval, Strand};
use crate::{Error, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// One BED line in 1-based inclusive coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecord {
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strand: Option<Strand>,
}

impl Feature for FeatureRecord {
    fn start(&self) -> u64 {
        self.start
    }

    fn end(&self) -> u64 {
        self.end
    }

    fn score(&self) -> Option<f64> {
        self.score
    }
}

impl FeatureRecord {
    /// Parses a BED3+ line. Header, track and comment lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty()
            || line.starts_with('#')
            || line.starts_with("track")
            || line.starts_with("browser")
        {
            return Ok(None);
        }

        let mut fields = line.split('\t');
        let chromosome = fields
            .next()
            .ok_or_else(|| Error::SourceRead(format!("missing chromosome: {}", line)))?;
        let start: u64 = parse_field(fields.next(), "start", line)?;
        let end: u64 = parse_field(fields.next(), "end", line)?;
        if end <= start {
            return Err(Error::SourceRead(format!("empty BED interval: {}", line)));
        }

        let name = fields
            .next()
            .filter(|s| !s.is_empty() && *s != ".")
            .map(str::to_string);
        let score = fields.next().and_then(|s| s.parse::<f64>().ok());
        let strand = match fields.next() {
            Some("+") => Some(Strand::Forward),
            Some("-") => Some(Strand::Reverse),
            _ => None,
        };

        // BED is 0-based half-open
        Ok(Some(Self {
            chromosome: chromosome.to_string(),
            start: start + 1,
            end,
            name,
            score,
            strand,
        }))
    }
}

fn parse_field(field: Option<&str>, what: &str, line: &str) -> Result<u64> {
    field
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| Error::SourceRead(format!("invalid BED {}: {}", what, line)))
}

/// Uncompressed BED file scanned line by line on every query.
pub struct BedSource {
    path: PathBuf,
}

impl BedSource {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!("{}", path.display())));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl FeatureSource for BedSource {
    fn query_overlapping(&mut self, interval: &GenomicInterval) -> Result<FeatureIter<'_>> {
        let file = File::open(&self.path)
            .map_err(|e| Error::SourceRead(format!("failed to open BED file: {}", e)))?;
        let window = interval.clone();

        let records = BufReader::new(file).lines().filter_map(move |line| {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    return Some(Err(Error::SourceRead(format!(
                        "failed to read BED line: {}",
                        e
                    ))));
                }
            };
            match FeatureRecord::parse(&line) {
                Ok(Some(record))
                    if record.chromosome == window.chromosome()
                        && window.overlaps(record.start, record.end) =>
                {
                    Some(Ok(record))
                }
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            }
        });

        Ok(Box::new(records))
    }
}
