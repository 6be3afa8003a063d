use super::{ReferenceSource, chromosome_alias};
use crate::engine::GenomicInterval;
use crate::{Error, Result};
use noodles::fasta::fai;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Random access to a FASTA file through its `.fai` index.
pub struct FastaReference {
    file: File,
    index: fai::Index,
}

impl FastaReference {
    pub fn open(fasta_path: &Path, index_path: &Path) -> Result<Self> {
        let index = fai::read(index_path)
            .map_err(|e| Error::SourceRead(format!("failed to read FAI index: {}", e)))?;
        let file = File::open(fasta_path)
            .map_err(|e| Error::SourceRead(format!("failed to open FASTA file: {}", e)))?;
        Ok(Self { file, index })
    }

    fn record(&self, name: &str) -> Option<&fai::Record> {
        // FAI Index wraps Vec<Record>, access via as_ref()
        self.index
            .as_ref()
            .iter()
            .find(|r| r.name() == name.as_bytes())
    }

    pub fn sequence_length(&self, name: &str) -> Option<u64> {
        self.record(name).map(|r| r.length() as u64)
    }

    /// Bases for `interval`, clamped to the sequence end. Newlines between
    /// FASTA lines are stripped.
    pub fn slice(&mut self, interval: &GenomicInterval) -> Result<Vec<u8>> {
        let record = self.record(interval.chromosome()).ok_or_else(|| {
            Error::NotFound(format!(
                "sequence not found in reference: {}",
                interval.chromosome()
            ))
        })?;

        let seq_length = record.length() as u64;
        let offset = record.offset();
        let line_bases = record.line_bases() as u64;
        let line_width = record.line_width() as u64;

        // 0-based half-open base range
        let start_base = interval.start() - 1;
        let end_base = interval.end().min(seq_length);
        if start_base >= end_base || line_bases == 0 {
            return Ok(Vec::new());
        }

        // Each line has line_bases bases and line_width bytes
        let byte_start = offset + (start_base / line_bases) * line_width + start_base % line_bases;
        let byte_end =
            offset + ((end_base - 1) / line_bases) * line_width + (end_base - 1) % line_bases + 1;

        self.file.seek(SeekFrom::Start(byte_start))?;
        let mut raw = vec![0u8; (byte_end - byte_start) as usize];
        self.file
            .read_exact(&mut raw)
            .map_err(|e| Error::SourceRead(format!("failed to read FASTA bases: {}", e)))?;
        raw.retain(|b| *b != b'\n' && *b != b'\r');
        Ok(raw)
    }
}

impl ReferenceSource for FastaReference {
    fn reference_slice(&mut self, interval: &GenomicInterval) -> Result<Vec<u8>> {
        if self.record(interval.chromosome()).is_none() {
            let alias = chromosome_alias(interval.chromosome());
            if self.record(&alias).is_some() {
                return self.slice(&interval.with_chromosome(alias));
            }
        }
        self.slice(interval)
    }
}
