use super::{AlignmentSource, ReadIter};
use crate::engine::{CigarKind, CigarOp, GenomicInterval, RawRead, Strand};
use crate::{Error, Result};
use noodles::bam;
use noodles::bam::bai;
use noodles::bgzf;
use noodles::core::{Position, Region};
use noodles::sam;
use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::alignment::record::data::field::{Tag, Value};
use std::fs::File;
use std::path::Path;

type BamReader = bam::io::IndexedReader<bgzf::Reader<File>>;

const XS: Tag = Tag::new(b'X', b'S');

/// Indexed BAM file.
pub struct BamSource {
    reader: BamReader,
    header: sam::Header,
}

impl BamSource {
    pub fn open(bam_path: &Path, index_path: &Path) -> Result<Self> {
        let index = bai::read(index_path)
            .map_err(|e| Error::SourceRead(format!("failed to read BAI index: {}", e)))?;
        let file = File::open(bam_path)
            .map_err(|e| Error::SourceRead(format!("failed to open BAM file: {}", e)))?;

        // IndexedReader::new wraps the file in a BGZF reader internally - don't double-wrap
        let mut reader = bam::io::IndexedReader::new(file, index);
        let header = reader
            .read_header()
            .map_err(|e| Error::SourceRead(format!("failed to read BAM header: {}", e)))?;

        Ok(Self { reader, header })
    }
}

impl AlignmentSource for BamSource {
    fn chromosome_length(&mut self, chromosome: &str) -> Result<Option<u64>> {
        Ok(self
            .header
            .reference_sequences()
            .get(chromosome.as_bytes())
            .map(|rs| rs.length().get() as u64))
    }

    fn query_overlapping(&mut self, interval: &GenomicInterval) -> Result<ReadIter<'_>> {
        let start = Position::try_from(interval.start() as usize)
            .map_err(|e| Error::InvalidInterval(format!("invalid start position: {}", e)))?;
        let end = Position::try_from(interval.end() as usize)
            .map_err(|e| Error::InvalidInterval(format!("invalid end position: {}", e)))?;
        let region = Region::new(interval.chromosome(), start..=end);

        let query = self
            .reader
            .query(&self.header, &region)
            .map_err(|e| Error::SourceRead(format!("index query failed: {}", e)))?;

        Ok(Box::new(query.map(|result| {
            let record =
                result.map_err(|e| Error::SourceRead(format!("failed to read record: {}", e)))?;
            ingest(&record)
        })))
    }
}

/// Copies the fields the engine needs out of a lazily decoded BAM record.
fn ingest(record: &bam::Record) -> Result<RawRead> {
    let start = match record.alignment_start() {
        Some(position) => position
            .map_err(|e| Error::SourceRead(format!("invalid alignment start: {}", e)))?
            .get() as u64,
        None => 0,
    };

    let cigar = record
        .cigar()
        .iter()
        .map(|op| {
            op.map(|op| CigarOp::new(convert_kind(op.kind()), op.len() as u32))
                .map_err(|e| Error::SourceRead(format!("invalid CIGAR: {}", e)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RawRead {
        name: record
            .name()
            .map(|name| name.to_string())
            .unwrap_or_default(),
        flags: record.flags().bits(),
        start,
        mapping_quality: record.mapping_quality().map(|q| q.get()),
        cigar,
        bases: record.sequence().iter().collect(),
        xs_strand: xs_strand(record)?,
    })
}

/// Transcript strand written by spliced aligners, as a character or a
/// one-letter string.
fn xs_strand(record: &bam::Record) -> Result<Option<Strand>> {
    let data = record.data();
    let value = match data.get(&XS) {
        Some(result) => {
            result.map_err(|e| Error::SourceRead(format!("invalid XS tag: {}", e)))?
        }
        None => return Ok(None),
    };
    let symbol = match value {
        Value::Character(c) => Some(c),
        Value::String(s) => s.first().copied(),
        _ => None,
    };
    Ok(match symbol {
        Some(b'+') => Some(Strand::Forward),
        Some(b'-') => Some(Strand::Reverse),
        _ => None,
    })
}

fn convert_kind(kind: Kind) -> CigarKind {
    match kind {
        Kind::Match => CigarKind::Match,
        Kind::Insertion => CigarKind::Insertion,
        Kind::Deletion => CigarKind::Deletion,
        Kind::Skip => CigarKind::Skip,
        Kind::SoftClip => CigarKind::SoftClip,
        Kind::HardClip => CigarKind::HardClip,
        Kind::Pad => CigarKind::Pad,
        Kind::SequenceMatch => CigarKind::SequenceMatch,
        Kind::SequenceMismatch => CigarKind::SequenceMismatch,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::engine::read::{FLAG_DUPLICATE, FLAG_REVERSE};
    use noodles::csi::binning_index::{Indexer, index::reference_sequence::bin::Chunk};
    use noodles::sam::alignment::RecordBuf;
    use noodles::sam::alignment::io::Write as _;
    use noodles::sam::alignment::record::cigar::Op;
    use noodles::sam::alignment::record::{Flags, MappingQuality};
    use noodles::sam::alignment::record_buf::{Cigar, Data, Sequence};
    use noodles::sam::alignment::record_buf::data::field::Value as BufValue;
    use noodles::sam::header::record::value::{Map, map::ReferenceSequence};
    use std::num::NonZeroUsize;

    /// One alignment to write into a fixture BAM, on reference sequence 0.
    pub(crate) struct FixtureRead<'a> {
        pub name: &'a str,
        pub flags: u16,
        pub start: usize,
        pub mapping_quality: Option<u8>,
        pub cigar: Vec<(Kind, usize)>,
        pub bases: &'a str,
        pub xs: Option<u8>,
    }

    impl<'a> FixtureRead<'a> {
        pub(crate) fn matched(name: &'a str, start: usize, bases: &'a str) -> Self {
            Self {
                name,
                flags: 0,
                start,
                mapping_quality: Some(60),
                cigar: vec![(Kind::Match, bases.len())],
                bases,
                xs: None,
            }
        }
    }

    fn record_buf(read: &FixtureRead<'_>) -> RecordBuf {
        let cigar: Cigar = read
            .cigar
            .iter()
            .map(|&(kind, len)| Op::new(kind, len))
            .collect();
        let data: Data = read
            .xs
            .map(|c| (XS, BufValue::Character(c)))
            .into_iter()
            .collect();

        let mut builder = RecordBuf::builder()
            .set_name(read.name)
            .set_flags(Flags::from(read.flags))
            .set_reference_sequence_id(0)
            .set_alignment_start(Position::try_from(read.start).unwrap())
            .set_cigar(cigar)
            .set_sequence(Sequence::from(read.bases.as_bytes().to_vec()))
            .set_data(data);
        if let Some(q) = read.mapping_quality.and_then(MappingQuality::new) {
            builder = builder.set_mapping_quality(q);
        }
        builder.build()
    }

    /// Writes a coordinate-sorted BAM with a single reference sequence and a
    /// BAI next to it. Returns the BAM and index paths.
    pub(crate) fn write_indexed_bam(
        dir: &Path,
        stem: &str,
        chromosome: &str,
        length: usize,
        reads: &[FixtureRead<'_>],
    ) -> (std::path::PathBuf, std::path::PathBuf) {
        let bam_path = dir.join(format!("{}.bam", stem));
        let bai_path = dir.join(format!("{}.bam.bai", stem));

        let header = sam::Header::builder()
            .add_reference_sequence(
                chromosome,
                Map::<ReferenceSequence>::new(NonZeroUsize::new(length).unwrap()),
            )
            .build();

        let mut writer = bam::io::Writer::new(File::create(&bam_path).unwrap());
        writer.write_header(&header).unwrap();
        for read in reads {
            writer
                .write_alignment_record(&header, &record_buf(read))
                .unwrap();
        }
        writer.try_finish().unwrap();
        drop(writer);

        let mut reader = bam::io::reader::Builder.build_from_path(&bam_path).unwrap();
        let header = reader.read_header().unwrap();
        let mut record = bam::Record::default();
        let mut indexer = Indexer::default();
        let mut chunk_start = reader.get_ref().virtual_position();
        while reader.read_record(&mut record).unwrap() != 0 {
            let chunk_end = reader.get_ref().virtual_position();
            let context = match (
                record.reference_sequence_id().transpose().unwrap(),
                record.alignment_start().transpose().unwrap(),
                sam::alignment::Record::alignment_end(&record)
                    .transpose()
                    .unwrap(),
            ) {
                (Some(id), Some(start), Some(end)) => {
                    Some((id, start, end, !record.flags().is_unmapped()))
                }
                _ => None,
            };
            indexer
                .add_record(context, Chunk::new(chunk_start, chunk_end))
                .unwrap();
            chunk_start = chunk_end;
        }
        let index = indexer.build(header.reference_sequences().len());
        bai::write(&bai_path, &index).unwrap();

        (bam_path, bai_path)
    }

    fn fixture_reads() -> Vec<FixtureRead<'static>> {
        vec![
            FixtureRead {
                name: "spliced",
                flags: FLAG_REVERSE,
                start: 5,
                mapping_quality: None,
                cigar: vec![(Kind::SoftClip, 2), (Kind::Match, 4), (Kind::Skip, 50), (Kind::Match, 4)],
                bases: "TTACGTACGT",
                xs: Some(b'+'),
            },
            FixtureRead::matched("plain", 20, "ACGTAC"),
            FixtureRead {
                flags: FLAG_DUPLICATE,
                ..FixtureRead::matched("dup", 200, "GGCC")
            },
        ]
    }

    #[test]
    fn test_convert_kind_reference_consumption() {
        assert!(convert_kind(Kind::Deletion).consumes_reference());
        assert!(!convert_kind(Kind::SoftClip).consumes_reference());
        assert!(convert_kind(Kind::Insertion).consumes_read());
    }

    #[test]
    fn test_open_written_bam() {
        let dir = tempfile::tempdir().unwrap();
        let (bam_path, bai_path) =
            write_indexed_bam(dir.path(), "sample", "chr1", 1000, &fixture_reads());

        let mut source = BamSource::open(&bam_path, &bai_path).unwrap();
        assert_eq!(source.chromosome_length("chr1").unwrap(), Some(1000));
        assert_eq!(source.chromosome_length("no-such-contig").unwrap(), None);
    }

    #[test]
    fn test_ingest_copies_record_fields() {
        let dir = tempfile::tempdir().unwrap();
        let (bam_path, bai_path) =
            write_indexed_bam(dir.path(), "sample", "chr1", 1000, &fixture_reads());
        let mut source = BamSource::open(&bam_path, &bai_path).unwrap();

        let window = GenomicInterval::new("chr1", 1, 100).unwrap();
        let reads: Vec<RawRead> = source
            .query_overlapping(&window)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(reads.len(), 2);

        let spliced = &reads[0];
        assert_eq!(spliced.name, "spliced");
        assert_eq!(spliced.start, 5);
        assert_eq!(spliced.cigar_string(), "2S4M50N4M");
        assert_eq!(spliced.end(), 62);
        assert_eq!(spliced.bases, b"TTACGTACGT".to_vec());
        assert_eq!(spliced.mapping_quality, None);
        assert_eq!(spliced.strand(), Strand::Reverse);
        assert_eq!(spliced.xs_strand, Some(Strand::Forward));
        assert_eq!(spliced.junction_strand(), Strand::Forward);

        let plain = &reads[1];
        assert_eq!(plain.name, "plain");
        assert_eq!(plain.start, 20);
        assert_eq!(plain.mapping_quality, Some(60));
        assert_eq!(plain.xs_strand, None);
    }

    #[test]
    fn test_query_uses_index_region() {
        let dir = tempfile::tempdir().unwrap();
        let (bam_path, bai_path) =
            write_indexed_bam(dir.path(), "sample", "chr1", 1000, &fixture_reads());
        let mut source = BamSource::open(&bam_path, &bai_path).unwrap();

        let window = GenomicInterval::new("chr1", 150, 300).unwrap();
        let reads: Vec<RawRead> = source
            .query_overlapping(&window)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(reads.len(), 1);
        assert_eq!(reads[0].name, "dup");
        assert!(reads[0].has_flag(FLAG_DUPLICATE));
    }
}
