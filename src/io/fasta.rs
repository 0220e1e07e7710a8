use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use noodles::fasta;
use tracing::warn;

use crate::errors::PoaError;

/// A named read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub name: String,
    pub sequence: Vec<u8>,
}

/// Open a possibly gzipped file for buffered reading, based on its extension.
pub fn open_maybe_gzipped(path: impl AsRef<Path>) -> Result<Box<dyn BufRead + Send>, PoaError> {
    let p = path.as_ref();
    let is_gzipped = p.extension().map_or(false, |ext| ext == "gz");

    let reader: Box<dyn BufRead + Send> = if is_gzipped {
        Box::new(File::open(p).map(MultiGzDecoder::new).map(BufReader::new)?)
    } else {
        Box::new(File::open(p).map(BufReader::new)?)
    };

    Ok(reader)
}

/// Read all FASTA records. Sequences are upper-cased, so soft-masked bases align to
/// their unmasked counterparts.
pub fn read_fasta(reader_inner: impl BufRead) -> Result<Vec<SequenceRecord>, PoaError> {
    let mut reader = fasta::io::Reader::new(reader_inner);
    let mut records = Vec::new();

    for record in reader.records() {
        let r = record?;
        let name = String::from_utf8_lossy(r.name()).into_owned();
        let sequence = r.sequence().as_ref().to_ascii_uppercase();

        if sequence.is_empty() {
            warn!(name = %name, "Skipping empty record.");
            continue;
        }

        records.push(SequenceRecord { name, sequence });
    }

    Ok(records)
}

pub fn read_fasta_file(path: impl AsRef<Path>) -> Result<Vec<SequenceRecord>, PoaError> {
    read_fasta(open_maybe_gzipped(path)?)
}
