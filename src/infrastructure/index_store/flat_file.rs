//! Line-oriented index file.
//!
//! One record per line, four tab-separated fields:
//!
//! ```text
//! <id>\t<v0,v1,...,vN-1>\t<filename>\t<chunk text>
//! ```
//!
//! Vector components are written with 7 decimal digits. The text field runs
//! to the end of the line and never contains tabs or newlines.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::domain::{ports::IndexWriter, DomainError, IndexRecord, VectorIndex};

const FIELD_BREAKS: &[char] = &['\t', '\n', '\r'];

pub fn format_record(record: &IndexRecord) -> String {
    let vector = record
        .embedding
        .as_slice()
        .iter()
        .map(|v| format!("{v:.7}"))
        .collect::<Vec<_>>()
        .join(",");

    format!(
        "{}\t{}\t{}\t{}",
        record.id,
        vector,
        record.filename.replace(FIELD_BREAKS, " "),
        record.text.replace(FIELD_BREAKS, " ")
    )
}

/// Parses one index line; `None` marks a line to discard.
pub fn parse_line(line: &str) -> Option<IndexRecord> {
    let mut fields = line.splitn(4, '\t');
    let id = trim_field(fields.next()?);
    let vector = trim_field(fields.next()?);
    let filename = trim_field(fields.next()?);
    let text = fields.next()?;

    if id.is_empty() || vector.is_empty() || filename.is_empty() {
        return None;
    }

    let id: u64 = id.parse().ok()?;
    let vector = parse_vector(vector);
    if vector.is_empty() {
        return None;
    }

    Some(IndexRecord::new(id, vector, filename, text))
}

fn trim_field(field: &str) -> &str {
    field.trim_matches(|c: char| c <= ' ')
}

/// Unparsable or non-finite components read as `0.0`; empty tokens are skipped.
fn parse_vector(csv: &str) -> Vec<f32> {
    csv.split(',')
        .map(|token| token.trim_matches(|c| c == ' ' || c == '\t'))
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .unwrap_or(0.0)
        })
        .collect()
}

pub struct FlatFileIndex;

impl FlatFileIndex {
    /// Loads every well-formed line of the file at `path`.
    ///
    /// Malformed lines are dropped. Fails only when the file cannot be read or
    /// nothing usable is in it.
    #[instrument(fields(path = %path.as_ref().display()), skip(path))]
    pub fn load(path: impl AsRef<Path>) -> Result<VectorIndex, DomainError> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let mut records = Vec::new();
        let mut discarded = 0usize;

        for (number, raw) in reader.split(b'\n').enumerate() {
            let raw = raw?;
            let Ok(line) = String::from_utf8(raw) else {
                discarded += 1;
                debug!(line = number + 1, "discarding non-UTF-8 index line");
                continue;
            };
            let line = line.strip_suffix('\r').unwrap_or(&line);
            if line.is_empty() {
                continue;
            }

            match parse_line(line) {
                Some(record) => records.push(record),
                None => {
                    discarded += 1;
                    debug!(line = number + 1, "discarding malformed index line");
                }
            }
        }

        if records.is_empty() {
            return Err(DomainError::validation(format!(
                "index {} has no usable records",
                path.as_ref().display()
            )));
        }

        info!(records = records.len(), discarded, "index loaded");
        Ok(VectorIndex::new(records))
    }
}

/// Appends records to an index file, truncating any previous content.
pub struct FlatFileIndexWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl FlatFileIndexWriter {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let path = path.into();
        let file = File::create(&path).map_err(|e| {
            DomainError::internal(format!("cannot open index output {}: {e}", path.display()))
        })?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl IndexWriter for FlatFileIndexWriter {
    fn append(&mut self, record: &IndexRecord) -> Result<(), DomainError> {
        writeln!(self.writer, "{}", format_record(record))?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DomainError> {
        self.writer.flush()?;
        Ok(())
    }
}
