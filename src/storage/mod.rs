// src/storage/mod.rs
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::batch::RawDocument;
use crate::extractors::section::ExtractedSection;
use crate::extractors::normalize::decode_bytes;
use crate::utils::error::{SourceError, StorageError};

// File extensions picked up from a raw corpus directory
const CORPUS_EXTENSIONS: [&str; 3] = ["html", "htm", "txt"];

/// One output line: a labeled section of one filing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRecord {
    pub doc_id: String,
    #[serde(rename = "section")]
    pub section_name: String,
    pub text: String,
}

impl From<&ExtractedSection> for SectionRecord {
    fn from(section: &ExtractedSection) -> Self {
        Self {
            doc_id: section.doc_id.clone(),
            section_name: section.section_name.clone(),
            text: section.text.clone(),
        }
    }
}

/// Receives emitted records. Whether output is appended or overwritten is
/// decided by the sink, never by the batch driver.
pub trait RecordSink {
    fn emit(&mut self, record: &SectionRecord) -> Result<(), StorageError>;

    fn flush(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}

impl RecordSink for Vec<SectionRecord> {
    fn emit(&mut self, record: &SectionRecord) -> Result<(), StorageError> {
        self.push(record.clone());
        Ok(())
    }
}

/// Writes one JSON object per line.
pub struct JsonlSink<W: Write> {
    writer: W,
    records_written: usize,
}

impl<W: Write> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, records_written: 0 }
    }

    pub fn records_written(&self) -> usize {
        self.records_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonlSink<BufWriter<fs::File>> {
    /// Opens `path` for writing, creating parent directories. Existing content
    /// is truncated unless `append` is set.
    pub fn create<P: AsRef<Path>>(path: P, append: bool) -> Result<Self, StorageError> {
        let path = path.as_ref();

        // Create the parent directory if it doesn't exist
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(StorageError::IoError)?;
            }
        }

        let file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)
            .map_err(StorageError::IoError)?;

        tracing::info!(
            "Writing records to {} ({})",
            path.display(),
            if append { "append" } else { "overwrite" }
        );
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> RecordSink for JsonlSink<W> {
    fn emit(&mut self, record: &SectionRecord) -> Result<(), StorageError> {
        let line = serde_json::to_string(record)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.records_written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Document source over a directory of raw filings (`*.html`, `*.htm`, `*.txt`).
///
/// Files are visited in file-name order and read one at a time; the file stem
/// is the document id.
pub struct CorpusReader {
    paths: std::vec::IntoIter<PathBuf>,
}

impl CorpusReader {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, SourceError> {
        let dir = dir.as_ref();
        let list_err = |source| SourceError::List { path: dir.to_path_buf(), source };

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(list_err)? {
            let path = entry.map_err(list_err)?.path();
            if path.is_file() && is_corpus_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        tracing::info!("Found {} filings in {}", paths.len(), dir.display());
        Ok(Self { paths: paths.into_iter() })
    }

    pub fn remaining(&self) -> usize {
        self.paths.len()
    }
}

impl Iterator for CorpusReader {
    type Item = Result<RawDocument, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.paths.next()?;
        let doc_id = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Some(match fs::read(&path) {
            Ok(bytes) => Ok(RawDocument {
                doc_id,
                raw_text: decode_bytes(&bytes),
            }),
            Err(source) => Err(SourceError::Read { path, source }),
        })
    }
}

fn is_corpus_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| CORPUS_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}
