// src/batch/mod.rs

//! Batch driver: normalize, extract and emit, one document at a time.
//!
//! A document that fails (unreadable source, panic while normalizing or
//! extracting, sink write error) is reported and skipped; the batch always
//! runs to the end of its input.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::extractors::normalize::NormalizedDocument;
use crate::extractors::section::{ExtractionOutcome, SectionExtractor};
use crate::storage::{RecordSink, SectionRecord};
use crate::utils::error::SourceError;

/// One document as supplied by the document source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub doc_id: String,
    pub raw_text: String,
}

impl RawDocument {
    pub fn new(doc_id: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            raw_text: raw_text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentStatus {
    /// Sections were found and every record reached the sink.
    Extracted { records: usize },
    /// No configured section was found.
    Miss,
    /// Processing failed; any records emitted before the failure still count.
    Failed { reason: String, records: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReport {
    pub doc_id: String,
    pub status: DocumentStatus,
}

/// Per-run counts and per-document results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub documents: Vec<DocumentReport>,
    /// Set when the sink failed to flush at the end of the run. Records
    /// counted as emitted may not have reached storage.
    pub sink_error: Option<String>,
}

impl BatchSummary {
    pub fn documents_processed(&self) -> usize {
        self.documents.len()
    }

    pub fn records_emitted(&self) -> usize {
        self.documents
            .iter()
            .map(|d| match d.status {
                DocumentStatus::Extracted { records } | DocumentStatus::Failed { records, .. } => records,
                DocumentStatus::Miss => 0,
            })
            .sum()
    }

    pub fn misses(&self) -> impl Iterator<Item = &DocumentReport> {
        self.documents
            .iter()
            .filter(|d| d.status == DocumentStatus::Miss)
    }

    pub fn failures(&self) -> impl Iterator<Item = &DocumentReport> {
        self.documents
            .iter()
            .filter(|d| matches!(d.status, DocumentStatus::Failed { .. }))
    }

    pub fn miss_count(&self) -> usize {
        self.misses().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn has_sink_error(&self) -> bool {
        self.sink_error.is_some()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} documents processed, {} records emitted, {} with no matches, {} failed",
            self.documents_processed(),
            self.records_emitted(),
            self.miss_count(),
            self.failure_count()
        )?;
        if let Some(e) = &self.sink_error {
            write!(f, ", sink error: {}", e)?;
        }
        Ok(())
    }
}

/// Runs `extractor` over `documents`, emitting one record per extracted
/// section to `sink` in configuration order.
pub fn run<I, S>(documents: I, extractor: &SectionExtractor, sink: &mut S) -> BatchSummary
where
    I: IntoIterator<Item = Result<RawDocument, SourceError>>,
    S: RecordSink + ?Sized,
{
    run_with_observer(documents, extractor, sink, |_, _| {})
}

/// Same as [`run`], but calls `observe` with every successfully extracted
/// document before its records are emitted.
pub fn run_with_observer<I, S, F>(
    documents: I,
    extractor: &SectionExtractor,
    sink: &mut S,
    mut observe: F,
) -> BatchSummary
where
    I: IntoIterator<Item = Result<RawDocument, SourceError>>,
    S: RecordSink + ?Sized,
    F: FnMut(&NormalizedDocument, &ExtractionOutcome),
{
    let mut summary = BatchSummary::default();

    for (index, item) in documents.into_iter().enumerate() {
        let report = match item {
            Ok(document) => process_document(document, extractor, sink, &mut observe),
            Err(e) => DocumentReport {
                doc_id: source_doc_id(&e, index),
                status: DocumentStatus::Failed { reason: e.to_string(), records: 0 },
            },
        };

        match &report.status {
            DocumentStatus::Extracted { records } => {
                tracing::info!("{}: emitted {} sections", report.doc_id, records);
            }
            DocumentStatus::Miss => {
                tracing::warn!("No matches in {}", report.doc_id);
            }
            DocumentStatus::Failed { reason, .. } => {
                tracing::error!("Failed to process {}: {}", report.doc_id, reason);
            }
        }
        summary.documents.push(report);
    }

    if let Err(e) = sink.flush() {
        tracing::error!("Failed to flush record sink: {}", e);
        summary.sink_error = Some(e.to_string());
    }

    tracing::info!("Batch finished: {}", summary);
    summary
}

fn process_document<S, F>(
    document: RawDocument,
    extractor: &SectionExtractor,
    sink: &mut S,
    observe: &mut F,
) -> DocumentReport
where
    S: RecordSink + ?Sized,
    F: FnMut(&NormalizedDocument, &ExtractionOutcome),
{
    let RawDocument { doc_id, raw_text } = document;
    tracing::debug!("Processing {} ({} bytes)", doc_id, raw_text.len());

    // Nothing here touches shared state, so a panic cannot leave anything half-updated
    let extracted = panic::catch_unwind(AssertUnwindSafe(|| {
        let normalized = NormalizedDocument::from_raw(doc_id.as_str(), &raw_text);
        let outcome = extractor.extract(&normalized);
        (normalized, outcome)
    }));

    let (normalized, outcome) = match extracted {
        Ok(result) => result,
        Err(payload) => {
            return DocumentReport {
                doc_id,
                status: DocumentStatus::Failed {
                    reason: format!("panic during extraction: {}", panic_message(payload.as_ref())),
                    records: 0,
                },
            };
        }
    };

    observe(&normalized, &outcome);
    drop(normalized);

    if outcome.is_miss() {
        return DocumentReport { doc_id, status: DocumentStatus::Miss };
    }

    let mut records = 0;
    for section in outcome.sections() {
        if let Err(e) = sink.emit(&SectionRecord::from(section)) {
            return DocumentReport {
                doc_id,
                status: DocumentStatus::Failed {
                    reason: format!("could not emit '{}': {}", section.section_name, e),
                    records,
                },
            };
        }
        records += 1;
    }

    DocumentReport { doc_id, status: DocumentStatus::Extracted { records } }
}

fn source_doc_id(error: &SourceError, index: usize) -> String {
    match error {
        SourceError::Read { path, .. } => path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("#{}", index)),
        SourceError::List { .. } => format!("#{}", index),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
