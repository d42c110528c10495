// src/lib.rs

//! Section boundary extraction for regulatory filings.
//!
//! Raw filing text is normalized ([`extractors::normalize`]), each configured
//! section is located between its heading and the next section's heading
//! ([`extractors::locator`]), the per-document result is assembled
//! ([`extractors::section`]) and a corpus is streamed through all of it by
//! the batch driver ([`batch`]).

pub mod batch;
pub mod config;
pub mod edgar;
pub mod extractors;
pub mod storage;
pub mod utils;

pub use batch::{run, BatchSummary, DocumentStatus, RawDocument};
pub use config::SectionsConfig;
pub use extractors::{
    ExtractedSection, ExtractionOutcome, HeadingSelection, NormalizedDocument, SectionExtractor,
    SectionSpec,
};
pub use storage::{CorpusReader, JsonlSink, RecordSink, SectionRecord};
pub use utils::AppError;
