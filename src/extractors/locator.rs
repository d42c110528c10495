// src/extractors/locator.rs

//! Section boundary location over normalized text.
//!
//! The heading is the first match of the section's start pattern in document
//! order, and the section ends at the first match of its end pattern after
//! that heading. Filings usually carry a table of contents ahead of the body,
//! so the first heading match is often the table-of-contents line and the
//! located span then runs from that line to the next heading found after it.
//! That behavior is kept as the default; [`HeadingSelection::SkipShortBodies`]
//! is an opt-in alternative.

use std::ops::Range;

use serde::Deserialize;

use crate::extractors::normalize::NormalizedDocument;
use crate::extractors::section::SectionSpec;

/// How to choose among several start-pattern matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum HeadingSelection {
    /// First occurrence in document order.
    #[default]
    First,
    /// First occurrence whose trimmed body is at least `min_body_len` bytes long.
    SkipShortBodies { min_body_len: usize },
}

/// Where one section was found in a normalized document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMatch {
    /// Match of the start pattern (the section heading).
    pub heading: Range<usize>,
    /// Match of the end pattern (the next section's heading).
    pub end_marker: Range<usize>,
}

impl SectionMatch {
    /// Untrimmed body span: `[heading.end, end_marker.start)`.
    pub fn span(&self) -> Range<usize> {
        self.heading.end..self.end_marker.start
    }

    /// Body span with leading and trailing whitespace removed. Empty when the
    /// body is blank.
    pub fn trimmed_span(&self, text: &str) -> Range<usize> {
        let span = self.span();
        let raw = &text[span.clone()];
        let start = span.start + (raw.len() - raw.trim_start().len());
        start..start + raw.trim().len()
    }
}

/// Locates `spec` in `doc` using the default first-occurrence rule.
pub fn locate(doc: &NormalizedDocument, spec: &SectionSpec) -> Option<SectionMatch> {
    locate_with(doc, spec, HeadingSelection::First)
}

/// Locates `spec` in `doc`. Absence is `None`, never an error, and a heading
/// without a following end marker is treated as absent.
pub fn locate_with(
    doc: &NormalizedDocument,
    spec: &SectionSpec,
    selection: HeadingSelection,
) -> Option<SectionMatch> {
    let text = doc.text.as_str();

    match selection {
        HeadingSelection::First => {
            let heading = spec.start_pattern().find_at(text, 0)?;
            tracing::trace!("'{}' heading candidate at {:?} in {}", spec.name(), heading, doc.doc_id);
            bounded_by_end(text, spec, heading)
        }
        HeadingSelection::SkipShortBodies { min_body_len } => {
            let mut from = 0;
            while from <= text.len() {
                let heading = spec.start_pattern().find_at(text, from)?;
                tracing::trace!("'{}' heading candidate at {:?} in {}", spec.name(), heading, doc.doc_id);

                // An end marker missing after this heading is missing after every later one too
                let found = bounded_by_end(text, spec, heading.clone())?;
                let body_len = found.trimmed_span(text).len();
                if body_len >= min_body_len {
                    return Some(found);
                }

                tracing::debug!(
                    "Skipping '{}' heading at {} in {}: body of {} bytes is shorter than {}",
                    spec.name(), heading.start, doc.doc_id, body_len, min_body_len
                );
                from = next_char_boundary(text, heading.start);
            }
            None
        }
    }
}

fn bounded_by_end(text: &str, spec: &SectionSpec, heading: Range<usize>) -> Option<SectionMatch> {
    match spec.end_pattern().find_at(text, heading.end) {
        Some(end_marker) => Some(SectionMatch { heading, end_marker }),
        None => {
            tracing::debug!(
                "'{}' heading found at {} but no end marker follows it",
                spec.name(), heading.start
            );
            None
        }
    }
}

fn next_char_boundary(text: &str, at: usize) -> usize {
    text[at..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| at + c.len_utf8())
}
