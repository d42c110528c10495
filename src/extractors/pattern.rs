// src/extractors/pattern.rs

use std::fmt;
use std::ops::Range;

use regex::{Regex, RegexBuilder};

/// A matcher for a section boundary (opening heading or next-section heading).
///
/// Implementations must be pure: the same text and offset always give the
/// same match, and no state is tied to any particular document.
pub trait BoundaryPattern: fmt::Debug + Send + Sync {
    /// Finds the first match starting at or after byte offset `from`.
    /// `from` is always a char boundary of `text`.
    fn find_at(&self, text: &str, from: usize) -> Option<Range<usize>>;

    /// Human readable form, used in logs and debug output.
    fn describe(&self) -> String;
}

/// Regex boundary matcher. Always case-insensitive, and `.` also matches
/// newlines so headings split across lines still match.
#[derive(Debug, Clone)]
pub struct RegexPattern {
    regex: Regex,
}

impl RegexPattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()?;
        Ok(Self { regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl BoundaryPattern for RegexPattern {
    fn find_at(&self, text: &str, from: usize) -> Option<Range<usize>> {
        self.regex.find_at(text, from).map(|m| m.range())
    }

    fn describe(&self) -> String {
        format!("/{}/i", self.regex.as_str())
    }
}
