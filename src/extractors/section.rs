// src/extractors/section.rs

// --- Imports ---
use std::collections::HashSet;
use std::ops::Range;
use std::sync::Arc;

use crate::extractors::locator::{locate_with, HeadingSelection};
use crate::extractors::normalize::NormalizedDocument;
use crate::extractors::pattern::{BoundaryPattern, RegexPattern};
use crate::utils::error::ConfigError;

// --- Default Section Patterns ---
// Heading must not run straight into a letter ("Item 1A." / "Item 1A\n", not "Item 1Ab").
// Item 7 additionally must not be followed by a digit, so it does not fire on Item 70.
pub const ITEM_1A_START: &str = r"item\s+1a[^a-z]";
pub const ITEM_1A_END: &str = r"item\s+1b";
pub const ITEM_7_START: &str = r"item\s+7[^0-9a-z]";
pub const ITEM_7_END: &str = r"item\s+7a";

// --- Data Structures ---

/// A named section to extract: its opening heading and the heading of the
/// section that follows it (exclusive end boundary).
#[derive(Debug, Clone)]
pub struct SectionSpec {
    name: String,
    start_pattern: Arc<dyn BoundaryPattern>,
    end_pattern: Arc<dyn BoundaryPattern>,
}

impl SectionSpec {
    pub fn new(
        name: impl Into<String>,
        start_pattern: impl BoundaryPattern + 'static,
        end_pattern: impl BoundaryPattern + 'static,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        Ok(Self {
            name,
            start_pattern: Arc::new(start_pattern),
            end_pattern: Arc::new(end_pattern),
        })
    }

    /// Builds a spec from two regex sources. A pattern that fails to compile
    /// is a configuration error.
    pub fn regex(name: &str, start: &str, end: &str) -> Result<Self, ConfigError> {
        let compile = |pattern: &str, role: &'static str| {
            RegexPattern::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                section: name.to_string(),
                role,
                source,
            })
        };
        Self::new(name, compile(start, "start")?, compile(end, "end")?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_pattern(&self) -> &dyn BoundaryPattern {
        self.start_pattern.as_ref()
    }

    pub fn end_pattern(&self) -> &dyn BoundaryPattern {
        self.end_pattern.as_ref()
    }
}

/// Item 1A (Risk Factors) and Item 7 (MD&A), bounded by Item 1B and Item 7A.
pub fn default_specs() -> Vec<SectionSpec> {
    [
        ("item_1a", ITEM_1A_START, ITEM_1A_END),
        ("item_7", ITEM_7_START, ITEM_7_END),
    ]
    .iter()
    .filter_map(|(name, start, end)| SectionSpec::regex(name, start, end).ok())
    .collect()
}

/// Checks that a configured list is usable before any document is processed.
pub fn validate_specs(specs: &[SectionSpec]) -> Result<(), ConfigError> {
    if specs.is_empty() {
        return Err(ConfigError::NoSections);
    }
    let mut seen = HashSet::new();
    for spec in specs {
        if !seen.insert(spec.name()) {
            return Err(ConfigError::DuplicateName(spec.name().to_string()));
        }
    }
    Ok(())
}

/// One located, non-empty section of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedSection {
    pub doc_id: String,
    pub section_name: String,
    pub text: String,
    /// Byte range of `text` inside the normalized document.
    pub span: Range<usize>,
}

/// Result of running every configured spec over one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// At least one section was found; kept in configuration order.
    Sections(Vec<ExtractedSection>),
    /// No configured section was found anywhere in the document.
    Miss,
}

impl ExtractionOutcome {
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss)
    }

    pub fn sections(&self) -> &[ExtractedSection] {
        match self {
            Self::Sections(sections) => sections,
            Self::Miss => &[],
        }
    }

    pub fn get(&self, section_name: &str) -> Option<&ExtractedSection> {
        self.sections().iter().find(|s| s.section_name == section_name)
    }

    pub fn into_sections(self) -> Vec<ExtractedSection> {
        match self {
            Self::Sections(sections) => sections,
            Self::Miss => Vec::new(),
        }
    }
}

// --- Main Extractor Structure ---

/// Runs the locator for a fixed, validated list of section specs.
#[derive(Debug, Clone)]
pub struct SectionExtractor {
    specs: Vec<SectionSpec>,
    selection: HeadingSelection,
}

impl SectionExtractor {
    pub fn new(specs: Vec<SectionSpec>) -> Result<Self, ConfigError> {
        validate_specs(&specs)?;
        Ok(Self {
            specs,
            selection: HeadingSelection::default(),
        })
    }

    pub fn with_selection(mut self, selection: HeadingSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn specs(&self) -> &[SectionSpec] {
        &self.specs
    }

    pub fn selection(&self) -> HeadingSelection {
        self.selection
    }

    /// Extracts every configured section from `doc`. Each spec is located
    /// independently; blank bodies count as not found.
    pub fn extract(&self, doc: &NormalizedDocument) -> ExtractionOutcome {
        extract_with(doc, &self.specs, self.selection)
    }
}

/// Extracts `specs` from `doc` with the default first-heading rule.
pub fn extract(doc: &NormalizedDocument, specs: &[SectionSpec]) -> ExtractionOutcome {
    extract_with(doc, specs, HeadingSelection::First)
}

pub fn extract_with(
    doc: &NormalizedDocument,
    specs: &[SectionSpec],
    selection: HeadingSelection,
) -> ExtractionOutcome {
    let mut sections = Vec::new();

    for spec in specs {
        let Some(found) = locate_with(doc, spec, selection) else {
            tracing::debug!("Section '{}' not found in {}", spec.name(), doc.doc_id);
            continue;
        };

        let span = found.trimmed_span(&doc.text);
        if span.is_empty() {
            tracing::debug!("Section '{}' in {} has an empty body, ignoring", spec.name(), doc.doc_id);
            continue;
        }

        tracing::debug!(
            "Extracted '{}' from {}: bytes {}..{} ({} bytes)",
            spec.name(), doc.doc_id, span.start, span.end, span.len()
        );
        sections.push(ExtractedSection {
            doc_id: doc.doc_id.clone(),
            section_name: spec.name().to_string(),
            text: doc.text[span.clone()].to_string(),
            span,
        });
    }

    if sections.is_empty() {
        ExtractionOutcome::Miss
    } else {
        ExtractionOutcome::Sections(sections)
    }
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> NormalizedDocument {
        NormalizedDocument::from_raw("0001-test", text)
    }

    const FULL_FILING: &str = r#"
        <html><body>
        <p>PART I</p>
        <p><b>Item 1A. Risk Factors</b></p>
        <p>Competition in our markets is intense.</p>
        <p><b>Item 1B. Unresolved Staff Comments</b></p>
        <p>None.</p>
        <p>PART II</p>
        <p><b>Item 7. Management's Discussion and Analysis</b></p>
        <p>Revenue grew in every segment.</p>
        <p><b>Item 7A. Quantitative and Qualitative Disclosures About Market Risk</b></p>
        </body></html>
    "#;

    #[test]
    fn test_default_specs_compile() {
        let specs = default_specs();
        let names: Vec<_> = specs.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["item_1a", "item_7"]);
    }

    #[test]
    fn test_extracts_both_default_sections_in_order() {
        let outcome = extract(&doc(FULL_FILING), &default_specs());
        let sections = outcome.sections();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].section_name, "item_1a");
        assert_eq!(sections[1].section_name, "item_7");

        let risk = outcome.get("item_1a").unwrap();
        assert!(risk.text.starts_with("Risk Factors"));
        assert!(risk.text.contains("Competition in our markets is intense."));
        assert!(!risk.text.contains("Unresolved"));

        let mdna = outcome.get("item_7").unwrap();
        assert!(mdna.text.starts_with("Management's Discussion and Analysis"));
        assert!(mdna.text.ends_with("Revenue grew in every segment."));
        assert_eq!(mdna.doc_id, "0001-test");
    }

    #[test]
    fn test_span_points_at_text() {
        let d = doc(FULL_FILING);
        let outcome = extract(&d, &default_specs());
        for section in outcome.sections() {
            assert_eq!(&d.text[section.span.clone()], section.text);
        }
    }

    #[test]
    fn test_one_missing_section_does_not_affect_the_other() {
        let d = doc("Item 7. Results improved. Item 7A. Market risk");
        let outcome = extract(&d, &default_specs());
        assert!(!outcome.is_miss());
        assert_eq!(outcome.sections().len(), 1);
        assert_eq!(outcome.get("item_7").unwrap().text, "Results improved.");
        assert!(outcome.get("item_1a").is_none());
    }

    #[test]
    fn test_all_missing_is_a_miss() {
        let outcome = extract(&doc("A proxy statement without any items."), &default_specs());
        assert!(outcome.is_miss());
        assert!(outcome.sections().is_empty());
        assert!(outcome.into_sections().is_empty());
    }

    #[test]
    fn test_blank_body_counts_as_not_found() {
        let outcome = extract(&doc("Item 1A.\n   \nItem 1B."), &default_specs());
        assert_eq!(outcome, ExtractionOutcome::Miss);
    }

    #[test]
    fn test_item_7_does_not_match_item_7a_or_70() {
        let d = doc("Item 70 stuff Item 7A. market Item 7. real body Item 7A. end");
        let outcome = extract(&d, &default_specs());
        assert_eq!(outcome.get("item_7").unwrap().text, "real body");
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let err = SectionSpec::regex("broken", r"item\s+(1a", r"item\s+1b").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { role: "start", .. }));
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(matches!(
            SectionSpec::regex("  ", "a", "b"),
            Err(ConfigError::EmptyName)
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let specs = vec![
            SectionSpec::regex("item_7", ITEM_7_START, ITEM_7_END).unwrap(),
            SectionSpec::regex("item_7", ITEM_7_START, ITEM_7_END).unwrap(),
        ];
        assert!(matches!(
            SectionExtractor::new(specs),
            Err(ConfigError::DuplicateName(name)) if name == "item_7"
        ));
    }

    #[test]
    fn test_no_specs_rejected() {
        assert!(matches!(SectionExtractor::new(Vec::new()), Err(ConfigError::NoSections)));
    }

    #[test]
    fn test_extractor_with_selection_skips_toc_heading() {
        let text = "Item 7. MD&A 40\nItem 7A. Market Risk 55\n\
                    Item 7. Management's Discussion\nSales increased substantially this year.\n\
                    Item 7A. Quantitative Disclosures";
        let extractor = SectionExtractor::new(default_specs())
            .unwrap()
            .with_selection(HeadingSelection::SkipShortBodies { min_body_len: 30 });
        let outcome = extractor.extract(&doc(text));
        assert_eq!(
            outcome.get("item_7").unwrap().text,
            "Management's Discussion\nSales increased substantially this year."
        );

        let first_only = SectionExtractor::new(default_specs()).unwrap().extract(&doc(text));
        assert_eq!(first_only.get("item_7").unwrap().text, "MD&A 40");
    }
}
