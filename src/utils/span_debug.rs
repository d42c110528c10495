// src/utils/span_debug.rs
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::extractors::locator::locate_with;
use crate::extractors::normalize::NormalizedDocument;
use crate::extractors::section::SectionExtractor;
use crate::utils::error::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HighlightKind {
    Heading,
    Body,
    EndMarker,
}

impl HighlightKind {
    fn css_class(self) -> &'static str {
        match self {
            Self::Heading => "highlight-start",
            Self::Body => "highlight-body",
            Self::EndMarker => "highlight-end",
        }
    }
}

#[derive(Debug, Clone)]
struct Highlight {
    range: Range<usize>,
    kind: HighlightKind,
    section: String,
}

/// Renders normalized text as HTML with every located heading, body and end
/// marker highlighted.
pub fn render_annotated(doc: &NormalizedDocument, extractor: &SectionExtractor) -> String {
    let text = doc.text.as_str();

    let mut highlights = Vec::new();
    for spec in extractor.specs() {
        let Some(found) = locate_with(doc, spec, extractor.selection()) else {
            continue;
        };
        let body = found.trimmed_span(text);
        highlights.push(Highlight { range: found.heading.clone(), kind: HighlightKind::Heading, section: spec.name().to_string() });
        if !body.is_empty() {
            highlights.push(Highlight { range: body, kind: HighlightKind::Body, section: spec.name().to_string() });
        }
        highlights.push(Highlight { range: found.end_marker.clone(), kind: HighlightKind::EndMarker, section: spec.name().to_string() });
    }
    highlights.sort_by_key(|h| h.range.start);

    // Add debug styling in head
    let mut debug_html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n");
    debug_html.push_str(".highlight-start { background-color: #FFFF00; }\n");
    debug_html.push_str(".highlight-body { background-color: #90EE90; }\n");
    debug_html.push_str(".highlight-end { background-color: #FFA500; }\n");
    debug_html.push_str("</style>\n</head>\n<body>\n");
    debug_html.push_str(&format!("<h1>{}</h1>\n<pre>", escape_html(&doc.doc_id)));

    let mut last_pos = 0;
    for highlight in highlights {
        let Range { start, end } = highlight.range;
        // Sections located independently may overlap; the earlier highlight wins
        if start < last_pos {
            tracing::trace!("Skipping overlapping {:?} highlight for '{}' at {}", highlight.kind, highlight.section, start);
            continue;
        }
        debug_html.push_str(&escape_html(&text[last_pos..start]));
        debug_html.push_str(&format!(
            "<span class=\"{}\" title=\"{}: {}-{}\">",
            highlight.kind.css_class(),
            escape_html(&highlight.section),
            start,
            end
        ));
        debug_html.push_str(&escape_html(&text[start..end]));
        debug_html.push_str("</span>");
        last_pos = end;
    }
    debug_html.push_str(&escape_html(&text[last_pos..]));

    debug_html.push_str("</pre>\n</body>\n</html>");
    debug_html
}

/// Writes the annotated view of `doc` to `<dir>/<doc_id>_annotated.html`.
pub fn save_annotated(
    doc: &NormalizedDocument,
    extractor: &SectionExtractor,
    dir: &Path,
) -> Result<PathBuf, StorageError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}_annotated.html", doc.doc_id));
    fs::write(&path, render_annotated(doc, extractor))?;

    tracing::debug!("Saved debug HTML to {}", path.display());
    Ok(path)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::section::default_specs;

    #[test]
    fn test_annotated_view_marks_boundaries() {
        let doc = NormalizedDocument::from_raw("acme", "Intro Item 7. Sales & costs Item 7A. Risk");
        let extractor = SectionExtractor::new(default_specs()).unwrap();
        let html = render_annotated(&doc, &extractor);

        assert!(html.contains("<h1>acme</h1>"));
        assert!(html.contains("<span class=\"highlight-start\" title=\"item_7: 6-13\">Item 7.</span>"));
        assert!(html.contains("<span class=\"highlight-body\" title=\"item_7: 14-27\">Sales &amp; costs</span>"));
        assert!(html.contains("\">Item 7A</span>. Risk</pre>"));
    }

    #[test]
    fn test_unmatched_document_is_plain_escaped_text() {
        let doc = NormalizedDocument::from_raw("x", "a < b");
        let extractor = SectionExtractor::new(default_specs()).unwrap();
        let html = render_annotated(&doc, &extractor);
        assert!(html.contains("<pre>a &lt; b</pre>"));
        assert!(!html.contains("<span"));
    }

    #[test]
    fn test_save_annotated_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let doc = NormalizedDocument::from_raw("acme-2024", "Item 7. body Item 7A.");
        let extractor = SectionExtractor::new(default_specs()).unwrap();

        let path = save_annotated(&doc, &extractor, &dir.path().join("debug")).unwrap();
        assert!(path.ends_with("acme-2024_annotated.html"));
        assert!(fs::read_to_string(path).unwrap().contains("highlight-body"));
    }
}
