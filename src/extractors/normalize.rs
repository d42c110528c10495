// src/extractors/normalize.rs

//! Text normalization: turns raw filing markup or plain text into the single
//! linear string the section locator searches.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{node::Node, Html};

// Anything that looks like a tag, doctype or comment marks the input as markup.
// Covers HTML as well as the SGML wrappers (<DOCUMENT>, <TYPE>) of EDGAR .txt submissions.
static MARKUP_HINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(?:!doctype|!--|/?[a-z][a-z0-9:\-]*(?:\s[^<>]*)?/?>)")
        .expect("Failed to compile MARKUP_HINT_RE")
});

// Elements whose text content never belongs to the filing body
const SKIPPED_ELEMENTS: [&str; 3] = ["script", "style", "template"];

const BYTE_ORDER_MARK: char = '\u{feff}';

/// One document after normalization. Owned by a single document's processing
/// and dropped once its sections are extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDocument {
    pub doc_id: String,
    pub text: String,
}

impl NormalizedDocument {
    /// Normalizes `raw` (markup or plain text). Never fails.
    pub fn from_raw(doc_id: impl Into<String>, raw: &str) -> Self {
        Self {
            doc_id: doc_id.into(),
            text: normalize_text(raw),
        }
    }

    /// Normalizes raw bytes, decoding them as UTF-8 and dropping anything undecodable.
    pub fn from_bytes(doc_id: impl Into<String>, raw: &[u8]) -> Self {
        Self::from_raw(doc_id, &decode_bytes(raw))
    }
}

/// Lossy UTF-8 decode that silently drops invalid sequences and a leading BOM.
pub fn decode_bytes(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .chars()
        .filter(|&c| c != char::REPLACEMENT_CHARACTER)
        .skip_while(|&c| c == BYTE_ORDER_MARK)
        .collect()
}

/// Canonicalizes raw text into one newline-joined string.
///
/// Markup is parsed with a tolerant HTML5 parser and every text node is kept,
/// joined with `\n`, so tables and paragraphs turn into line breaks instead of
/// disappearing. Plain text passes through untouched apart from whitespace
/// canonicalization. Case is preserved.
///
/// Entities are only decoded on the markup route; plain text keeps `&amp;`
/// and friends verbatim.
///
/// Idempotent: escaped tags (`&lt;b&gt;`) decode into tag-like text, so the
/// markup route repeats until no tag is left. Every pass consumes at least
/// one tag and shrinks the text, and the final result always re-normalizes
/// through the plain-text route unchanged.
pub fn normalize_text(raw: &str) -> String {
    let mut linear = canonicalize_whitespace(raw);
    while looks_like_markup(&linear) {
        linear = canonicalize_whitespace(&markup_to_text(&linear));
    }
    linear
}

pub fn looks_like_markup(raw: &str) -> bool {
    MARKUP_HINT_RE.is_match(raw)
}

fn markup_to_text(raw: &str) -> String {
    // html5ever recovers from any input; broken markup just yields fewer text nodes
    let document = Html::parse_document(raw);

    let mut pieces: Vec<&str> = Vec::new();
    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let in_skipped = node
            .parent()
            .and_then(|parent| parent.value().as_element())
            .map(|el| SKIPPED_ELEMENTS.contains(&el.name()))
            .unwrap_or(false);
        if in_skipped {
            continue;
        }

        pieces.push(&**text);
    }

    tracing::trace!("Collected {} text nodes from markup", pieces.len());
    pieces.join("\n")
}

fn canonicalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
            }
            c if c.is_whitespace() && !c.is_ascii_whitespace() => out.push(' '),
            c => out.push(c),
        }
    }

    out
}
