// src/extractors/mod.rs
pub mod locator;
pub mod normalize;
pub mod pattern;
pub mod section;

// Re-export key extraction types for convenience
pub use locator::{locate, locate_with, HeadingSelection, SectionMatch};
pub use normalize::{normalize_text, NormalizedDocument};
pub use pattern::{BoundaryPattern, RegexPattern};
pub use section::{
    default_specs,
    extract,
    extract_with,
    ExtractedSection,
    ExtractionOutcome,
    SectionExtractor,
    SectionSpec,
};
