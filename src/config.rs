// src/config.rs

//! Section configuration loaded from TOML.
//!
//! ```toml
//! [selection]
//! strategy = "skip_short_bodies"
//! min_body_len = 500
//!
//! [[section]]
//! name = "item_1a"
//! start = 'item\s+1a[^a-z]'
//! end = 'item\s+1b'
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::extractors::locator::HeadingSelection;
use crate::extractors::section::{
    SectionExtractor, SectionSpec, ITEM_1A_END, ITEM_1A_START, ITEM_7_END, ITEM_7_START,
};
use crate::utils::error::ConfigError;

/// One `[[section]]` table: a name plus start/end regex sources.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SectionEntry {
    pub name: String,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SectionsConfig {
    #[serde(default)]
    pub selection: HeadingSelection,

    #[serde(rename = "section", default)]
    pub sections: Vec<SectionEntry>,
}

impl Default for SectionsConfig {
    /// Item 1A and Item 7 with first-heading selection
    fn default() -> Self {
        let entry = |name: &str, start: &str, end: &str| SectionEntry {
            name: name.to_string(),
            start: start.to_string(),
            end: end.to_string(),
        };
        Self {
            selection: HeadingSelection::First,
            sections: vec![
                entry("item_1a", ITEM_1A_START, ITEM_1A_END),
                entry("item_7", ITEM_7_START, ITEM_7_END),
            ],
        }
    }
}

impl SectionsConfig {
    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded section config from {}", path.display());
        Self::from_toml(&content)
    }

    /// Validate the configuration without compiling patterns
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sections.is_empty() {
            return Err(ConfigError::NoSections);
        }
        let mut seen = HashSet::new();
        for entry in &self.sections {
            if entry.name.trim().is_empty() {
                return Err(ConfigError::EmptyName);
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(ConfigError::DuplicateName(entry.name.clone()));
            }
        }
        Ok(())
    }

    /// Compiles every pattern. Any failure here is fatal for the run.
    pub fn build_extractor(&self) -> Result<SectionExtractor, ConfigError> {
        self.validate()?;
        let specs = self
            .sections
            .iter()
            .map(|entry| SectionSpec::regex(&entry.name, &entry.start, &entry.end))
            .collect::<Result<Vec<_>, _>>()?;

        for spec in &specs {
            tracing::debug!(
                "Section '{}': start {} end {}",
                spec.name(),
                spec.start_pattern().describe(),
                spec.end_pattern().describe()
            );
        }
        Ok(SectionExtractor::new(specs)?.with_selection(self.selection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_builds() {
        let extractor = SectionsConfig::default().build_extractor().unwrap();
        let names: Vec<_> = extractor.specs().iter().map(|s| s.name()).collect();
        assert_eq!(names, ["item_1a", "item_7"]);
        assert_eq!(extractor.selection(), HeadingSelection::First);
    }

    #[test]
    fn test_parse_sections_in_order() {
        let config = SectionsConfig::from_toml(
            r#"
            [[section]]
            name = "item_7"
            start = 'item\s+7[^0-9a-z]'
            end = 'item\s+7a'

            [[section]]
            name = "item_2"
            start = 'item\s+2[^0-9a-z]'
            end = 'item\s+3'
            "#,
        )
        .unwrap();

        assert_eq!(config.selection, HeadingSelection::First);
        assert_eq!(config.sections.len(), 2);
        assert_eq!(config.sections[0].name, "item_7");
        assert_eq!(config.sections[1].end, r"item\s+3");
        assert!(config.build_extractor().is_ok());
    }

    #[test]
    fn test_parse_selection_strategy() {
        let config = SectionsConfig::from_toml(
            r#"
            [selection]
            strategy = "skip_short_bodies"
            min_body_len = 500

            [[section]]
            name = "item_1a"
            start = 'item\s+1a'
            end = 'item\s+1b'
            "#,
        )
        .unwrap();
        assert_eq!(
            config.selection,
            HeadingSelection::SkipShortBodies { min_body_len: 500 }
        );
    }

    #[test]
    fn test_bad_pattern_fails_at_build() {
        let config = SectionsConfig::from_toml(
            r#"
            [[section]]
            name = "item_1a"
            start = 'item\s+1a'
            end = 'item\s+(1b'
            "#,
        )
        .unwrap();
        let err = config.build_extractor().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { role: "end", .. }));
        assert!(err.to_string().contains("item_1a"));
    }

    #[test]
    fn test_duplicate_and_empty_names_rejected() {
        let mut config = SectionsConfig::default();
        config.sections[1].name = "item_1a".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateName(_))));

        config.sections[1].name = "".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyName)));
    }

    #[test]
    fn test_empty_config_rejected() {
        let config = SectionsConfig::from_toml("").unwrap();
        assert!(matches!(config.build_extractor(), Err(ConfigError::NoSections)));
    }

    #[test]
    fn test_unparseable_toml() {
        assert!(matches!(
            SectionsConfig::from_toml("[[section]]\nname = "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sections.toml");
        fs::write(&path, "[[section]]\nname = \"item_7\"\nstart = 'item\\s+7\\.'\nend = 'item\\s+7a'\n").unwrap();

        let config = SectionsConfig::load(&path).unwrap();
        assert_eq!(config.sections[0].start, r"item\s+7\.");

        assert!(matches!(
            SectionsConfig::load(dir.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
