// src/utils/error.rs
use std::path::PathBuf;
use thiserror::Error;

// Errors raised while talking to EDGAR (fetch subcommand only)
#[derive(Error, Debug)]
pub enum EdgarError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode), // e.g., 404 Not Found, 403 Forbidden

    #[error("SEC Rate limit likely exceeded")]
    RateLimited,

    #[error("Could not find CIK for ticker {0}")]
    TickerNotFound(String),

    #[error("Could not find specified filing: {0}")]
    FilingDocNotFound(String),

    #[error("Failed to parse EDGAR response: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Invalid section configuration. Always fatal before a batch starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {role} pattern for section '{section}': {source}")]
    InvalidPattern {
        section: String,
        role: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("Section name must not be empty")]
    EmptyName,

    #[error("Duplicate section name: {0}")]
    DuplicateName(String),

    #[error("No sections configured")]
    NoSections,

    #[error("Could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

// A single document could not be produced by the document source
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Could not read document {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not list corpus directory {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("EDGAR interaction failed: {0}")]
    Edgar(#[from] EdgarError),

    #[error("Document source failed: {0}")]
    Source(#[from] SourceError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Data processing failed: {0}")]
    Processing(String),
}
