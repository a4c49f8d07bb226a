// File: src/error.rs
//! Error type shared by the library and the `expand_categories` binary.
//!
//! # Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success |
//! | 1 | I/O or unspecified failure |
//! | 2 | A required artifact is missing |
//! | 3 | No corpus data for a requested build |
//! | 4 | Invalid input (unknown category, bad threshold) |
//! | 5 | An artifact exists but cannot be decoded |

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExpandError {
    // Missing artifacts
    #[error("Frequency table not found: {0} (run with --build-freq or --refresh-freq first)")]
    FrequencyTableMissing(PathBuf),

    #[error("Category file not found: {0}")]
    CategoryFileMissing(PathBuf),

    #[error("Reference lexicon not found: {0}")]
    LexiconMissing(PathBuf),

    // Corpus errors
    #[error("No corpus data found: {0}")]
    NoCorpusData(String),

    #[error("Subtitle glob matched no files: {0}")]
    EmptySubtitleGlob(String),

    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlob { pattern: String, reason: String },

    // Input validation
    #[error("Unknown categories: {}", .0.join(", "))]
    UnknownCategories(Vec<String>),

    #[error("Conflicting frequency gates: {0}")]
    ThresholdConflict(String),

    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    #[error("Unknown rank column: {0}")]
    UnknownRankColumn(String),

    // Decoding
    #[error("Corrupt artifact: {path} - {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Config parse error: {path} - {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExpandError {
    pub fn corrupt(path: &std::path::Path, reason: impl ToString) -> Self {
        Self::Corrupt {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Process exit code for this error, see the table at the top of the module.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FrequencyTableMissing(_) | Self::CategoryFileMissing(_) | Self::LexiconMissing(_) => 2,
            Self::NoCorpusData(_) | Self::EmptySubtitleGlob(_) => 3,
            Self::UnknownCategories(_)
            | Self::ThresholdConflict(_)
            | Self::InvalidThreshold(_)
            | Self::UnknownRankColumn(_)
            | Self::InvalidGlob { .. } => 4,
            Self::Corrupt { .. } | Self::ConfigParse { .. } => 5,
            Self::Io(_) => 1,
        }
    }
}

pub type ExpandResult<T> = Result<T, ExpandError>;
