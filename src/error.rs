//! Error types for p4-protections
//!
//! This module defines the error hierarchy used throughout the crate.
//! We use `thiserror` for library-style errors that are part of the API;
//! the binary wraps them in `anyhow` at the top level.

use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Protections table error: {0}")]
    Parse(#[from] ParseError),

    #[error("Failed to read {source_name}: {source}")]
    Input {
        source_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid protections entries: {0}")]
    Entries(#[from] serde_json::Error),
}

impl AppError {
    pub fn input(source_name: impl Into<String>, source: std::io::Error) -> Self {
        Self::Input {
            source_name: source_name.into(),
            source,
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },
}

/// Why a single raw protections line could not be decomposed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("expected `[=][-]<mode> <type> <name> <host> <path>`")]
    Malformed,

    #[error("unknown access mode '{0}'")]
    UnknownMode(String),

    #[error("unterminated quote in path")]
    UnterminatedQuote,

    #[error("empty depot path")]
    EmptyPath,
}

/// A protections table could not be built; the whole table is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line} '{text}': {kind}")]
pub struct ParseError {
    /// 1-based position of the offending line in the input
    pub line: usize,
    pub text: String,
    #[source]
    pub kind: RuleError,
}

impl ParseError {
    pub fn new(line: usize, text: impl Into<String>, kind: RuleError) -> Self {
        Self {
            line,
            text: text.into(),
            kind,
        }
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for table construction
pub type ParseResult<T> = std::result::Result<T, ParseError>;
