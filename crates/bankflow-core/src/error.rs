//! Error types for the bankflow-core library.

use thiserror::Error;

/// Main error type for the bankflow library.
#[derive(Error, Debug)]
pub enum BankflowError {
    /// The document could not yield any text to parse.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fatal, per-document failures.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The renderer handed over zero pages.
    #[error("document has no pages")]
    NoPages,

    /// Every page was empty or whitespace only.
    #[error("no text could be extracted from the document")]
    NoText,
}

/// Errors raised while turning one line (or one column index) into a transaction.
///
/// These never leave a parser: strategies log them and record a
/// [`Diagnostic::SkippedLine`](crate::models::transaction::Diagnostic::SkippedLine).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// A date token did not form a valid calendar date.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// A time token did not form a valid time of day.
    #[error("invalid time: {0}")]
    InvalidTime(String),

    /// A numeric token could not be read as an amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

/// Result type for the bankflow library.
pub type Result<T> = std::result::Result<T, BankflowError>;
