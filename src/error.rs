//! Error types for the correction pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for correction operations.
pub type CorrectionResult<T> = Result<T, CorrectionError>;

/// Errors that can abort a document or a single text source.
///
/// Only `FatalExtraction` aborts a whole document. Every other variant aborts
/// the text source being corrected and leaves its sibling source untouched.
#[derive(Debug, Error)]
pub enum CorrectionError {
    /// OCR or native text extraction could not read the document.
    #[error("Extraction failed for {}: {message}", path.display())]
    FatalExtraction { path: PathBuf, message: String },

    /// Masking and tokenization disagree on the number of placeholders.
    #[error("Placeholder desync: expected {expected} masks, found {found}")]
    Desync { expected: usize, found: usize },

    /// Tokenized text is longer than the model accepts.
    #[error("Context overflow: {tokens} tokens exceed model limit of {limit}")]
    ContextOverflow { tokens: usize, limit: usize },

    /// Dictionary failed to load or answer.
    #[error("Dictionary error: {message}")]
    Dictionary { message: String },

    /// Tokenizer or model failure.
    #[error("Model error: {message}")]
    Model { message: String },

    /// Invalid configuration.
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CorrectionError {
    pub(crate) fn extraction(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        CorrectionError::FatalExtraction {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn model(message: impl Into<String>) -> Self {
        CorrectionError::Model {
            message: message.into(),
        }
    }

    /// True when the error should abort the whole document rather than one text source.
    pub fn is_document_fatal(&self) -> bool {
        matches!(self, CorrectionError::FatalExtraction { .. })
    }
}
