// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pagesense.

use thiserror::Error;

/// Top-level error type for all Pagesense operations.
#[derive(Debug, Error)]
pub enum PagesenseError {
    // -- Input errors --
    #[error("cannot open document: {0}")]
    DocumentOpen(String),

    #[error("cannot divide by zero page count: {0}")]
    Division(String),

    // -- Routing errors --
    #[error("unexpected PDF classification: {0}")]
    Classification(String),

    #[error("extraction failed: {message}")]
    Extraction { message: String, trace: String },

    // -- Contract violations --
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    // -- Processing errors --
    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("layout detection failed: {0}")]
    Layout(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PagesenseError {
    /// Short kind name used as the prefix of failed extraction messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DocumentOpen(_) => "DocumentOpenError",
            Self::Division(_) => "DivisionError",
            Self::Classification(_) => "ClassificationError",
            Self::Extraction { .. } => "ExtractionFailure",
            Self::InvalidGeometry(_) => "InvalidGeometry",
            Self::Pdf(_) => "PdfError",
            Self::Image(_) => "ImageError",
            Self::Layout(_) => "LayoutError",
            Self::Ocr(_) => "OcrError",
            Self::Config(_) => "ConfigError",
            Self::Io(_) => "IoError",
            Self::Serialization(_) => "SerializationError",
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PagesenseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_match_error_taxonomy() {
        assert_eq!(
            PagesenseError::DocumentOpen("x".into()).kind(),
            "DocumentOpenError"
        );
        assert_eq!(PagesenseError::Division("x".into()).kind(), "DivisionError");
        assert_eq!(
            PagesenseError::Classification("x".into()).kind(),
            "ClassificationError"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PagesenseError = io.into();
        assert!(matches!(err, PagesenseError::Io(_)));
        assert!(err.to_string().contains("gone"));
    }
}
