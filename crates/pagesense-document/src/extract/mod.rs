// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extraction strategies and the timing/error-capturing wrapper shared by all
// of them.

use std::backtrace::Backtrace;
use std::path::Path;
use std::time::Instant;

use pagesense_core::error::{PagesenseError, Result};
use pagesense_core::types::ExtractionResult;
use tracing::{error, info};

pub mod digital;
pub mod ocr;
pub mod router;

pub use digital::{TextLayerExtractor, extract_digital};
pub use ocr::OcrExtractor;
pub use router::{ExtractionRouter, RoutedExtraction};

/// A way of pulling the full text out of a document.
pub trait Extractor {
    /// Name recorded in results and used in output file names.
    fn name(&self) -> &str;

    /// Full text of the document at `path`. No partial results: any failure
    /// fails the whole document.
    fn extract(&self, path: &Path) -> Result<String>;
}

impl<T: Extractor + ?Sized> Extractor for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn extract(&self, path: &Path) -> Result<String> {
        (**self).extract(path)
    }
}

/// Wrap a lower-level error as an extraction failure, capturing a backtrace.
pub fn extraction_failure(err: PagesenseError) -> PagesenseError {
    let (message, trace) = failure_parts(err);
    PagesenseError::Extraction { message, trace }
}

/// `("<Kind>: <message>", trace)` for a failed document.
pub(crate) fn failure_parts(err: PagesenseError) -> (String, String) {
    match err {
        PagesenseError::Extraction { message, trace } => (message, trace),
        other => (
            format!("{}: {}", other.kind(), other),
            Backtrace::capture().to_string(),
        ),
    }
}

/// `"<Kind>: <message>\n<trace>"`, the text stored on a failed result.
pub(crate) fn failure_message(err: PagesenseError) -> String {
    let kind = err.kind();
    match err {
        PagesenseError::Extraction { message, trace } => format!("{kind}: {message}\n{trace}"),
        other => format!("{kind}: {other}\n{}", Backtrace::capture()),
    }
}

/// Run `extractor` on `path`, timing it. Any error becomes a failed result
/// carrying an [`extraction_failure`].
pub fn extract_with_timing<E: Extractor + ?Sized>(extractor: &E, path: &Path) -> ExtractionResult {
    let start = Instant::now();
    let outcome = extractor.extract(path);
    let seconds = start.elapsed().as_secs_f64();

    match outcome {
        Ok(text) => {
            let result = ExtractionResult::success(extractor.name(), text, seconds);
            info!(
                extractor = extractor.name(),
                seconds,
                words = result.word_count,
                "Extraction finished"
            );
            result
        }
        Err(err) => {
            let failure = extraction_failure(err);
            error!(extractor = extractor.name(), seconds, error = %failure, "Extraction failed");
            ExtractionResult::failure(extractor.name(), failure_message(failure), seconds)
        }
    }
}

/// Stands in for an extractor that cannot run in this build or environment.
/// Every document it is asked for fails with the recorded reason.
#[derive(Debug, Clone)]
pub struct UnavailableExtractor {
    name: String,
    reason: String,
}

impl UnavailableExtractor {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl Extractor for UnavailableExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self, _path: &Path) -> Result<String> {
        Err(PagesenseError::Ocr(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns the text, or fails with a PDF error carrying the message.
    struct Fixed(std::result::Result<&'static str, &'static str>);

    impl Extractor for Fixed {
        fn name(&self) -> &str {
            "Fixed"
        }

        fn extract(&self, _path: &Path) -> Result<String> {
            self.0
                .map(str::to_string)
                .map_err(|message| PagesenseError::Pdf(message.to_string()))
        }
    }

    #[test]
    fn success_is_timed_and_counted() {
        let result = extract_with_timing(&Fixed(Ok("one two\nthree")), Path::new("x.pdf"));
        assert!(result.success);
        assert_eq!(result.extractor_name, "Fixed");
        assert_eq!(result.word_count, 3);
        assert_eq!(result.line_count, 2);
        assert!(result.execution_time_seconds >= 0.0);
    }

    #[test]
    fn failure_carries_kind_message_and_trace() {
        let failing = Fixed(Err("broken xref"));
        let result = extract_with_timing(&failing, Path::new("x.pdf"));
        assert!(!result.success);
        assert!(result.text.is_empty());
        let message = result.error_message.unwrap();
        assert!(
            message.starts_with("ExtractionFailure: PdfError: "),
            "wrapped as an extraction failure, got {message}"
        );
        assert!(message.contains("broken xref"));
        assert!(message.contains('\n'), "trace follows the message");
    }

    #[test]
    fn extraction_failures_are_not_wrapped_twice() {
        let err = PagesenseError::Extraction {
            message: "OcrError: boom".into(),
            trace: "trace".into(),
        };
        match extraction_failure(err) {
            PagesenseError::Extraction { message, trace } => {
                assert_eq!(message, "OcrError: boom");
                assert_eq!(trace, "trace");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unavailable_extractor_always_fails() {
        let extractor = UnavailableExtractor::new("OCRExtractor", "models missing");
        let result = extract_with_timing(&extractor, Path::new("x.pdf"));
        assert_eq!(result.extractor_name, "OCRExtractor");
        assert!(result.error_message.unwrap().contains("models missing"));
    }
}
