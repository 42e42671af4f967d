// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Verdict-driven dispatch between the text-layer and OCR extractors.

use std::path::Path;

use pagesense_core::error::PagesenseError;
use pagesense_core::types::{ClassificationVerdict, ExtractionResult, Verdict};
use serde_json::json;
use tracing::{info, warn};

use super::{Extractor, extract_with_timing, failure_message};
use crate::analysis::Classifier;

/// Name of the result produced when a document cannot be routed.
const CLASSIFICATION_ERROR: &str = "ClassificationError";

/// Outcome of routing one document.
#[derive(Debug, Clone)]
pub struct RoutedExtraction {
    /// `None` when classification itself failed.
    pub classification: Option<ClassificationVerdict>,
    pub result: ExtractionResult,
}

pub struct ExtractionRouter {
    classifier: Classifier,
    digital: Box<dyn Extractor>,
    ocr: Box<dyn Extractor>,
}

impl ExtractionRouter {
    pub fn new(classifier: Classifier, digital: Box<dyn Extractor>, ocr: Box<dyn Extractor>) -> Self {
        Self {
            classifier,
            digital,
            ocr,
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn extractor_for(&self, verdict: Verdict) -> &dyn Extractor {
        match verdict {
            Verdict::Digital => self.digital.as_ref(),
            Verdict::Scanned => self.ocr.as_ref(),
        }
    }

    /// Classify the document, then run the matching extractor. Never fails:
    /// any error is reported in the returned result.
    pub fn route(&self, path: &Path) -> RoutedExtraction {
        let classification = match self.classifier.classify(path) {
            Ok(classification) => classification,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Classification failed");
                return RoutedExtraction {
                    classification: None,
                    result: classification_failure(err),
                };
            }
        };

        info!(
            path = %path.display(),
            verdict = %classification.verdict,
            forced_pages = classification.forced_pages,
            page_count = classification.page_count,
            "Document classified"
        );

        let result = extract_with_timing(self.extractor_for(classification.verdict), path)
            .with_metadata("verdict", json!(classification.verdict.as_str()))
            .with_metadata("force_ratio", json!(classification.force_ratio))
            .with_metadata("avg_size_per_page", json!(classification.avg_size_per_page))
            .with_metadata("forced_pages", json!(classification.forced_pages))
            .with_metadata("page_count", json!(classification.page_count));

        RoutedExtraction {
            classification: Some(classification),
            result,
        }
    }

    /// Skip classification and dispatch on a caller-supplied verdict label.
    pub fn route_as(&self, path: &Path, label: &str) -> ExtractionResult {
        match label.parse::<Verdict>() {
            Ok(verdict) => extract_with_timing(self.extractor_for(verdict), path)
                .with_metadata("verdict", json!(verdict.as_str())),
            Err(err) => classification_failure(err),
        }
    }
}

fn classification_failure(err: PagesenseError) -> ExtractionResult {
    ExtractionResult::failure(CLASSIFICATION_ERROR, failure_message(err), 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagesense_core::config::{ClassifierConfig, QualityConfig};
    use pagesense_core::error::Result;

    use crate::pdf::reader::tests::{FixtureImage, FixturePage, build_pdf};

    struct Named(&'static str);

    impl Extractor for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn extract(&self, _path: &Path) -> Result<String> {
            Ok(format!("from {}", self.0))
        }
    }

    fn router() -> ExtractionRouter {
        ExtractionRouter::new(
            Classifier::new(ClassifierConfig::default(), QualityConfig::latin()),
            Box::new(Named("TextLayer")),
            Box::new(Named("OCRExtractor")),
        )
    }

    fn write_pdf(dir: &tempfile::TempDir, name: &str, pages: Vec<FixturePage>) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, build_pdf(pages)).unwrap();
        path
    }

    #[test]
    fn digital_documents_use_the_text_layer() {
        let dir = tempfile::tempdir().unwrap();
        let line = "The quick brown fox jumps over the lazy dog";
        let path = write_pdf(&dir, "digital.pdf", vec![FixturePage::text(&[line, line])]);

        let routed = router().route(&path);
        assert_eq!(routed.classification.unwrap().verdict, Verdict::Digital);
        assert_eq!(routed.result.extractor_name, "TextLayer");
        assert_eq!(routed.result.text, "from TextLayer");
        assert_eq!(routed.result.metadata["verdict"], json!("digital"));
        assert_eq!(routed.result.metadata["forced_pages"], json!(0));
    }

    #[test]
    fn scanned_documents_use_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pdf(
            &dir,
            "scanned.pdf",
            vec![FixturePage::full_page_image(FixtureImage::gray_2x2())],
        );

        let routed = router().route(&path);
        assert!(routed.classification.unwrap().is_scanned());
        assert_eq!(routed.result.extractor_name, "OCRExtractor");
        assert_eq!(routed.result.metadata["force_ratio"], json!(1.0));
    }

    #[test]
    fn unreadable_documents_become_classification_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();

        let routed = router().route(&path);
        assert!(routed.classification.is_none());
        assert!(!routed.result.success);
        assert_eq!(routed.result.extractor_name, "ClassificationError");
        assert!(routed.result.error_message.unwrap().starts_with("DocumentOpenError: "));
    }

    #[test]
    fn explicit_labels_bypass_classification() {
        let router = router();
        let path = Path::new("unused.pdf");
        assert_eq!(router.route_as(path, "scanned").extractor_name, "OCRExtractor");
        assert_eq!(router.route_as(path, "Docx").extractor_name, "TextLayer");

        let unknown = router.route_as(path, "hologram");
        assert!(!unknown.success);
        assert_eq!(unknown.extractor_name, "ClassificationError");
        assert!(unknown.error_message.unwrap().starts_with("ClassificationError: "));
    }
}
