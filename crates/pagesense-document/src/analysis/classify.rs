// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document classifier — per-page force-OCR decisions aggregated into a
// `digital` / `scanned` verdict.

use std::path::Path;

use pagesense_core::config::{ClassifierConfig, PipelineConfig, QualityConfig};
use pagesense_core::error::{PagesenseError, Result};
use pagesense_core::types::{ClassificationVerdict, ForceReason, PageDecision, QualityReport, Verdict};
use tracing::{debug, info, instrument, warn};

use super::quality::{image_coverage_ratio, text_quality};
use crate::page::{DocumentSource, Page};
use crate::pdf::PdfReader;

/// Decide whether a page must go through OCR. The first matching rule wins.
pub fn should_force_ocr(
    image_coverage: f64,
    quality: &QualityReport,
    config: &ClassifierConfig,
) -> (bool, ForceReason) {
    let reason = if image_coverage >= config.img_cover_threshold {
        ForceReason::HighImageCoverage
    } else if quality.char_count < config.min_text_chars {
        ForceReason::TooLittleText
    } else if quality.score < config.quality_threshold {
        ForceReason::LowTextQuality
    } else {
        ForceReason::UseTextLayer
    };
    (reason.forces_ocr(), reason)
}

/// Aggregate page decisions into a verdict.
///
/// Returns `(verdict, force_ratio, avg_size_per_page)`. Either signal alone is
/// enough for `scanned`.
pub fn decide_verdict(
    forced_pages: usize,
    page_count: usize,
    file_size: u64,
    config: &ClassifierConfig,
) -> Result<(Verdict, f64, f64)> {
    if page_count == 0 {
        return Err(PagesenseError::Division(
            "document has no pages to classify".into(),
        ));
    }
    let force_ratio = forced_pages as f64 / page_count as f64;
    let avg_size_per_page = file_size as f64 / page_count as f64;

    let verdict = if force_ratio > config.force_ratio_threshold
        || avg_size_per_page > config.avg_size_per_page_threshold
    {
        Verdict::Scanned
    } else {
        Verdict::Digital
    };
    Ok((verdict, force_ratio, avg_size_per_page))
}

/// Classifies documents with a fixed set of thresholds.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    thresholds: ClassifierConfig,
    quality: QualityConfig,
}

impl Classifier {
    pub fn new(thresholds: ClassifierConfig, quality: QualityConfig) -> Self {
        Self { thresholds, quality }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.classifier.clone(), config.quality.clone())
    }

    pub fn thresholds(&self) -> &ClassifierConfig {
        &self.thresholds
    }

    /// Analyse one page. Unreadable text or blocks are logged and treated as empty.
    pub fn analyze_page<P: Page>(&self, page: &P) -> PageDecision {
        let number = page.number();
        let blocks = page.blocks().unwrap_or_else(|err| {
            warn!(page = number, %err, "Cannot read page blocks, assuming none");
            Vec::new()
        });
        let text = page.text().unwrap_or_else(|err| {
            warn!(page = number, %err, "Cannot read text layer, assuming empty");
            String::new()
        });

        let image_coverage = image_coverage_ratio(&page.bounds(), &blocks);
        let quality = text_quality(&text, &self.quality);
        let (force_ocr, reason) = should_force_ocr(image_coverage, &quality, &self.thresholds);
        debug!(
            page = number,
            image_coverage,
            chars = quality.char_count,
            score = quality.score,
            %reason,
            "Page analysed"
        );

        PageDecision {
            page: number,
            force_ocr,
            reason,
            image_coverage,
            quality,
        }
    }

    /// Classify an opened document.
    pub fn classify_document<D: DocumentSource>(&self, doc: &D) -> Result<ClassificationVerdict> {
        let page_count = doc.page_count();
        let mut pages = Vec::with_capacity(page_count);
        for index in 0..page_count {
            let page = doc.page(index)?;
            pages.push(self.analyze_page(&page));
        }
        let forced_pages = pages.iter().filter(|p| p.force_ocr).count();
        let file_size = doc.byte_len();
        let (verdict, force_ratio, avg_size_per_page) =
            decide_verdict(forced_pages, page_count, file_size, &self.thresholds)?;

        info!(
            %verdict,
            page_count,
            forced_pages,
            force_ratio,
            avg_size_per_page,
            "Document classified"
        );

        Ok(ClassificationVerdict {
            verdict,
            pages,
            forced_pages,
            page_count,
            force_ratio,
            file_size,
            avg_size_per_page,
        })
    }

    /// Open and classify the PDF at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn classify(&self, path: impl AsRef<Path>) -> Result<ClassificationVerdict> {
        let reader = PdfReader::open(path.as_ref())?;
        self.classify_document(&reader)
    }
}

/// Classify the PDF at `path` with default thresholds.
pub fn classify(path: impl AsRef<Path>) -> Result<ClassificationVerdict> {
    let reader = PdfReader::open(path.as_ref())?;
    Classifier::default().classify_document(&reader)
}
