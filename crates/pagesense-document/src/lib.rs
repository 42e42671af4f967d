// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagesense-document — PDF page analysis and text extraction for Pagesense.
//
// Classifies a PDF as born-digital or scanned from per-page quality signals,
// then pulls its text either from the embedded text layer or through a
// render, layout, crop and OCR pipeline.

pub mod analysis;
pub mod extract;
pub mod image;
pub mod layout;
pub mod page;
pub mod pdf;
pub mod scan;

// Re-export the primary entry points so callers can use `pagesense_document::Classifier` etc.
pub use analysis::{Classifier, classify};
pub use extract::{
    ExtractionRouter, Extractor, OcrExtractor, RoutedExtraction, TextLayerExtractor,
    UnavailableExtractor, extract_with_timing,
};
pub use layout::{LayoutDetector, MorphologyLayoutDetector, RegionOrderer};
pub use page::{DocumentSource, Page};
pub use pdf::reader::PdfReader;
pub use scan::TextRecognizer;

#[cfg(feature = "ocr")]
pub use scan::ocr::OcrEngine;
