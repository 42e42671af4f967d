// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout-aware OCR extraction: render, detect regions, order them, crop each
// one and recognise it.

use std::path::Path;

use pagesense_core::config::{OcrSettings, PipelineConfig};
use pagesense_core::error::{PagesenseError, Result};
use tracing::{debug, info, instrument};

use super::Extractor;
use crate::image::crop_with_margin;
use crate::layout::{LayoutDetector, MorphologyLayoutDetector, RegionOrderer, filter_text_regions};
use crate::page::{DocumentSource, Page};
use crate::pdf::PdfReader;
#[cfg(feature = "pdfium")]
use crate::pdf::PdfiumRasterizer;
use crate::scan::TextRecognizer;

/// OCR extractor over a layout detector `L` and a recogniser `R`.
pub struct OcrExtractor<R, L = MorphologyLayoutDetector> {
    recognizer: R,
    detector: L,
    orderer: RegionOrderer,
    settings: OcrSettings,
    /// Renders whole pages when set; otherwise only image content is
    /// composited and pages with visible text fail.
    #[cfg(feature = "pdfium")]
    rasterizer: Option<PdfiumRasterizer>,
}

impl<R: TextRecognizer> OcrExtractor<R, MorphologyLayoutDetector> {
    /// Morphological layout detection tuned to the configured DPI.
    pub fn with_config(recognizer: R, config: &PipelineConfig) -> Self {
        Self::new(
            recognizer,
            MorphologyLayoutDetector::for_dpi(config.ocr.dpi),
            RegionOrderer::new(config.ordering.clone()),
            config.ocr.clone(),
        )
    }
}

impl<R: TextRecognizer, L: LayoutDetector> OcrExtractor<R, L> {
    pub fn new(recognizer: R, detector: L, orderer: RegionOrderer, settings: OcrSettings) -> Self {
        Self {
            recognizer,
            detector,
            orderer,
            settings,
            #[cfg(feature = "pdfium")]
            rasterizer: None,
        }
    }

    #[cfg(feature = "pdfium")]
    pub fn with_rasterizer(mut self, rasterizer: PdfiumRasterizer) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    /// Text of one page: recognised regions in reading order joined with `\n`.
    #[instrument(skip_all, fields(page = page.number()))]
    pub fn extract_page<P: Page>(&self, page: &P) -> Result<String> {
        let raster = page.render(self.settings.dpi)?;
        let detected = self.detector.detect(&raster)?;
        if let Some(bad) = detected.iter().find(|region| !region.bbox.is_finite()) {
            return Err(PagesenseError::Layout(format!(
                "detector returned a non-finite {:?} region {:?}",
                bad.label, bad.bbox
            )));
        }
        let detected_count = detected.len();
        let regions = filter_text_regions(detected, &self.settings.text_labels);
        let ordered = self.orderer.order(regions, f64::from(raster.width()))?;
        debug!(detected = detected_count, text_regions = ordered.len(), "Regions ordered");

        let mut parts = Vec::with_capacity(ordered.len());
        for region in &ordered {
            let crop = crop_with_margin(&raster, &region.bbox, self.settings.margin)?;
            if crop.width() == 0 || crop.height() == 0 {
                continue;
            }
            let lines = self.recognizer.recognize(&crop)?;
            let text = lines.join("\n");
            let text = text.trim();
            if !text.is_empty() {
                parts.push(text.to_string());
            }
        }
        Ok(parts.join("\n"))
    }

    /// Text of every page that produced any, pages joined with a blank line.
    pub fn extract_ocr<D: DocumentSource>(&self, doc: &D) -> Result<String> {
        let mut pages = Vec::with_capacity(doc.page_count());
        for index in 0..doc.page_count() {
            let text = self.extract_page(&doc.page(index)?)?;
            if !text.is_empty() {
                pages.push(text);
            }
        }
        info!(pages_with_text = pages.len(), page_count = doc.page_count(), "OCR finished");
        Ok(pages.join("\n\n"))
    }
}

impl<R: TextRecognizer, L: LayoutDetector> Extractor for OcrExtractor<R, L> {
    fn name(&self) -> &str {
        "OCRExtractor"
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn extract(&self, path: &Path) -> Result<String> {
        #[cfg(feature = "pdfium")]
        if let Some(rasterizer) = &self.rasterizer {
            return self.extract_ocr(&rasterizer.open(path)?);
        }
        let reader = PdfReader::open(path)?;
        self.extract_ocr(&reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use image::{Rgb, RgbImage};
    use pagesense_core::types::{BoundingBox, TextRegion};

    use crate::extract::extract_with_timing;
    use crate::page::testing::{FakeDocument, FakePage};
    use crate::pdf::reader::tests::{FixtureImage, FixturePage, build_pdf};

    /// Returns fixed regions regardless of the image.
    struct FixedLayout(pub Vec<TextRegion>);

    impl LayoutDetector for FixedLayout {
        fn detect(&self, _image: &RgbImage) -> Result<Vec<TextRegion>> {
            Ok(self.0.clone())
        }
    }

    /// Reads the crop's top-left pixel red channel as a line id and records
    /// every crop size it sees.
    #[derive(Default)]
    struct PixelTagRecognizer {
        pub seen: RefCell<Vec<(u32, u32)>>,
    }

    impl TextRecognizer for PixelTagRecognizer {
        fn recognize(&self, image: &RgbImage) -> Result<Vec<String>> {
            self.seen.borrow_mut().push(image.dimensions());
            let tag = image.get_pixel(0, 0).0[0];
            match tag {
                255 => Ok(Vec::new()),
                0 => Err(PagesenseError::Ocr("engine crashed".into())),
                n => Ok(vec![format!("  line {n}a"), format!("line {n}b  ")]),
            }
        }
    }

    /// 200x100 white page with a tagged pixel at each `(x, y, tag)`.
    fn tagged_page(number: u32, tags: &[(u32, u32, u8)]) -> FakePage {
        let mut raster = RgbImage::from_pixel(200, 100, Rgb([255, 255, 255]));
        for &(x, y, tag) in tags {
            raster.put_pixel(x, y, Rgb([tag, 0, 0]));
        }
        FakePage {
            raster: Some(raster),
            ..FakePage::with_text(number, "")
        }
    }

    fn extractor(regions: Vec<TextRegion>) -> OcrExtractor<PixelTagRecognizer, FixedLayout> {
        let settings = OcrSettings {
            margin: 0,
            ..OcrSettings::default()
        };
        OcrExtractor::new(
            PixelTagRecognizer::default(),
            FixedLayout(regions),
            RegionOrderer::default(),
            settings,
        )
    }

    fn region(x0: f64, y0: f64, label: &str) -> TextRegion {
        TextRegion::new(BoundingBox::new(x0, y0, x0 + 20.0, y0 + 10.0), label)
    }

    #[test]
    fn regions_are_read_in_column_order_and_joined() {
        // Right column region sits higher on the page but is read second.
        let regions = vec![
            region(150.0, 10.0, "text"),
            region(10.0, 50.0, "text"),
            region(10.0, 80.0, "figure"),
        ];
        let page = tagged_page(1, &[(150, 10, 2), (10, 50, 1), (10, 80, 9)]);
        let text = extractor(regions).extract_page(&page).unwrap();
        assert_eq!(text, "line 1a\nline 1b\nline 2a\nline 2b");
    }

    #[test]
    fn empty_regions_and_crops_are_skipped() {
        let regions = vec![
            region(10.0, 10.0, "text"),
            region(500.0, 500.0, "text"),
            region(100.0, 10.0, "text"),
        ];
        let page = tagged_page(1, &[(100, 10, 3)]);
        let ocr = extractor(regions);
        let text = ocr.extract_page(&page).unwrap();
        assert_eq!(text, "line 3a\nline 3b");
        assert_eq!(ocr.recognizer.seen.borrow().len(), 2, "off-page crop never reaches the engine");
    }

    #[test]
    fn pages_without_text_are_dropped() {
        let doc = FakeDocument {
            pages: vec![
                tagged_page(1, &[(10, 10, 4)]),
                tagged_page(2, &[]),
                tagged_page(3, &[(10, 10, 5)]),
            ],
            byte_len: 0,
        };
        let text = extractor(vec![region(10.0, 10.0, "text")])
            .extract_ocr(&doc)
            .unwrap();
        assert_eq!(text, "line 4a\nline 4b\n\nline 5a\nline 5b");
    }

    #[test]
    fn recogniser_errors_fail_the_document() {
        let doc = FakeDocument {
            pages: vec![tagged_page(1, &[(10, 10, 0)])],
            byte_len: 0,
        };
        let err = extractor(vec![region(10.0, 10.0, "text")])
            .extract_ocr(&doc)
            .unwrap_err();
        assert_eq!(err.kind(), "OcrError");
    }

    #[test]
    fn non_finite_detections_are_layout_errors() {
        let broken = TextRegion::new(BoundingBox::new(f64::NAN, 0.0, 10.0, 10.0), "text");
        let page = tagged_page(1, &[]);
        let err = extractor(vec![broken]).extract_page(&page).unwrap_err();
        assert_eq!(err.kind(), "LayoutError");
    }

    #[test]
    fn unrenderable_page_fails_the_document() {
        let doc = FakeDocument {
            pages: vec![FakePage::with_text(1, "")],
            byte_len: 0,
        };
        assert!(extractor(Vec::new()).extract_ocr(&doc).is_err());
    }

    /// Reports `ink` for any crop containing a dark pixel.
    struct InkRecognizer;

    impl TextRecognizer for InkRecognizer {
        fn recognize(&self, image: &RgbImage) -> Result<Vec<String>> {
            let inked = image.pixels().any(|p| p.0.iter().all(|&c| c < 128));
            Ok(if inked { vec!["ink".to_string()] } else { Vec::new() })
        }
    }

    fn morphology_extractor() -> OcrExtractor<InkRecognizer> {
        let mut config = PipelineConfig::default();
        config.ocr.dpi = 36;
        OcrExtractor::with_config(InkRecognizer, &config)
    }

    #[test]
    fn scanned_pdf_page_runs_the_whole_pipeline() {
        let bytes = build_pdf(vec![FixturePage::full_page_image(FixtureImage::gray_2x2())]);
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        let text = morphology_extractor().extract_ocr(&reader).unwrap();
        assert_eq!(text, "ink", "the black half of the scan is one text region");
    }

    #[test]
    fn text_pdf_fails_instead_of_returning_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("born_digital.pdf");
        std::fs::write(&path, build_pdf(vec![FixturePage::text(&["Hello World"])])).unwrap();

        let result = extract_with_timing(&morphology_extractor(), &path);
        assert!(
            !result.text.is_empty() || !result.success,
            "a page with glyphs never yields an empty success"
        );
        assert!(!result.success, "image compositor cannot draw text");
        assert!(result.error_message.unwrap().contains("PdfError"));
    }
}
