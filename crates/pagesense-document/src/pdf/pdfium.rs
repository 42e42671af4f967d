// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Full-fidelity page rendering through pdfium. Text, vector paths and images
// are all rasterised, so OCR sees exactly what a viewer would show. Analysis
// (text layer, blocks, byte size) still comes from the lopdf reader.

use std::path::Path;

use image::RgbImage;
use pagesense_core::error::{PagesenseError, Result};
use pagesense_core::types::{BoundingBox, PageBlock};
use pdfium_render::prelude::{PdfDocument, PdfRenderConfig, Pdfium};
use tracing::{debug, info, instrument};

use super::raster::raster_size;
use super::reader::{PdfPage, PdfReader};
use crate::page::{DocumentSource, Page};

/// A bound pdfium library.
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
}

impl PdfiumRasterizer {
    /// Bind libpdfium from `library_dir` (or the working directory), falling
    /// back to the system library search path.
    pub fn bind(library_dir: Option<&Path>) -> Result<Self> {
        let dir = library_dir.unwrap_or_else(|| Path::new("./"));
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|err| PagesenseError::Pdf(format!("cannot bind pdfium library: {err}")))?;
        info!("pdfium bound");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Open `path` with both lopdf (analysis) and pdfium (rendering).
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn open(&self, path: &Path) -> Result<RenderedPdf<'_>> {
        let reader = PdfReader::open(path)?;
        let document = self.pdfium.load_pdf_from_file(path, None).map_err(|err| {
            PagesenseError::DocumentOpen(format!("pdfium cannot open {}: {err}", path.display()))
        })?;
        Ok(RenderedPdf { reader, document })
    }
}

/// A document whose pages render through pdfium.
pub struct RenderedPdf<'p> {
    reader: PdfReader,
    document: PdfDocument<'p>,
}

impl<'p> DocumentSource for RenderedPdf<'p> {
    type Page<'a>
        = RenderedPage<'a, 'p>
    where
        Self: 'a;

    fn page_count(&self) -> usize {
        self.reader.page_count()
    }

    fn page(&self, index: usize) -> Result<RenderedPage<'_, 'p>> {
        Ok(RenderedPage {
            page: self.reader.page(index)?,
            document: &self.document,
            index,
        })
    }

    fn byte_len(&self) -> u64 {
        self.reader.byte_len()
    }
}

pub struct RenderedPage<'a, 'p> {
    page: PdfPage<'a>,
    document: &'a PdfDocument<'p>,
    index: usize,
}

impl Page for RenderedPage<'_, '_> {
    fn number(&self) -> u32 {
        self.page.number()
    }

    fn bounds(&self) -> BoundingBox {
        self.page.bounds()
    }

    fn blocks(&self) -> Result<Vec<PageBlock>> {
        self.page.blocks()
    }

    fn text(&self) -> Result<String> {
        self.page.text()
    }

    #[instrument(skip(self), fields(page = self.page.number()))]
    fn render(&self, dpi: u32) -> Result<RgbImage> {
        if dpi == 0 {
            return Err(PagesenseError::Image("cannot render at 0 dpi".into()));
        }
        let (width, height, _) = raster_size(&self.page.bounds(), dpi);
        let index = self.index.try_into().map_err(|_| {
            PagesenseError::Pdf(format!("page index {} exceeds pdfium's range", self.index))
        })?;
        let page = self.document.pages().get(index).map_err(|err| {
            PagesenseError::Pdf(format!("pdfium cannot load page {}: {err}", self.page.number()))
        })?;

        let bitmap = page
            .render_with_config(
                &PdfRenderConfig::new()
                    .set_target_width(width as i32)
                    .set_target_height(height as i32)
                    .render_form_data(true)
                    .render_annotations(true),
            )
            .map_err(|err| {
                PagesenseError::Pdf(format!("pdfium cannot render page {}: {err}", self.page.number()))
            })?;

        let raster = bitmap.as_image().to_rgb8();
        debug!(width = raster.width(), height = raster.height(), "Page rendered by pdfium");
        Ok(raster)
    }
}
