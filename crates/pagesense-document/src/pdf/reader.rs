// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open existing PDF documents with the `lopdf` crate and expose
// their pages through the `DocumentSource` / `Page` traits.

use std::path::Path;

use image::RgbImage;
use lopdf::{Dictionary, Document, ObjectId};
use pagesense_core::error::{PagesenseError, Result};
use pagesense_core::types::{BlockKind, BoundingBox, PageBlock};
use tracing::{debug, info, instrument};

use super::content::{self, Matrix, PageContent, number, resolve};
use super::raster;
use crate::page::{DocumentSource, Page};

/// US Letter, used when a page tree carries no usable `/MediaBox`.
const FALLBACK_MEDIA_BOX: BoundingBox = BoundingBox::new(0.0, 0.0, 612.0, 792.0);

/// Bound on `/Parent` hops when looking up inherited page attributes.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Reads existing PDF files.
///
/// Wraps `lopdf::Document` and records the page order and the size of the
/// source so the classifier can compute bytes per page.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
    /// `(page number, page object)` in page-tree order.
    pages: Vec<(u32, ObjectId)>,
    byte_len: u64,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let byte_len = std::fs::metadata(path_ref)
            .map_err(|err| {
                PagesenseError::DocumentOpen(format!("cannot stat {}: {}", path_ref.display(), err))
            })?
            .len();

        let document = Document::load(path_ref).map_err(|err| {
            PagesenseError::DocumentOpen(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        let reader = Self::with_document(document, byte_len, Some(path_ref.display().to_string()));
        debug!(pages = reader.pages.len(), byte_len, "PDF loaded");
        Ok(reader)
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            PagesenseError::DocumentOpen(format!("failed to load PDF from memory: {}", err))
        })?;

        let reader = Self::with_document(document, data.len() as u64, None);
        debug!(pages = reader.pages.len(), "PDF loaded from bytes");
        Ok(reader)
    }

    fn with_document(document: Document, byte_len: u64, source_path: Option<String>) -> Self {
        let pages = document.get_pages().into_iter().collect();
        Self {
            document,
            source_path,
            pages,
            byte_len,
        }
    }

    // -- Inspection -----------------------------------------------------------

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    // -- Helpers --------------------------------------------------------------

    /// Look up a page attribute, following `/Parent` links for inherited keys.
    fn inherited<'a>(&'a self, page_id: ObjectId, key: &[u8]) -> Option<&'a lopdf::Object> {
        let mut node = self.document.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if let Ok(value) = node.get(key) {
                return Some(resolve(&self.document, value));
            }
            let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
            node = self.document.get_dictionary(parent).ok()?;
        }
        None
    }

    fn media_box(&self, page_id: ObjectId) -> BoundingBox {
        let parsed = self
            .inherited(page_id, b"MediaBox")
            .and_then(|obj| obj.as_array().ok())
            .and_then(|arr| match arr.as_slice() {
                [a, b, c, d] => Some((
                    number(resolve(&self.document, a))?,
                    number(resolve(&self.document, b))?,
                    number(resolve(&self.document, c))?,
                    number(resolve(&self.document, d))?,
                )),
                _ => None,
            });

        match parsed {
            Some((x0, y0, x1, y1)) => {
                let media = BoundingBox::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1));
                if media.area() > 0.0 {
                    media
                } else {
                    FALLBACK_MEDIA_BOX
                }
            }
            None => {
                debug!(?page_id, "no usable MediaBox, assuming US Letter");
                FALLBACK_MEDIA_BOX
            }
        }
    }

    fn resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        self.inherited(page_id, b"Resources")
            .and_then(|obj| obj.as_dict().ok())
    }
}

impl DocumentSource for PdfReader {
    type Page<'a> = PdfPage<'a>;

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, index: usize) -> Result<PdfPage<'_>> {
        let (number, id) = *self.pages.get(index).ok_or_else(|| {
            PagesenseError::Pdf(format!(
                "page index {} out of range (document has {} pages)",
                index,
                self.pages.len()
            ))
        })?;
        Ok(PdfPage {
            reader: self,
            number,
            id,
            media_box: self.media_box(id),
        })
    }

    fn byte_len(&self) -> u64 {
        self.byte_len
    }
}

/// A single page of a [`PdfReader`].
pub struct PdfPage<'a> {
    reader: &'a PdfReader,
    number: u32,
    id: ObjectId,
    media_box: BoundingBox,
}

impl<'a> PdfPage<'a> {
    /// Walk the page content once, collecting blocks and image placements.
    pub(crate) fn content(&self) -> Result<PageContent<'a>> {
        let reader: &'a PdfReader = self.reader;
        let doc = &reader.document;
        let bytes = doc.get_page_content(self.id).map_err(|err| {
            PagesenseError::Pdf(format!("cannot read content of page {}: {}", self.number, err))
        })?;
        content::walk_page(
            doc,
            &bytes,
            reader.resources(self.id),
            Matrix::page_flip(&self.media_box),
        )
    }
}

impl Page for PdfPage<'_> {
    fn number(&self) -> u32 {
        self.number
    }

    fn bounds(&self) -> BoundingBox {
        BoundingBox::new(0.0, 0.0, self.media_box.width(), self.media_box.height())
    }

    #[instrument(skip(self), fields(page = self.number))]
    fn blocks(&self) -> Result<Vec<PageBlock>> {
        let found = self.content()?;
        debug!(blocks = found.blocks.len(), images = found.images.len(), "Page content walked");
        Ok(found.blocks)
    }

    fn text(&self) -> Result<String> {
        self.reader
            .document
            .extract_text(&[self.number])
            .map_err(|err| {
                PagesenseError::Pdf(format!("text extraction failed on page {}: {}", self.number, err))
            })
    }

    /// Composite the page's image XObjects. Glyphs and vector paths are not
    /// drawn, so a page showing visible text is refused rather than rendered
    /// without it.
    #[instrument(skip(self), fields(page = self.number))]
    fn render(&self, dpi: u32) -> Result<RgbImage> {
        let found = self.content()?;
        let text_blocks = found
            .blocks
            .iter()
            .filter(|block| block.kind == BlockKind::Text)
            .count();
        if text_blocks > 0 {
            return Err(PagesenseError::Pdf(format!(
                "page {} shows {} text object(s) that the image compositor cannot draw",
                self.number, text_blocks
            )));
        }
        raster::render_page(&self.reader.document, self.bounds(), &found.images, dpi)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::{Object, Stream, dictionary};

    /// An image XObject painted by a fixture page as `/Im1`.
    pub(crate) struct FixtureImage {
        pub width: i64,
        pub height: i64,
        pub color_space: &'static str,
        pub bits: i64,
        pub data: Vec<u8>,
    }

    impl FixtureImage {
        /// 2x2 grayscale: black top row, white bottom row.
        pub(crate) fn gray_2x2() -> Self {
            Self {
                width: 2,
                height: 2,
                color_space: "DeviceGray",
                bits: 8,
                data: vec![0, 0, 255, 255],
            }
        }
    }

    pub(crate) struct FixturePage {
        pub content: String,
        pub image: Option<FixtureImage>,
    }

    impl FixturePage {
        /// Lines of Helvetica text.
        pub(crate) fn text(lines: &[&str]) -> Self {
            let mut content = String::from("BT /F1 12 Tf 72 720 Td 14 TL\n");
            for line in lines {
                content.push_str(&format!("({line}) Tj T*\n"));
            }
            content.push_str("ET");
            Self {
                content,
                image: None,
            }
        }

        /// `image` stretched over the whole US Letter page.
        pub(crate) fn full_page_image(image: FixtureImage) -> Self {
            Self {
                content: "q 612 0 0 792 0 0 cm /Im1 Do Q".to_string(),
                image: Some(image),
            }
        }
    }

    /// Build a US Letter PDF in memory.
    pub(crate) fn build_pdf(pages: Vec<FixturePage>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut kids = Vec::new();
        for page in pages {
            let mut resources = dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            };
            if let Some(image) = page.image {
                let image_id = doc.add_object(Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => image.width,
                        "Height" => image.height,
                        "ColorSpace" => image.color_space,
                        "BitsPerComponent" => image.bits,
                    },
                    image.data,
                ));
                resources.set("XObject", dictionary! { "Im1" => image_id });
            }
            let content_id = doc.add_object(Stream::new(dictionary! {}, page.content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources,
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn open_reports_page_count_and_size() {
        let bytes = build_pdf(vec![FixturePage::text(&["one"]), FixturePage::text(&["two"])]);
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        assert_eq!(reader.page_count(), 2);
        assert_eq!(reader.byte_len(), bytes.len() as u64);
        assert!(reader.source_path().is_none());
    }

    #[test]
    fn invalid_bytes_are_a_document_open_error() {
        let err = PdfReader::from_bytes(b"not a pdf").err().unwrap();
        assert_eq!(err.kind(), "DocumentOpenError");
    }

    #[test]
    fn missing_file_is_a_document_open_error() {
        let err = PdfReader::open("/nonexistent/input.pdf").err().unwrap();
        assert_eq!(err.kind(), "DocumentOpenError");
    }

    #[test]
    fn bounds_inherit_media_box_from_page_tree() {
        let bytes = build_pdf(vec![FixturePage::text(&["x"])]);
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        let page = reader.page(0).unwrap();
        assert_eq!(page.number(), 1);
        assert_eq!(page.bounds(), BoundingBox::new(0.0, 0.0, 612.0, 792.0));
    }

    #[test]
    fn text_layer_is_extracted() {
        let bytes = build_pdf(vec![FixturePage::text(&["Hello World"])]);
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        let text = reader.page(0).unwrap().text().unwrap();
        assert!(text.contains("Hello"), "got {text:?}");
    }

    #[test]
    fn image_page_yields_full_coverage_block() {
        let bytes = build_pdf(vec![FixturePage::full_page_image(FixtureImage::gray_2x2())]);
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        let blocks = reader.page(0).unwrap().blocks().unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Image);
        assert_eq!(blocks[0].bbox, BoundingBox::new(0.0, 0.0, 612.0, 792.0));
    }

    #[test]
    fn out_of_range_page_index_is_an_error() {
        let bytes = build_pdf(vec![FixturePage::text(&["x"])]);
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        assert!(reader.page(1).is_err());
    }

    #[test]
    fn image_page_renders_its_scan() {
        let bytes = build_pdf(vec![FixturePage::full_page_image(FixtureImage::gray_2x2())]);
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        let raster = reader.page(0).unwrap().render(36).unwrap();
        assert_eq!(raster.dimensions(), (306, 396));
        assert!(raster.get_pixel(10, 5).0[0] < 64, "black top row of the scan");
        assert!(raster.get_pixel(10, 390).0[0] > 192, "white bottom row of the scan");
    }

    #[test]
    fn visible_text_page_is_refused_not_rendered_blank() {
        let bytes = build_pdf(vec![FixturePage::text(&["Hello World"])]);
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        let err = reader.page(0).unwrap().render(72).unwrap_err();
        assert_eq!(err.kind(), "PdfError");
        assert!(err.to_string().contains("text object"), "got {err}");
    }

    #[test]
    fn hidden_text_over_a_scan_still_renders() {
        let page = FixturePage {
            content: "q 612 0 0 792 0 0 cm /Im1 Do Q BT 3 Tr /F1 12 Tf 72 720 Td (ocr layer) Tj ET"
                .to_string(),
            image: Some(FixtureImage::gray_2x2()),
        };
        let reader = PdfReader::from_bytes(&build_pdf(vec![page])).unwrap();
        assert!(reader.page(0).unwrap().render(36).is_ok());
    }
}
