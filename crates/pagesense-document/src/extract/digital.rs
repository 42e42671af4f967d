// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Direct text-layer extraction for born-digital documents.

use std::path::Path;

use pagesense_core::error::Result;
use tracing::instrument;

use super::Extractor;
use crate::page::{DocumentSource, Page};
use crate::pdf::PdfReader;

/// Text of every page's text layer, pages joined with `\n`.
pub fn extract_digital<D: DocumentSource>(doc: &D) -> Result<String> {
    let mut texts = Vec::with_capacity(doc.page_count());
    for index in 0..doc.page_count() {
        texts.push(doc.page(index)?.text()?);
    }
    Ok(texts.join("\n"))
}

/// Pulls the embedded text layer without OCR.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLayerExtractor;

impl Extractor for TextLayerExtractor {
    fn name(&self) -> &str {
        "TextLayer"
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    fn extract(&self, path: &Path) -> Result<String> {
        let reader = PdfReader::open(path)?;
        extract_digital(&reader)
    }
}
