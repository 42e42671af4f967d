// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page and document provider abstractions. The analysis, classification and
// extraction code only sees these traits, never a concrete PDF library.

use image::RgbImage;
use pagesense_core::error::Result;
use pagesense_core::types::{BoundingBox, PageBlock};

/// A read-only page handle.
pub trait Page {
    /// 1-based page number.
    fn number(&self) -> u32;

    /// Page rectangle with its origin at (0, 0) and the y axis pointing down.
    fn bounds(&self) -> BoundingBox;

    /// Positioned text and image blocks in the same coordinate space as
    /// [`bounds`](Self::bounds).
    fn blocks(&self) -> Result<Vec<PageBlock>>;

    /// Plain text of the page's text layer.
    fn text(&self) -> Result<String>;

    /// Rasterise the page to RGB at `dpi` dots per inch.
    fn render(&self, dpi: u32) -> Result<RgbImage>;
}

/// An opened document that hands out its pages by index.
pub trait DocumentSource {
    type Page<'a>: Page
    where
        Self: 'a;

    fn page_count(&self) -> usize;

    /// Page at a 0-based `index`.
    fn page(&self, index: usize) -> Result<Self::Page<'_>>;

    /// Size of the underlying file in bytes.
    fn byte_len(&self) -> u64;
}
