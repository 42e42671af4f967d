// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text recognition — the seam between the OCR extraction path and whichever
// engine turns a cropped region into lines of text.

use image::RgbImage;
use pagesense_core::error::Result;

#[cfg(feature = "ocr")]
pub mod ocr;

#[cfg(feature = "ocr")]
pub use ocr::{OcrConfig, OcrEngine};

/// Recognises text in a cropped region image.
pub trait TextRecognizer {
    /// Recognised lines, top to bottom. An image with no text yields no lines.
    fn recognize(&self, image: &RgbImage) -> Result<Vec<String>>;
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for &T {
    fn recognize(&self, image: &RgbImage) -> Result<Vec<String>> {
        (**self).recognize(image)
    }
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Box<T> {
    fn recognize(&self, image: &RgbImage) -> Result<Vec<String>> {
        (**self).recognize(image)
    }
}
