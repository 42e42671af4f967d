// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — page provider over lopdf: page geometry, content walking, and
// rasterisation of image content. With the `pdfium` feature, pages can also
// be rendered in full by pdfium.

pub mod content;
#[cfg(feature = "pdfium")]
pub mod pdfium;
pub mod raster;
pub mod reader;

#[cfg(feature = "pdfium")]
pub use pdfium::{PdfiumRasterizer, RenderedPdf};
pub use reader::{PdfPage, PdfReader};
