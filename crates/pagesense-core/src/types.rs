// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Pagesense classification and extraction pipeline.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PagesenseError;

/// Axis-aligned rectangle in page or pixel space. The y axis points down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BoundingBox {
    pub const fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        (self.x1 - self.x0).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.y1 - self.y0).max(0.0)
    }

    /// Zero for inverted or degenerate rectangles.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center_x(&self) -> f64 {
        (self.x0 + self.x1) / 2.0
    }

    /// Overlap of two rectangles; `None` when they do not overlap.
    pub fn intersect(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let clipped = BoundingBox {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        };
        (clipped.x1 > clipped.x0 && clipped.y1 > clipped.y0).then_some(clipped)
    }

    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite()
    }
}

/// What a page block contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Image,
}

/// A positioned block on a page, `(x0, y0, x1, y1, kind)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageBlock {
    pub bbox: BoundingBox,
    pub kind: BlockKind,
}

impl PageBlock {
    pub const fn new(bbox: BoundingBox, kind: BlockKind) -> Self {
        Self { bbox, kind }
    }

    pub fn is_image(&self) -> bool {
        self.kind == BlockKind::Image
    }
}

/// Per-page text-quality signals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityReport {
    /// Non-whitespace character count.
    pub char_count: usize,
    /// Fraction of characters in the expected script.
    pub script_ratio: f64,
    pub replacement_ratio: f64,
    pub control_ratio: f64,
    pub cid_artifact_count: usize,
    /// Combined score in `[0, 1]`.
    pub score: f64,
}

impl QualityReport {
    /// Report for a page whose text is empty after stripping whitespace.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Why a page was (or was not) forced to OCR. Earlier variants take priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceReason {
    HighImageCoverage,
    TooLittleText,
    LowTextQuality,
    UseTextLayer,
}

impl ForceReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighImageCoverage => "high_image_coverage",
            Self::TooLittleText => "too_little_text",
            Self::LowTextQuality => "low_text_quality",
            Self::UseTextLayer => "use_text_layer",
        }
    }

    pub fn forces_ocr(&self) -> bool {
        !matches!(self, Self::UseTextLayer)
    }
}

impl fmt::Display for ForceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision recorded for one page during classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDecision {
    /// 1-based page number.
    pub page: u32,
    pub force_ocr: bool,
    pub reason: ForceReason,
    pub image_coverage: f64,
    pub quality: QualityReport,
}

/// Document-level verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Digital,
    Scanned,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Digital => "digital",
            Self::Scanned => "scanned",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = PagesenseError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label.trim().to_ascii_lowercase().as_str() {
            "digital" | "docx" => Ok(Self::Digital),
            "scanned" => Ok(Self::Scanned),
            other => Err(PagesenseError::Classification(format!(
                "unexpected verdict '{other}'"
            ))),
        }
    }
}

/// Classifier output with its diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationVerdict {
    pub verdict: Verdict,
    pub pages: Vec<PageDecision>,
    pub forced_pages: usize,
    pub page_count: usize,
    pub force_ratio: f64,
    /// File size in bytes.
    pub file_size: u64,
    pub avg_size_per_page: f64,
}

impl ClassificationVerdict {
    pub fn is_scanned(&self) -> bool {
        self.verdict == Verdict::Scanned
    }
}

/// A labelled layout region detected on a rendered page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    pub bbox: BoundingBox,
    pub label: String,
}

impl TextRegion {
    pub fn new(bbox: BoundingBox, label: impl Into<String>) -> Self {
        Self {
            bbox,
            label: label.into(),
        }
    }
}

/// Outcome of one extractor run over one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub extractor_name: String,
    pub text: String,
    pub success: bool,
    pub error_message: Option<String>,
    pub execution_time_seconds: f64,
    pub char_count: usize,
    pub word_count: usize,
    pub line_count: usize,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ExtractionResult {
    /// Successful result; counts are derived from `text`.
    pub fn success(extractor_name: impl Into<String>, text: String, seconds: f64) -> Self {
        let char_count = text.chars().count();
        let word_count = crate::text::word_count(&text);
        let line_count = crate::text::line_count(&text);
        Self {
            extractor_name: extractor_name.into(),
            text,
            success: true,
            error_message: None,
            execution_time_seconds: seconds,
            char_count,
            word_count,
            line_count,
            metadata: BTreeMap::new(),
        }
    }

    /// Failed result: empty text, zero counts, message set.
    pub fn failure(
        extractor_name: impl Into<String>,
        error_message: impl Into<String>,
        seconds: f64,
    ) -> Self {
        Self {
            extractor_name: extractor_name.into(),
            text: String::new(),
            success: false,
            error_message: Some(error_message.into()),
            execution_time_seconds: seconds,
            char_count: 0,
            word_count: 0,
            line_count: 0,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
