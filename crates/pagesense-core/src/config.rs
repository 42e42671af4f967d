// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration. Every heuristic threshold is a field here so callers
// can tune the classifier and the OCR path without touching the code.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PagesenseError, Result};

/// Thresholds for the per-page force-OCR rules and the document verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Image coverage at or above which a page is forced to OCR.
    pub img_cover_threshold: f64,
    /// Minimum non-whitespace characters a usable text layer must carry.
    pub min_text_chars: usize,
    /// Text-quality score below which a page is forced to OCR.
    pub quality_threshold: f64,
    /// Forced-page ratio above which the document is `scanned`.
    pub force_ratio_threshold: f64,
    /// Average bytes per page above which the document is `scanned`.
    pub avg_size_per_page_threshold: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            img_cover_threshold: 0.85,
            min_text_chars: 50,
            quality_threshold: 0.35,
            force_ratio_threshold: 0.85,
            avg_size_per_page_threshold: 10.0 * 1024.0,
        }
    }
}

/// An inclusive range of Unicode code points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRange {
    pub start: u32,
    pub end: u32,
}

impl ScriptRange {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, ch: char) -> bool {
        (self.start..=self.end).contains(&(ch as u32))
    }
}

/// Parameters of the text-quality score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Code point ranges counted as the expected body-text script.
    pub script_ranges: Vec<ScriptRange>,
    /// Script ratio at which the script factor saturates at 1.0.
    pub expected_script_ratio: f64,
}

impl QualityConfig {
    /// Hangul syllables (U+AC00..=U+D7A3).
    pub fn hangul() -> Self {
        Self {
            script_ranges: vec![ScriptRange::new(0xAC00, 0xD7A3)],
            expected_script_ratio: 0.20,
        }
    }

    /// ASCII letters plus Latin-1 Supplement and Latin Extended-A/B letters.
    pub fn latin() -> Self {
        Self {
            script_ranges: vec![
                ScriptRange::new(0x41, 0x5A),
                ScriptRange::new(0x61, 0x7A),
                ScriptRange::new(0xC0, 0x24F),
            ],
            expected_script_ratio: 0.20,
        }
    }

    /// Look up a preset by name (`hangul` or `latin`).
    pub fn preset(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "hangul" | "korean" => Ok(Self::hangul()),
            "latin" => Ok(Self::latin()),
            other => Err(PagesenseError::Config(format!(
                "unknown script preset '{other}' (expected 'hangul' or 'latin')"
            ))),
        }
    }

    pub fn is_script_char(&self, ch: char) -> bool {
        self.script_ranges.iter().any(|range| range.contains(ch))
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self::hangul()
    }
}

/// Two-column reading-order heuristic parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingConfig {
    /// Minimum center gap, as a fraction of page width, that splits columns.
    pub gap_ratio: f64,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self { gap_ratio: 0.25 }
    }
}

/// Layout labels kept for OCR by default.
pub const DEFAULT_TEXT_LABELS: [&str; 6] = [
    "text",
    "paragraph_title",
    "document_title",
    "abstract",
    "references",
    "sidebar_text",
];

/// Settings for the OCR extraction path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Rendering resolution in dots per inch.
    pub dpi: u32,
    /// Pixels added around each region before cropping.
    pub margin: u32,
    /// Layout labels treated as text-bearing (compared case-insensitively).
    pub text_labels: BTreeSet<String>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            dpi: 300,
            margin: 8,
            text_labels: DEFAULT_TEXT_LABELS.iter().map(|l| l.to_string()).collect(),
        }
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub classifier: ClassifierConfig,
    pub quality: QualityConfig,
    pub ordering: OrderingConfig,
    pub ocr: OcrSettings,
}

impl PipelineConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|err| {
            PagesenseError::Config(format!("failed to read {}: {}", path.display(), err))
        })?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values outside the domain the heuristics are defined on.
    pub fn validate(&self) -> Result<()> {
        let c = &self.classifier;
        for (name, value) in [
            ("img_cover_threshold", c.img_cover_threshold),
            ("quality_threshold", c.quality_threshold),
            ("force_ratio_threshold", c.force_ratio_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PagesenseError::Config(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }
        if !c.avg_size_per_page_threshold.is_finite() || c.avg_size_per_page_threshold < 0.0 {
            return Err(PagesenseError::Config(format!(
                "avg_size_per_page_threshold must be a non-negative number, got {}",
                c.avg_size_per_page_threshold
            )));
        }
        if !(self.quality.expected_script_ratio > 0.0) {
            return Err(PagesenseError::Config(
                "expected_script_ratio must be positive".into(),
            ));
        }
        if !self.ordering.gap_ratio.is_finite() || self.ordering.gap_ratio < 0.0 {
            return Err(PagesenseError::Config(format!(
                "gap_ratio must be a non-negative number, got {}",
                self.ordering.gap_ratio
            )));
        }
        if self.ocr.dpi == 0 {
            return Err(PagesenseError::Config("dpi must be greater than zero".into()));
        }
        Ok(())
    }
}
