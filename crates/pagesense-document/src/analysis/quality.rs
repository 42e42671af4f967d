// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page quality analysis — image coverage and text-layer quality signals.

use once_cell::sync::Lazy;
use pagesense_core::config::QualityConfig;
use pagesense_core::text::is_separator;
use pagesense_core::types::{BoundingBox, PageBlock, QualityReport};
use regex::Regex;

/// Glyphs a PDF text extractor could not map to Unicode.
static CID_ARTIFACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(cid:\d+\)").expect("Invalid CID artifact regex"));

/// One character of the Unicode "Other" (C*) major category.
static OTHER_CATEGORY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{C}").expect("Invalid general category regex"));

/// Share of `bounds` covered by image blocks, clamped to `[0, 1]`.
///
/// Each block is clipped to the page first. A page with zero area counts as
/// fully covered.
pub fn image_coverage_ratio(bounds: &BoundingBox, blocks: &[PageBlock]) -> f64 {
    let page_area = bounds.area();
    if page_area <= 0.0 {
        return 1.0;
    }
    let covered: f64 = blocks
        .iter()
        .filter(|block| block.is_image())
        .filter_map(|block| block.bbox.intersect(bounds))
        .map(|clipped| clipped.area())
        .sum();
    (covered / page_area).clamp(0.0, 1.0)
}

/// Score how trustworthy a page's text layer looks.
pub fn text_quality(text: &str, config: &QualityConfig) -> QualityReport {
    let stripped: String = text.chars().filter(|&c| !is_separator(c)).collect();
    let n = stripped.chars().count();
    if n == 0 {
        return QualityReport::empty();
    }

    let script = stripped.chars().filter(|&c| config.is_script_char(c)).count();
    let replacement = stripped.chars().filter(|&c| c == '\u{FFFD}').count();
    let control = OTHER_CATEGORY.find_iter(&stripped).count();
    let cid_artifact_count = CID_ARTIFACT.find_iter(text).count();

    let total = n as f64;
    let script_ratio = script as f64 / total;
    let replacement_ratio = replacement as f64 / total;
    let control_ratio = control as f64 / total;

    let score = saturate(script_ratio / config.expected_script_ratio)
        * (1.0 - saturate(replacement_ratio * 10.0))
        * (1.0 - saturate(control_ratio * 10.0))
        * (1.0 - saturate(cid_artifact_count as f64 / 10.0));

    QualityReport {
        char_count: n,
        script_ratio,
        replacement_ratio,
        control_ratio,
        cid_artifact_count,
        score: score.clamp(0.0, 1.0),
    }
}

fn saturate(x: f64) -> f64 {
    x.min(1.0)
}
