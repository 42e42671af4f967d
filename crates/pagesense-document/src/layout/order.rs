// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Reading order for detected text regions: a single-column or two-column
// heuristic driven by the spread of region centers.

use std::collections::BTreeSet;

use pagesense_core::config::OrderingConfig;
use pagesense_core::error::{PagesenseError, Result};
use pagesense_core::types::TextRegion;
use tracing::debug;

/// Orders regions with a fixed column-gap ratio.
#[derive(Debug, Clone, Default)]
pub struct RegionOrderer {
    config: OrderingConfig,
}

impl RegionOrderer {
    pub fn new(config: OrderingConfig) -> Self {
        Self { config }
    }

    pub fn order(&self, regions: Vec<TextRegion>, page_width: f64) -> Result<Vec<TextRegion>> {
        order_regions(regions, page_width, self.config.gap_ratio)
    }
}

/// Permute `regions` into reading order.
///
/// If the widest gap between sorted horizontal centers reaches
/// `gap_ratio * page_width`, the page is split at the midpoint of the first
/// such widest gap and the left column (top to bottom) precedes the right
/// column. Otherwise regions are read top to bottom, then left to right.
pub fn order_regions(
    mut regions: Vec<TextRegion>,
    page_width: f64,
    gap_ratio: f64,
) -> Result<Vec<TextRegion>> {
    if !page_width.is_finite() || !gap_ratio.is_finite() {
        return Err(PagesenseError::InvalidGeometry(format!(
            "page width {page_width} and gap ratio {gap_ratio} must be finite"
        )));
    }
    if let Some(bad) = regions.iter().find(|r| !r.bbox.is_finite()) {
        return Err(PagesenseError::InvalidGeometry(format!(
            "region '{}' has non-finite coordinates {:?}",
            bad.label, bad.bbox
        )));
    }
    if regions.is_empty() {
        return Ok(regions);
    }

    let mut centers: Vec<f64> = regions.iter().map(|r| r.bbox.center_x()).collect();
    centers.sort_by(f64::total_cmp);

    // First occurrence of the widest gap.
    let mut widest: Option<(usize, f64)> = None;
    for (index, pair) in centers.windows(2).enumerate() {
        let gap = pair[1] - pair[0];
        if widest.is_none_or(|(_, best)| gap > best) {
            widest = Some((index, gap));
        }
    }

    let threshold = gap_ratio * page_width;
    let split_at = match widest {
        Some((index, gap)) if gap >= threshold => (centers[index] + centers[index + 1]) / 2.0,
        _ => {
            regions.sort_by(|a, b| {
                a.bbox
                    .y0
                    .total_cmp(&b.bbox.y0)
                    .then(a.bbox.x0.total_cmp(&b.bbox.x0))
            });
            debug!(regions = regions.len(), "Single-column reading order");
            return Ok(regions);
        }
    };

    let (mut left, mut right): (Vec<TextRegion>, Vec<TextRegion>) = regions
        .into_iter()
        .partition(|r| r.bbox.center_x() < split_at);
    left.sort_by(|a, b| a.bbox.y0.total_cmp(&b.bbox.y0));
    right.sort_by(|a, b| a.bbox.y0.total_cmp(&b.bbox.y0));
    debug!(
        split_at,
        left = left.len(),
        right = right.len(),
        "Two-column reading order"
    );

    left.extend(right);
    Ok(left)
}

/// Keep regions whose label is in `labels`, ignoring ASCII case.
pub fn filter_text_regions(regions: Vec<TextRegion>, labels: &BTreeSet<String>) -> Vec<TextRegion> {
    regions
        .into_iter()
        .filter(|r| labels.iter().any(|l| l.eq_ignore_ascii_case(&r.label)))
        .collect()
}
