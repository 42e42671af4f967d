// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the per-page hot paths in pagesense-document:
// text quality scoring and region ordering.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use pagesense_core::config::QualityConfig;
use pagesense_core::types::{BoundingBox, TextRegion};
use pagesense_document::analysis::text_quality;
use pagesense_document::layout::order_regions;

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Score a page-sized Korean text layer with a sprinkling of CID artifacts.
fn bench_text_quality(c: &mut Criterion) {
    let paragraph = "대한민국은 민주공화국이다. 모든 권력은 국민으로부터 나온다. (cid:12) ";
    let text = paragraph.repeat(60);
    let config = QualityConfig::hangul();

    c.bench_function("text_quality (page of hangul)", |b| {
        b.iter(|| black_box(text_quality(black_box(&text), &config)));
    });
}

/// Order 80 regions laid out in two columns on a 2480 px wide raster.
fn bench_order_regions(c: &mut Criterion) {
    let mut regions = Vec::new();
    for row in 0..40 {
        let y = 100.0 + f64::from(row) * 80.0;
        regions.push(TextRegion::new(BoundingBox::new(1300.0, y, 2300.0, y + 60.0), "text"));
        regions.push(TextRegion::new(BoundingBox::new(150.0, y, 1150.0, y + 60.0), "text"));
    }

    c.bench_function("order_regions (80 regions, two columns)", |b| {
        b.iter(|| {
            let ordered = order_regions(black_box(regions.clone()), 2480.0, 0.25);
            black_box(ordered.ok());
        });
    });
}

criterion_group!(benches, bench_text_quality, bench_order_regions);
criterion_main!(benches);
