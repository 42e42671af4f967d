// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout module — region detection on rendered pages and reading order.

pub mod detect;
pub mod order;

pub use detect::{LayoutDetector, MorphologyLayoutDetector};
pub use order::{RegionOrderer, filter_text_regions, order_regions};
