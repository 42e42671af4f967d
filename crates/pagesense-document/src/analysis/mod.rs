// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page analysis — quality signals per page and the document-level classifier.

pub mod classify;
pub mod quality;

pub use classify::{Classifier, classify, decide_verdict, should_force_ocr};
pub use quality::{image_coverage_ratio, text_quality};
