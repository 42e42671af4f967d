// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — cropping detected regions out of page rasters.

pub mod crop;

pub use crop::{CropRect, crop_rect, crop_with_margin};
