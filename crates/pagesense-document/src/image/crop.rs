// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Region cropper — expand a region by a margin and cut it out of the page
// raster without reading outside the image.

use image::{RgbImage, imageops};
use pagesense_core::error::{PagesenseError, Result};
use pagesense_core::types::BoundingBox;

/// Pixel rectangle `[x0, x1) x [y0, y1)`, always inside the image it was
/// computed for. May be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl CropRect {
    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Truncate `bbox` to integers, grow it by `margin` on every side and clamp
/// it to a `width` x `height` image.
pub fn crop_rect(bbox: &BoundingBox, margin: u32, width: u32, height: u32) -> Result<CropRect> {
    if !bbox.is_finite() {
        return Err(PagesenseError::InvalidGeometry(format!(
            "cannot crop non-finite box {:?}",
            bbox
        )));
    }
    let margin = i64::from(margin);
    let clamp = |v: i64, max: u32| v.clamp(0, i64::from(max)) as u32;

    let x0 = clamp((bbox.x0 as i64).saturating_sub(margin), width);
    let y0 = clamp((bbox.y0 as i64).saturating_sub(margin), height);
    let x1 = clamp((bbox.x1 as i64).saturating_add(margin), width);
    let y1 = clamp((bbox.y1 as i64).saturating_add(margin), height);

    Ok(CropRect {
        x0,
        y0,
        x1: x1.max(x0),
        y1: y1.max(y0),
    })
}

/// Cut the margin-expanded `bbox` out of `image`. The result may be 0 x 0.
pub fn crop_with_margin(image: &RgbImage, bbox: &BoundingBox, margin: u32) -> Result<RgbImage> {
    let rect = crop_rect(bbox, margin, image.width(), image.height())?;
    Ok(imageops::crop_imm(image, rect.x0, rect.y0, rect.width(), rect.height()).to_image())
}
