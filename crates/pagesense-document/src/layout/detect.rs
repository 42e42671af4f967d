// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout detection — partitions a rendered page into labelled regions.

use image::{GrayImage, Luma, RgbImage, imageops};
use imageproc::contrast::otsu_level;
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;
use imageproc::region_labelling::{Connectivity, connected_components};
use pagesense_core::error::Result;
use pagesense_core::types::{BoundingBox, TextRegion};
use tracing::{debug, instrument};

/// Anything that can find labelled regions on a page raster.
pub trait LayoutDetector {
    /// Regions in pixel coordinates of `image`. Labels are free-form; callers
    /// filter them against the text-bearing set.
    fn detect(&self, image: &RgbImage) -> Result<Vec<TextRegion>>;
}

/// Model-free detector: Otsu binarisation, dilation to merge glyphs into
/// blocks, then one region per connected blob of ink.
#[derive(Debug, Clone)]
pub struct MorphologyLayoutDetector {
    /// L-infinity dilation radius in pixels.
    pub dilation_radius: u8,
    /// Blobs whose ink box is smaller than this on both sides are noise.
    pub min_side: u32,
    /// Blobs covering more than this share of the page are labelled `figure`.
    pub figure_area_ratio: f64,
}

impl MorphologyLayoutDetector {
    /// Parameters tuned for 300 dpi, scaled to `dpi`.
    pub fn for_dpi(dpi: u32) -> Self {
        let scale = f64::from(dpi) / 300.0;
        Self {
            dilation_radius: (10.0 * scale).round().clamp(1.0, 255.0) as u8,
            min_side: (6.0 * scale).round().max(2.0) as u32,
            figure_area_ratio: 0.9,
        }
    }
}

impl Default for MorphologyLayoutDetector {
    fn default() -> Self {
        Self::for_dpi(300)
    }
}

impl LayoutDetector for MorphologyLayoutDetector {
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn detect(&self, image: &RgbImage) -> Result<Vec<TextRegion>> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let gray = imageops::grayscale(image);
        let level = otsu_level(&gray);
        let ink = GrayImage::from_fn(width, height, |x, y| {
            if gray.get_pixel(x, y).0[0] <= level {
                Luma([255])
            } else {
                Luma([0])
            }
        });

        let merged = dilate(&ink, Norm::LInf, self.dilation_radius);
        let labels = connected_components(&merged, Connectivity::Eight, Luma([0u8]));

        // Tight box of the original ink per blob: (x0, y0, x1, y1) inclusive.
        let mut boxes: Vec<Option<(u32, u32, u32, u32)>> = Vec::new();
        for (x, y, pixel) in ink.enumerate_pixels() {
            if pixel.0[0] == 0 {
                continue;
            }
            let label = labels.get_pixel(x, y).0[0] as usize;
            if label == 0 {
                continue;
            }
            if boxes.len() < label {
                boxes.resize(label, None);
            }
            let entry = &mut boxes[label - 1];
            *entry = Some(match *entry {
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                None => (x, y, x, y),
            });
        }

        let page_area = f64::from(width) * f64::from(height);
        let mut regions = Vec::new();
        let mut noise = 0usize;
        for (x0, y0, x1, y1) in boxes.into_iter().flatten() {
            let (w, h) = (x1 - x0 + 1, y1 - y0 + 1);
            if w < self.min_side && h < self.min_side {
                noise += 1;
                continue;
            }
            let bbox = BoundingBox::new(
                f64::from(x0),
                f64::from(y0),
                f64::from(x1 + 1),
                f64::from(y1 + 1),
            );
            let label = if bbox.area() > self.figure_area_ratio * page_area {
                "figure"
            } else {
                "text"
            };
            regions.push(TextRegion::new(bbox, label));
        }

        debug!(level, regions = regions.len(), noise, "Layout detected");
        Ok(regions)
    }
}
