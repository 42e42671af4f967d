// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasteriser — composites a page's image XObjects onto a white canvas.
// Vector text and paths are not drawn; the output feeds layout detection and
// OCR on image-dominated pages.

use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgb, RgbImage};
use lopdf::{Dictionary, Document, Object, Stream};
use pagesense_core::error::{PagesenseError, Result};
use pagesense_core::types::BoundingBox;
use tracing::{debug, instrument, warn};

use super::content::{ImagePlacement, name_of, number, resolve, stream_bytes};

/// Longest side of a rendered page, in pixels.
pub const MAX_RASTER_SIDE: u32 = 12_000;

/// Images with more samples than this are not decoded.
const MAX_IMAGE_PIXELS: u64 = 200_000_000;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Canvas size and points-to-pixels scale for a page rendered at `dpi`.
pub fn raster_size(bounds: &BoundingBox, dpi: u32) -> (u32, u32, f64) {
    let mut scale = f64::from(dpi) / 72.0;
    let longest = bounds.width().max(bounds.height()) * scale;
    if longest > f64::from(MAX_RASTER_SIDE) {
        scale *= f64::from(MAX_RASTER_SIDE) / longest;
    }
    let width = (bounds.width() * scale).round().clamp(1.0, f64::from(MAX_RASTER_SIDE));
    let height = (bounds.height() * scale).round().clamp(1.0, f64::from(MAX_RASTER_SIDE));
    (width as u32, height as u32, scale)
}

/// Render `images` (placed in top-left page space) onto a white canvas.
#[instrument(skip_all, fields(dpi, images = images.len()))]
pub fn render_page(
    doc: &Document,
    bounds: BoundingBox,
    images: &[ImagePlacement<'_>],
    dpi: u32,
) -> Result<RgbImage> {
    if dpi == 0 {
        return Err(PagesenseError::Image("cannot render at 0 dpi".into()));
    }
    let (width, height, scale) = raster_size(&bounds, dpi);
    let mut canvas = RgbImage::from_pixel(width, height, WHITE);
    let canvas_pixels = u64::from(width) * u64::from(height);

    for placement in images {
        if placement.bbox.intersect(&bounds).is_none() {
            continue;
        }
        let target_w = (placement.bbox.width() * scale).round() as u32;
        let target_h = (placement.bbox.height() * scale).round() as u32;
        if target_w == 0 || target_h == 0 {
            continue;
        }
        if u64::from(target_w) * u64::from(target_h) > canvas_pixels.saturating_mul(4) {
            warn!(target_w, target_h, "Image placement far larger than the page, skipping");
            continue;
        }

        let decoded = match decode_image(doc, placement.stream) {
            Ok(Some(decoded)) => decoded,
            Ok(None) => continue,
            Err(err) => {
                warn!(%err, "Skipping undecodable image");
                continue;
            }
        };

        let mut scaled = imageops::resize(&decoded, target_w, target_h, FilterType::Triangle);
        if placement.flip_horizontal {
            imageops::flip_horizontal_in_place(&mut scaled);
        }
        if placement.flip_vertical {
            imageops::flip_vertical_in_place(&mut scaled);
        }
        imageops::overlay(
            &mut canvas,
            &scaled,
            (placement.bbox.x0 * scale).round() as i64,
            (placement.bbox.y0 * scale).round() as i64,
        );
    }

    debug!(width, height, "Page rendered");
    Ok(canvas)
}

/// Decode an image XObject to RGB.
///
/// `Ok(None)` means the encoding or colour space is one this rasteriser does
/// not handle; the caller leaves that area blank.
pub fn decode_image(doc: &Document, stream: &Stream) -> Result<Option<RgbImage>> {
    let dict = &stream.dict;
    let filters = filter_names(dict);

    if filters.iter().any(|f| f.as_slice() == b"DCTDecode") {
        if filters.len() != 1 {
            warn!("Chained DCT filters are not supported");
            return Ok(None);
        }
        let decoded = image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
            .map_err(|err| PagesenseError::Image(format!("JPEG image decode failed: {}", err)))?;
        return Ok(Some(decoded.to_rgb8()));
    }

    if let Some(other) = filters
        .iter()
        .find(|f| !matches!(f.as_slice(), b"FlateDecode" | b"LZWDecode"))
    {
        warn!(filter = %String::from_utf8_lossy(other), "Unsupported image encoding");
        return Ok(None);
    }

    let width = int_entry(dict, b"Width").unwrap_or(0);
    let height = int_entry(dict, b"Height").unwrap_or(0);
    if width == 0 || height == 0 {
        return Err(PagesenseError::Image(format!(
            "image has invalid dimensions {}x{}",
            width, height
        )));
    }
    if u64::from(width) * u64::from(height) > MAX_IMAGE_PIXELS {
        warn!(width, height, "Image too large to decode");
        return Ok(None);
    }

    let is_mask = matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true)));
    let (components, bits) = if is_mask {
        (1, 1)
    } else {
        let Some(components) = color_components(doc, dict) else {
            warn!("Unsupported image colour space");
            return Ok(None);
        };
        (components, int_entry(dict, b"BitsPerComponent").unwrap_or(8))
    };

    let data = stream_bytes(stream)?;
    let Some(mut samples) = unpack_samples(&data, width, height, components, bits) else {
        warn!(width, height, components, bits, len = data.len(), "Image samples do not match dimensions");
        return Ok(None);
    };
    if inverted_decode(doc, dict) {
        samples.iter_mut().for_each(|s| *s = 255 - *s);
    }

    let pixels: Vec<u8> = match components {
        1 => samples.iter().flat_map(|&g| [g, g, g]).collect(),
        3 => samples,
        _ => samples.chunks_exact(4).flat_map(cmyk_to_rgb).collect(),
    };
    Ok(RgbImage::from_raw(width, height, pixels))
}

fn filter_names(dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items.iter().filter_map(name_of).map(<[u8]>::to_vec).collect(),
        _ => Vec::new(),
    }
}

fn int_entry(dict: &Dictionary, key: &[u8]) -> Option<u32> {
    match dict.get(key).ok()? {
        Object::Integer(i) => u32::try_from(*i).ok(),
        _ => None,
    }
}

/// Components per sample for the colour spaces the rasteriser understands.
fn color_components(doc: &Document, dict: &Dictionary) -> Option<u8> {
    let space = resolve(doc, dict.get(b"ColorSpace").ok()?);
    match space {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => Some(1),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(3),
            b"DeviceCMYK" | b"CMYK" => Some(4),
            _ => None,
        },
        Object::Array(items) => match items.as_slice() {
            [family, params, ..] if name_of(family) == Some(b"ICCBased".as_slice()) => {
                let profile = resolve(doc, params).as_stream().ok()?;
                match int_entry(&profile.dict, b"N")? {
                    n @ (1 | 3 | 4) => Some(n as u8),
                    _ => None,
                }
            }
            [family, ..] if matches!(name_of(family), Some(b"CalGray")) => Some(1),
            [family, ..] if matches!(name_of(family), Some(b"CalRGB")) => Some(3),
            _ => None,
        },
        _ => None,
    }
}

/// A `/Decode [1 0 ...]` array swaps dark and light.
fn inverted_decode(doc: &Document, dict: &Dictionary) -> bool {
    let Ok(decode) = dict.get(b"Decode") else {
        return false;
    };
    match resolve(doc, decode).as_array() {
        Ok(items) => matches!(
            (items.first().and_then(number), items.get(1).and_then(number)),
            (Some(lo), Some(hi)) if lo > hi
        ),
        Err(_) => false,
    }
}

/// Expand packed samples to one byte per component.
fn unpack_samples(data: &[u8], width: u32, height: u32, components: u8, bits: u32) -> Option<Vec<u8>> {
    let per_row = width as usize * components as usize;
    let rows = height as usize;
    match bits {
        8 => {
            let needed = per_row * rows;
            (data.len() >= needed).then(|| data[..needed].to_vec())
        }
        1 => {
            let stride = per_row.div_ceil(8);
            if data.len() < stride * rows {
                return None;
            }
            let mut out = Vec::with_capacity(per_row * rows);
            for row in data.chunks_exact(stride).take(rows) {
                out.extend((0..per_row).map(|i| {
                    if row[i / 8] & (0x80 >> (i % 8)) != 0 { 255 } else { 0 }
                }));
            }
            Some(out)
        }
        _ => None,
    }
}

fn cmyk_to_rgb(cmyk: &[u8]) -> [u8; 3] {
    let k = 255 - u16::from(cmyk[3]);
    let channel = |v: u8| ((255 - u16::from(v)) * k / 255) as u8;
    [channel(cmyk[0]), channel(cmyk[1]), channel(cmyk[2])]
}
