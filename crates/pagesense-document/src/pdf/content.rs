// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content-stream walker — tracks the graphics state through a page's content
// and reports where text is shown and where image XObjects are painted.

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, Stream};
use pagesense_core::error::{PagesenseError, Result};
use pagesense_core::types::{BlockKind, BoundingBox, PageBlock};
use tracing::{debug, warn};

/// Nesting limit for Form XObjects painting other Form XObjects.
const MAX_FORM_DEPTH: usize = 8;

/// Approximate glyph advance as a fraction of the font size.
const GLYPH_ADVANCE: f64 = 0.5;

/// Descender depth as a fraction of the font size.
const DESCENT: f64 = 0.25;

/// `Tr` mode that neither fills nor strokes glyphs (hidden OCR layers).
const INVISIBLE_TEXT: i64 = 3;

/// Affine transform `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    /// Maps PDF user space inside `media_box` to a top-left origin with y down.
    pub fn page_flip(media_box: &BoundingBox) -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: -1.0,
            e: -media_box.x0,
            f: media_box.y1,
        }
    }

    /// `self × other`: apply `self` first, then `other`.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Bounding box of the rectangle `(x0, y0)..(x1, y1)` mapped through `self`.
    pub fn transform_rect(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> BoundingBox {
        let corners = [
            self.apply(x0, y0),
            self.apply(x1, y0),
            self.apply(x0, y1),
            self.apply(x1, y1),
        ];
        let mut bbox = BoundingBox::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for (x, y) in corners {
            bbox.x0 = bbox.x0.min(x);
            bbox.y0 = bbox.y0.min(y);
            bbox.x1 = bbox.x1.max(x);
            bbox.y1 = bbox.y1.max(y);
        }
        bbox
    }

    fn from_operands(operands: &[Object]) -> Option<Matrix> {
        match operands {
            [a, b, c, d, e, f] => Some(Matrix {
                a: number(a)?,
                b: number(b)?,
                c: number(c)?,
                d: number(d)?,
                e: number(e)?,
                f: number(f)?,
            }),
            _ => None,
        }
    }
}

/// An image XObject painted on the page.
#[derive(Debug, Clone)]
pub struct ImagePlacement<'a> {
    /// Placement in top-left page space.
    pub bbox: BoundingBox,
    pub stream: &'a Stream,
    /// Image columns run right to left on the page.
    pub flip_horizontal: bool,
    /// Image rows run bottom to top on the page.
    pub flip_vertical: bool,
}

/// Everything the walker found on one page.
#[derive(Debug, Default)]
pub struct PageContent<'a> {
    pub blocks: Vec<PageBlock>,
    pub images: Vec<ImagePlacement<'a>>,
}

/// Walk a page's content stream, starting from `base` (normally [`Matrix::page_flip`]).
pub fn walk_page<'a>(
    doc: &'a Document,
    content: &[u8],
    resources: Option<&'a Dictionary>,
    base: Matrix,
) -> Result<PageContent<'a>> {
    let mut walker = Walker {
        doc,
        found: PageContent::default(),
    };
    walker.walk(content, resources, base, 0)?;
    Ok(walker.found)
}

#[derive(Debug, Clone, Copy)]
struct TextState {
    font_size: f64,
    leading: f64,
    matrix: Matrix,
    line_matrix: Matrix,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_size: 0.0,
            leading: 0.0,
            matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
        }
    }
}

struct Walker<'a> {
    doc: &'a Document,
    found: PageContent<'a>,
}

impl<'a> Walker<'a> {
    fn walk(
        &mut self,
        content: &[u8],
        resources: Option<&'a Dictionary>,
        base: Matrix,
        depth: usize,
    ) -> Result<()> {
        let content = Content::decode(content)
            .map_err(|err| PagesenseError::Pdf(format!("cannot decode content stream: {}", err)))?;

        let mut ctm = base;
        let mut stack: Vec<(Matrix, i64)> = Vec::new();
        let mut text = TextState::default();
        // Text rendering mode (Tr) lives in the graphics state, so q/Q saves it.
        let mut render_mode: i64 = 0;
        // Union of the glyph boxes shown in the current BT..ET object.
        let mut text_extent: Option<BoundingBox> = None;

        for op in &content.operations {
            let operands = op.operands.as_slice();
            match op.operator.as_str() {
                "q" => stack.push((ctm, render_mode)),
                "Q" => (ctm, render_mode) = stack.pop().unwrap_or((base, 0)),
                "cm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        ctm = m.multiply(&ctm);
                    }
                }
                "BT" => {
                    text.matrix = Matrix::IDENTITY;
                    text.line_matrix = Matrix::IDENTITY;
                    text_extent = None;
                }
                "ET" => {
                    if let Some(bbox) = text_extent.take() {
                        self.found
                            .blocks
                            .push(PageBlock::new(bbox, BlockKind::Text));
                    }
                }
                "Tf" => {
                    if let Some(size) = operands.get(1).and_then(number) {
                        text.font_size = size.abs();
                    }
                }
                "Tr" => {
                    if let Some(Object::Integer(mode)) = operands.first() {
                        render_mode = *mode;
                    }
                }
                "TL" => {
                    if let Some(leading) = operands.first().and_then(number) {
                        text.leading = leading;
                    }
                }
                "Td" | "TD" => {
                    if let [tx, ty] = operands
                        && let (Some(tx), Some(ty)) = (number(tx), number(ty))
                    {
                        if op.operator == "TD" {
                            text.leading = -ty;
                        }
                        text.line_matrix = Matrix::translation(tx, ty).multiply(&text.line_matrix);
                        text.matrix = text.line_matrix;
                    }
                }
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        text.matrix = m;
                        text.line_matrix = m;
                    }
                }
                "T*" => next_line(&mut text),
                "Tj" | "'" | "\"" | "TJ" => {
                    if op.operator != "Tj" && op.operator != "TJ" {
                        next_line(&mut text);
                    }
                    let advance = shown_advance(operands, text.font_size);
                    if render_mode != INVISIBLE_TEXT && text.font_size > 0.0 && advance > 0.0 {
                        let device = text.matrix.multiply(&ctm);
                        let glyphs = device.transform_rect(
                            0.0,
                            -DESCENT * text.font_size,
                            advance,
                            text.font_size,
                        );
                        text_extent = Some(match text_extent {
                            Some(acc) => union(&acc, &glyphs),
                            None => glyphs,
                        });
                    }
                    text.matrix = Matrix::translation(advance, 0.0).multiply(&text.matrix);
                }
                "Do" => {
                    let Some(name) = operands.first().and_then(name_of) else {
                        continue;
                    };
                    self.paint_xobject(name, resources, ctm, depth);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn paint_xobject(
        &mut self,
        name: &[u8],
        resources: Option<&'a Dictionary>,
        ctm: Matrix,
        depth: usize,
    ) {
        let Some(stream) = lookup_xobject(self.doc, resources, name) else {
            debug!(name = %String::from_utf8_lossy(name), "XObject not found in resources");
            return;
        };

        let subtype = stream.dict.get(b"Subtype").ok().and_then(name_of);
        match subtype {
            Some(b"Image") => {
                let bbox = ctm.transform_rect(0.0, 0.0, 1.0, 1.0);
                self.found
                    .blocks
                    .push(PageBlock::new(bbox, BlockKind::Image));
                self.found.images.push(ImagePlacement {
                    bbox,
                    stream,
                    flip_horizontal: ctm.a < 0.0,
                    flip_vertical: ctm.d > 0.0,
                });
            }
            Some(b"Form") => {
                if depth >= MAX_FORM_DEPTH {
                    warn!(depth, "Form XObject nesting too deep, skipping");
                    return;
                }
                let form_matrix = stream
                    .dict
                    .get(b"Matrix")
                    .ok()
                    .and_then(|obj| resolve(self.doc, obj).as_array().ok())
                    .and_then(|arr| Matrix::from_operands(arr))
                    .unwrap_or(Matrix::IDENTITY);
                let form_resources = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|obj| resolve(self.doc, obj).as_dict().ok())
                    .or(resources);

                let bytes = match stream_bytes(stream) {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        warn!(%err, "Cannot read Form XObject content");
                        return;
                    }
                };
                if let Err(err) =
                    self.walk(&bytes, form_resources, form_matrix.multiply(&ctm), depth + 1)
                {
                    warn!(%err, "Cannot walk Form XObject content");
                }
            }
            _ => {}
        }
    }
}

fn next_line(text: &mut TextState) {
    text.line_matrix = Matrix::translation(0.0, -text.leading).multiply(&text.line_matrix);
    text.matrix = text.line_matrix;
}

/// Estimated horizontal advance, in text space, of a text-showing operator.
fn shown_advance(operands: &[Object], font_size: f64) -> f64 {
    let mut glyphs = 0.0;
    let mut adjust = 0.0;
    for operand in operands {
        match operand {
            Object::String(bytes, _) => glyphs += bytes.len() as f64,
            Object::Array(items) => {
                for item in items {
                    match item {
                        Object::String(bytes, _) => glyphs += bytes.len() as f64,
                        other => {
                            if let Some(kern) = number(other) {
                                adjust += kern / 1000.0;
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
    ((glyphs * GLYPH_ADVANCE - adjust) * font_size).max(0.0)
}

fn union(a: &BoundingBox, b: &BoundingBox) -> BoundingBox {
    BoundingBox::new(a.x0.min(b.x0), a.y0.min(b.y0), a.x1.max(b.x1), a.y1.max(b.y1))
}

pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

pub(crate) fn name_of(obj: &Object) -> Option<&[u8]> {
    match obj {
        Object::Name(name) => Some(name.as_slice()),
        _ => None,
    }
}

/// Follow a single level of indirection.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Raw stream bytes with any filters lopdf understands removed.
pub(crate) fn stream_bytes(stream: &Stream) -> Result<Vec<u8>> {
    if stream.dict.get(b"Filter").is_err() {
        return Ok(stream.content.clone());
    }
    stream
        .decompressed_content()
        .map_err(|err| PagesenseError::Pdf(format!("cannot decompress stream: {}", err)))
}

fn lookup_xobject<'a>(
    doc: &'a Document,
    resources: Option<&'a Dictionary>,
    name: &[u8],
) -> Option<&'a Stream> {
    let xobjects = resolve(doc, resources?.get(b"XObject").ok()?).as_dict().ok()?;
    resolve(doc, xobjects.get(name).ok()?).as_stream().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn letter() -> Matrix {
        Matrix::page_flip(&BoundingBox::new(0.0, 0.0, 612.0, 792.0))
    }

    #[test]
    fn page_flip_moves_origin_to_top_left() {
        let flip = letter();
        assert_eq!(flip.apply(0.0, 792.0), (0.0, 0.0));
        assert_eq!(flip.apply(612.0, 0.0), (612.0, 792.0));
    }

    #[test]
    fn multiply_applies_left_operand_first() {
        let scale = Matrix {
            a: 2.0,
            d: 3.0,
            ..Matrix::IDENTITY
        };
        let shift = Matrix::translation(10.0, 20.0);
        assert_eq!(scale.multiply(&shift).apply(1.0, 1.0), (12.0, 23.0));
        assert_eq!(shift.multiply(&scale).apply(1.0, 1.0), (22.0, 63.0));
    }

    #[test]
    fn image_do_yields_image_block_in_top_left_space() {
        let mut doc = Document::with_version("1.5");
        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 1,
                "Height" => 1,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![0],
        );
        let image_id = doc.add_object(image);
        let resources = dictionary! { "XObject" => dictionary! { "Im1" => image_id } };

        let found = walk_page(
            &doc,
            b"q 100 0 0 50 10 20 cm /Im1 Do Q",
            Some(&resources),
            letter(),
        )
        .unwrap();

        assert_eq!(found.blocks.len(), 1);
        let block = found.blocks[0];
        assert_eq!(block.kind, BlockKind::Image);
        assert_eq!(block.bbox, BoundingBox::new(10.0, 722.0, 110.0, 772.0));
        assert!(!found.images[0].flip_vertical);
        assert!(!found.images[0].flip_horizontal);
    }

    #[test]
    fn text_object_yields_one_text_block() {
        let doc = Document::with_version("1.5");
        let found = walk_page(
            &doc,
            b"BT /F1 10 Tf 72 700 Td (Hello) Tj 0 -12 Td (World) Tj ET",
            None,
            letter(),
        )
        .unwrap();

        assert_eq!(found.blocks.len(), 1);
        let block = found.blocks[0];
        assert_eq!(block.kind, BlockKind::Text);
        assert!((block.bbox.x0 - 72.0).abs() < 1e-9);
        assert!((block.bbox.x1 - 97.0).abs() < 1e-9, "5 glyphs at 5pt each");
        assert!((block.bbox.y0 - 82.0).abs() < 1e-9, "top of first line");
        assert!((block.bbox.y1 - 106.5).abs() < 1e-9, "descender of second line");
    }

    #[test]
    fn empty_text_object_yields_nothing() {
        let doc = Document::with_version("1.5");
        let found = walk_page(&doc, b"BT /F1 10 Tf ET", None, letter()).unwrap();
        assert!(found.blocks.is_empty());
    }

    #[test]
    fn unbalanced_restore_falls_back_to_base() {
        let doc = Document::with_version("1.5");
        let found = walk_page(
            &doc,
            b"Q BT /F1 10 Tf 0 0 Td (x) Tj ET",
            None,
            letter(),
        )
        .unwrap();
        assert_eq!(found.blocks.len(), 1);
    }

    #[test]
    fn invisible_text_is_not_a_block() {
        let doc = Document::with_version("1.5");
        let found = walk_page(
            &doc,
            b"q BT 3 Tr /F1 10 Tf 72 700 Td (hidden) Tj ET Q BT /F1 10 Tf 72 600 Td (shown) Tj ET",
            None,
            letter(),
        )
        .unwrap();
        assert_eq!(found.blocks.len(), 1, "Q restores the visible rendering mode");
        assert!((found.blocks[0].bbox.y1 - 194.5).abs() < 1e-9);
    }
}
