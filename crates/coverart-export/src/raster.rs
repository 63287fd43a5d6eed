//! Rasterizing documents to PNG.
//!
//! [`Rasterizer`] is the seam to a real renderer. [`PreviewRasterizer`] is a
//! flat stand-in: it paints the background fill, fills rect/circle/triangle
//! shapes and lines, and draws a box for every other element. Text glyphs,
//! background images and rotation are not rendered.

use std::io::Cursor;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use coverart_core::{Document, Element, ShapeType};
use image::{ImageFormat, Rgba, RgbaImage};
use tracing::debug;

use crate::error::{ExportError, ExportResult};

/// Canvas width in CSS pixels before the pixel ratio is applied
pub const BASE_CANVAS_WIDTH: u32 = 1080;

/// Largest canvas edge the preview rasterizer will allocate
const MAX_EDGE: u32 = 8192;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    /// Output pixels per canvas pixel
    pub pixel_ratio: f64,
}

impl RasterOptions {
    /// Small preview stored with a snapshot
    pub fn thumbnail() -> Self {
        Self { pixel_ratio: 0.2 }
    }

    /// Full-resolution PNG export
    pub fn full() -> Self {
        Self { pixel_ratio: 2.0 }
    }

    /// Output (width, height) in pixels for `doc`.
    pub fn output_size(&self, doc: &Document) -> ExportResult<(u32, u32)> {
        if !self.pixel_ratio.is_finite() || self.pixel_ratio <= 0.0 {
            return Err(ExportError::render_failed(format!(
                "invalid pixel ratio {}",
                self.pixel_ratio
            )));
        }
        let width = (f64::from(BASE_CANVAS_WIDTH) * self.pixel_ratio).round();
        if width < 1.0 || width > f64::from(MAX_EDGE) {
            return Err(ExportError::render_failed(format!(
                "canvas width {width} out of range"
            )));
        }
        let (w, h) = doc.aspect_ratio.dimensions(width as u32);
        if h > MAX_EDGE {
            return Err(ExportError::render_failed(format!(
                "canvas height {h} out of range"
            )));
        }
        Ok((w, h))
    }
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self::full()
    }
}

/// Produces PNG bytes for a document
#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn rasterize(&self, doc: &Document, options: RasterOptions) -> ExportResult<Vec<u8>>;
}

/// Encode bytes as a `data:<mime>;base64,` URI.
pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", BASE64.encode(bytes))
}

/// Render `doc` and encode it as a data URI, as stored in snapshot thumbnails.
pub async fn render_data_uri(
    rasterizer: &dyn Rasterizer,
    doc: &Document,
    options: RasterOptions,
) -> ExportResult<String> {
    let png = rasterizer.rasterize(doc, options).await?;
    Ok(to_data_uri("image/png", &png))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PreviewRasterizer;

impl PreviewRasterizer {
    pub fn new() -> Self {
        Self
    }

    /// Paint `doc` into an RGBA buffer.
    pub fn render(&self, doc: &Document, options: RasterOptions) -> ExportResult<RgbaImage> {
        let (width, height) = options.output_size(doc)?;
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

        let bg = &doc.background;
        if let Some(rgb) = parse_color(&bg.fill_value) {
            fill(&mut canvas, Region::full(width, height), rgb, bg.fill_opacity, |_, _| true);
        }

        for element in &doc.elements {
            paint_element(&mut canvas, element, options.pixel_ratio);
        }
        debug!(width, height, elements = doc.elements.len(), "Rendered preview");
        Ok(canvas)
    }
}

#[async_trait]
impl Rasterizer for PreviewRasterizer {
    async fn rasterize(&self, doc: &Document, options: RasterOptions) -> ExportResult<Vec<u8>> {
        let canvas = self.render(doc, options)?;
        let mut bytes = Vec::new();
        canvas.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

/// Pixel rectangle clipped to the canvas
#[derive(Debug, Clone, Copy)]
struct Region {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl Region {
    fn full(width: u32, height: u32) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: width,
            y1: height,
        }
    }

    fn clipped(left: f64, top: f64, w: f64, h: f64, canvas: &RgbaImage) -> Option<Self> {
        let clamp = |v: f64, max: u32| v.round().clamp(0.0, f64::from(max)) as u32;
        let region = Self {
            x0: clamp(left, canvas.width()),
            y0: clamp(top, canvas.height()),
            x1: clamp(left + w, canvas.width()),
            y1: clamp(top + h, canvas.height()),
        };
        (region.x0 < region.x1 && region.y0 < region.y1).then_some(region)
    }
}

fn paint_element(canvas: &mut RgbaImage, element: &Element, pixel_ratio: f64) {
    let base = element.base();
    let left = base.x / 100.0 * f64::from(canvas.width());
    let top = base.y / 100.0 * f64::from(canvas.height());
    let w = base.width * base.scale * pixel_ratio;
    let h = (base.height * base.scale * pixel_ratio).max(1.0);
    let Some(region) = Region::clipped(left, top, w, h, canvas) else {
        return;
    };
    let opacity = base.opacity;

    match element {
        Element::Shape(shape) => {
            let color = match shape.shape_type {
                ShapeType::Line if shape.fill == "transparent" => &shape.stroke_color,
                _ => &shape.fill,
            };
            let Some(rgb) = parse_color(color) else {
                return;
            };
            match shape.shape_type {
                ShapeType::Rect | ShapeType::Line => {
                    fill(canvas, region, rgb, opacity, |_, _| true)
                }
                ShapeType::Circle => fill(canvas, region, rgb, opacity, |u, v| {
                    let (dx, dy) = (u - 0.5, v - 0.5);
                    dx * dx + dy * dy <= 0.25
                }),
                ShapeType::Triangle => {
                    fill(canvas, region, rgb, opacity, |u, v| (u - 0.5).abs() * 2.0 <= v)
                }
                ShapeType::Star => outline(canvas, region, rgb, opacity),
            }
        }
        Element::Text(text) => {
            if let Some(rgb) = parse_color(&text.padding_color) {
                fill(canvas, region, rgb, opacity, |_, _| true);
            }
            if let Some(rgb) = parse_color(&text.color) {
                outline(canvas, region, rgb, opacity);
            }
        }
        Element::Image(_) => fill(canvas, region, [160, 160, 160], opacity, |_, _| true),
    }
}

/// Blend `rgb` at `alpha` into every pixel of `region` where `inside(u, v)`
/// holds, with (u, v) the pixel center in [0, 1] region coordinates.
fn fill<F>(canvas: &mut RgbaImage, region: Region, rgb: [u8; 3], alpha: f64, inside: F)
where
    F: Fn(f64, f64) -> bool,
{
    let alpha = alpha.clamp(0.0, 1.0);
    let w = f64::from(region.x1 - region.x0);
    let h = f64::from(region.y1 - region.y0);
    for y in region.y0..region.y1 {
        let v = (f64::from(y - region.y0) + 0.5) / h;
        for x in region.x0..region.x1 {
            let u = (f64::from(x - region.x0) + 0.5) / w;
            if inside(u, v) {
                blend(canvas.get_pixel_mut(x, y), rgb, alpha);
            }
        }
    }
}

fn outline(canvas: &mut RgbaImage, region: Region, rgb: [u8; 3], alpha: f64) {
    let alpha = alpha.clamp(0.0, 1.0);
    for x in region.x0..region.x1 {
        blend(canvas.get_pixel_mut(x, region.y0), rgb, alpha);
        blend(canvas.get_pixel_mut(x, region.y1 - 1), rgb, alpha);
    }
    for y in region.y0..region.y1 {
        blend(canvas.get_pixel_mut(region.x0, y), rgb, alpha);
        blend(canvas.get_pixel_mut(region.x1 - 1, y), rgb, alpha);
    }
}

fn blend(pixel: &mut Rgba<u8>, rgb: [u8; 3], alpha: f64) {
    for (channel, src) in pixel.0.iter_mut().zip(rgb) {
        let mixed = f64::from(src) * alpha + f64::from(*channel) * (1.0 - alpha);
        *channel = mixed.round() as u8;
    }
}

/// First `#rgb` or `#rrggbb` color in a CSS value, so gradients use their
/// first stop. `None` for anything else, including `transparent`.
pub(crate) fn parse_color(value: &str) -> Option<[u8; 3]> {
    let start = value.find('#')? + 1;
    let digits: String = value[start..]
        .chars()
        .take_while(char::is_ascii_hexdigit)
        .collect();
    let expanded = match digits.len() {
        3 | 4 => digits.chars().take(3).flat_map(|c| [c, c]).collect(),
        6 | 8 => digits[..6].to_string(),
        _ => return None,
    };
    let bytes = hex::decode(expanded).ok()?;
    Some([bytes[0], bytes[1], bytes[2]])
}
