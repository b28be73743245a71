use crate::annotate::model::Rect;
use anyhow::{anyhow, ensure, Context, Result};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbaImage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    fn from_slice(px: &[u8]) -> Self {
        Self::rgba(px[0], px[1], px[2], px[3])
    }
}

/// Integer pixel span covered by a [`Rect`], before or after clipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    /// Rounds the edges of `rect` to pixels. Edges are pinned to
    /// `±PIXEL_EDGE_LIMIT` first, so arbitrary host geometry cannot overflow
    /// the span arithmetic.
    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.normalized();
        let x0 = pixel_edge(rect.x);
        let y0 = pixel_edge(rect.y);
        let x1 = pixel_edge(rect.x + rect.width);
        let y1 = pixel_edge(rect.y + rect.height);
        Self {
            x: x0,
            y: y0,
            width: x1.saturating_sub(x0),
            height: y1.saturating_sub(y0),
        }
    }

    pub fn inflate(self, by: i32) -> Self {
        let twice = by.saturating_mul(2);
        Self {
            x: self.x.saturating_sub(by),
            y: self.y.saturating_sub(by),
            width: self.width.saturating_add(twice),
            height: self.height.saturating_add(twice),
        }
    }

    pub fn clamp(self, width: u32, height: u32) -> Option<PixelRect> {
        let max_w = width.min(i32::MAX as u32) as i32;
        let max_h = height.min(i32::MAX as u32) as i32;
        let x0 = self.x.clamp(0, max_w);
        let y0 = self.y.clamp(0, max_h);
        let x1 = self.x.saturating_add(self.width).clamp(0, max_w);
        let y1 = self.y.saturating_add(self.height).clamp(0, max_h);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(PixelRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }

    fn contains(self, x: i32, y: i32) -> bool {
        x >= self.x
            && x < self.x.saturating_add(self.width)
            && y >= self.y
            && y < self.y.saturating_add(self.height)
    }
}

/// Largest pixel edge magnitude kept by [`PixelRect::from_rect`]. Far beyond
/// any real surface, small enough that spans and inflation stay in `i32`.
pub const PIXEL_EDGE_LIMIT: f64 = (1 << 28) as f64;

fn pixel_edge(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(-PIXEL_EDGE_LIMIT, PIXEL_EDGE_LIMIT) as i32
}

/// Straight-alpha RGBA pixel surface, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Surface {
    pub fn new(width: u32, height: u32, fill: Rgba) -> Self {
        let mut surface = Self {
            width,
            height,
            pixels: vec![0u8; (width as usize) * (height as usize) * 4],
        };
        surface.fill(fill);
        surface
    }

    pub fn transparent(width: u32, height: u32) -> Self {
        Self::new(width, height, Rgba::TRANSPARENT)
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        ensure!(
            pixels.len() == expected,
            "surface {width}x{height} needs {expected} bytes, got {}",
            pixels.len()
        );
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn from_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            pixels: image.into_raw(),
        }
    }

    pub fn to_image(&self) -> Result<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| anyhow!("surface buffer does not match {}x{}", self.width, self.height))
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(&self.pixels, self.width, self.height, ColorType::Rgba8)
            .with_context(|| format!("encode {}x{} surface as png", self.width, self.height))?;
        Ok(bytes)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixel at `x`, `y`.
    ///
    /// # Panics
    ///
    /// Panics when the coordinates fall outside the surface; use
    /// [`Surface::get_pixel`] for unchecked input.
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let idx = self.index(x, y);
        Rgba::from_slice(&self.pixels[idx..idx + 4])
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixel(x, y))
    }

    /// Replaces every pixel, like a clear followed by an opaque copy.
    pub fn fill(&mut self, color: Rgba) {
        let value = color.to_array();
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&value);
        }
    }

    /// Source-over fill of the pixels covered by `rect`.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        let Some(span) = PixelRect::from_rect(rect).clamp(self.width, self.height) else {
            return;
        };
        self.for_each_in(span, |px| blend_into(px, color));
    }

    /// Sets the pixels covered by `rect` to fully transparent.
    pub fn clear_rect(&mut self, rect: Rect) {
        let Some(span) = PixelRect::from_rect(rect).clamp(self.width, self.height) else {
            return;
        };
        self.for_each_in(span, |px| px.copy_from_slice(&[0, 0, 0, 0]));
    }

    /// Strokes the outline of `rect` with a line centred on its edges.
    /// Outer corners are bevelled.
    pub fn stroke_rect(&mut self, rect: Rect, line_width: f64, color: Rgba) {
        let half = ((line_width / 2.0).round() as i32).clamp(1, 1 << 16);
        let bounds = PixelRect::from_rect(rect);
        let outer = bounds.inflate(half);
        let inner = bounds.inflate(-half);
        let Some(span) = outer.clamp(self.width, self.height) else {
            return;
        };

        for y in span.y..span.y + span.height {
            for x in span.x..span.x + span.width {
                if inner.width > 0 && inner.height > 0 && inner.contains(x, y) {
                    continue;
                }
                let dx = (bounds.x - x).max(x - (bounds.x + bounds.width - 1)).max(0);
                let dy = (bounds.y - y).max(y - (bounds.y + bounds.height - 1)).max(0);
                if dx > 0 && dy > 0 && dx + dy > half + 1 {
                    continue;
                }
                let idx = self.index(x as u32, y as u32);
                blend_into(&mut self.pixels[idx..idx + 4], color);
            }
        }
    }

    /// Blends `top` over this surface. `top` is read starting at `origin`, so a
    /// document-sized layer can be laid over a viewport-sized capture.
    pub fn draw_over(&mut self, top: &Surface, origin: (i32, i32)) {
        for y in 0..self.height {
            let src_y = y as i64 + origin.1 as i64;
            if src_y < 0 || src_y >= top.height as i64 {
                continue;
            }
            for x in 0..self.width {
                let src_x = x as i64 + origin.0 as i64;
                if src_x < 0 || src_x >= top.width as i64 {
                    continue;
                }
                let color = top.pixel(src_x as u32, src_y as u32);
                let idx = self.index(x, y);
                blend_into(&mut self.pixels[idx..idx + 4], color);
            }
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + x as usize) * 4
    }

    fn for_each_in<F>(&mut self, span: PixelRect, mut paint: F)
    where
        F: FnMut(&mut [u8]),
    {
        let stride = self.width as usize * 4;
        for y in span.y..span.y + span.height {
            let row = y as usize * stride;
            let start = row + span.x as usize * 4;
            let end = start + span.width as usize * 4;
            for px in self.pixels[start..end].chunks_exact_mut(4) {
                paint(px);
            }
        }
    }
}

fn blend_into(dst: &mut [u8], top: Rgba) {
    let blended = blend_pixel(Rgba::from_slice(dst), top);
    dst.copy_from_slice(&blended.to_array());
}

fn blend_pixel(bottom: Rgba, top: Rgba) -> Rgba {
    if top.a == 255 {
        return top;
    }
    let sa = top.a as f32 / 255.0;
    let da = bottom.a as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    if out_a <= f32::EPSILON {
        return Rgba::TRANSPARENT;
    }

    let blend = |s: u8, d: u8| -> u8 {
        (((s as f32 * sa) + (d as f32 * da * (1.0 - sa))) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };

    Rgba {
        r: blend(top.r, bottom.r),
        g: blend(top.g, bottom.g),
        b: blend(top.b, bottom.b),
        a: (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_over_blends_expected_pixel() {
        let mut surface = Surface::new(1, 1, Rgba::rgba(100, 100, 100, 255));
        surface.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Rgba::rgba(200, 0, 0, 128));
        assert_eq!(surface.pixel(0, 0), Rgba::rgba(150, 50, 50, 255));
    }

    #[test]
    fn translucent_fill_over_transparent_keeps_source_color() {
        let mut surface = Surface::transparent(2, 2);
        surface.fill_rect(Rect::new(0.0, 0.0, 2.0, 2.0), Rgba::rgba(102, 102, 102, 128));
        assert_eq!(surface.pixel(1, 1), Rgba::rgba(102, 102, 102, 128));
    }

    #[test]
    fn clear_rect_punches_transparent_hole_with_negative_extent() {
        let mut surface = Surface::new(10, 10, Rgba::BLACK);
        surface.clear_rect(Rect::new(6.0, 6.0, -4.0, -4.0));
        assert_eq!(surface.pixel(2, 2), Rgba::TRANSPARENT);
        assert_eq!(surface.pixel(5, 5), Rgba::TRANSPARENT);
        assert_eq!(surface.pixel(6, 6), Rgba::BLACK);
        assert_eq!(surface.pixel(1, 1), Rgba::BLACK);
    }

    #[test]
    fn rect_outside_surface_is_ignored() {
        let mut surface = Surface::transparent(4, 4);
        surface.fill_rect(Rect::new(10.0, 10.0, 5.0, 5.0), Rgba::BLACK);
        surface.stroke_rect(Rect::new(-20.0, -20.0, 5.0, 5.0), 4.0, Rgba::BLACK);
        assert!(surface.pixels().iter().all(|b| *b == 0));
    }

    #[test]
    fn stroke_straddles_edges_and_bevels_corners() {
        let accent = Rgba::rgba(255, 235, 59, 255);
        let mut surface = Surface::transparent(30, 30);
        surface.stroke_rect(Rect::new(10.0, 10.0, 10.0, 10.0), 4.0, accent);

        // both sides of the left edge
        assert_eq!(surface.pixel(8, 15), accent);
        assert_eq!(surface.pixel(11, 15), accent);
        // interior untouched
        assert_eq!(surface.pixel(12, 15), Rgba::TRANSPARENT);
        assert_eq!(surface.pixel(15, 15), Rgba::TRANSPARENT);
        // outermost corner pixel is cut by the bevel
        assert_eq!(surface.pixel(8, 8), Rgba::TRANSPARENT);
        assert_eq!(surface.pixel(9, 9), accent);
    }

    #[test]
    fn draw_over_reads_top_from_origin() {
        let mut top = Surface::transparent(4, 4);
        top.fill_rect(Rect::new(2.0, 2.0, 1.0, 1.0), Rgba::BLACK);
        let mut base = Surface::new(2, 2, Rgba::rgba(255, 255, 255, 255));
        base.draw_over(&top, (2, 2));
        assert_eq!(base.pixel(0, 0), Rgba::BLACK);
        assert_eq!(base.pixel(1, 1), Rgba::rgba(255, 255, 255, 255));
    }

    #[test]
    fn huge_host_geometry_is_pinned_not_overflowed() {
        let huge = Rect::new(-3e9, 10.0, 6e9, 20.0);
        let span = PixelRect::from_rect(huge);
        assert_eq!(span.x, -(1 << 28));
        assert_eq!(span.width, 1 << 29);
        assert_eq!(span.inflate(i32::MAX).x, i32::MIN);

        let mut cleared = Surface::new(20, 20, Rgba::BLACK);
        cleared.clear_rect(huge);
        assert_eq!(cleared.pixel(0, 10), Rgba::TRANSPARENT);
        assert_eq!(cleared.pixel(19, 19), Rgba::TRANSPARENT);
        assert_eq!(cleared.pixel(0, 5), Rgba::BLACK);

        let accent = Rgba::rgba(255, 235, 59, 255);
        let mut stroked = Surface::transparent(20, 20);
        stroked.stroke_rect(huge, 4.0, accent);
        assert_eq!(stroked.pixel(5, 9), accent);
        assert_eq!(stroked.pixel(5, 15), Rgba::TRANSPARENT);
    }

    #[test]
    fn non_finite_rect_paints_nothing() {
        let mut surface = Surface::transparent(8, 8);
        surface.fill_rect(Rect::new(f64::NAN, 0.0, 4.0, 4.0), Rgba::BLACK);
        surface.fill_rect(Rect::new(0.0, 0.0, f64::INFINITY, f64::NAN), Rgba::BLACK);
        assert!(surface.pixels().iter().all(|b| *b == 0));
    }

    #[test]
    fn get_pixel_is_none_outside_surface() {
        let surface = Surface::new(3, 2, Rgba::BLACK);
        assert_eq!(surface.get_pixel(2, 1), Some(Rgba::BLACK));
        assert_eq!(surface.get_pixel(3, 0), None);
        assert_eq!(surface.get_pixel(0, 2), None);
    }

    #[test]
    fn from_pixels_rejects_wrong_length() {
        assert!(Surface::from_pixels(2, 2, vec![0; 15]).is_err());
        assert!(Surface::from_pixels(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn png_encoding_produces_png_signature() {
        let surface = Surface::new(3, 2, Rgba::BLACK);
        let bytes = surface.encode_png().expect("encode");
        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }
}
