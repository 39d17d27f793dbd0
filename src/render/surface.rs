//! The raster surface: an owned RGBA8 buffer with the drawing primitives the
//! report compositor needs. One surface is allocated per render call and
//! discarded after PNG encoding; nothing here is shared or cached.

use image::{ImageBuffer, Rgba, RgbaImage};

use crate::{Error, Result};

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Near-black ink used for frames, text, and the dot grid.
    pub const INK: Color = Color::new(0x11, 0x11, 0x11);
    /// Paper background of the report.
    pub const CREAM: Color = Color::new(0xF2, 0xF0, 0xE4);
    pub const WHITE: Color = Color::new(0xFF, 0xFF, 0xFF);
    /// Decorative circle inside result panels.
    pub const PANEL_GREY: Color = Color::new(0xEE, 0xEE, 0xEE);
    /// Accent for the first (flash) model.
    pub const ACCENT_RED: Color = Color::new(0xFF, 0x2A, 0x2A);
    /// Accent for the second (pro) model.
    pub const ACCENT_BLUE: Color = Color::new(0x00, 0x55, 0xFF);

    pub fn rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 0xFF]
    }

    /// Parse `#RRGGBB`.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let raw = hex.strip_prefix('#').unwrap_or(hex);
        if raw.len() != 6 {
            return Err(Error::ConfigError(format!("invalid hex color: {}", hex)));
        }
        let n = u32::from_str_radix(raw, 16)
            .map_err(|_| Error::ConfigError(format!("invalid hex color: {}", hex)))?;
        Ok(Self::new((n >> 16) as u8, (n >> 8) as u8, n as u8))
    }
}

/// An axis-aligned clip rectangle in surface coordinates.
#[derive(Debug, Clone, Copy)]
pub struct ClipRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl ClipRect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    fn contains(&self, px: i64, py: i64) -> bool {
        let (x0, y0) = (self.x as i64, self.y as i64);
        let (x1, y1) = (x0 + self.w as i64, y0 + self.h as i64);
        px >= x0 && px < x1 && py >= y0 && py < y1
    }
}

/// A write-only RGBA8 raster buffer.
pub struct Surface {
    buf: RgbaImage,
}

impl Surface {
    /// Allocate a surface filled with `background`.
    pub fn new(width: u32, height: u32, background: Color) -> Self {
        Self {
            buf: ImageBuffer::from_pixel(width, height, Rgba(background.rgba())),
        }
    }

    pub fn width(&self) -> u32 {
        self.buf.width()
    }

    pub fn height(&self) -> u32 {
        self.buf.height()
    }

    /// Read one pixel (test hook).
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.buf.get_pixel(x, y).0
    }

    fn blend_pixel(&mut self, x: i64, y: i64, color: Color, alpha: f32) {
        if x < 0 || y < 0 || x >= self.buf.width() as i64 || y >= self.buf.height() as i64 {
            return;
        }
        let px = self.buf.get_pixel_mut(x as u32, y as u32);
        if alpha >= 1.0 {
            *px = Rgba(color.rgba());
            return;
        }
        let inv = 1.0 - alpha;
        px.0 = [
            (color.r as f32 * alpha + px.0[0] as f32 * inv).round() as u8,
            (color.g as f32 * alpha + px.0[1] as f32 * inv).round() as u8,
            (color.b as f32 * alpha + px.0[2] as f32 * inv).round() as u8,
            0xFF,
        ];
    }

    /// Fill an opaque rectangle, clipped to the surface.
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        self.fill_rect_alpha(x, y, w, h, color, 1.0);
    }

    /// Fill a rectangle blended over the existing pixels.
    pub fn fill_rect_alpha(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color, alpha: f32) {
        let (x0, y0) = (x as i64, y as i64);
        let (x1, y1) = (x0 + w as i64, y0 + h as i64);
        for py in y0.max(0)..y1.min(self.buf.height() as i64) {
            for px in x0.max(0)..x1.min(self.buf.width() as i64) {
                self.blend_pixel(px, py, color, alpha);
            }
        }
    }

    /// Stroke a rectangle outline with the stroke centered on the path,
    /// matching 2D-canvas `strokeRect`.
    pub fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, line_width: f32, color: Color) {
        let half = line_width / 2.0;
        // Top and bottom edges span the full outer width.
        self.fill_rect(x - half, y - half, w + line_width, line_width, color);
        self.fill_rect(x - half, y + h - half, w + line_width, line_width, color);
        // Left and right edges fill between them.
        self.fill_rect(x - half, y + half, line_width, h - line_width, color);
        self.fill_rect(x + w - half, y + half, line_width, h - line_width, color);
    }

    /// Fill a circle, optionally clipped to a rectangle.
    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color, clip: Option<ClipRect>) {
        let r2 = radius * radius;
        let x0 = (cx - radius).floor() as i64;
        let x1 = (cx + radius).ceil() as i64;
        let y0 = (cy - radius).floor() as i64;
        let y1 = (cy + radius).ceil() as i64;
        for py in y0.max(0)..y1.min(self.buf.height() as i64) {
            for px in x0.max(0)..x1.min(self.buf.width() as i64) {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                if dx * dx + dy * dy > r2 {
                    continue;
                }
                if let Some(c) = clip {
                    if !c.contains(px, py) {
                        continue;
                    }
                }
                self.blend_pixel(px, py, color, 1.0);
            }
        }
    }

    /// Draw `src` scaled into the destination rectangle with nearest-neighbor
    /// sampling and source-over alpha blending.
    pub fn blit_scaled(
        &mut self,
        src: &RgbaImage,
        dx: f32,
        dy: f32,
        dw: f32,
        dh: f32,
        clip: Option<ClipRect>,
    ) {
        if src.width() == 0 || src.height() == 0 || dw <= 0.0 || dh <= 0.0 {
            return;
        }
        let x0 = dx.floor() as i64;
        let y0 = dy.floor() as i64;
        let x1 = (dx + dw).ceil() as i64;
        let y1 = (dy + dh).ceil() as i64;
        for py in y0.max(0)..y1.min(self.buf.height() as i64) {
            for px in x0.max(0)..x1.min(self.buf.width() as i64) {
                if let Some(c) = clip {
                    if !c.contains(px, py) {
                        continue;
                    }
                }
                let u = ((px as f32 + 0.5 - dx) / dw * src.width() as f32) as u32;
                let v = ((py as f32 + 0.5 - dy) / dh * src.height() as f32) as u32;
                let u = u.min(src.width() - 1);
                let v = v.min(src.height() - 1);
                let s = src.get_pixel(u, v).0;
                let alpha = s[3] as f32 / 255.0;
                if alpha <= 0.0 {
                    continue;
                }
                self.blend_pixel(px, py, Color::new(s[0], s[1], s[2]), alpha);
            }
        }
    }

    /// Scale-and-crop so `src` fully fills the box; overflow is clipped.
    pub fn blit_cover(&mut self, src: &RgbaImage, x: f32, y: f32, w: f32, h: f32) {
        if src.width() == 0 || src.height() == 0 {
            return;
        }
        let scale = (w / src.width() as f32).max(h / src.height() as f32);
        let dw = src.width() as f32 * scale;
        let dh = src.height() as f32 * scale;
        let dx = x + (w - dw) / 2.0;
        let dy = y + (h - dh) / 2.0;
        self.blit_scaled(src, dx, dy, dw, dh, Some(ClipRect::new(x, y, w, h)));
    }

    /// Scale-and-letterbox so the whole of `src` fits inside the box.
    pub fn blit_contain(&mut self, src: &RgbaImage, x: f32, y: f32, w: f32, h: f32) {
        if src.width() == 0 || src.height() == 0 {
            return;
        }
        let scale = (w / src.width() as f32).min(h / src.height() as f32);
        let dw = src.width() as f32 * scale;
        let dh = src.height() as f32 * scale;
        let dx = x + (w - dw) / 2.0;
        let dy = y + (h - dh) / 2.0;
        self.blit_scaled(src, dx, dy, dw, dh, None);
    }

    /// Draw `src` unscaled at the origin (watermark base pass).
    pub fn blit_origin(&mut self, src: &RgbaImage) {
        let (w, h) = (src.width() as f32, src.height() as f32);
        self.blit_scaled(src, 0.0, 0.0, w, h, None);
    }

    /// Encode the surface as a lossless RGBA8 PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut buffer, self.buf.width(), self.buf.height());
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            encoder
                .write_header()
                .map_err(|e| Error::RenderError(format!("PNG header: {}", e)))?
                .write_image_data(self.buf.as_raw())
                .map_err(|e| Error::RenderError(format!("PNG data: {}", e)))?;
        }
        Ok(buffer)
    }
}

/// Decode an encoded image payload (PNG/JPEG/WebP) into an RGBA8 buffer.
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage> {
    let img = image::load_from_memory(bytes).map_err(|e| Error::DecodeError(e.to_string()))?;
    Ok(img.to_rgba8())
}
