//! Stamps the watermark label onto a single generated image.
//!
//! This is the lightweight sibling of the report compositor: same surface and
//! font machinery, but the output matches the source image's exact dimensions
//! and any failure returns the original payload untouched rather than erroring
//! the caller.

use crate::ingest::ImageRef;
use crate::render::font::{Baseline, FontFace};
use crate::render::report::WATERMARK_TEXT;
use crate::render::surface::{decode_rgba, Color, Surface};

/// Minimum watermark font size in pixels.
const MIN_FONT_PX: f32 = 12.0;

/// Stamp the watermark box into the bottom-right corner of `image`.
///
/// Returns a PNG data-URL handle. If the payload cannot be decoded the input
/// handle is returned unchanged; generation results must never be lost to a
/// cosmetic step.
pub fn stamp(image: &ImageRef) -> ImageRef {
    match try_stamp(image) {
        Ok(stamped) => stamped,
        Err(e) => {
            log::warn!("watermark skipped: {}", e);
            image.clone()
        }
    }
}

fn try_stamp(image: &ImageRef) -> crate::Result<ImageRef> {
    let bytes = image.decode()?;
    let src = decode_rgba(&bytes)?;
    let (w, h) = (src.width() as f32, src.height() as f32);

    let mut surface = Surface::new(src.width(), src.height(), Color::WHITE);
    surface.blit_origin(&src);

    let face = FontFace::new();
    // Font scales with the image, floored so tiny outputs stay legible.
    let font_px = (h * 0.03).floor().max(MIN_FONT_PX);
    let padding = font_px / 2.0;
    let text_width = face.measure(WATERMARK_TEXT, font_px);
    let box_w = text_width + padding * 2.0;
    let box_h = font_px + padding;

    let x = w - box_w - padding;
    let y = h - box_h - padding;

    surface.fill_rect(x, y, box_w, box_h, Color::INK);
    face.draw_text(
        &mut surface,
        x + padding,
        y + box_h / 2.0 + 2.0,
        WATERMARK_TEXT,
        font_px,
        Color::WHITE,
        Baseline::Middle,
    );

    Ok(ImageRef::from_bytes("image/png", &surface.encode_png()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_png(w: u32, h: u32) -> ImageRef {
        let s = Surface::new(w, h, Color::CREAM);
        ImageRef::from_bytes("image/png", &s.encode_png().unwrap())
    }

    #[test]
    fn stamp_preserves_dimensions() {
        let stamped = stamp(&sample_png(320, 240));
        let decoded = decode_rgba(&stamped.decode().unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 240));
    }

    #[test]
    fn stamp_inks_the_bottom_right_corner() {
        let stamped = stamp(&sample_png(400, 400));
        let decoded = decode_rgba(&stamped.decode().unwrap()).unwrap();
        // Box anchored near the corner: probe inside it.
        let font = MIN_FONT_PX; // 400 * 0.03 = 12
        let pad = font / 2.0;
        let box_h = font + pad;
        let probe_y = (400.0 - pad - box_h / 2.0) as u32;
        assert_eq!(decoded.get_pixel(395 - 20, probe_y).0, Color::INK.rgba());
        // Far corner regions stay untouched.
        assert_eq!(decoded.get_pixel(5, 5).0, Color::CREAM.rgba());
    }

    #[test]
    fn undecodable_payload_returns_original() {
        let broken = ImageRef::from_bytes("image/png", b"definitely not a png");
        let out = stamp(&broken);
        assert_eq!(out, broken);
    }

    #[test]
    fn font_size_scales_with_image_height() {
        // 1000px tall: 3% = 30px; the box must be taller than the minimum case.
        let tall = stamp(&sample_png(200, 1000));
        let small = stamp(&sample_png(200, 100));
        // Both decode; dimensional check only (glyph metrics covered elsewhere).
        assert!(tall.decode().unwrap().len() > 0);
        assert!(small.decode().unwrap().len() > 0);
    }
}
