//! Text measurement and glyph drawing for report compositing.
//!
//! The default face is a scalable 5×7 bitmap monospace: every character
//! advances exactly `6 × unit(px)` pixels, where `unit(px)` is the integer
//! glyph cell size for the requested font size. That keeps measurement a pure
//! function of the character count, which in turn keeps line wrapping and the
//! golden render tests fully deterministic across platforms.
//!
//! With the `embed-font` feature a real TrueType face can be loaded at
//! runtime via [`FontFace::load_from_bytes`]; measurement then uses fontdue
//! glyph advances while drawing still rasterizes through the bitmap face.
//! Loading failures fall back to the bitmap metrics rather than erroring, so
//! report generation never depends on a font file being present.

use super::surface::{Color, Surface};

/// Vertical anchoring for a text draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Baseline {
    /// `y` is the bottom of the glyph box (the usual case).
    Alphabetic,
    /// `y` is the vertical center of the glyph box (watermark captions).
    Middle,
}

/// A text face: measurement plus bitmap glyph drawing.
#[derive(Default)]
pub struct FontFace {
    #[cfg(feature = "embed-font")]
    metrics_font: Option<fontdue::Font>,
}

impl FontFace {
    /// The built-in bitmap face.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a TrueType face for measurement, keeping the bitmap rasterizer.
    #[cfg(feature = "embed-font")]
    pub fn load_from_bytes(bytes: &[u8]) -> Self {
        let metrics_font = fontdue::Font::from_bytes(bytes, Default::default()).ok();
        Self { metrics_font }
    }

    /// Integer glyph cell size for a font size in pixels.
    fn unit(px: f32) -> u32 {
        ((px / 10.0).round() as u32).max(1)
    }

    /// Fixed horizontal advance per character at the given size.
    pub fn advance(&self, px: f32) -> f32 {
        (Self::unit(px) * 6) as f32
    }

    /// Measured width of `text` at the given size.
    pub fn measure(&self, text: &str, px: f32) -> f32 {
        #[cfg(feature = "embed-font")]
        if let Some(font) = &self.metrics_font {
            return text
                .chars()
                .map(|ch| font.metrics(ch, px).advance_width)
                .sum();
        }
        text.chars().count() as f32 * self.advance(px)
    }

    /// Glyph box height at the given size.
    pub fn glyph_height(&self, px: f32) -> f32 {
        (Self::unit(px) * 7) as f32
    }

    /// Draw `text` onto `surface` with its left edge at `x`.
    pub fn draw_text(
        &self,
        surface: &mut Surface,
        x: f32,
        y: f32,
        text: &str,
        px: f32,
        color: Color,
        baseline: Baseline,
    ) {
        let unit = Self::unit(px) as i64;
        let glyph_h = unit * 7;
        let top = match baseline {
            Baseline::Alphabetic => y as i64 - glyph_h,
            Baseline::Middle => y as i64 - glyph_h / 2,
        };

        let mut pen_x = x as i64;
        for ch in text.to_ascii_uppercase().chars() {
            if let Some(rows) = glyph_rows(ch) {
                for (row_idx, row) in rows.iter().enumerate() {
                    for (col_idx, cell) in row.chars().enumerate() {
                        if cell != ' ' {
                            surface.fill_rect(
                                (pen_x + col_idx as i64 * unit) as f32,
                                (top + row_idx as i64 * unit) as f32,
                                unit as f32,
                                unit as f32,
                                color,
                            );
                        }
                    }
                }
            }
            // Unknown glyphs advance blank so layout stays monospace.
            pen_x += unit * 6;
        }
    }
}

/// 5×7 dot-matrix glyph patterns.
///
/// Covers the ASCII subset the report actually draws: letters, digits, and
/// the punctuation appearing in section tags, timestamps, and captions.
fn glyph_rows(ch: char) -> Option<&'static [&'static str; 7]> {
    match ch {
        'A' => Some(&[
            "  #  ", " # # ", "#   #", "#####", "#   #", "#   #", "#   #",
        ]),
        'B' => Some(&[
            "#### ", "#   #", "#   #", "#### ", "#   #", "#   #", "#### ",
        ]),
        'C' => Some(&[
            " ### ", "#   #", "#    ", "#    ", "#    ", "#   #", " ### ",
        ]),
        'D' => Some(&[
            "#### ", "#   #", "#   #", "#   #", "#   #", "#   #", "#### ",
        ]),
        'E' => Some(&[
            "#####", "#    ", "#    ", "#### ", "#    ", "#    ", "#####",
        ]),
        'F' => Some(&[
            "#####", "#    ", "#    ", "#### ", "#    ", "#    ", "#    ",
        ]),
        'G' => Some(&[
            " ### ", "#   #", "#    ", "# ###", "#   #", "#   #", " ### ",
        ]),
        'H' => Some(&[
            "#   #", "#   #", "#   #", "#####", "#   #", "#   #", "#   #",
        ]),
        'I' => Some(&[
            " ### ", "  #  ", "  #  ", "  #  ", "  #  ", "  #  ", " ### ",
        ]),
        'J' => Some(&["  ###", "   # ", "   # ", "   # ", "#  # ", "#  # ", " ##  "]),
        'K' => Some(&[
            "#   #", "#  # ", "# #  ", "##   ", "# #  ", "#  # ", "#   #",
        ]),
        'L' => Some(&[
            "#    ", "#    ", "#    ", "#    ", "#    ", "#    ", "#####",
        ]),
        'M' => Some(&[
            "#   #", "## ##", "# # #", "# # #", "#   #", "#   #", "#   #",
        ]),
        'N' => Some(&[
            "#   #", "##  #", "# # #", "#  ##", "#   #", "#   #", "#   #",
        ]),
        'O' => Some(&[
            " ### ", "#   #", "#   #", "#   #", "#   #", "#   #", " ### ",
        ]),
        'P' => Some(&[
            "#### ", "#   #", "#   #", "#### ", "#    ", "#    ", "#    ",
        ]),
        'Q' => Some(&[
            " ### ", "#   #", "#   #", "#   #", "# # #", "#  # ", " ## #",
        ]),
        'R' => Some(&[
            "#### ", "#   #", "#   #", "#### ", "# #  ", "#  # ", "#   #",
        ]),
        'S' => Some(&[
            " ####", "#    ", "#    ", " ### ", "    #", "    #", "#### ",
        ]),
        'T' => Some(&[
            "#####", "  #  ", "  #  ", "  #  ", "  #  ", "  #  ", "  #  ",
        ]),
        'U' => Some(&[
            "#   #", "#   #", "#   #", "#   #", "#   #", "#   #", " ### ",
        ]),
        'V' => Some(&[
            "#   #", "#   #", "#   #", "#   #", " # # ", " # # ", "  #  ",
        ]),
        'W' => Some(&[
            "#   #", "#   #", "#   #", "# # #", "# # #", "## ##", "#   #",
        ]),
        'X' => Some(&[
            "#   #", "#   #", " # # ", "  #  ", " # # ", "#   #", "#   #",
        ]),
        'Y' => Some(&[
            "#   #", "#   #", " # # ", "  #  ", "  #  ", "  #  ", "  #  ",
        ]),
        'Z' => Some(&[
            "#####", "    #", "   # ", "  #  ", " #   ", "#    ", "#####",
        ]),
        '0' => Some(&[
            " ### ", "#   #", "#  ##", "# # #", "##  #", "#   #", " ### ",
        ]),
        '1' => Some(&[
            "  #  ", " ##  ", "# #  ", "  #  ", "  #  ", "  #  ", "#####",
        ]),
        '2' => Some(&[
            " ### ", "#   #", "    #", "   # ", "  #  ", " #   ", "#####",
        ]),
        '3' => Some(&[
            " ### ", "#   #", "    #", " ### ", "    #", "#   #", " ### ",
        ]),
        '4' => Some(&[
            "   # ", "  ## ", " # # ", "#  # ", "#####", "   # ", "   # ",
        ]),
        '5' => Some(&[
            "#####", "#    ", "#    ", "#### ", "    #", "#   #", " ### ",
        ]),
        '6' => Some(&[
            " ### ", "#   #", "#    ", "#### ", "#   #", "#   #", " ### ",
        ]),
        '7' => Some(&[
            "#####", "    #", "   # ", "  #  ", "  #  ", "  #  ", "  #  ",
        ]),
        '8' => Some(&[
            " ### ", "#   #", "#   #", " ### ", "#   #", "#   #", " ### ",
        ]),
        '9' => Some(&[
            " ### ", "#   #", "#   #", " ####", "    #", "#   #", " ### ",
        ]),
        '-' => Some(&[
            "     ", "     ", "     ", " ### ", "     ", "     ", "     ",
        ]),
        '_' => Some(&[
            "     ", "     ", "     ", "     ", "     ", "     ", "#####",
        ]),
        '.' => Some(&[
            "     ", "     ", "     ", "     ", "     ", " ### ", " ### ",
        ]),
        ',' => Some(&[
            "     ", "     ", "     ", "     ", " ### ", " ### ", "  #  ",
        ]),
        '/' => Some(&[
            "    #", "   # ", "   # ", "  #  ", " #   ", "#    ", "#    ",
        ]),
        ':' => Some(&[
            "     ", "  ## ", "  ## ", "     ", "  ## ", "  ## ", "     ",
        ]),
        '|' => Some(&[
            "  #  ", "  #  ", "  #  ", "  #  ", "  #  ", "  #  ", "  #  ",
        ]),
        '(' => Some(&[
            "   # ", "  #  ", " #   ", " #   ", " #   ", "  #  ", "   # ",
        ]),
        ')' => Some(&[
            " #   ", "  #  ", "   # ", "   # ", "   # ", "  #  ", " #   ",
        ]),
        _ => None,
    }
}
