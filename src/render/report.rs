//! The battle-report compositor: layout computation plus fixed-order drawing.
//!
//! A render call derives every measurement from the incoming [`ReportSpec`] at call
//! time (no layout state survives between calls), prefetches all referenced
//! images, then draws the document in one fixed z-order onto a fresh surface
//! and encodes it to PNG.

use image::RgbaImage;

use crate::ingest::ImageRef;
use crate::render::font::{Baseline, FontFace};
use crate::render::surface::{ClipRect, Color, Surface};
use crate::render::wrap::wrap_text;
use crate::render::RasterReport;
use crate::Result;

/// Text shown in place of an empty prompt.
const PROMPT_PLACEHOLDER: &str = "(NO TEXT PROMPT)";

/// Title drawn across the report header.
const REPORT_TITLE: &str = "IMGDUEL BATTLE REPORT";

/// Label stamped into the report footer watermark.
pub const WATERMARK_TEXT: &str = "ImgDuel | Duel Lab";

/// Filename prefix for the downloadable artifact.
const FILENAME_PREFIX: &str = "ImgDuel_Report";

/// One generated image plus its display metadata.
#[derive(Debug, Clone)]
pub struct ResultEntry {
    pub image: ImageRef,
    pub label: String,
    pub latency_ms: u64,
    pub accent: Color,
}

/// Caller-supplied aggregate fully determining one report.
#[derive(Debug, Clone)]
pub struct ReportSpec {
    pub prompt: String,
    pub references: Vec<ImageRef>,
    pub left: ResultEntry,
    pub right: ResultEntry,
}

/// Fixed document geometry. Defaults reproduce the reference report layout.
#[derive(Debug, Clone)]
pub struct ReportStyle {
    /// Fixed document width.
    pub width: u32,
    /// Outer margin on all sides.
    pub margin: f32,
    /// Gap between the two result panels.
    pub gap: f32,
    /// Height reserved for the title/timestamp header.
    pub header_height: f32,
    /// Vertical pitch between wrapped prompt lines.
    pub line_pitch: f32,
    /// Vertical padding around the prompt block.
    pub prompt_padding: f32,
    /// Height of the reference thumbnail strip when present.
    pub thumb_strip_height: f32,
    /// Side of one square reference thumbnail.
    pub thumb_size: f32,
    /// Horizontal pitch between thumbnails.
    pub thumb_pitch: f32,
    /// Trailing space for captions, badges, footer, and watermark.
    pub trailing: f32,
    /// Font size of the prompt body text.
    pub prompt_font: f32,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            width: 1600,
            margin: 60.0,
            gap: 40.0,
            header_height: 140.0,
            line_pitch: 36.0,
            prompt_padding: 60.0,
            thumb_strip_height: 160.0,
            thumb_size: 100.0,
            thumb_pitch: 120.0,
            trailing: 140.0,
            prompt_font: 24.0,
        }
    }
}

/// Geometry derived from one spec; recomputed per render.
#[derive(Debug, Clone)]
pub struct ReportLayout {
    pub prompt_lines: Vec<String>,
    pub prompt_block_height: f32,
    pub uploads_height: f32,
    pub panel_width: f32,
    pub panels_y: f32,
    pub total_height: u32,
}

/// Renders [`ReportSpec`]s into downloadable PNG reports.
pub struct ReportRenderer {
    style: ReportStyle,
    face: FontFace,
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self::new(ReportStyle::default())
    }
}

impl ReportRenderer {
    pub fn new(style: ReportStyle) -> Self {
        Self {
            style,
            face: FontFace::new(),
        }
    }

    /// Swap in a different text face (e.g. one loaded via `embed-font`).
    pub fn with_face(mut self, face: FontFace) -> Self {
        self.face = face;
        self
    }

    pub fn style(&self) -> &ReportStyle {
        &self.style
    }

    /// Compute the content-driven geometry for `spec`.
    pub fn layout(&self, spec: &ReportSpec) -> ReportLayout {
        let s = &self.style;
        let prompt_text = if spec.prompt.is_empty() {
            PROMPT_PLACEHOLDER
        } else {
            spec.prompt.as_str()
        };
        let budget = s.width as f32 - 2.0 * s.margin;
        let prompt_lines = wrap_text(prompt_text, budget, |t| {
            self.face.measure(t, s.prompt_font)
        });

        let prompt_block_height =
            prompt_lines.len() as f32 * s.line_pitch + s.prompt_padding;
        let uploads_height = if spec.references.is_empty() {
            0.0
        } else {
            s.thumb_strip_height
        };
        let panel_width = (s.width as f32 - 2.0 * s.margin - s.gap) / 2.0;
        let panels_y = s.header_height + prompt_block_height + uploads_height + 40.0;
        let total_height =
            (s.header_height + prompt_block_height + uploads_height + panel_width + s.trailing)
                as u32;

        ReportLayout {
            prompt_lines,
            prompt_block_height,
            uploads_height,
            panel_width,
            panels_y,
            total_height,
        }
    }

    /// Composite `spec` into a PNG report stamped with the current time.
    pub async fn render(&self, spec: &ReportSpec) -> Result<RasterReport> {
        let now_millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        self.render_at(spec, now_millis).await
    }

    /// Composite `spec` using an explicit timestamp (deterministic renders).
    pub async fn render_at(&self, spec: &ReportSpec, now_millis: u64) -> Result<RasterReport> {
        let s = self.style.clone();
        let layout = self.layout(spec);
        let width = s.width as f32;
        let total_height = layout.total_height as f32;

        // Resolve every referenced image up front; failures become gaps, not
        // errors. Completion order is irrelevant, draw order is fixed below.
        let thumbs = load_all(&spec.references).await;
        let results = load_all(&[spec.left.image.clone(), spec.right.image.clone()]).await;

        let mut surface = Surface::new(s.width, layout.total_height, Color::CREAM);

        // Sparse dot-grid texture: a faint 2x2 mark every 40-unit cell.
        let mut gy = 0.0;
        while gy < total_height {
            let mut gx = 0.0;
            while gx < width {
                surface.fill_rect_alpha(gx, gy, 2.0, 2.0, Color::INK, 0.1);
                gx += 40.0;
            }
            gy += 40.0;
        }

        // Top accent bar.
        surface.fill_rect(0.0, 0.0, width, 20.0, Color::INK);

        // Title and timestamp.
        self.face.draw_text(
            &mut surface,
            s.margin,
            100.0,
            REPORT_TITLE,
            60.0,
            Color::INK,
            Baseline::Alphabetic,
        );
        self.face.draw_text(
            &mut surface,
            width - s.margin - 320.0,
            95.0,
            &format_utc(now_millis),
            20.0,
            Color::INK,
            Baseline::Alphabetic,
        );

        // Bordered prompt container spans the prompt block and the thumbnail
        // strip so the references read as part of the input record.
        let prompt_y = s.header_height;
        surface.stroke_rect(
            s.margin,
            prompt_y,
            width - 2.0 * s.margin,
            layout.prompt_block_height + layout.uploads_height,
            4.0,
            Color::INK,
        );

        // Prompt section tag.
        surface.fill_rect(s.margin, prompt_y, 160.0, 30.0, Color::INK);
        self.face.draw_text(
            &mut surface,
            s.margin + 10.0,
            prompt_y + 20.0,
            "INPUT_PROMPT:",
            16.0,
            Color::WHITE,
            Baseline::Alphabetic,
        );

        // Wrapped prompt body, one draw call per line.
        for (idx, line) in layout.prompt_lines.iter().enumerate() {
            self.face.draw_text(
                &mut surface,
                s.margin + 20.0,
                prompt_y + 60.0 + idx as f32 * s.line_pitch,
                line,
                s.prompt_font,
                Color::INK,
                Baseline::Alphabetic,
            );
        }

        // Reference thumbnail strip.
        if !spec.references.is_empty() {
            let uploads_y = prompt_y + layout.prompt_block_height;
            surface.fill_rect(s.margin, uploads_y - 10.0, 160.0, 30.0, Color::INK);
            self.face.draw_text(
                &mut surface,
                s.margin + 10.0,
                uploads_y + 10.0,
                "VISUAL_INPUT:",
                16.0,
                Color::WHITE,
                Baseline::Alphabetic,
            );

            let mut thumb_x = s.margin + 20.0;
            let thumb_y = uploads_y + 30.0;
            for thumb in &thumbs {
                surface.stroke_rect(thumb_x, thumb_y, s.thumb_size, s.thumb_size, 2.0, Color::INK);
                if let Some(img) = thumb {
                    surface.blit_cover(img, thumb_x, thumb_y, s.thumb_size, s.thumb_size);
                }
                thumb_x += s.thumb_pitch;
            }
        }

        // Result panels in fixed left/right slots.
        let panel = layout.panel_width;
        let entries = [(&spec.left, &results[0]), (&spec.right, &results[1])];
        for (slot, (entry, img)) in entries.iter().enumerate() {
            let x = s.margin + slot as f32 * (panel + s.gap);
            let y = layout.panels_y;
            self.draw_result_panel(&mut surface, entry, img.as_ref(), x, y, panel, panel);
        }

        // Footer divider mark.
        surface.fill_rect(width / 2.0 - 1.0, total_height - 20.0, 2.0, 20.0, Color::INK);

        // Watermark: filled box, middle-baseline text, right-aligned.
        let wm_font = 24.0;
        let wm_width = self.face.measure(WATERMARK_TEXT, wm_font);
        let wm_pad = 10.0;
        let box_x = width - wm_width - 2.0 * wm_pad - s.margin;
        let box_y = total_height - 60.0;
        surface.fill_rect(box_x, box_y, wm_width + 2.0 * wm_pad, 40.0, Color::INK);
        self.face.draw_text(
            &mut surface,
            width - wm_width - wm_pad - s.margin,
            box_y + 20.0,
            WATERMARK_TEXT,
            wm_font,
            Color::WHITE,
            Baseline::Middle,
        );

        Ok(RasterReport {
            width: s.width,
            height: layout.total_height,
            png_data: surface.encode_png()?,
            filename: format!("{}_{}.png", FILENAME_PREFIX, now_millis),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_result_panel(
        &self,
        surface: &mut Surface,
        entry: &ResultEntry,
        img: Option<&RgbaImage>,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
    ) {
        // Frame and neutral backdrop with a circular motif, clipped inside.
        surface.stroke_rect(x, y, w, h, 6.0, Color::INK);
        let clip = ClipRect::new(x, y, w, h);
        surface.fill_rect(x, y, w, h, Color::WHITE);
        surface.fill_circle(
            x + w / 2.0,
            y + h / 2.0,
            w / 3.0,
            Color::PANEL_GREY,
            Some(clip),
        );

        // The generated image, letterboxed. A failed load leaves the backdrop.
        if let Some(img) = img {
            surface.blit_contain(img, x, y, w, h);
        }

        // Caption badge above the frame.
        let badge_y = y - 25.0;
        surface.fill_rect(x + 20.0, badge_y, 280.0, 50.0, entry.accent);
        surface.stroke_rect(x + 20.0, badge_y, 280.0, 50.0, 6.0, Color::INK);
        self.face.draw_text(
            surface,
            x + 40.0,
            badge_y + 32.0,
            &entry.label.to_uppercase(),
            20.0,
            Color::WHITE,
            Baseline::Alphabetic,
        );

        // Latency caption below the frame.
        self.face.draw_text(
            surface,
            x,
            y + h + 30.0,
            &format!("LATENCY: {}ms", entry.latency_ms),
            16.0,
            Color::INK,
            Baseline::Alphabetic,
        );
    }
}

/// Resolve a batch of image handles concurrently, keeping input order.
/// Individual failures are logged and yield `None`.
async fn load_all(refs: &[ImageRef]) -> Vec<Option<RgbaImage>> {
    let futures = refs.iter().map(load_one);
    futures::future::join_all(futures).await
}

async fn load_one(image: &ImageRef) -> Option<RgbaImage> {
    match resolve_bytes(image).await {
        Ok(bytes) => match super::surface::decode_rgba(&bytes) {
            Ok(img) => Some(img),
            Err(e) => {
                log::warn!("skipping undecodable report image: {}", e);
                None
            }
        },
        Err(e) => {
            log::warn!("skipping unresolvable report image: {}", e);
            None
        }
    }
}

async fn resolve_bytes(image: &ImageRef) -> Result<Vec<u8>> {
    if !image.is_remote() {
        return image.decode();
    }
    #[cfg(feature = "genai")]
    {
        let resp = reqwest::get(image.as_str())
            .await
            .map_err(|e| crate::Error::NetworkError(format!("image fetch failed: {}", e)))?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| crate::Error::NetworkError(format!("image body failed: {}", e)))?;
        Ok(bytes.to_vec())
    }
    #[cfg(not(feature = "genai"))]
    {
        Err(crate::Error::NetworkError(
            "remote image handles require the genai feature".into(),
        ))
    }
}

/// Render an epoch-millis timestamp as `YYYY-MM-DD HH:MM:SS UTC`.
fn format_utc(epoch_millis: u64) -> String {
    use time::{macros::format_description, OffsetDateTime};

    OffsetDateTime::from_unix_timestamp_nanos(epoch_millis as i128 * 1_000_000)
        .ok()
        .and_then(|t| {
            t.format(&format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second] UTC"
            ))
            .ok()
        })
        .unwrap_or_else(|| "1970-01-01 00:00:00 UTC".into())
}
