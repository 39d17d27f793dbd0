//! Report rendering: surface primitives, text wrapping, and the compositor.

pub mod font;
pub mod report;
pub mod surface;
pub mod watermark;
pub mod wrap;

pub use font::{Baseline, FontFace};
pub use report::{ReportLayout, ReportRenderer, ReportSpec, ReportStyle, ResultEntry};
pub use surface::{decode_rgba, ClipRect, Color, Surface};
pub use wrap::wrap_text;

/// A finished report: encoded pixels plus the download filename.
#[derive(Debug, Clone)]
pub struct RasterReport {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
    pub filename: String,
}

impl RasterReport {
    /// Wrap the encoded PNG back into a data-URL handle.
    pub fn to_image_ref(&self) -> crate::ingest::ImageRef {
        crate::ingest::ImageRef::from_bytes("image/png", &self.png_data)
    }
}
