//! ImgDuel Comparison Engine
//!
//! A library for comparing two image-generation models side by side: it sends
//! one prompt (plus up to five reference images) to both models concurrently,
//! watermarks each result, and composites a downloadable "battle report" PNG
//! from the prompt, the reference thumbnails, and the two generated images.
//!
//! # Features
//!
//! - **genai** (default): the remote generation/description client
//! - **embed-font**: real TrueType metrics for report text via `fontdue`
//!
//! # Example
//!
//! ```no_run
//! use imgduel::render::{Color, ReportRenderer, ReportSpec, ResultEntry};
//! use imgduel::ImageRef;
//!
//! # async fn demo() -> imgduel::Result<()> {
//! let spec = ReportSpec {
//!     prompt: "a lighthouse at dusk".to_string(),
//!     references: Vec::new(),
//!     left: ResultEntry {
//!         image: ImageRef::parse("data:image/png;base64,...")?,
//!         label: "NANO".to_string(),
//!         latency_ms: 820,
//!         accent: Color::ACCENT_RED,
//!     },
//!     right: ResultEntry {
//!         image: ImageRef::parse("data:image/png;base64,...")?,
//!         label: "PRO".to_string(),
//!         latency_ms: 1340,
//!         accent: Color::ACCENT_BLUE,
//!     },
//! };
//!
//! let report = ReportRenderer::default().render(&spec).await?;
//! std::fs::write(&report.filename, &report.png_data)
//!     .map_err(|e| imgduel::Error::Other(e.to_string()))?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod ingest;
pub use ingest::{accept_uploads, ImageRef, UploadFile, MAX_REFERENCES};

pub mod render;
pub use render::RasterReport;

// Remote generation client and the session that races the two models.
#[cfg(feature = "genai")]
pub mod genai;
#[cfg(feature = "genai")]
pub mod session;
#[cfg(feature = "genai")]
pub use session::{BattleOutcome, BattleSession, PanelOutcome};
