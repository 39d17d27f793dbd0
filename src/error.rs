//! Error types for the comparison engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while ingesting images, talking to the generation
/// API, or compositing a report
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// A payload could not be accepted as a reference image
    #[error("Ingestion failed: {0}")]
    IngestError(String),

    /// The reference buffer is already full
    #[error("Reference capacity reached ({0} slots)")]
    CapacityReached(usize),

    /// An encoded image payload could not be decoded
    #[error("Image decode failed: {0}")]
    DecodeError(String),

    /// Failed to composite or encode a report
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The generation collaborator rejected or failed the request
    #[error("Generation failed: {0}")]
    GenerationError(String),

    /// Credentials were rejected; the caller should re-verify them
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Nothing to generate from: no prompt text and no reference images
    #[error("Prompt is required")]
    EmptyPrompt,

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this failure should invalidate a "credentials verified" state.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Error::PermissionDenied(_))
    }
}
