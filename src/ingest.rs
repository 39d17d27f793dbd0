//! Reference-image ingestion: data-URL handles and the upload acceptance pipeline.
//!
//! Every image that flows through the engine — user uploads, generation
//! results, report inputs — is carried as an [`ImageRef`]: a self-describing
//! `data:<mime>;base64,<payload>` handle. The acceptance pipeline mirrors the
//! upload rules of the front end it serves: non-image MIME types are skipped
//! silently, and at most [`MAX_REFERENCES`] references are held at once.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::{Error, Result};

/// Maximum number of reference images a battle can carry.
pub const MAX_REFERENCES: usize = 5;

/// MIME type assumed when a handle does not carry one.
const DEFAULT_MIME: &str = "image/jpeg";

/// A self-describing encoded-image handle (a data URL).
///
/// The handle owns its text form; decoding is done on demand so the
/// compositor and the API client can each pull the raw bytes they need
/// without the ingestion layer caching pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    handle: String,
}

impl ImageRef {
    /// Wrap raw encoded bytes as a data-URL handle.
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        Self {
            handle: format!("data:{};base64,{}", mime, BASE64.encode(bytes)),
        }
    }

    /// Parse an existing handle string.
    ///
    /// Accepts any `data:` URL with a base64 payload as well as http(s) URLs,
    /// which the report renderer resolves at draw time.
    pub fn parse(handle: &str) -> Result<Self> {
        if handle.starts_with("data:") {
            let rest = &handle["data:".len()..];
            let comma = rest
                .find(',')
                .ok_or_else(|| Error::IngestError("data URL has no payload separator".into()))?;
            if !rest[..comma].ends_with(";base64") {
                return Err(Error::IngestError(
                    "only base64-encoded data URLs are supported".into(),
                ));
            }
            Ok(Self {
                handle: handle.to_string(),
            })
        } else if handle.starts_with("http://") || handle.starts_with("https://") {
            Ok(Self {
                handle: handle.to_string(),
            })
        } else {
            Err(Error::IngestError(format!(
                "unsupported image handle: {}",
                truncate_for_log(handle)
            )))
        }
    }

    /// The handle text (usable directly as an image source).
    pub fn as_str(&self) -> &str {
        &self.handle
    }

    /// Whether this handle must be fetched over the network before decoding.
    pub fn is_remote(&self) -> bool {
        !self.handle.starts_with("data:")
    }

    /// MIME type embedded in the handle, or the jpeg default when absent.
    pub fn mime_type(&self) -> &str {
        if let Some(rest) = self.handle.strip_prefix("data:") {
            if let Some(semi) = rest.find(';') {
                let mime = &rest[..semi];
                if !mime.is_empty() {
                    return mime;
                }
            }
        }
        DEFAULT_MIME
    }

    /// Base64 payload without the data-URL prefix.
    ///
    /// Errors for remote handles; fetch those first.
    pub fn base64_payload(&self) -> Result<&str> {
        if self.is_remote() {
            return Err(Error::IngestError(
                "remote handle carries no inline payload".into(),
            ));
        }
        self.handle
            .split_once(',')
            .map(|(_, payload)| payload)
            .ok_or_else(|| Error::IngestError("data URL has no payload separator".into()))
    }

    /// Decode the inline payload to raw encoded-image bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        let payload = self.base64_payload()?;
        BASE64
            .decode(payload)
            .map_err(|e| Error::DecodeError(format!("invalid base64 payload: {}", e)))
    }
}

/// One file offered for upload: its declared MIME type and raw bytes.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }
}

/// Accept a batch of uploaded files into an existing reference list.
///
/// Non-image MIME types are skipped silently (the batch is not an error),
/// and only as many files as fit under [`MAX_REFERENCES`] are converted.
/// Returns the accepted handles; the caller appends them to its own list.
pub fn accept_uploads(files: &[UploadFile], already_held: usize) -> Vec<ImageRef> {
    let remaining = MAX_REFERENCES.saturating_sub(already_held);
    files
        .iter()
        .filter(|f| f.mime.starts_with("image/"))
        .take(remaining)
        .map(|f| ImageRef::from_bytes(&f.mime, &f.bytes))
        .collect()
}

/// Append a single already-encoded image (e.g. a generation result being
/// recycled as input). Unlike batch upload this is an explicit user action,
/// so a full buffer is a typed error rather than a silent skip.
pub fn push_reference(refs: &mut Vec<ImageRef>, image: ImageRef) -> Result<()> {
    if refs.len() >= MAX_REFERENCES {
        return Err(Error::CapacityReached(MAX_REFERENCES));
    }
    refs.push(image);
    Ok(())
}

fn truncate_for_log(s: &str) -> String {
    const LIMIT: usize = 48;
    if s.chars().count() > LIMIT {
        let head: String = s.chars().take(LIMIT).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_bytes_through_data_url() {
        let img = ImageRef::from_bytes("image/png", &[1, 2, 3, 4]);
        assert!(img.as_str().starts_with("data:image/png;base64,"));
        assert_eq!(img.mime_type(), "image/png");
        assert_eq!(img.decode().unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn parse_rejects_bare_paths() {
        assert!(ImageRef::parse("/tmp/cat.png").is_err());
        assert!(ImageRef::parse("data:image/png;base64,AAAA").is_ok());
        assert!(ImageRef::parse("https://example.com/cat.png").is_ok());
    }

    #[test]
    fn missing_mime_defaults_to_jpeg() {
        let img = ImageRef::parse("data:;base64,AAAA").unwrap();
        assert_eq!(img.mime_type(), "image/jpeg");
    }

    #[test]
    fn accept_uploads_skips_non_images_silently() {
        let files = vec![
            UploadFile::new("image/png", vec![0]),
            UploadFile::new("text/plain", vec![1]),
            UploadFile::new("image/jpeg", vec![2]),
        ];
        let accepted = accept_uploads(&files, 0);
        assert_eq!(accepted.len(), 2);
        assert_eq!(accepted[0].mime_type(), "image/png");
        assert_eq!(accepted[1].mime_type(), "image/jpeg");
    }

    #[test]
    fn accept_uploads_caps_at_five_total() {
        let files: Vec<UploadFile> = (0..4)
            .map(|i| UploadFile::new("image/png", vec![i]))
            .collect();
        let accepted = accept_uploads(&files, 3);
        assert_eq!(accepted.len(), 2);

        let accepted = accept_uploads(&files, MAX_REFERENCES);
        assert!(accepted.is_empty());
    }

    #[test]
    fn push_reference_errors_when_full() {
        let mut refs = vec![ImageRef::from_bytes("image/png", &[0]); MAX_REFERENCES];
        let err = push_reference(&mut refs, ImageRef::from_bytes("image/png", &[1])).unwrap_err();
        assert!(matches!(err, Error::CapacityReached(5)));
    }
}
