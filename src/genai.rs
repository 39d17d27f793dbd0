//! Client for the remote generation and description API.
//!
//! Requests carry the prompt text plus any reference images as inline
//! base64 parts; responses are walked for the first inline image payload.
//! Every returned image is watermarked before it reaches the caller, so
//! nothing downstream ever sees an unstamped result.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ingest::ImageRef;
use crate::render::watermark;
use crate::{Error, Result};

/// Model id of the fast image model (supports editing with references).
pub const MODEL_FLASH: &str = "gemini-2.5-flash-image";
/// Model id of the high-fidelity image model.
pub const MODEL_PRO: &str = "gemini-3-pro-image-preview";
/// Text model used for reverse prompting.
const MODEL_DESCRIBE: &str = "gemini-2.5-flash";

/// Prompt substituted when the caller supplies references but no text.
const DEFAULT_REFERENCE_PROMPT: &str =
    "Generate an image based on the provided visual references.";

/// Fixed instruction for the reverse-prompt flow.
const DESCRIBE_PROMPT: &str = "Analyze this image and provide a professional, coherent image \
     generation prompt. Describe the image including details, lighting, character features, \
     facial proportions, expressions, materials, and style. Output ONLY the prompt description.";

/// Configuration for [`GenAiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API credential sent with every request.
    pub api_key: String,
    /// Service root; override to point at a mock server in tests.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_ms: 120_000,
        }
    }
}

/// HTTP client for image generation and description.
#[derive(Debug)]
pub struct GenAiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl GenAiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::ConfigError("API key must not be empty".into()));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::ConfigError(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    /// Generate one image from `prompt` and up to five `references`.
    ///
    /// An empty prompt is allowed when references are present (a fixed
    /// substitute prompt is sent); empty prompt and no references is a typed
    /// error. The result arrives watermarked.
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        references: &[ImageRef],
    ) -> Result<ImageRef> {
        let mut parts = Vec::with_capacity(references.len() + 1);
        for image in references {
            parts.push(Part::inline(image.mime_type(), image.base64_payload()?));
        }

        let final_prompt = if prompt.trim().is_empty() {
            if references.is_empty() {
                return Err(Error::EmptyPrompt);
            }
            DEFAULT_REFERENCE_PROMPT
        } else {
            prompt.trim()
        };
        parts.push(Part::text(final_prompt));

        // The pro model is pinned to a square 1K output so both panels compare
        // like for like.
        let image_config = (model == MODEL_PRO).then(|| ImageConfig {
            aspect_ratio: "1:1".to_string(),
            image_size: "1K".to_string(),
        });
        let request = GenerateRequest {
            contents: vec![Content { parts: Some(parts) }],
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
                image_config,
            }),
        };

        let response = self.post(model, &request).await?;
        let raw = first_inline_image(response)?;
        Ok(watermark::stamp(&raw))
    }

    /// Describe `image` as a reusable generation prompt ("reverse prompt").
    pub async fn describe(&self, image: &ImageRef) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: Some(vec![
                    Part::inline(image.mime_type(), image.base64_payload()?),
                    Part::text(DESCRIBE_PROMPT),
                ]),
            }],
            generation_config: None,
        };

        let response = self.post(MODEL_DESCRIBE, &request).await?;
        let text = response
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<String>();
        if text.trim().is_empty() {
            return Err(Error::GenerationError(
                "no description returned for image".into(),
            ));
        }
        Ok(text.trim().to_string())
    }

    async fn post(&self, model: &str, request: &GenerateRequest) -> Result<GenerateResponse> {
        let url = format!("{}/models/{}:generateContent", self.config.base_url, model);
        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(self.config.timeout_ms)
                } else {
                    Error::NetworkError(format!("request to {} failed: {}", model, e))
                }
            })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::NetworkError(format!("failed to read response body: {}", e)))?;

        if status.as_u16() == 403 || body.contains("PERMISSION_DENIED") {
            return Err(Error::PermissionDenied(format!(
                "{} rejected credentials (HTTP {})",
                model, status
            )));
        }
        if !status.is_success() {
            return Err(Error::GenerationError(format!(
                "{} returned HTTP {}: {}",
                model,
                status,
                truncate(&body)
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::GenerationError(format!("malformed response from {}: {}", model, e)))
    }
}

fn truncate(body: &str) -> String {
    const LIMIT: usize = 200;
    if body.chars().count() > LIMIT {
        body.chars().take(LIMIT).collect()
    } else {
        body.to_string()
    }
}

/// Extract the first inline image payload as a data-URL handle.
fn first_inline_image(response: GenerateResponse) -> Result<ImageRef> {
    let candidates = response
        .candidates
        .filter(|c| !c.is_empty())
        .ok_or_else(|| Error::GenerationError("no candidates returned".into()))?;
    let parts = candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts)
        .ok_or_else(|| Error::GenerationError("no content parts returned".into()))?;

    for part in parts {
        if let Some(inline) = part.inline_data {
            if !inline.data.is_empty() {
                let mime = if inline.mime_type.is_empty() {
                    "image/png".to_string()
                } else {
                    inline.mime_type
                };
                return ImageRef::parse(&format!("data:{};base64,{}", mime, inline.data));
            }
        }
    }
    Err(Error::GenerationError(
        "no image data found in response".into(),
    ))
}

// --- wire types ---

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    parts: Option<Vec<Part>>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(
        rename = "inlineData",
        skip_serializing_if = "Option::is_none",
        default
    )]
    inline_data: Option<InlineData>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    text: Option<String>,
}

impl Part {
    fn inline(mime: &str, data: &str) -> Self {
        Self {
            inline_data: Some(InlineData {
                mime_type: mime.to_string(),
                data: data.to_string(),
            }),
            text: None,
        }
    }

    fn text(text: &str) -> Self {
        Self {
            inline_data: None,
            text: Some(text.to_string()),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct InlineData {
    #[serde(rename = "mimeType", default)]
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseModalities")]
    response_modalities: Vec<String>,
    #[serde(rename = "imageConfig", skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
}

#[derive(Serialize)]
struct ImageConfig {
    #[serde(rename = "aspectRatio")]
    aspect_ratio: String,
    #[serde(rename = "imageSize")]
    image_size: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_a_config_error() {
        let err = GenAiClient::new(ClientConfig::new("")).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn empty_prompt_without_references_is_rejected() {
        let client = GenAiClient::new(ClientConfig::new("k")).unwrap();
        let err = futures::executor::block_on(client.generate(MODEL_FLASH, "  ", &[]));
        assert!(matches!(err, Err(Error::EmptyPrompt)));
    }

    #[test]
    fn first_inline_image_prefers_image_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[
                {"text":"caption"},
                {"inlineData":{"mimeType":"image/png","data":"AAAA"}}
            ]}}]}"#,
        )
        .unwrap();
        let image = first_inline_image(response).unwrap();
        assert_eq!(image.as_str(), "data:image/png;base64,AAAA");
    }

    #[test]
    fn missing_mime_defaults_to_png() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[
                {"inlineData":{"data":"AAAA"}}
            ]}}]}"#,
        )
        .unwrap();
        let image = first_inline_image(response).unwrap();
        assert_eq!(image.mime_type(), "image/png");
    }

    #[test]
    fn empty_candidates_is_a_descriptive_error() {
        let response: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        let err = first_inline_image(response).unwrap_err();
        assert!(err.to_string().contains("no candidates"));
    }

    #[test]
    fn text_only_parts_mean_no_image_data() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"sorry"}]}}]}"#,
        )
        .unwrap();
        let err = first_inline_image(response).unwrap_err();
        assert!(err.to_string().contains("no image data"));
    }
}
