//! The battle session: one prompt, up to five references, two models raced
//! concurrently, and explicit credentials state.
//!
//! The session owns the "credentials verified" flag instead of leaving it as
//! ambient global state: permission failures reported by either panel flip it
//! to false, and the caller decides when to mark credentials verified again.

use std::time::Instant;

use crate::genai::{GenAiClient, MODEL_FLASH, MODEL_PRO};
use crate::ingest::{self, ImageRef};
use crate::render::{Color, ResultEntry};
use crate::{Error, Result};

/// Display defaults for the two compared models.
const FLASH_LABEL: &str = "NANO";
const PRO_LABEL: &str = "PRO";

/// What one panel produced: either a watermarked image or that panel's error.
#[derive(Debug)]
pub struct PanelOutcome {
    pub model_id: &'static str,
    pub label: String,
    pub accent: Color,
    pub latency_ms: u64,
    pub result: Result<ImageRef>,
}

impl PanelOutcome {
    /// Convert a successful panel into a report result entry.
    pub fn to_result_entry(&self) -> Option<ResultEntry> {
        self.result.as_ref().ok().map(|image| ResultEntry {
            image: image.clone(),
            label: self.label.clone(),
            latency_ms: self.latency_ms,
            accent: self.accent,
        })
    }
}

/// Both panels of one battle run.
#[derive(Debug)]
pub struct BattleOutcome {
    pub left: PanelOutcome,
    pub right: PanelOutcome,
}

impl BattleOutcome {
    /// Whether both panels produced an image (a report can be composited).
    pub fn is_complete(&self) -> bool {
        self.left.result.is_ok() && self.right.result.is_ok()
    }
}

/// Coordinates concurrent generation runs and tracks credentials state.
pub struct BattleSession {
    client: GenAiClient,
    credentials_verified: bool,
}

impl BattleSession {
    pub fn new(client: GenAiClient) -> Self {
        Self {
            client,
            credentials_verified: true,
        }
    }

    /// Whether the last known credentials state is still good.
    pub fn credentials_verified(&self) -> bool {
        self.credentials_verified
    }

    /// Mark credentials as re-confirmed (e.g. after the user re-selects a key).
    pub fn mark_credentials_verified(&mut self) {
        self.credentials_verified = true;
    }

    /// Race both models over the same prompt and references.
    ///
    /// Each panel resolves independently: one model failing never suppresses
    /// the other's image. A permission-denied failure on either side flips
    /// the credentials flag. There is no retry; a failed panel stays failed
    /// until the caller runs another battle.
    pub async fn run(&mut self, prompt: &str, references: &[ImageRef]) -> Result<BattleOutcome> {
        if prompt.trim().is_empty() && references.is_empty() {
            return Err(Error::EmptyPrompt);
        }

        let (left, right) = tokio::join!(
            self.run_panel(MODEL_FLASH, FLASH_LABEL, Color::ACCENT_RED, prompt, references),
            self.run_panel(MODEL_PRO, PRO_LABEL, Color::ACCENT_BLUE, prompt, references),
        );

        if left.result.as_ref().is_err_and(Error::is_permission_denied)
            || right.result.as_ref().is_err_and(Error::is_permission_denied)
        {
            self.credentials_verified = false;
        }

        Ok(BattleOutcome { left, right })
    }

    async fn run_panel(
        &self,
        model_id: &'static str,
        label: &str,
        accent: Color,
        prompt: &str,
        references: &[ImageRef],
    ) -> PanelOutcome {
        let start = Instant::now();
        let result = self.client.generate(model_id, prompt, references).await;
        let latency_ms = start.elapsed().as_millis() as u64;
        if let Err(e) = &result {
            log::warn!("{} generation failed after {}ms: {}", model_id, latency_ms, e);
        }
        PanelOutcome {
            model_id,
            label: label.to_string(),
            accent,
            latency_ms,
            result,
        }
    }

    /// Synthesize a prompt from the first reference image.
    ///
    /// Failures here abort the whole action (there is no partial result to
    /// show), unlike per-panel generation errors.
    pub async fn reverse_prompt(&self, references: &[ImageRef]) -> Result<String> {
        let first = references
            .first()
            .ok_or_else(|| Error::IngestError("no reference image to analyze".into()))?;
        self.client.describe(first).await
    }

    /// Recycle a generated image as an additional reference input.
    pub fn use_result_as_input(
        &self,
        references: &mut Vec<ImageRef>,
        image: ImageRef,
    ) -> Result<()> {
        ingest::push_reference(references, image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genai::ClientConfig;

    fn session() -> BattleSession {
        BattleSession::new(GenAiClient::new(ClientConfig::new("test-key")).unwrap())
    }

    #[tokio::test]
    async fn empty_battle_is_rejected_before_any_request() {
        let mut s = session();
        let err = s.run("   ", &[]).await.unwrap_err();
        assert!(matches!(err, Error::EmptyPrompt));
        assert!(s.credentials_verified());
    }

    #[test]
    fn result_entry_conversion_requires_success() {
        let ok = PanelOutcome {
            model_id: MODEL_FLASH,
            label: "NANO".into(),
            accent: Color::ACCENT_RED,
            latency_ms: 820,
            result: Ok(ImageRef::from_bytes("image/png", &[1])),
        };
        let failed = PanelOutcome {
            model_id: MODEL_PRO,
            label: "PRO".into(),
            accent: Color::ACCENT_BLUE,
            latency_ms: 1340,
            result: Err(Error::GenerationError("boom".into())),
        };
        assert_eq!(ok.to_result_entry().unwrap().latency_ms, 820);
        assert!(failed.to_result_entry().is_none());
    }

    #[test]
    fn recycling_respects_the_reference_cap() {
        let s = session();
        let mut refs = vec![ImageRef::from_bytes("image/png", &[0]); 4];
        s.use_result_as_input(&mut refs, ImageRef::from_bytes("image/png", &[1]))
            .unwrap();
        let err = s
            .use_result_as_input(&mut refs, ImageRef::from_bytes("image/png", &[2]))
            .unwrap_err();
        assert!(matches!(err, Error::CapacityReached(5)));
    }
}
