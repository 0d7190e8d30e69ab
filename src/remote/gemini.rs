use std::path::Path;

use crate::compose::Composite;
use crate::foundation::error::{AdError, AdResult};
use crate::generate::{BackgroundGenerator, GenerationRequest};
use crate::remote::client::{Endpoint, GeminiClient, Part};
use crate::remote::prompts::{generation_prompt, review_prompt};
use crate::review::judge::{ComplianceJudge, ReviewContext};
use crate::review::verdict::{ReviewVerdict, parse_verdict};

const IMAGE_MODALITIES: &[&str] = &["TEXT", "IMAGE"];

/// Background generator backed by a Gemini image model.
#[derive(Clone, Debug)]
pub struct GeminiImageGenerator {
    client: GeminiClient,
    model: String,
}

impl GeminiImageGenerator {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

struct ReferencePhoto {
    bytes: Vec<u8>,
    mime: &'static str,
    size: (u32, u32),
}

/// Product photo to anchor the generation. A missing or unreadable file only costs the
/// anchor, never the attempt.
fn load_reference(path: &Path) -> Option<ReferencePhoto> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "reference image unreadable; prompting without it");
            return None;
        }
    };
    let format = match image::guess_format(&bytes) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "reference image format unknown; prompting without it");
            return None;
        }
    };
    let size = match image::load_from_memory_with_format(&bytes, format) {
        Ok(img) => (img.width(), img.height()),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "reference image undecodable; prompting without it");
            return None;
        }
    };
    Some(ReferencePhoto {
        mime: format.to_mime_type(),
        bytes,
        size,
    })
}

impl BackgroundGenerator for GeminiImageGenerator {
    fn generate_background(&self, request: &GenerationRequest<'_>) -> AdResult<Vec<u8>> {
        let reference = request
            .product
            .image_path
            .as_deref()
            .and_then(load_reference);
        let prompt = generation_prompt(request, reference.as_ref().map(|r| r.size));

        let mut parts = vec![Part::text(prompt)];
        if let Some(r) = &reference {
            parts.push(Part::image(r.mime, &r.bytes));
        }

        tracing::info!(
            model = %self.model,
            attempt = request.attempt,
            width = request.spec.canvas.width,
            height = request.spec.canvas.height,
            with_reference = reference.is_some(),
            "requesting background"
        );
        let resp = self.client.generate_content(
            Endpoint::Generation,
            &self.model,
            parts,
            Some(IMAGE_MODALITIES),
        )?;

        if let Some(reason) = resp.block_reason() {
            return Err(AdError::generation(format!("prompt blocked: {reason}")));
        }
        match resp.first_image()? {
            Some(bytes) => Ok(bytes),
            None => {
                let text = resp.text();
                Err(AdError::generation(if text.trim().is_empty() {
                    "no image data in response".to_string()
                } else {
                    format!("no image data in response; model said: {}", text.trim())
                }))
            }
        }
    }
}

/// Compliance judge backed by a Gemini multimodal model.
#[derive(Clone, Debug)]
pub struct GeminiJudge {
    client: GeminiClient,
    model: String,
}

impl GeminiJudge {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

impl ComplianceJudge for GeminiJudge {
    fn judge(&self, composite: &Composite, context: &ReviewContext<'_>) -> AdResult<ReviewVerdict> {
        let png = composite.encode_png()?;
        let parts = vec![Part::text(review_prompt(context)), Part::image("image/png", &png)];

        tracing::info!(
            model = %self.model,
            attempt = context.attempt,
            banned_words = context.banned_words().len(),
            "requesting review"
        );
        let resp = self
            .client
            .generate_content(Endpoint::Review, &self.model, parts, None)?;
        if let Some(reason) = resp.block_reason() {
            return Err(AdError::judge(format!("review blocked: {reason}")));
        }
        let text = resp.text();
        parse_verdict(&text).inspect_err(|e| {
            tracing::debug!(error = %e, raw = %truncate(&text, 500), "unparsable verdict");
        })
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
