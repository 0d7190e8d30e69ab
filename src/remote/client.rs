//! Minimal blocking client for the Gemini `generateContent` REST endpoint.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::config::GeminiSettings;
use crate::foundation::error::{AdError, AdResult};

/// Which collaborator a call serves; decides the error variant for transient failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Generation,
    Review,
}

impl Endpoint {
    pub fn error(self, msg: impl Into<String>) -> AdError {
        match self {
            Self::Generation => AdError::generation(msg),
            Self::Review => AdError::judge(msg),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// Base64 payload.
    pub data: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        default,
        alias = "inline_data",
        skip_serializing_if = "Option::is_none"
    )]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn image(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: BASE64.encode(bytes),
            }),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_modalities: &'a [&'a str],
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
    }

    /// Decoded bytes of the first inline `image/*` part.
    pub fn first_image(&self) -> AdResult<Option<Vec<u8>>> {
        let Some(inline) = self
            .parts()
            .filter_map(|p| p.inline_data.as_ref())
            .find(|d| d.mime_type.starts_with("image/"))
        else {
            return Ok(None);
        };
        BASE64
            .decode(inline.data.as_bytes())
            .map(Some)
            .map_err(|e| AdError::generation(format!("inline image is not valid base64: {e}")))
    }

    /// All text parts joined in order.
    pub fn text(&self) -> String {
        self.parts()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
    }
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// Map a non-success HTTP status to the crate taxonomy.
pub fn status_error(endpoint: Endpoint, status: u16, body: &str) -> AdError {
    let message = serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|e| e.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.chars().take(300).collect());
    match status {
        401 | 403 => AdError::account(format!("HTTP {status}: {message}")),
        429 => endpoint.error(format!("quota exhausted (HTTP 429): {message}")),
        _ => endpoint.error(format!("HTTP {status}: {message}")),
    }
}

/// Shared HTTP client; cheap to clone.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>, api_key: String, timeout: Duration) -> AdResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdError::Other(anyhow::anyhow!("build http client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Client for `settings`, with the API key taken from the environment.
    pub fn from_settings(settings: &GeminiSettings, timeout: Duration) -> AdResult<Self> {
        let key = settings.resolve_api_key()?;
        Self::new(settings.base_url.clone(), key, timeout)
    }

    pub fn generate_content(
        &self,
        endpoint: Endpoint,
        model: &str,
        parts: Vec<Part>,
        response_modalities: Option<&[&str]>,
    ) -> AdResult<GenerateContentResponse> {
        let url = format!("{}/models/{model}:generateContent", self.base_url);
        let body = GenerateContentRequest {
            contents: [Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: response_modalities.map(|m| GenerationConfig {
                response_modalities: m,
            }),
        };

        tracing::debug!(model, ?endpoint, "gemini request");
        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| endpoint.error(transport_message(&e)))?;

        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| endpoint.error(transport_message(&e)))?;
        if !status.is_success() {
            return Err(status_error(endpoint, status.as_u16(), &text));
        }
        serde_json::from_str(&text)
            .map_err(|e| endpoint.error(format!("unreadable response body: {e}")))
    }
}

fn transport_message(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {e}")
    } else {
        format!("transport: {e}")
    }
}
