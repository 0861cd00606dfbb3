use crate::config::{ApiKey, GeminiSettings};
use crate::converters::gemini::{GeminiApiError, GeminiRequest, GeminiResponse};
use reqwest::StatusCode;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("[{status}] {message}")]
    Api {
        status: StatusCode,
        /// Canonical status string from the error body, e.g. `RESOURCE_EXHAUSTED`.
        code: Option<String>,
        reason: Option<String>,
        message: String,
    },

    #[error("Error fetching from Gemini API: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to parse Gemini response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Text not available. {0}")]
    Blocked(String),
}

impl GeminiError {
    pub fn is_invalid_api_key(&self) -> bool {
        match self {
            GeminiError::Api { reason, message, .. } => {
                reason.as_deref() == Some("API_KEY_INVALID") || message.contains("API key not valid")
            }
            _ => false,
        }
    }

    pub fn is_quota_exceeded(&self) -> bool {
        match self {
            GeminiError::Api { status, code, message, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS
                    || code.as_deref() == Some("RESOURCE_EXHAUSTED")
                    || message.to_lowercase().contains("quota")
            }
            _ => false,
        }
    }

    /// Provider-facing detail without the status prefix.
    pub fn detail(&self) -> String {
        match self {
            GeminiError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct LlmClient {
    http_client: Arc<reqwest::Client>,
    api_base: String,
    api_key: ApiKey,
}

impl LlmClient {
    pub fn new(http_client: Arc<reqwest::Client>, settings: &GeminiSettings) -> Self {
        Self {
            http_client,
            api_base: settings.api_base.clone(),
            api_key: settings.api_key.clone(),
        }
    }

    fn build_target_url(&self, model: &str) -> String {
        // Bare names live under models/; tunedModels/... and friends are already qualified
        let model_path = if model.contains('/') { model.to_string() } else { format!("models/{}", model) };
        let path = format!("{}:generateContent", model_path);
        if self.api_base.ends_with('/') {
            format!("{}{}", self.api_base, path)
        } else {
            format!("{}/{}", self.api_base, path)
        }
    }

    /// One `generateContent` call. No retries; a failure is returned as-is for
    /// the caller to classify.
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GeminiRequest,
    ) -> Result<GeminiResponse, GeminiError> {
        let target_url = self.build_target_url(model);
        info!("Forwarding request to: {}", target_url);
        debug!(
            "structured: {}, generation config keys: {:?}",
            request.is_structured(),
            request.generation_config.keys().collect::<Vec<_>>()
        );

        let response = self
            .http_client
            .post(&target_url)
            .header(API_KEY_HEADER, self.api_key.expose())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(api_error(status, &body));
        }

        let parsed: GeminiResponse = serde_json::from_slice(&body)?;
        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "Gemini usage ({}): prompt={:?} candidates={:?} thoughts={:?} total={:?}",
                parsed.model_version.as_deref().unwrap_or(model),
                usage.prompt_token_count,
                usage.candidates_token_count,
                usage.thoughts_token_count,
                usage.total_token_count
            );
        }
        Ok(parsed)
    }
}

fn api_error(status: StatusCode, body: &[u8]) -> GeminiError {
    match serde_json::from_slice::<GeminiApiError>(body) {
        Ok(parsed) => {
            debug!(
                "Gemini error body: code={:?} status={:?} details={}",
                parsed.error.code,
                parsed.error.status,
                parsed.error.details.len()
            );
            GeminiError::Api {
                status,
                reason: parsed.error.reason().map(str::to_string),
                code: parsed.error.status,
                message: parsed.error.message,
            }
        }
        Err(_) => {
            let text = String::from_utf8_lossy(body);
            let message = if text.trim().is_empty() {
                status.canonical_reason().unwrap_or("Unexpected response from Gemini API").to_string()
            } else {
                truncate(text.trim(), 500)
            };
            GeminiError::Api { status, code: None, reason: None, message }
        }
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    match s.char_indices().nth(max_len) {
        None => s.to_string(),
        Some((idx, _)) => format!("{}…", &s[..idx]),
    }
}
