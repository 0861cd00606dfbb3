use crate::converters::gemini::{GeminiCandidate, GeminiPromptFeedback, GeminiUsage};
use crate::llm_client::GeminiError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
    #[serde(rename = "promptFeedback")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<GeminiPromptFeedback>,
    #[serde(rename = "usageMetadata")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<GeminiUsage>,
    #[serde(rename = "modelVersion")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

impl GeminiResponse {
    /// Text of the first candidate.
    ///
    /// Fails when the candidate stopped for a safety-style reason or when the
    /// prompt itself was blocked and nothing came back. A response with neither
    /// candidates nor feedback yields an empty string.
    pub fn text(&self) -> Result<String, GeminiError> {
        if let Some(candidate) = self.candidates.first() {
            if self.candidates.len() > 1 {
                tracing::debug!(
                    "Response has {} candidates, returning text from the first one",
                    self.candidates.len()
                );
            }
            if candidate.is_blocked() {
                return Err(GeminiError::Blocked(candidate_block_message(candidate)));
            }
            return Ok(candidate.text());
        }

        if let Some(reason) = self.prompt_feedback.as_ref().and_then(|f| f.block_reason) {
            let mut message = format!("Response was blocked due to {}", reason.as_str());
            if let Some(detail) = self
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason_message.as_deref())
            {
                message.push_str(": ");
                message.push_str(detail);
            }
            return Err(GeminiError::Blocked(message));
        }

        Ok(String::new())
    }
}

fn candidate_block_message(candidate: &GeminiCandidate) -> String {
    let reason = candidate.finish_reason.map(|r| r.as_str()).unwrap_or("UNKNOWN");
    match &candidate.finish_message {
        Some(detail) => format!("Candidate was blocked due to {}: {}", reason, detail),
        None => format!("Candidate was blocked due to {}", reason),
    }
}
