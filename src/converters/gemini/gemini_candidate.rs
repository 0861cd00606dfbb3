use crate::converters::gemini::{GeminiContent, GeminiFinishReason};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiCandidate {
    // Absent when the candidate was blocked before producing anything
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<GeminiContent>,
    #[serde(rename = "finishReason")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<GeminiFinishReason>,
    #[serde(rename = "finishMessage")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_message: Option<String>,
    pub index: Option<u32>,
}

impl GeminiCandidate {
    pub fn is_blocked(&self) -> bool {
        self.finish_reason.is_some_and(|r| r.is_blocking())
    }

    pub fn text(&self) -> String {
        self.content
            .as_ref()
            .map(|c| c.parts.iter().filter_map(|p| p.as_text()).collect::<String>())
            .unwrap_or_default()
    }
}
