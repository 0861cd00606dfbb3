use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GeminiFinishReason {
    FinishReasonUnspecified,
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    Language,
    Other,
    Blocklist,
    ProhibitedContent,
    Spii,
    MalformedFunctionCall,
    ImageSafety,
    #[serde(other)]
    Unknown,
}

impl GeminiFinishReason {
    /// Reasons for which the candidate's text must not be handed out.
    pub fn is_blocking(self) -> bool {
        matches!(
            self,
            GeminiFinishReason::Safety
                | GeminiFinishReason::Recitation
                | GeminiFinishReason::Language
                | GeminiFinishReason::Blocklist
                | GeminiFinishReason::ProhibitedContent
                | GeminiFinishReason::Spii
                | GeminiFinishReason::ImageSafety
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GeminiFinishReason::FinishReasonUnspecified => "FINISH_REASON_UNSPECIFIED",
            GeminiFinishReason::Stop => "STOP",
            GeminiFinishReason::MaxTokens => "MAX_TOKENS",
            GeminiFinishReason::Safety => "SAFETY",
            GeminiFinishReason::Recitation => "RECITATION",
            GeminiFinishReason::Language => "LANGUAGE",
            GeminiFinishReason::Other => "OTHER",
            GeminiFinishReason::Blocklist => "BLOCKLIST",
            GeminiFinishReason::ProhibitedContent => "PROHIBITED_CONTENT",
            GeminiFinishReason::Spii => "SPII",
            GeminiFinishReason::MalformedFunctionCall => "MALFORMED_FUNCTION_CALL",
            GeminiFinishReason::ImageSafety => "IMAGE_SAFETY",
            GeminiFinishReason::Unknown => "UNKNOWN",
        }
    }
}
