use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeminiPart {
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        thought: Option<bool>,
    },
    // functionCall, inlineData, executableCode...; carried but never rendered
    Other(Value),
}

impl GeminiPart {
    pub fn text(text: &str) -> Self {
        GeminiPart::Text { text: text.to_string(), thought: None }
    }

    /// Visible text of this part; thought summaries are not part of the answer.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            GeminiPart::Text { text, thought } if *thought != Some(true) => Some(text),
            _ => None,
        }
    }
}
