use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error envelope returned by the Gemini API on non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiApiError {
    pub error: GeminiApiErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiApiErrorBody {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
    /// Canonical status, e.g. `INVALID_ARGUMENT` or `RESOURCE_EXHAUSTED`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub details: Vec<Value>,
}

impl GeminiApiErrorBody {
    /// First `reason` found in the `google.rpc.ErrorInfo` details, such as `API_KEY_INVALID`.
    pub fn reason(&self) -> Option<&str> {
        self.details
            .iter()
            .find_map(|d| d.get("reason").and_then(Value::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_key_error() {
        let body = r#"{
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT",
                "details": [
                    {
                        "@type": "type.googleapis.com/google.rpc.ErrorInfo",
                        "reason": "API_KEY_INVALID",
                        "domain": "googleapis.com"
                    }
                ]
            }
        }"#;
        let err: GeminiApiError = serde_json::from_str(body).unwrap();
        assert_eq!(err.error.code, Some(400));
        assert_eq!(err.error.status.as_deref(), Some("INVALID_ARGUMENT"));
        assert_eq!(err.error.reason(), Some("API_KEY_INVALID"));
    }

    #[test]
    fn test_minimal_error_body() {
        let err: GeminiApiError = serde_json::from_str(r#"{"error":{"message":"boom"}}"#).unwrap();
        assert_eq!(err.error.message, "boom");
        assert!(err.error.reason().is_none());
    }
}
