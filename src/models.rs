use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub prompt: Option<String>,
    pub model_name: Option<String>,
    pub system_prompt: Option<String>,
    /// Sampling parameters, forwarded to the provider untouched.
    pub generation_config: Option<Map<String, Value>>,
    pub structured_output_config: Option<StructuredOutputConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuredOutputConfig {
    pub schema: Option<Value>,
}

impl GenerateRequest {
    pub fn schema(&self) -> Option<&Value> {
        self.structured_output_config.as_ref().and_then(|c| c.schema.as_ref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub response: String,
}

impl GenerateResponse {
    pub fn ok(response: String) -> Self {
        Self { success: true, response }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
