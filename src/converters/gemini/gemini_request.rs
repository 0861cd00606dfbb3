use crate::converters::gemini::GeminiContent;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const JSON_MIME_TYPE: &str = "application/json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiContent>,
    // Caller parameters pass through untouched; the provider validates them.
    #[serde(rename = "generationConfig")]
    #[serde(default)]
    pub generation_config: Map<String, Value>,
}

impl GeminiRequest {
    /// Single-turn user prompt. With a `schema` the response is constrained to
    /// JSON, overriding any mime type or schema the caller put in the config.
    pub fn new(
        prompt: &str,
        system_prompt: Option<&str>,
        generation_config: Option<&Map<String, Value>>,
        schema: Option<&Value>,
    ) -> Self {
        let mut config = generation_config.cloned().unwrap_or_default();
        if let Some(schema) = schema {
            config.insert("responseMimeType".to_string(), Value::String(JSON_MIME_TYPE.to_string()));
            config.insert("responseSchema".to_string(), schema.clone());
        }

        GeminiRequest {
            contents: vec![GeminiContent::text("user", prompt)],
            system_instruction: system_prompt
                .filter(|s| !s.is_empty())
                .map(|s| GeminiContent::text("system", s)),
            generation_config: config,
        }
    }

    pub fn is_structured(&self) -> bool {
        self.generation_config.contains_key("responseSchema")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_prompt_shape() {
        let req = GeminiRequest::new("Hello", None, None, None);
        let body = serde_json::to_value(&req).unwrap();

        assert_eq!(
            body,
            json!({
                "contents": [ { "role": "user", "parts": [ { "text": "Hello" } ] } ],
                "generationConfig": {}
            })
        );
        assert!(!req.is_structured());
    }

    #[test]
    fn test_system_prompt_and_config_pass_through() {
        let config = json!({ "temperature": 7.5, "topP": 0.9, "maxOutputTokens": 64, "vendorKnob": [1, 2] });
        let req = GeminiRequest::new("Hi", Some("Be terse"), config.as_object(), None);
        let body = serde_json::to_value(&req).unwrap();

        assert_eq!(body["systemInstruction"]["role"], "system");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be terse");
        // no clamping of out-of-range values, no dropping of unknown keys
        assert_eq!(body["generationConfig"], config);
    }

    #[test]
    fn test_empty_system_prompt_is_omitted() {
        let req = GeminiRequest::new("Hi", Some(""), None, None);
        let body = serde_json::to_value(&req).unwrap();
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn test_schema_overrides_caller_mime_type() {
        let config = json!({ "temperature": 0.2, "responseMimeType": "text/plain" });
        let schema = json!({ "type": "object", "properties": { "name": { "type": "string" } } });
        let req = GeminiRequest::new("Hi", None, config.as_object(), Some(&schema));

        assert!(req.is_structured());
        assert_eq!(req.generation_config["temperature"], json!(0.2));
        assert_eq!(req.generation_config["responseMimeType"], json!("application/json"));
        assert_eq!(req.generation_config["responseSchema"], schema);
    }
}
