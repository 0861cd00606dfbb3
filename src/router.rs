use crate::auth::{self, AppState, VerifiedUser};
use crate::converters::gemini::GeminiRequest;
use crate::cors;
use crate::error::GatewayError;
use crate::models::{GenerateRequest, GenerateResponse, HealthResponse};
use crate::request_id;
use axum::{
    Extension, Json, Router,
    extract::State,
    middleware,
    routing::{get, post},
};
use bytes::Bytes;
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

// Part of the health contract, independent of the crate version.
const HEALTH_VERSION: &str = "1.0.0";

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/generate", post(generate))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth::require_authorization,
        ))
        .route("/health", get(health))
        .route("/", get(health))
        .method_not_allowed_fallback(not_found)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(app_state.clone(), cors::negotiate))
        .layer(middleware::from_fn(request_id::inject_request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: HEALTH_VERSION.to_string(),
    })
}

pub async fn not_found() -> GatewayError {
    GatewayError::NotFound
}

pub async fn generate(
    State(app_state): State<AppState>,
    Extension(user): Extension<VerifiedUser>,
    body: Bytes,
) -> Result<Json<GenerateResponse>, GatewayError> {
    // An unreadable body is an internal failure like any other, not a validation error
    let request: GenerateRequest =
        serde_json::from_slice(&body).map_err(|e| GatewayError::upstream(e.to_string()))?;

    let prompt = request
        .prompt
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or(GatewayError::MissingPrompt)?;

    let model = request
        .model_name
        .as_deref()
        .filter(|m| !m.is_empty())
        .unwrap_or(app_state.default_model.as_str());

    let schema = request.schema();
    let gemini_request = GeminiRequest::new(
        prompt,
        request.system_prompt.as_deref(),
        request.generation_config.as_ref(),
        schema,
    );
    let structured = gemini_request.is_structured();

    info!(
        "Generating with model {} for user {} (structured: {})",
        model,
        user.local_id.as_deref().unwrap_or("<unknown>"),
        structured
    );
    debug!("Prompt length: {} chars", prompt.chars().count());

    let text = app_state
        .llm_client
        .generate_content(model, &gemini_request)
        .await
        .and_then(|response| response.text())
        .map_err(|e| GatewayError::from_gemini(e, structured))?;

    let response = if structured { pretty_json_or_raw(text) } else { text };
    Ok(Json(GenerateResponse::ok(response)))
}

/// Re-indents JSON text for display; anything that does not parse is returned
/// unchanged.
fn pretty_json_or_raw(text: String) -> String {
    match serde_json::from_str::<Value>(&text) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or(text),
        Err(e) => {
            debug!("Structured output is not valid JSON, returning raw text: {}", e);
            text
        }
    }
}
