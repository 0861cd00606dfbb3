use crate::llm_client::GeminiError;
use crate::models::ErrorResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, info, warn};

const UNKNOWN_UPSTREAM_ERROR: &str = "An unknown error occurred while contacting the Gemini API.";

/// Every failure a request can end in. Each one renders as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Authentication required")]
    MissingCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Prompt is required")]
    MissingPrompt,

    #[error("Invalid API Key. Please check the gateway configuration.")]
    InvalidApiKey,

    #[error("API quota exceeded. Please check your usage or try again later.")]
    QuotaExceeded,

    #[error("Schema error: {0}. Please check your JSON schema.")]
    Schema(String),

    #[error("{0}")]
    Upstream(String),

    #[error("Not found")]
    NotFound,
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::MissingCredentials
            | GatewayError::InvalidToken
            | GatewayError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            GatewayError::MissingPrompt | GatewayError::Schema(_) => StatusCode::BAD_REQUEST,
            GatewayError::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            GatewayError::Upstream(UNKNOWN_UPSTREAM_ERROR.to_string())
        } else {
            GatewayError::Upstream(message)
        }
    }

    /// Maps a provider failure onto the caller-facing taxonomy. Key and quota
    /// problems win; any other failure while JSON output was requested is
    /// reported against the caller's schema.
    pub fn from_gemini(err: GeminiError, structured: bool) -> Self {
        if err.is_invalid_api_key() {
            GatewayError::InvalidApiKey
        } else if err.is_quota_exceeded() {
            GatewayError::QuotaExceeded
        } else if structured {
            GatewayError::Schema(err.detail())
        } else {
            GatewayError::upstream(err.to_string())
        }
    }

    // A bad server-held key surfaces as 401 but is an operator problem.
    fn is_configuration_problem(&self) -> bool {
        matches!(self, GatewayError::InvalidApiKey)
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = %status, "Request failed: {}", self);
        } else if status == StatusCode::TOO_MANY_REQUESTS || self.is_configuration_problem() {
            warn!(status = %status, "Request failed: {}", self);
        } else {
            info!(status = %status, "Request rejected: {}", self);
        }

        let body = ErrorResponse { error: self.to_string() };
        (status, Json(body)).into_response()
    }
}
