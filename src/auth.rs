use crate::config::{ApiKey, IdentitySettings};
use crate::cors::CorsPolicy;
use crate::error::GatewayError;
use crate::llm_client::LlmClient;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct AppState {
    pub identity: Arc<IdentityClient>,
    pub llm_client: Arc<LlmClient>,
    pub cors: Arc<CorsPolicy>,
    pub default_model: String,
}

/// A user record as returned by `accounts:lookup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedUser {
    #[serde(rename = "localId")]
    pub local_id: Option<String>,
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra_fields: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Option<Vec<VerifiedUser>>,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity service unreachable: {0}")]
    Transport(reqwest::Error),

    #[error("malformed identity response: {0}")]
    Decode(#[from] serde_json::Error),
}

// The lookup URL carries the identity key in its query string.
impl From<reqwest::Error> for IdentityError {
    fn from(e: reqwest::Error) -> Self {
        IdentityError::Transport(e.without_url())
    }
}

/// Token from an `Authorization: Bearer <token>` header. Any other scheme, or
/// an empty token, counts as no credentials at all.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|hv| hv.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[derive(Debug)]
pub struct IdentityClient {
    http_client: Arc<reqwest::Client>,
    endpoint: String,
    api_key: ApiKey,
}

impl IdentityClient {
    pub fn new(http_client: Arc<reqwest::Client>, settings: &IdentitySettings) -> Self {
        Self {
            http_client,
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
        }
    }

    /// Single lookup. `Ok(None)` means the provider answered and rejected the
    /// token; `Err` means we never got a usable answer.
    pub async fn lookup(&self, token: &str) -> Result<Option<VerifiedUser>, IdentityError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.expose())])
            .json(&json!({ "idToken": token }))
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let reason = serde_json::from_slice::<Value>(&body)
                .ok()
                .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| status.to_string());
            warn!("Token verification failed: {}", reason);
            return Ok(None);
        }

        let parsed: LookupResponse = serde_json::from_slice(&body)?;
        Ok(parsed.users.and_then(|users| users.into_iter().next()))
    }

    /// Fail-closed wrapper around [`lookup`](Self::lookup): anything short of a
    /// user record is treated as unauthenticated.
    pub async fn verify(&self, token: &str) -> Option<VerifiedUser> {
        match self.lookup(token).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                debug!("Identity service returned no user for token");
                None
            }
            Err(e) => {
                error!("Token verification error: {}", e);
                None
            }
        }
    }
}

pub async fn require_authorization(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let token = match bearer_token(request.headers()) {
        Some(token) => token.to_string(),
        None => {
            info!("Missing or malformed Authorization header");
            return Err(GatewayError::MissingCredentials);
        }
    };

    let user = app_state
        .identity
        .verify(&token)
        .await
        .ok_or(GatewayError::InvalidToken)?;

    info!("Authenticated user: {}", user.email.as_deref().unwrap_or("<no email>"));
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
