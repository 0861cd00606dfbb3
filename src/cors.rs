use crate::auth::AppState;
use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, HeaderValue, Method, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ORIGIN, VARY,
        },
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

pub const DEFAULT_ALLOWED_ORIGINS: [&str; 3] = [
    "http://localhost:5173",
    "http://localhost:4173",
    "https://promptbox.app",
];

const ALLOW_METHODS: &str = "POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";
const MAX_AGE_SECS: &str = "86400";

#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
}

impl CorsPolicy {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|o| o == origin)
    }

    /// Headers for a request carrying `origin`. The allow-origin header is only
    /// present for listed origins; everything else is unconditional. `Vary`
    /// is always set because the response depends on the request's origin.
    pub fn headers_for(&self, origin: Option<&HeaderValue>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(VARY, HeaderValue::from_static("Origin"));
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
        headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE_SECS));

        if let Some(origin) = origin {
            match origin.to_str() {
                Ok(o) if self.is_allowed(o) => {
                    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
                }
                Ok(o) => debug!("Origin not in allow-list: {}", o),
                Err(_) => debug!("Ignoring non-ASCII Origin header"),
            }
        }

        headers
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect())
    }
}

/// Answers every preflight with 204 and merges the negotiated headers into
/// all other responses, whatever route produced them.
pub async fn negotiate(State(app_state): State<AppState>, request: Request, next: Next) -> Response {
    let cors_headers = app_state.cors.headers_for(request.headers().get(ORIGIN));

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    for (name, value) in cors_headers.iter() {
        headers.insert(name.clone(), value.clone());
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listed_origin_is_echoed() {
        let policy = CorsPolicy::default();
        let origin = HeaderValue::from_static("https://promptbox.app");

        let headers = policy.headers_for(Some(&origin));

        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://promptbox.app");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type, Authorization");
        assert_eq!(headers[ACCESS_CONTROL_MAX_AGE], "86400");
        assert_eq!(headers[VARY], "Origin");
    }

    #[test]
    fn test_unlisted_origin_gets_no_allow_origin() {
        let policy = CorsPolicy::default();
        let origin = HeaderValue::from_static("https://evil.example");

        let headers = policy.headers_for(Some(&origin));

        assert!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert_eq!(headers[ACCESS_CONTROL_MAX_AGE], "86400");
    }

    #[test]
    fn test_missing_origin() {
        let headers = CorsPolicy::default().headers_for(None);
        assert!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert_eq!(headers[VARY], "Origin");
        assert_eq!(headers.len(), 4);
    }

    #[test]
    fn test_origin_match_is_exact() {
        let policy = CorsPolicy::default();
        assert!(policy.is_allowed("http://localhost:5173"));
        assert!(!policy.is_allowed("http://localhost:5173/"));
        assert!(!policy.is_allowed("https://promptbox.app.evil.example"));
        assert!(!policy.is_allowed("HTTPS://PROMPTBOX.APP"));
    }

    #[test]
    fn test_custom_allow_list() {
        let policy = CorsPolicy::new(vec!["https://example.test".to_string()]);
        assert!(policy.is_allowed("https://example.test"));
        assert!(!policy.is_allowed("https://promptbox.app"));
    }
}
