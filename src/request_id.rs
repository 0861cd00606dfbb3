use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, info_span};
use uuid::Uuid;

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

// Caller-supplied ids are reused only if they can be echoed back as a header.
fn request_id_from(headers: &HeaderMap) -> HeaderValue {
    headers
        .get(&X_REQUEST_ID)
        .filter(|v| v.to_str().is_ok_and(|s| !s.is_empty() && s.len() <= 128))
        .cloned()
        .unwrap_or_else(|| {
            HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
        })
}

/// Runs the rest of the stack inside a span tagged with the request id and
/// reflects the id back on the response.
pub async fn inject_request_id(req: Request, next: Next) -> Response {
    let id = request_id_from(req.headers());

    let span = info_span!(
        "gateway_request",
        trace_id = %id.to_str().unwrap_or_default(),
        method = %req.method(),
        path = %req.uri().path()
    );

    let mut resp = next.run(req).instrument(span).await;
    resp.headers_mut().insert(X_REQUEST_ID.clone(), id);
    resp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incoming_id_is_kept() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID.clone(), HeaderValue::from_static("abc-123"));
        assert_eq!(request_id_from(&headers), "abc-123");
    }

    #[test]
    fn test_missing_id_is_generated() {
        let id = request_id_from(&HeaderMap::new());
        assert!(Uuid::parse_str(id.to_str().unwrap()).is_ok());
    }

    #[test]
    fn test_oversized_id_is_replaced() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID.clone(), HeaderValue::from_str(&"x".repeat(500)).unwrap());
        let id = request_id_from(&headers);
        assert!(Uuid::parse_str(id.to_str().unwrap()).is_ok());
    }
}
