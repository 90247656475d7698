//! Response rendering.
//!
//! # Responsibilities
//! - Turn a recording's canned response into an HTTP response
//! - Build the response for unmatched requests
//!
//! # Design Decisions
//! - Canned responses are cloned per request (`Bytes` clones are cheap)
//! - Unmatched responses carry `x-troxy-unmatched: true` so clients can tell them apart

use axum::body::{Body, Bytes};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::Response;

use crate::config::UnmatchedConfig;
use crate::recording::CannedResponse;

/// Marker header on responses to unmatched requests.
pub const X_TROXY_UNMATCHED: HeaderName = HeaderName::from_static("x-troxy-unmatched");

/// Render a recording's canned response.
pub fn render(canned: &CannedResponse) -> Response {
    let mut response = Response::new(Body::from(canned.body.clone()));
    *response.status_mut() = canned.status;
    *response.headers_mut() = canned.headers.clone();
    response
}

/// The response served when no recording matches.
#[derive(Debug, Clone)]
pub struct UnmatchedResponse {
    status: StatusCode,
    body: Bytes,
}

impl UnmatchedResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Build from config; an invalid status falls back to 404.
    pub fn from_config(config: &UnmatchedConfig) -> Self {
        let status = StatusCode::from_u16(config.status).unwrap_or(StatusCode::NOT_FOUND);
        Self::new(status, config.body.clone())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn render(&self) -> Response {
        let mut response = Response::new(Body::from(self.body.clone()));
        *response.status_mut() = self.status;
        response
            .headers_mut()
            .insert(X_TROXY_UNMATCHED, HeaderValue::from_static("true"));
        response
    }
}

impl Default for UnmatchedResponse {
    fn default() -> Self {
        Self::from_config(&UnmatchedConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    #[tokio::test]
    async fn test_render_canned_response() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        let canned = CannedResponse {
            status: StatusCode::ACCEPTED,
            headers,
            body: Bytes::from_static(b"{}"),
        };

        let response = render(&canned);
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()["content-type"], "application/json");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, Bytes::from_static(b"{}"));
    }

    #[test]
    fn test_unmatched_response_is_marked() {
        let response = UnmatchedResponse::new(StatusCode::IM_A_TEAPOT, "nothing here").render();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(response.headers()[X_TROXY_UNMATCHED], "true");
    }

    #[test]
    fn test_unmatched_from_invalid_config_falls_back() {
        let config = UnmatchedConfig {
            status: 7,
            body: String::new(),
        };
        assert_eq!(UnmatchedResponse::from_config(&config).status(), StatusCode::NOT_FOUND);
    }
}
