use std::sync::Arc;
use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::Response,
};

/// Bearer token required by the admin API, if any.
#[derive(Debug, Clone, Default)]
pub struct AdminAuth {
    api_key: Option<Arc<str>>,
}

impl AdminAuth {
    pub fn new(api_key: Option<&str>) -> Self {
        Self {
            api_key: api_key.map(Arc::from),
        }
    }

    fn authorizes(&self, header: Option<&str>) -> bool {
        match &self.api_key {
            None => true,
            Some(key) => header
                .and_then(|h| h.strip_prefix("Bearer "))
                .is_some_and(|token| token == key.as_ref()),
        }
    }
}

pub async fn admin_auth_middleware(
    State(auth): State<AdminAuth>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    if auth.authorizes(auth_header) {
        return Ok(next.run(request).await);
    }

    tracing::warn!(path = %request.uri().path(), "Rejected unauthorized admin request");
    Err(StatusCode::UNAUTHORIZED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_key_allows_everything() {
        assert!(AdminAuth::new(None).authorizes(None));
    }

    #[test]
    fn test_key_requires_bearer_token() {
        let auth = AdminAuth::new(Some("secret"));
        assert!(auth.authorizes(Some("Bearer secret")));
        assert!(!auth.authorizes(Some("Bearer wrong")));
        assert!(!auth.authorizes(Some("secret")));
        assert!(!auth.authorizes(None));
    }
}
