//! Request handling.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Buffer the request body so predicates can inspect it
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Body size is bounded before buffering
//! - A client-provided `x-request-id` is kept and echoed back

use axum::body::{Body, Bytes};
use axum::http::{HeaderName, Request};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Layer that assigns a UUID request ID when the client did not send one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Layer that copies the request ID onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// Read the request ID set by [`set_request_id_layer`].
pub fn request_id<B>(req: &Request<B>) -> &str {
    req.headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Buffer the whole body, failing if it exceeds `limit` bytes.
pub async fn buffer_request(
    req: Request<Body>,
    limit: usize,
) -> Result<Request<Bytes>, axum::Error> {
    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, limit).await?;
    Ok(Request::from_parts(parts, bytes))
}
