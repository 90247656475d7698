//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the replay handler and the admin API
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Buffer requests and hand them to the dispatcher
//! - Observability (metrics, correlation IDs)

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::{setup_admin_router, shadowed_recordings, ApiHandler};
use crate::config::TroxyConfig;
use crate::http::dispatch::Dispatcher;
use crate::http::request::{
    buffer_request, propagate_request_id_layer, request_id, set_request_id_layer,
};
use crate::http::response::{UnmatchedResponse, X_TROXY_UNMATCHED};
use crate::observability::metrics;
use crate::recording::RecordingStore;
use crate::statistics::StatisticsRegistry;

/// Application state injected into the replay handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub max_body_size: usize,
}

/// HTTP server replaying recordings.
pub struct HttpServer {
    router: Router,
    api: ApiHandler,
}

impl HttpServer {
    /// Create a new HTTP server serving the given recordings.
    ///
    /// The server gets its own statistics registry with every known key at zero.
    pub fn new(config: TroxyConfig, store: Arc<RecordingStore>) -> Self {
        for recording in shadowed_recordings(&store, &config.admin) {
            tracing::warn!(
                recording = %recording.id,
                path = recording.request.exact_path().unwrap_or_default(),
                admin_prefix = %config.admin.path_prefix,
                "Recording path is served by the admin API and will never be replayed"
            );
        }

        let statistics = Arc::new(StatisticsRegistry::for_store(&store));
        let dispatcher = Dispatcher::new(
            store.clone(),
            statistics.clone(),
            UnmatchedResponse::from_config(&config.unmatched),
        );
        let api = ApiHandler::new(store, statistics);

        let state = AppState {
            dispatcher,
            max_body_size: config.limits.max_body_size,
        };

        let router = Self::build_router(&config, state, api.clone());
        Self { router, api }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &TroxyConfig, state: AppState, api: ApiHandler) -> Router {
        let mut router = Router::new()
            .route("/{*path}", any(replay_handler))
            .route("/", any(replay_handler))
            .with_state(state);

        if config.admin.enabled {
            router = router.nest(&config.admin.path_prefix, setup_admin_router(api, &config.admin));
        }

        router.layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(propagate_request_id_layer())
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            recordings = self.api.recording_count(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Statistics facade bound to this server.
    pub fn api_handler(&self) -> ApiHandler {
        self.api.clone()
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Replay handler.
/// Buffers the request, then lets the dispatcher match, render and count.
async fn replay_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();

    let request = match buffer_request(request, state.max_body_size).await {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(method = %method, error = %e, "Failed to read request body");
            metrics::record_request(&method, 400, "rejected", start_time);
            return (StatusCode::BAD_REQUEST, "Failed to read request body").into_response();
        }
    };

    tracing::trace!(
        request_id = %request_id(&request),
        path = %request.uri().path(),
        "Replaying request"
    );

    let response = state.dispatcher.handle(&request);

    let outcome = if response.headers().contains_key(X_TROXY_UNMATCHED) {
        "unmatched"
    } else {
        "matched"
    };
    metrics::record_request(&method, response.status().as_u16(), outcome, start_time);

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{parse_recording, RecordingId};
    use tower::ServiceExt;

    fn server(config: TroxyConfig) -> HttpServer {
        let recordings = vec![
            parse_recording(
                RecordingId::new("echo.troxy"),
                "[request]\nmethod = \"POST\"\npath = \"/echo\"\n[request.body]\ncontains = \"ping\"\n[response]\nbody = \"pong\"",
            )
            .unwrap(),
            parse_recording(
                RecordingId::new("root.troxy"),
                "[request]\npath = \"/\"\n[response]\nbody = \"root\"",
            )
            .unwrap(),
        ];
        let store = Arc::new(RecordingStore::from_recordings(recordings).unwrap());
        HttpServer::new(config, store)
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_replays_and_counts() {
        let server = server(TroxyConfig::default());
        let api = server.api_handler();

        let response = server
            .router()
            .oneshot(Request::post("/echo").body(Body::from("ping!")).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(body_text(response).await, "pong");

        let response = server
            .router()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_text(response).await, "root");

        assert_eq!(api.request_counter_per_path()["/echo"], 1);
        assert_eq!(api.request_counter_per_path()["/"], 1);
        assert_eq!(api.request_counter_per_recording()["echo.troxy"], 1);
    }

    #[tokio::test]
    async fn test_unmatched_uses_configured_response() {
        let mut config = TroxyConfig::default();
        config.unmatched.status = 418;
        config.unmatched.body = "no tea".into();
        let server = server(config);

        let response = server
            .router()
            .oneshot(Request::get("/echo").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(body_text(response).await, "no tea");
        assert_eq!(server.api_handler().request_counter_per_recording()["echo.troxy"], 0);
    }

    #[tokio::test]
    async fn test_oversized_body_rejected_and_not_counted() {
        let mut config = TroxyConfig::default();
        config.limits.max_body_size = 4;
        let server = server(config);

        let response = server
            .router()
            .oneshot(Request::post("/echo").body(Body::from("ping ping ping")).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(server.api_handler().request_counter_per_path()["/echo"], 0);
    }

    #[tokio::test]
    async fn test_admin_nested_under_prefix() {
        let server = server(TroxyConfig::default());
        let response = server
            .router()
            .oneshot(Request::get("/troxy/api/statistics/recordings").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_text(response).await,
            r#"{"echo.troxy":0,"root.troxy":0}"#
        );
    }

    #[tokio::test]
    async fn test_admin_can_be_disabled() {
        let mut config = TroxyConfig::default();
        config.admin.enabled = false;
        let server = server(config);
        let response = server
            .router()
            .oneshot(Request::get("/troxy/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.headers()[X_TROXY_UNMATCHED], "true");
    }

    #[tokio::test]
    async fn test_admin_route_takes_precedence_over_recording() {
        let recording = parse_recording(
            RecordingId::new("status.troxy"),
            "[request]\npath = \"/troxy/api/status\"\n[response]\nbody = \"recorded\"",
        )
        .unwrap();
        let store = Arc::new(RecordingStore::from_recordings(vec![recording]).unwrap());

        let server = HttpServer::new(TroxyConfig::default(), store.clone());
        let response = server
            .router()
            .oneshot(Request::get("/troxy/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_ne!(body_text(response).await, "recorded");
        assert_eq!(server.api_handler().request_counter_per_recording()["status.troxy"], 0);

        let mut config = TroxyConfig::default();
        config.admin.enabled = false;
        let server = HttpServer::new(config, store);
        let response = server
            .router()
            .oneshot(Request::get("/troxy/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_text(response).await, "recorded");
    }
}
