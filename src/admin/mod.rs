//! Admin API: statistics read/reset and recording listing.

pub mod api;
pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::get,
    Router,
};
use crate::config::AdminConfig;
use crate::recording::{Recording, RecordingStore};
use self::auth::{admin_auth_middleware, AdminAuth};
use self::handlers::*;

pub use api::{ApiHandler, RecordingSummary};

/// Paths served by the admin router, relative to its prefix.
pub const ADMIN_ROUTES: [&str; 5] = [
    "/status",
    "/recordings",
    "/statistics",
    "/statistics/paths",
    "/statistics/recordings",
];

/// Recordings whose exact path is taken by an admin route and can never be replayed.
pub fn shadowed_recordings<'a>(
    store: &'a RecordingStore,
    config: &AdminConfig,
) -> Vec<&'a Recording> {
    if !config.enabled {
        return Vec::new();
    }
    store
        .iter()
        .filter(|recording| {
            recording.request.exact_path().is_some_and(|path| {
                path.strip_prefix(config.path_prefix.as_str())
                    .is_some_and(|route| ADMIN_ROUTES.iter().any(|admin| *admin == route))
            })
        })
        .collect()
}

/// Build the admin router; the caller nests it under `config.path_prefix`.
pub fn setup_admin_router(api: ApiHandler, config: &AdminConfig) -> Router {
    let auth = AdminAuth::new(config.api_key.as_deref());

    Router::new()
        .route("/status", get(get_status))
        .route("/recordings", get(get_recordings))
        .route("/statistics", get(get_statistics).delete(reset_statistics))
        .route("/statistics/paths", get(get_path_statistics))
        .route("/statistics/recordings", get(get_recording_statistics))
        .layer(middleware::from_fn_with_state(auth, admin_auth_middleware))
        .with_state(api)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{parse_recording, RecordingId, RecordingStore};
    use crate::statistics::StatisticsRegistry;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn api() -> ApiHandler {
        let recording =
            parse_recording(RecordingId::new("a.troxy"), "[request]\npath = \"/a\"").unwrap();
        let store = Arc::new(RecordingStore::from_recordings(vec![recording]).unwrap());
        let statistics = Arc::new(StatisticsRegistry::for_store(&store));
        ApiHandler::new(store, statistics)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_statistics_endpoints() {
        let router = setup_admin_router(api(), &AdminConfig::default());

        let response = router
            .clone()
            .oneshot(Request::get("/statistics/paths").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!({ "/a": 0 }));

        let response = router
            .clone()
            .oneshot(Request::delete("/statistics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = router
            .oneshot(Request::get("/statistics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "per_path": { "/a": 0 }, "per_recording": { "a.troxy": 0 } })
        );
    }

    #[tokio::test]
    async fn test_api_key_enforced() {
        let config = AdminConfig {
            api_key: Some("secret".into()),
            ..AdminConfig::default()
        };
        let router = setup_admin_router(api(), &config);

        let response = router
            .clone()
            .oneshot(Request::get("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router
            .oneshot(
                Request::get("/status")
                    .header("Authorization", "Bearer secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["recordings"], 1);
    }

    #[tokio::test]
    async fn test_every_admin_route_is_served() {
        let router = setup_admin_router(api(), &AdminConfig::default());

        for route in ADMIN_ROUTES {
            let response = router
                .clone()
                .oneshot(Request::get(route).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{route}");
        }
    }

    #[test]
    fn test_shadowed_recordings() {
        let recordings = [
            ("status.troxy", "[request]\npath = \"/troxy/api/status\""),
            ("paths.troxy", "[request]\npath = \"/troxy/api/statistics/paths\""),
            ("other.troxy", "[request]\npath = \"/troxy/api/other\""),
            ("prefix.troxy", "[request]\npath_prefix = \"/troxy/api\""),
            ("plain.troxy", "[request]\npath = \"/status\""),
        ]
        .into_iter()
        .map(|(id, body)| parse_recording(RecordingId::new(id), body).unwrap())
        .collect();
        let store = RecordingStore::from_recordings(recordings).unwrap();

        let ids: Vec<_> = shadowed_recordings(&store, &AdminConfig::default())
            .into_iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["status.troxy", "paths.troxy"]);

        let disabled = AdminConfig {
            enabled: false,
            ..AdminConfig::default()
        };
        assert!(shadowed_recordings(&store, &disabled).is_empty());

        let moved = AdminConfig {
            path_prefix: "/admin".into(),
            ..AdminConfig::default()
        };
        assert!(shadowed_recordings(&store, &moved).is_empty());
    }
}
