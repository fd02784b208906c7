//! HTTP API handlers and routing.

pub mod error;
mod health;
mod request_context;
mod v1;

use axum::{
    http::{header, Method},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Create the main API router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(Any);

    Router::new()
        // Health endpoints
        .merge(health::routes())
        // API v1 routes
        .nest("/v1", v1::routes())
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Application state
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::Request, http::StatusCode};
    use cirrus_id::Region;
    use tower::ServiceExt;

    use super::*;
    use crate::provider::MockProvider;
    use crate::zones::ZoneService;

    fn router() -> Router {
        let provider = Arc::new(MockProvider::dev_default());
        create_router(AppState::new(ZoneService::new(provider, Region::new("dev"))))
    }

    #[tokio::test]
    async fn test_routes_health_and_v1() {
        for (method, uri) in [("GET", "/healthz"), ("GET", "/readyz"), ("GET", "/v1/zones")] {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            let response = router().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/v1/zones/derive")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"volume_attachments": [{"volume_id": ""}]}"#))
            .unwrap();

        let response = router().oneshot(request).await.unwrap();
        assert!(response.status().is_client_error());
    }
}
