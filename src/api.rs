//! Unified API router for EventDesk
//!
//! Merges the module routers into a single axum `Router` with CORS and
//! request tracing.
//!
//! ## Endpoint Map
//!
//! | Prefix              | Module   | Description                      |
//! |---------------------|----------|----------------------------------|
//! | `/health`           | api      | Load balancer health probe       |
//! | `/api/v1/auth/*`    | identity | Registration, current actor      |
//! | `/api/v1/events/*`  | events   | Event search and lifecycle       |

use crate::events::{events_router, EventsState};
use crate::identity::{identity_router, IdentityState};
use axum::{
    http::{header, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the complete EventDesk HTTP application
///
/// Merges all module routers, adds CORS and tracing middleware, and returns
/// a single `Router` ready to be served by `axum::serve`.
pub fn build_app(
    identity_state: IdentityState,
    events_state: EventsState,
    cors_origins: &[String],
) -> Router {
    let cors = build_cors(cors_origins);

    Router::new()
        .route("/health", get(health_check))
        .merge(identity_router(identity_state))
        .merge(events_router(events_state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// CORS
// =============================================================================

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let parsed: Vec<_> = origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::events::{EventLifecycle, JsonEventStore, OwnershipGuard, QueryEngine};
    use crate::identity::{IdentityResolver, JwtService, Role, UserStore};
    use crate::notify::NotificationDispatcher;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_check() {
        let resp = health_check().await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn test_build_cors_empty_origins() {
        let _cors = build_cors(&[]);
    }

    #[test]
    fn test_build_cors_with_origins() {
        let _cors = build_cors(&[
            "http://localhost:3000".to_string(),
            "https://app.example.com".to_string(),
        ]);
    }

    #[tokio::test]
    async fn test_build_app_serves_all_modules() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonEventStore::new(dir.path().join("events")).await.unwrap());
        let users = Arc::new(UserStore::new(dir.path().join("users")).await.unwrap());
        let user = users
            .add_user("Alice", "alice@example.com", Role::User)
            .await
            .unwrap();
        let jwt = Arc::new(JwtService::new("test-secret", "eventdesk"));
        let token = jwt.issue(&user, chrono::Duration::hours(1)).unwrap();
        let resolver = Arc::new(IdentityResolver::new(jwt, users.clone()));

        let identity = IdentityState {
            resolver: resolver.clone(),
            users,
        };
        let state = EventsState {
            lifecycle: Arc::new(EventLifecycle::new(
                store.clone(),
                OwnershipGuard::default(),
                NotificationDispatcher::disabled(),
            )),
            query: Arc::new(QueryEngine::new(store, 50_000.0)),
            resolver,
            search: SearchConfig::default(),
        };
        let app = build_app(identity, state, &[]);

        for uri in ["/health", "/api/v1/auth/me", "/api/v1/events"] {
            let resp = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri(uri)
                        .header("authorization", format!("Bearer {}", token))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
        }
    }
}
