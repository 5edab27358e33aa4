//! HTTP handlers for the Identity API
//!
//! - POST /api/v1/auth/register — add a user to the directory
//! - GET  /api/v1/auth/me       — the actor behind the bearer token

use crate::error::{Error, Result};
use crate::identity::{CurrentActor, IdentityResolver, Role, UserStore};
use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Shared state for identity handlers
#[derive(Clone)]
pub struct IdentityState {
    pub resolver: Arc<IdentityResolver>,
    pub users: Arc<UserStore>,
}

impl FromRef<IdentityState> for Arc<IdentityResolver> {
    fn from_ref(state: &IdentityState) -> Self {
        state.resolver.clone()
    }
}

/// Create the identity router
pub fn identity_router(state: IdentityState) -> Router {
    Router::new()
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/me", get(current_actor))
        .with_state(state)
}

/// Registration payload; missing fields are reported as validation errors
#[derive(Debug, Default, Deserialize)]
struct RegisterRequest {
    name: Option<String>,
    email: Option<String>,
}

/// POST /api/v1/auth/register
///
/// Self-registration always yields the `user` role.
async fn register(
    State(state): State<IdentityState>,
    body: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(request) = body
        .map_err(|rejection| Error::Validation(vec![format!("body: {}", rejection.body_text())]))?;

    let user = state
        .users
        .add_user(
            request.name.as_deref().unwrap_or_default(),
            request.email.as_deref().unwrap_or_default(),
            Role::User,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/v1/auth/me
async fn current_actor(CurrentActor(actor): CurrentActor) -> impl IntoResponse {
    Json(actor)
}
