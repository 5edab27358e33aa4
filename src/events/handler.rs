//! HTTP handlers for the Events API
//!
//! Provides 5 REST endpoints, all requiring a bearer token:
//! - GET    /api/v1/events      — search (category / near filters, paginated)
//! - GET    /api/v1/events/:id  — event detail
//! - POST   /api/v1/events      — create event
//! - PUT    /api/v1/events/:id  — partial update (owner or admin)
//! - DELETE /api/v1/events/:id  — delete (owner or admin)

use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::events::lifecycle::EventLifecycle;
use crate::events::query::{EventFilter, QueryEngine};
use crate::events::types::*;
use crate::identity::{CurrentActor, IdentityResolver};
use axum::{
    extract::{rejection::JsonRejection, FromRef, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Shared state for event handlers
#[derive(Clone)]
pub struct EventsState {
    pub lifecycle: Arc<EventLifecycle>,
    pub query: Arc<QueryEngine>,
    pub resolver: Arc<IdentityResolver>,
    pub search: SearchConfig,
}

impl FromRef<EventsState> for Arc<IdentityResolver> {
    fn from_ref(state: &EventsState) -> Self {
        state.resolver.clone()
    }
}

/// Create the events router with all REST endpoints
pub fn events_router(state: EventsState) -> Router {
    Router::new()
        .route("/api/v1/events", get(list_events).post(create_event))
        .route(
            "/api/v1/events/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
        .with_state(state)
}

// =============================================================================
// Query parameter types
// =============================================================================

/// Raw search parameters; parsed by hand so bad values map to `INVALID_FILTER`
#[derive(Debug, Default, Deserialize)]
struct ListEventsQuery {
    category: Option<String>,
    longitude: Option<String>,
    latitude: Option<String>,
    page: Option<String>,
    #[serde(rename = "perPage")]
    per_page: Option<String>,
}

fn parse_positive(name: &str, raw: Option<&str>) -> Result<Option<u64>> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v
            .parse::<u64>()
            .ok()
            .filter(|n| *n > 0)
            .map(Some)
            .ok_or_else(|| Error::InvalidFilter(format!("{} must be a positive integer", name))),
    }
}

fn body_error(rejection: JsonRejection) -> Error {
    Error::Validation(vec![format!("body: {}", rejection.body_text())])
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/v1/events
async fn list_events(
    State(state): State<EventsState>,
    CurrentActor(_actor): CurrentActor,
    Query(params): Query<ListEventsQuery>,
) -> Result<impl IntoResponse> {
    let filter = EventFilter::from_params(
        params.category.as_deref(),
        params.longitude.as_deref(),
        params.latitude.as_deref(),
    )?;
    let page = parse_positive("page", params.page.as_deref())?.unwrap_or(1);
    let per_page = parse_positive("perPage", params.per_page.as_deref())?
        .unwrap_or(state.search.default_per_page)
        .min(state.search.max_per_page);

    let results = state.query.search(&filter).await?;
    Ok(Json(results.page(page, per_page)))
}

/// GET /api/v1/events/:id
async fn get_event(
    State(state): State<EventsState>,
    CurrentActor(_actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let event = state.lifecycle.get(&id).await?;
    Ok(Json(event))
}

/// POST /api/v1/events
async fn create_event(
    State(state): State<EventsState>,
    CurrentActor(actor): CurrentActor,
    body: std::result::Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(request) = body.map_err(body_error)?;
    let event = state.lifecycle.create(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// PUT /api/v1/events/:id
async fn update_event(
    State(state): State<EventsState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    body: std::result::Result<Json<UpdateEventRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(patch) = body.map_err(body_error)?;
    let event = state.lifecycle.update(&actor, &id, patch).await?;
    Ok(Json(event))
}

/// DELETE /api/v1/events/:id
async fn delete_event(
    State(state): State<EventsState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state.lifecycle.delete(&actor, &id).await?;
    Ok(Json(MessageResponse {
        message: format!("Event {} deleted", id),
    }))
}
