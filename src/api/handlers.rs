use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::indexing::{RunMode, RunSnapshot, RunStatus};
use crate::metrics::gather_metrics;
use crate::models::*;
use crate::search::{FacetedResult, SearchRequest};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        site: state.synchronizer.site().to_string(),
        indexing: state.synchronizer.runs().is_running(),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub site: String,
    pub indexing: bool,
}

/// Prometheus text exposition
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        gather_metrics(),
    )
}

/// Run a faceted search; engine failures degrade to an empty result
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<FacetedResult>> {
    request.validate()?;
    Ok(Json(state.search.search(&request).await))
}

pub async fn list_fields(State(state): State<AppState>) -> Result<Json<Vec<Field>>> {
    Ok(Json(state.store.list_fields().await?))
}

pub async fn create_field(
    State(state): State<AppState>,
    Json(mut field): Json<Field>,
) -> Result<(StatusCode, Json<Field>)> {
    field.validate()?;

    if state.registries.fields.snapshot().find(&field.name).is_some() {
        return Err(AppError::Conflict(format!("Field {} already exists", field.name)));
    }

    field.id = 0;
    let created = state.store.create_field(&field).await?;
    state.registries.reload().await?;

    tracing::info!(field_id = created.id, name = %created.name, "Field created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_field(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(mut field): Json<Field>,
) -> Result<Json<Field>> {
    field.validate()?;

    let clash = state
        .registries
        .fields
        .snapshot()
        .find(&field.name)
        .is_some_and(|existing| existing.id != id);
    if clash {
        return Err(AppError::Conflict(format!("Field {} already exists", field.name)));
    }

    field.id = id;
    state.store.update_field(&field).await?;
    state.registries.reload().await?;

    Ok(Json(field))
}

pub async fn delete_field(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode> {
    state.store.delete_field(id).await?;
    state.registries.reload().await?;

    tracing::info!(field_id = id, "Field deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Intersections resolved to field names
pub async fn list_intersections(State(state): State<AppState>) -> Result<Json<Vec<FacetPair>>> {
    Ok(Json(state.registries.intersections.intersections().as_ref().clone()))
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateIntersectionRequest {
    pub field1_id: u64,
    pub field2_id: u64,
}

pub async fn create_intersection(
    State(state): State<AppState>,
    Json(request): Json<CreateIntersectionRequest>,
) -> Result<(StatusCode, Json<FacetIntersection>)> {
    let fields = state.registries.fields.snapshot();
    for field_id in [request.field1_id, request.field2_id] {
        if fields.find_by_id(field_id).is_none() {
            return Err(AppError::Validation(format!("Unknown field id {}", field_id)));
        }
    }
    if request.field1_id == request.field2_id {
        return Err(AppError::Validation(
            "An intersection needs two distinct fields".to_string(),
        ));
    }

    let created = state
        .store
        .create_intersection(&FacetIntersection::new(request.field1_id, request.field2_id))
        .await?;
    state.registries.reload().await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_intersection(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode> {
    state.store.delete_intersection(id).await?;
    state.registries.reload().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Record a content change for the next incremental run
pub async fn notify_change(
    State(state): State<AppState>,
    Json(change): Json<ContentChange>,
) -> Result<(StatusCode, Json<IndexerAction>)> {
    let action = state.queue().notify(&change).await?;
    Ok((StatusCode::ACCEPTED, Json(action)))
}

pub async fn list_actions(State(state): State<AppState>) -> Result<Json<Vec<IndexerAction>>> {
    Ok(Json(state.queue().pending().await?))
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RunIndexingRequest {
    #[serde(default)]
    pub full: bool,
}

/// Start a background run; 409 while another run is active
pub async fn start_indexing(
    State(state): State<AppState>,
    request: Option<Json<RunIndexingRequest>>,
) -> Result<(StatusCode, Json<RunSnapshot>)> {
    let Json(request) = request.unwrap_or_default();
    let handle = state.synchronizer.spawn(RunMode::from_full_flag(request.full))?;
    Ok((StatusCode::ACCEPTED, Json(handle.snapshot())))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IndexingStatusResponse {
    #[serde(flatten)]
    pub status: RunStatus,
    pub pending_actions: usize,
}

pub async fn indexing_status(State(state): State<AppState>) -> Result<Json<IndexingStatusResponse>> {
    let pending_actions = state.queue().pending().await?.len();
    Ok(Json(IndexingStatusResponse {
        status: state.synchronizer.runs().status(),
        pending_actions,
    }))
}
