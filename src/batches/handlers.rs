// HTTP handlers for batch endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::batches::{AdvanceBatchRequest, AssignDriverRequest, Batch, BatchFilter, MetricsSummary};
use crate::error::{ApiError, ErrorResponse};
use crate::AppState;

/// Handler for GET /api/batches
/// Lists batches, optionally filtered by key fields and status
#[utoipa::path(
    get,
    path = "/api/batches",
    params(BatchFilter),
    responses(
        (status = 200, description = "Matching batches ordered by key", body = Vec<Batch>)
    ),
    tag = "batches"
)]
pub async fn list_batches_handler(
    State(state): State<AppState>,
    Query(filter): Query<BatchFilter>,
) -> Result<Json<Vec<Batch>>, ApiError> {
    let batches = state.batches.list_batches(&filter)?;
    Ok(Json(batches))
}

/// Handler for GET /api/batches/{id}
#[utoipa::path(
    get,
    path = "/api/batches/{id}",
    params(
        ("id" = Uuid, Path, description = "Batch ID")
    ),
    responses(
        (status = 200, description = "Batch found", body = Batch),
        (status = 404, description = "Batch not found", body = ErrorResponse)
    ),
    tag = "batches"
)]
pub async fn get_batch_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Batch>, ApiError> {
    let batch = state.batches.get_batch(id)?;
    Ok(Json(batch))
}

/// Handler for POST /api/batches/{id}/advance
/// Moves a batch one step along its lifecycle
#[utoipa::path(
    post,
    path = "/api/batches/{id}/advance",
    params(
        ("id" = Uuid, Path, description = "Batch ID")
    ),
    request_body = AdvanceBatchRequest,
    responses(
        (status = 200, description = "Batch advanced", body = Batch),
        (status = 404, description = "Batch not found", body = ErrorResponse),
        (status = 409, description = "Transition not allowed", body = ErrorResponse)
    ),
    tag = "batches"
)]
pub async fn advance_batch_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AdvanceBatchRequest>,
) -> Result<Json<Batch>, ApiError> {
    tracing::debug!("Advancing batch {} to {}", id, request.status);
    let batch = state.batches.advance_batch(id, request.status)?;
    Ok(Json(batch))
}

/// Handler for PUT /api/batches/{id}/driver
/// Records the driver and van for an assigned batch
#[utoipa::path(
    put,
    path = "/api/batches/{id}/driver",
    params(
        ("id" = Uuid, Path, description = "Batch ID")
    ),
    request_body = AssignDriverRequest,
    responses(
        (status = 200, description = "Driver recorded", body = Batch),
        (status = 400, description = "Invalid driver details", body = ErrorResponse),
        (status = 404, description = "Batch not found", body = ErrorResponse),
        (status = 409, description = "Batch is not assigned yet", body = ErrorResponse)
    ),
    tag = "batches"
)]
pub async fn assign_driver_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignDriverRequest>,
) -> Result<Json<Batch>, ApiError> {
    request.validate()?;

    let batch = state
        .batches
        .assign_driver(id, &request.driver_name, &request.van_number)?;
    Ok(Json(batch))
}

/// Handler for GET /api/metrics
/// Returns the batch aggregator counters
#[utoipa::path(
    get,
    path = "/api/metrics",
    responses(
        (status = 200, description = "Aggregator counters", body = MetricsSummary)
    ),
    tag = "batches"
)]
pub async fn metrics_handler(State(state): State<AppState>) -> Json<MetricsSummary> {
    Json(state.batches.metrics().summary())
}
