use crate::{
    errors::ServiceError,
    handlers::common::{
        created_response, success_response, JsonBody, PaginatedResponse, PaginationParams,
    },
    services::batch_tracking::{BatchIssue, BatchTrackingFilter, NewBatchTracking},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
    Router,
};

/// Issuances are append-only: no update or delete routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/batch-trackings", get(list_batch_trackings).post(create_batch_tracking))
        .route("/batch-trackings/bulk", post(create_batch_trackings_bulk))
        .route("/batch-trackings/:issue_id", get(get_batch_tracking))
}

#[utoipa::path(
    get,
    path = "/api/v1/batch-trackings",
    params(PaginationParams, BatchTrackingFilter),
    responses(
        (status = 200, description = "Issuances, newest first", body = PaginatedResponse<BatchIssue>)
    ),
    tag = "batch-trackings"
)]
pub async fn list_batch_trackings(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<BatchTrackingFilter>,
) -> Result<Response, ServiceError> {
    let (page, per_page) = state.page(&pagination);
    let issues = state
        .services
        .batch_tracking
        .list(&filter, page, per_page)
        .await?;
    Ok(success_response(PaginatedResponse::from(issues)))
}

#[utoipa::path(
    post,
    path = "/api/v1/batch-trackings",
    request_body = NewBatchTracking,
    responses(
        (status = 201, description = "Material issued and batch recomputed", body = BatchIssue),
        (status = 400, description = "Invalid issue or over-issuance", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown batch", body = crate::errors::ErrorResponse),
        (status = 409, description = "No unique issue id could be allocated", body = crate::errors::ErrorResponse)
    ),
    tag = "batch-trackings"
)]
pub async fn create_batch_tracking(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<NewBatchTracking>,
) -> Result<Response, ServiceError> {
    let issue = state.services.batch_tracking.create(payload).await?;
    Ok(created_response(issue))
}

#[utoipa::path(
    post,
    path = "/api/v1/batch-trackings/bulk",
    request_body = Vec<NewBatchTracking>,
    responses(
        (status = 201, description = "Every issuance recorded", body = Vec<BatchIssue>),
        (status = 400, description = "Nothing was saved; details list each rejected index", body = crate::errors::ErrorResponse)
    ),
    tag = "batch-trackings"
)]
pub async fn create_batch_trackings_bulk(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<Vec<NewBatchTracking>>,
) -> Result<Response, ServiceError> {
    let issues = state.services.batch_tracking.create_bulk(payload).await?;
    Ok(created_response(issues))
}

#[utoipa::path(
    get,
    path = "/api/v1/batch-trackings/:issue_id",
    params(("issue_id" = String, Path, description = "Issue id, e.g. ISSUE-0A1B2C3D")),
    responses(
        (status = 200, description = "Issuance", body = BatchIssue),
        (status = 404, description = "Unknown issue id", body = crate::errors::ErrorResponse)
    ),
    tag = "batch-trackings"
)]
pub async fn get_batch_tracking(
    State(state): State<AppState>,
    Path(issue_id): Path<String>,
) -> Result<Response, ServiceError> {
    let issue = state.services.batch_tracking.get(&issue_id).await?;
    Ok(success_response(issue))
}
