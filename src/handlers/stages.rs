use crate::{
    entities::production_entry,
    errors::{ApiError, ServiceError},
    handlers::common::{created_response, success_response, validate_input, JsonBody},
    services::stage_progress::{
        DepartmentRemaining, NewProductionEntry, ProcessStage, StageRemaining,
    },
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stages/department-remaining", get(department_remaining))
        .route("/stages/:stage/entries", post(record_entry))
        .route("/stages/:stage/remaining", get(stage_remaining))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StageQuery {
    pub batch_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DepartmentQuery {
    pub batch_id: Option<String>,
    pub current_department: Option<String>,
}

fn parse_stage(slug: &str) -> Result<ProcessStage, ApiError> {
    ProcessStage::from_slug(slug).ok_or_else(|| ApiError::NotFound(format!("Unknown stage {}", slug)))
}

#[utoipa::path(
    post,
    path = "/api/v1/stages/:stage/entries",
    params(("stage" = String, Path, description = "Stage slug, e.g. heat-treatment")),
    request_body = NewProductionEntry,
    responses(
        (status = 201, description = "Entry recorded", body = production_entry::Model),
        (status = 400, description = "Invalid entry", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown stage", body = crate::errors::ErrorResponse)
    ),
    tag = "stages"
)]
pub async fn record_entry(
    State(state): State<AppState>,
    Path(stage): Path<String>,
    JsonBody(payload): JsonBody<NewProductionEntry>,
) -> Result<Response, ApiError> {
    let stage = parse_stage(&stage)?;
    validate_input(&payload)?;
    let entry = state
        .services
        .stage_progress
        .record_entry(stage, payload)
        .await?;
    Ok(created_response(entry))
}

#[utoipa::path(
    get,
    path = "/api/v1/stages/:stage/remaining",
    params(("stage" = String, Path, description = "Stage slug"), StageQuery),
    responses(
        (status = 200, description = "Received, entered and remaining pieces", body = StageRemaining),
        (status = 400, description = "Missing batch id", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown stage or batch", body = crate::errors::ErrorResponse)
    ),
    tag = "stages"
)]
pub async fn stage_remaining(
    State(state): State<AppState>,
    Path(stage): Path<String>,
    Query(query): Query<StageQuery>,
) -> Result<Response, ApiError> {
    let stage = parse_stage(&stage)?;
    let batch_id = query
        .batch_id
        .ok_or_else(|| ApiError::BadRequest("Batch ID is required".to_string()))?;
    let remaining = state
        .services
        .stage_progress
        .stage_remaining(stage, &batch_id)
        .await?;
    Ok(success_response(remaining))
}

#[utoipa::path(
    get,
    path = "/api/v1/stages/department-remaining",
    params(DepartmentQuery),
    responses(
        (status = 200, description = "Tagged in minus tagged out for the department", body = DepartmentRemaining),
        (status = 400, description = "Batch id or department missing", body = crate::errors::ErrorResponse)
    ),
    tag = "stages"
)]
pub async fn department_remaining(
    State(state): State<AppState>,
    Query(query): Query<DepartmentQuery>,
) -> Result<Response, ServiceError> {
    let remaining = state
        .services
        .stage_progress
        .department_remaining(query.batch_id.as_deref(), query.current_department.as_deref())
        .await?;
    Ok(success_response(remaining))
}
