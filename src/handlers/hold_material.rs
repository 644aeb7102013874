use crate::{
    entities::hold_material,
    errors::ServiceError,
    handlers::common::{
        created_response, success_response, JsonBody, ListResponse, PaginatedResponse, PaginationParams,
    },
    services::hold_material::{HoldMaterialFilter, HoldPackingDetails, NewHoldMaterial},
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
        .route("/hold-materials", get(list_hold_materials).post(create_hold_material))
        .route("/hold-materials/bulk", post(create_hold_materials_bulk))
        .route("/hold-materials/search", get(search_batches))
        .route("/hold-materials/:batch_id", get(get_hold_material))
        .route("/hold-materials/:batch_id/recompute", post(recompute_hold_material))
        .route("/hold-materials/:batch_id/packing-details", get(packing_details))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// At least two characters of a batch id.
    #[serde(default)]
    pub q: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/hold-materials",
    params(PaginationParams, HoldMaterialFilter),
    responses(
        (status = 200, description = "Hold batches, newest first", body = PaginatedResponse<hold_material::Model>),
        (status = 400, description = "Invalid status filter", body = crate::errors::ErrorResponse)
    ),
    tag = "hold-materials"
)]
pub async fn list_hold_materials(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<HoldMaterialFilter>,
) -> Result<Response, ServiceError> {
    let (page, per_page) = state.page(&pagination);
    let holds = state
        .services
        .hold_material
        .list(&filter, page, per_page)
        .await?;
    Ok(success_response(PaginatedResponse::from(holds)))
}

#[utoipa::path(
    post,
    path = "/api/v1/hold-materials",
    request_body = NewHoldMaterial,
    responses(
        (status = 201, description = "Batch created and lot recomputed", body = hold_material::Model),
        (status = 400, description = "Invalid batch or over-allocation", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown lot", body = crate::errors::ErrorResponse)
    ),
    tag = "hold-materials"
)]
pub async fn create_hold_material(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<NewHoldMaterial>,
) -> Result<Response, ServiceError> {
    let hold = state.services.hold_material.create(payload).await?;
    Ok(created_response(hold))
}

#[utoipa::path(
    post,
    path = "/api/v1/hold-materials/bulk",
    request_body = Vec<NewHoldMaterial>,
    responses(
        (status = 201, description = "Every batch created", body = Vec<hold_material::Model>),
        (status = 400, description = "Nothing was saved; details list each rejected index", body = crate::errors::ErrorResponse)
    ),
    tag = "hold-materials"
)]
pub async fn create_hold_materials_bulk(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<Vec<NewHoldMaterial>>,
) -> Result<Response, ServiceError> {
    let holds = state.services.hold_material.create_bulk(payload).await?;
    Ok(created_response(holds))
}

#[utoipa::path(
    get,
    path = "/api/v1/hold-materials/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Up to ten matching batch ids", body = ListResponse<String>)
    ),
    tag = "hold-materials"
)]
pub async fn search_batches(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, ServiceError> {
    let batch_ids = state.services.hold_material.search(&query.q).await?;
    Ok(success_response(ListResponse::new(batch_ids)))
}

#[utoipa::path(
    get,
    path = "/api/v1/hold-materials/:batch_id",
    params(("batch_id" = String, Path, description = "Batch id, e.g. PP-20250314-AC-01")),
    responses(
        (status = 200, description = "Hold batch", body = hold_material::Model),
        (status = 404, description = "Unknown batch", body = crate::errors::ErrorResponse)
    ),
    tag = "hold-materials"
)]
pub async fn get_hold_material(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
) -> Result<Response, ServiceError> {
    let hold = state.services.hold_material.get(&batch_id).await?;
    Ok(success_response(hold))
}

#[utoipa::path(
    post,
    path = "/api/v1/hold-materials/:batch_id/recompute",
    params(("batch_id" = String, Path, description = "Batch id")),
    responses(
        (status = 200, description = "Counters recomputed from issuances", body = hold_material::Model),
        (status = 404, description = "Unknown batch", body = crate::errors::ErrorResponse)
    ),
    tag = "hold-materials"
)]
pub async fn recompute_hold_material(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
) -> Result<Response, ServiceError> {
    let hold = state.services.hold_material.update_status(&batch_id).await?;
    Ok(success_response(hold))
}

#[utoipa::path(
    get,
    path = "/api/v1/hold-materials/:batch_id/packing-details",
    params(("batch_id" = String, Path, description = "Batch id")),
    responses(
        (status = 200, description = "Component options and stockable pieces", body = HoldPackingDetails),
        (status = 404, description = "Unknown batch", body = crate::errors::ErrorResponse)
    ),
    tag = "hold-materials"
)]
pub async fn packing_details(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
) -> Result<Response, ServiceError> {
    let details = state
        .services
        .hold_material
        .packing_details(&batch_id)
        .await?;
    Ok(success_response(details))
}
