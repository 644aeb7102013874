use crate::{
    entities::packing_location,
    errors::ServiceError,
    handlers::common::{
        created_response, success_response, JsonBody, ListResponse, PaginatedResponse, PaginationParams,
    },
    ledger::StockDirection,
    services::packing_area::{
        AvailableMaterial, InventoryFilter, InventorySummary, LocationStock, MovementView,
        NewLocation, StockMovement,
    },
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
    Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/packing/locations", get(list_locations).post(create_location))
        .route("/packing/locations/:id/available", get(available_for_location))
        .route("/packing/location-summary/:code", get(location_summary))
        .route("/packing/stock-in", post(stock_in))
        .route("/packing/stock-out", post(stock_out))
        .route("/packing/inventory-summary", get(inventory_summary))
        .route("/packing/in-history", get(in_history))
        .route("/packing/out-history", get(out_history))
        .route("/packing/component-options", get(component_filter_options))
}

#[utoipa::path(
    get,
    path = "/api/v1/packing/locations",
    responses((status = 200, description = "Locations ordered by code", body = ListResponse<packing_location::Model>)),
    tag = "packing"
)]
pub async fn list_locations(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let locations = state.services.packing_area.list_locations().await?;
    Ok(success_response(ListResponse::new(locations)))
}

#[utoipa::path(
    post,
    path = "/api/v1/packing/locations",
    request_body = NewLocation,
    responses(
        (status = 201, description = "Location created", body = packing_location::Model),
        (status = 400, description = "Blank code", body = crate::errors::ErrorResponse),
        (status = 409, description = "Code already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "packing"
)]
pub async fn create_location(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<NewLocation>,
) -> Result<Response, ServiceError> {
    let location = state.services.packing_area.create_location(payload).await?;
    Ok(created_response(location))
}

#[utoipa::path(
    get,
    path = "/api/v1/packing/locations/:id/available",
    params(("id" = i32, Path, description = "Location id")),
    responses(
        (status = 200, description = "Materials with stock in the location", body = ListResponse<AvailableMaterial>),
        (status = 404, description = "Unknown location", body = crate::errors::ErrorResponse)
    ),
    tag = "packing"
)]
pub async fn available_for_location(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let rows = state.services.packing_area.available_for_location(id).await?;
    Ok(success_response(ListResponse::new(rows)))
}

#[utoipa::path(
    get,
    path = "/api/v1/packing/location-summary/:code",
    params(("code" = String, Path, description = "Location code")),
    responses(
        (status = 200, description = "Stock on hand at the location", body = ListResponse<LocationStock>),
        (status = 404, description = "Unknown location", body = crate::errors::ErrorResponse)
    ),
    tag = "packing"
)]
pub async fn location_summary(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response, ServiceError> {
    let rows = state.services.packing_area.location_summary(&code).await?;
    Ok(success_response(ListResponse::new(rows)))
}

#[utoipa::path(
    post,
    path = "/api/v1/packing/stock-in",
    request_body = StockMovement,
    responses(
        (status = 201, description = "IN recorded", body = MovementView),
        (status = 400, description = "Quantity exceeds the batch's pieces", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown material or location", body = crate::errors::ErrorResponse)
    ),
    tag = "packing"
)]
pub async fn stock_in(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<StockMovement>,
) -> Result<Response, ServiceError> {
    let movement = state.services.packing_area.stock_in(payload).await?;
    Ok(created_response(movement))
}

#[utoipa::path(
    post,
    path = "/api/v1/packing/stock-out",
    request_body = StockMovement,
    responses(
        (status = 201, description = "OUT recorded", body = MovementView),
        (status = 400, description = "Not enough stock at the location", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown material or location", body = crate::errors::ErrorResponse)
    ),
    tag = "packing"
)]
pub async fn stock_out(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<StockMovement>,
) -> Result<Response, ServiceError> {
    let movement = state.services.packing_area.stock_out(payload).await?;
    Ok(created_response(movement))
}

#[utoipa::path(
    get,
    path = "/api/v1/packing/inventory-summary",
    params(InventoryFilter),
    responses((status = 200, description = "Stock by material and location with weight totals", body = InventorySummary)),
    tag = "packing"
)]
pub async fn inventory_summary(
    State(state): State<AppState>,
    Query(filter): Query<InventoryFilter>,
) -> Result<Response, ServiceError> {
    let summary = state.services.packing_area.inventory_summary(&filter).await?;
    Ok(success_response(summary))
}

async fn history(
    state: AppState,
    direction: StockDirection,
    pagination: PaginationParams,
) -> Result<Response, ServiceError> {
    let (page, per_page) = state.page(&pagination);
    let rows = state
        .services
        .packing_area
        .history(direction, page, per_page)
        .await?;
    Ok(success_response(PaginatedResponse::from(rows)))
}

#[utoipa::path(
    get,
    path = "/api/v1/packing/in-history",
    params(PaginationParams),
    responses((status = 200, description = "IN entries, newest first", body = PaginatedResponse<MovementView>)),
    tag = "packing"
)]
pub async fn in_history(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, ServiceError> {
    history(state, StockDirection::In, pagination).await
}

#[utoipa::path(
    get,
    path = "/api/v1/packing/out-history",
    params(PaginationParams),
    responses((status = 200, description = "OUT entries, newest first", body = PaginatedResponse<MovementView>)),
    tag = "packing"
)]
pub async fn out_history(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, ServiceError> {
    history(state, StockDirection::Out, pagination).await
}

#[utoipa::path(
    get,
    path = "/api/v1/packing/component-options",
    responses((status = 200, description = "Catalogued component names", body = ListResponse<String>)),
    tag = "packing"
)]
pub async fn component_filter_options(
    State(state): State<AppState>,
) -> Result<Response, ServiceError> {
    let components = state.services.packing_area.component_filter_options().await?;
    Ok(success_response(ListResponse::new(components)))
}
