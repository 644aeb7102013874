use crate::{
    entities::rm_receiving,
    errors::ServiceError,
    handlers::common::{
        created_response, success_response, JsonBody, PaginatedResponse, PaginationParams,
    },
    services::rm_receiving::{NewRmReceiving, RmReceivingFilter, UpdateRmReceiving},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rm-receivings", get(list_rm_receivings).post(create_rm_receiving))
        .route("/rm-receivings/bulk", post(create_rm_receivings_bulk))
        .route(
            "/rm-receivings/:uid",
            get(get_rm_receiving).patch(update_rm_receiving),
        )
        .route("/rm-receivings/:uid/recompute", post(recompute_rm_receiving))
}

#[utoipa::path(
    get,
    path = "/api/v1/rm-receivings",
    params(PaginationParams, RmReceivingFilter),
    responses(
        (status = 200, description = "Raw material lots, newest first", body = PaginatedResponse<rm_receiving::Model>),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse)
    ),
    tag = "rm-receivings"
)]
pub async fn list_rm_receivings(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<RmReceivingFilter>,
) -> Result<Response, ServiceError> {
    let (page, per_page) = state.page(&pagination);
    let lots = state
        .services
        .rm_receiving
        .list(&filter, page, per_page)
        .await?;
    Ok(success_response(PaginatedResponse::from(lots)))
}

#[utoipa::path(
    post,
    path = "/api/v1/rm-receivings",
    request_body = NewRmReceiving,
    responses(
        (status = 201, description = "Lot received", body = rm_receiving::Model),
        (status = 400, description = "Invalid lot", body = crate::errors::ErrorResponse)
    ),
    tag = "rm-receivings"
)]
pub async fn create_rm_receiving(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<NewRmReceiving>,
) -> Result<Response, ServiceError> {
    let lot = state.services.rm_receiving.create(payload).await?;
    Ok(created_response(lot))
}

#[utoipa::path(
    post,
    path = "/api/v1/rm-receivings/bulk",
    request_body = Vec<NewRmReceiving>,
    responses(
        (status = 201, description = "Every lot received", body = Vec<rm_receiving::Model>),
        (status = 400, description = "Nothing was saved; details list each rejected index", body = crate::errors::ErrorResponse)
    ),
    tag = "rm-receivings"
)]
pub async fn create_rm_receivings_bulk(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<Vec<NewRmReceiving>>,
) -> Result<Response, ServiceError> {
    let lots = state.services.rm_receiving.create_bulk(payload).await?;
    Ok(created_response(lots))
}

#[utoipa::path(
    get,
    path = "/api/v1/rm-receivings/:uid",
    params(("uid" = Uuid, Path, description = "Lot UID")),
    responses(
        (status = 200, description = "Lot", body = rm_receiving::Model),
        (status = 404, description = "Unknown lot", body = crate::errors::ErrorResponse)
    ),
    tag = "rm-receivings"
)]
pub async fn get_rm_receiving(
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let lot = state.services.rm_receiving.get(uid).await?;
    Ok(success_response(lot))
}

#[utoipa::path(
    patch,
    path = "/api/v1/rm-receivings/:uid",
    params(("uid" = Uuid, Path, description = "Lot UID")),
    request_body = UpdateRmReceiving,
    responses(
        (status = 200, description = "Lot updated", body = rm_receiving::Model),
        (status = 400, description = "Read-only or invalid field", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown lot", body = crate::errors::ErrorResponse)
    ),
    tag = "rm-receivings"
)]
pub async fn update_rm_receiving(
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateRmReceiving>,
) -> Result<Response, ServiceError> {
    let lot = state.services.rm_receiving.update(uid, payload).await?;
    Ok(success_response(lot))
}

#[utoipa::path(
    post,
    path = "/api/v1/rm-receivings/:uid/recompute",
    params(("uid" = Uuid, Path, description = "Lot UID")),
    responses(
        (status = 200, description = "Counters recomputed from holds", body = rm_receiving::Model),
        (status = 404, description = "Unknown lot", body = crate::errors::ErrorResponse)
    ),
    tag = "rm-receivings"
)]
pub async fn recompute_rm_receiving(
    State(state): State<AppState>,
    Path(uid): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let lot = state.services.rm_receiving.update_status(uid).await?;
    Ok(success_response(lot))
}
