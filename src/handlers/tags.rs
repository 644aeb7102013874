use crate::{
    entities::process_tag,
    errors::ServiceError,
    handlers::common::{created_response, success_response, JsonBody, ListResponse},
    services::tags::{NewProcessTag, ProceedCheck},
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
        .route("/tags", post(create_tag))
        .route("/tags/recent", get(recent_tags))
        .route("/tags/:tag_uid", get(get_tag))
        .route("/tags/:tag_uid/print", post(mark_printed))
        .route("/tags/:tag_uid/can-proceed", get(can_proceed))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentQuery {
    /// Defaults to 20.
    pub limit: Option<u64>,
}

#[utoipa::path(
    post,
    path = "/api/v1/tags",
    request_body = NewProcessTag,
    responses(
        (status = 201, description = "Tag generated", body = process_tag::Model),
        (status = 400, description = "Invalid tag or quantity not available", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown batch", body = crate::errors::ErrorResponse)
    ),
    tag = "tags"
)]
pub async fn create_tag(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<NewProcessTag>,
) -> Result<Response, ServiceError> {
    let tag = state.services.tags.create(payload).await?;
    Ok(created_response(tag))
}

#[utoipa::path(
    get,
    path = "/api/v1/tags/recent",
    params(RecentQuery),
    responses((status = 200, description = "Newest tags first", body = ListResponse<process_tag::Model>)),
    tag = "tags"
)]
pub async fn recent_tags(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Response, ServiceError> {
    let tags = state.services.tags.recent(query.limit).await?;
    Ok(success_response(ListResponse::new(tags)))
}

#[utoipa::path(
    get,
    path = "/api/v1/tags/:tag_uid",
    params(("tag_uid" = String, Path, description = "Tag UID, e.g. 25030001")),
    responses(
        (status = 200, description = "Tag", body = process_tag::Model),
        (status = 404, description = "Unknown tag", body = crate::errors::ErrorResponse)
    ),
    tag = "tags"
)]
pub async fn get_tag(
    State(state): State<AppState>,
    Path(tag_uid): Path<String>,
) -> Result<Response, ServiceError> {
    let tag = state.services.tags.get(&tag_uid).await?;
    Ok(success_response(tag))
}

#[utoipa::path(
    post,
    path = "/api/v1/tags/:tag_uid/print",
    params(("tag_uid" = String, Path, description = "Tag UID")),
    responses(
        (status = 200, description = "Tag marked printed", body = process_tag::Model),
        (status = 404, description = "Unknown tag", body = crate::errors::ErrorResponse)
    ),
    tag = "tags"
)]
pub async fn mark_printed(
    State(state): State<AppState>,
    Path(tag_uid): Path<String>,
) -> Result<Response, ServiceError> {
    let tag = state.services.tags.mark_printed(&tag_uid).await?;
    Ok(success_response(tag))
}

#[utoipa::path(
    get,
    path = "/api/v1/tags/:tag_uid/can-proceed",
    params(("tag_uid" = String, Path, description = "Tag UID")),
    responses(
        (status = 200, description = "Whether the tagged quantity may move on", body = ProceedCheck),
        (status = 404, description = "Unknown tag", body = crate::errors::ErrorResponse)
    ),
    tag = "tags"
)]
pub async fn can_proceed(
    State(state): State<AppState>,
    Path(tag_uid): Path<String>,
) -> Result<Response, ServiceError> {
    let check = state.services.tags.can_proceed(&tag_uid).await?;
    Ok(success_response(check))
}
