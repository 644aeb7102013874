use crate::{
    entities::masterlist,
    errors::{ApiError, ServiceError},
    handlers::common::{success_response, ListResponse, PaginatedResponse, PaginationParams},
    services::masterlist::{ComponentOptions, OperationTarget},
    AppState,
};
use axum::{
    extract::{Query, State},
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/masterlist", get(list_components))
        .route("/masterlist/suggest", get(suggest_components))
        .route("/masterlist/children", get(child_components))
        .route("/masterlist/operation-target", get(operation_target))
        .route("/masterlist/component-options", get(component_options))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SuggestQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChildrenQuery {
    pub parent_component: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TargetQuery {
    #[serde(default)]
    pub component: String,
    /// `I` or `II`.
    #[serde(default)]
    pub setup: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ComponentQuery {
    pub component: Option<String>,
}

fn required(value: Option<String>, message: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(message.to_string()))
}

#[utoipa::path(
    get,
    path = "/api/v1/masterlist",
    params(PaginationParams),
    responses((status = 200, description = "Catalog entries by component", body = PaginatedResponse<masterlist::Model>)),
    tag = "masterlist"
)]
pub async fn list_components(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, ServiceError> {
    let (page, per_page) = state.page(&pagination);
    let components = state.services.masterlist.list(page, per_page).await?;
    Ok(success_response(PaginatedResponse::from(components)))
}

#[utoipa::path(
    get,
    path = "/api/v1/masterlist/suggest",
    params(SuggestQuery),
    responses((status = 200, description = "Up to ten component names", body = ListResponse<String>)),
    tag = "masterlist"
)]
pub async fn suggest_components(
    State(state): State<AppState>,
    Query(query): Query<SuggestQuery>,
) -> Result<Response, ServiceError> {
    let names = state.services.masterlist.suggest(&query.q).await?;
    Ok(success_response(ListResponse::new(names)))
}

#[utoipa::path(
    get,
    path = "/api/v1/masterlist/children",
    params(ChildrenQuery),
    responses(
        (status = 200, description = "Parent followed by its children", body = ListResponse<String>),
        (status = 400, description = "Parent component missing", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown parent", body = crate::errors::ErrorResponse)
    ),
    tag = "masterlist"
)]
pub async fn child_components(
    State(state): State<AppState>,
    Query(query): Query<ChildrenQuery>,
) -> Result<Response, ApiError> {
    let parent = required(query.parent_component, "Parent component is required")?;
    let components = state.services.masterlist.child_components(&parent).await?;
    Ok(success_response(ListResponse::new(components)))
}

#[utoipa::path(
    get,
    path = "/api/v1/masterlist/operation-target",
    params(TargetQuery),
    responses(
        (status = 200, description = "Machining target for the setup", body = OperationTarget),
        (status = 400, description = "Setup is not I or II", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown component", body = crate::errors::ErrorResponse)
    ),
    tag = "masterlist"
)]
pub async fn operation_target(
    State(state): State<AppState>,
    Query(query): Query<TargetQuery>,
) -> Result<Response, ServiceError> {
    let target = state
        .services
        .masterlist
        .operation_target(&query.component, &query.setup)
        .await?;
    Ok(success_response(target))
}

#[utoipa::path(
    get,
    path = "/api/v1/masterlist/component-options",
    params(ComponentQuery),
    responses(
        (status = 200, description = "Parent/child family of the component", body = ComponentOptions),
        (status = 400, description = "Component missing", body = crate::errors::ErrorResponse)
    ),
    tag = "masterlist"
)]
pub async fn component_options(
    State(state): State<AppState>,
    Query(query): Query<ComponentQuery>,
) -> Result<Response, ApiError> {
    let component = required(query.component, "Component is required")?;
    let options = state
        .services
        .masterlist
        .component_options(&component)
        .await?;
    Ok(success_response(options))
}
