use crate::{
    errors::ServiceError,
    handlers::common::success_response,
    services::reconciliation::{ReconcileAllReport, ReconcileReport},
    AppState,
};
use axum::{extract::State, response::Response, routing::post, Router};

/// Admin sweeps that re-derive cached counters from their children.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reconcile", post(reconcile_all))
        .route("/reconcile/hold-materials", post(reconcile_hold_materials))
        .route("/reconcile/rm-receivings", post(reconcile_rm_receivings))
}

#[utoipa::path(
    post,
    path = "/api/v1/reconcile",
    responses(
        (status = 200, description = "Hold batches swept first, then lots", body = ReconcileAllReport)
    ),
    tag = "reconciliation"
)]
pub async fn reconcile_all(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let report = state.services.reconciliation.reconcile_all().await?;
    Ok(success_response(report))
}

#[utoipa::path(
    post,
    path = "/api/v1/reconcile/hold-materials",
    responses(
        (status = 200, description = "Hold batch sweep report", body = ReconcileReport)
    ),
    tag = "reconciliation"
)]
pub async fn reconcile_hold_materials(
    State(state): State<AppState>,
) -> Result<Response, ServiceError> {
    let report = state
        .services
        .reconciliation
        .reconcile_hold_materials()
        .await?;
    Ok(success_response(report))
}

#[utoipa::path(
    post,
    path = "/api/v1/reconcile/rm-receivings",
    responses(
        (status = 200, description = "Lot sweep report, including heat numbers lowercased", body = ReconcileReport)
    ),
    tag = "reconciliation"
)]
pub async fn reconcile_rm_receivings(
    State(state): State<AppState>,
) -> Result<Response, ServiceError> {
    let report = state
        .services
        .reconciliation
        .reconcile_rm_receivings()
        .await?;
    Ok(success_response(report))
}
