//! Plant ledger API library
//!
//! Tracks raw material from intake (RM receiving) through hold batches and
//! issuance, the packing-area IN/OUT ledger, and shop-floor stage progress.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod ledger;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{http::HeaderValue, response::Json, routing::get, Router};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::handlers::common::PaginationParams;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub event_sender: Arc<EventSender>,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: AppConfig, event_sender: Arc<EventSender>) -> Self {
        let services = handlers::AppServices::new(db.clone(), event_sender.clone(), &config);
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }

    /// Page number and size for a listing, bounded by the configured page sizes.
    pub fn page(&self, params: &PaginationParams) -> (u64, u64) {
        params.resolve(
            self.config.api_default_page_size,
            self.config.api_max_page_size,
        )
    }
}

pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .merge(handlers::rm_receiving::router())
        .merge(handlers::hold_material::router())
        .merge(handlers::batch_tracking::router())
        .merge(handlers::packing_area::router())
        .merge(handlers::stages::router())
        .merge(handlers::tags::router())
        .merge(handlers::masterlist::router())
        .merge(handlers::reconcile::router())
}

async fn api_status() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "plant-ledger-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// CORS policy from config: explicit origins win, otherwise permissive when
/// allowed, otherwise an error.
pub fn cors_layer(cfg: &AppConfig) -> Result<CorsLayer, String> {
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    if let Some(origins) = configured_origins {
        Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_credentials(cfg.cors_allow_credentials))
    } else if cfg.should_allow_permissive_cors() {
        ::tracing::info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        Ok(CorsLayer::permissive())
    } else {
        Err("Missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true".into())
    }
}

/// Full application router: health, the v1 API and Swagger UI, wrapped in
/// tracing, compression, timeout, CORS and request-id layers.
pub fn build_router(state: AppState) -> Result<Router, String> {
    let cors = cors_layer(&state.config)?;
    let timeout = state.config.request_timeout();

    Ok(Router::<AppState>::new()
        .route("/", get(|| async { "plant-ledger-api up" }))
        .nest("/health", handlers::health::health_routes())
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
        // Outermost so every span and error body sees the request id
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state))
}
