#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::Utc;
use plant_ledger_api::{
    build_router,
    config::AppConfig,
    db,
    entities::masterlist,
    events::{self, EventSender},
    AppState,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Application backed by a fresh SQLite file that lives as long as the harness.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let db_path = dir.path().join("ledger_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.cors_allow_any_origin = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(Arc::new(pool), cfg, Arc::new(EventSender::new(event_tx)));
        let router = build_router(state.clone()).expect("router");

        Self {
            router,
            state,
            _event_task: event_task,
            _dir: dir,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        self.router
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("router response")
    }

    /// Sends `body` verbatim, for payloads that are not valid JSON.
    pub async fn post_raw(&self, uri: &str, content_type: Option<&str>, body: &str) -> Response {
        let mut builder = Request::builder().method(Method::POST).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::from(body.to_string())).expect("request"))
            .await
            .expect("router response")
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> Response {
        self.request(Method::POST, uri, Some(body)).await
    }

    /// POSTs and asserts the expected status, returning the JSON body.
    pub async fn post_expect(&self, uri: &str, body: Value, status: StatusCode) -> Value {
        let response = self.post(uri, body).await;
        let actual = response.status();
        let json = response_json(response).await;
        assert_eq!(actual, status, "POST {} returned {}", uri, json);
        json
    }

    pub async fn get_expect(&self, uri: &str, status: StatusCode) -> Value {
        let response = self.get(uri).await;
        let actual = response.status();
        let json = response_json(response).await;
        assert_eq!(actual, status, "GET {} returned {}", uri, json);
        json
    }

    /// Receives a lot and returns it.
    pub async fn receive_lot(&self, weight_kg: &str) -> Value {
        self.post_expect(
            "/api/v1/rm-receivings",
            lot_payload(weight_kg),
            StatusCode::CREATED,
        )
        .await
    }

    /// Creates a hold batch of `qty_kg` from the lot `uid`.
    pub async fn hold_from(&self, uid: &str, qty_kg: &str, pieces: i32) -> Value {
        self.post_expect(
            "/api/v1/hold-materials",
            json!({
                "rm_receiving": uid,
                "component": "FL-100",
                "customer": "Acme",
                "slug_weight": "2.50",
                "pieces": pieces,
                "hold_material_qty_kg": qty_kg,
                "verified_by": "QA"
            }),
            StatusCode::CREATED,
        )
        .await
    }

    pub async fn issue_from(&self, batch_id: &str, qty_kg: &str) -> Value {
        self.post_expect(
            "/api/v1/batch-trackings",
            json!({
                "batch_id": batch_id,
                "issue_qty_kg": qty_kg,
                "line": "L1",
                "verified_by": "Stores"
            }),
            StatusCode::CREATED,
        )
        .await
    }

    pub async fn create_location(&self, code: &str) -> Value {
        self.post_expect(
            "/api/v1/packing/locations",
            json!({"code": code, "description": "rack"}),
            StatusCode::CREATED,
        )
        .await
    }

    /// Inserts a catalog entry directly; the catalog has no write endpoints.
    pub async fn seed_component(
        &self,
        component: &str,
        parent: Option<i32>,
        op_10_target: Option<i32>,
    ) -> masterlist::Model {
        masterlist::ActiveModel {
            component: Set(component.to_string()),
            part_name: Set(format!("{} part", component)),
            customer: Set("Acme".to_string()),
            supplier: Set("Steelco".to_string()),
            drawing_sr_number: Set(42),
            standard: Set("IS 2062".to_string()),
            grade: Set("EN8".to_string()),
            slug_weight: Set(Decimal::from(3)),
            dia: Set("32".to_string()),
            ht_process: Set("Normalizing".to_string()),
            running_status: Set(None),
            op_10_time: Set(None),
            op_10_target: Set(op_10_target),
            op_20_time: Set(None),
            op_20_target: Set(None),
            parent_component_id: Set(parent),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed masterlist component")
    }
}

pub fn lot_payload(weight_kg: &str) -> Value {
    json!({
        "date": "2025-03-14",
        "supplier": "Steelco",
        "grade": "EN8",
        "dia": "32",
        "customer": "Acme",
        "standerd": "IS 2062",
        "heatno": "HT-901A",
        "reciving_weight_kg": weight_kg,
        "rack_no": "R1",
        "location": "Bay 2",
        "type_of_material": "Bar",
        "cost_per_kg": "72.50",
        "invoice_no": "INV-7",
        "verified_by": "QA"
    })
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("json response")
}

/// Reads a decimal that may be serialized as a string or a number.
pub fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("not a decimal: {}", other),
    }
}

pub fn d(s: &str) -> Decimal {
    Decimal::from_str(s).expect("decimal literal")
}
