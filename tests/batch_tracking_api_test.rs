mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{d, dec, TestApp};

async fn batch_with(app: &TestApp, qty_kg: &str) -> String {
    let lot = app.receive_lot("1000").await;
    let hold = app.hold_from(lot["uid"].as_str().unwrap(), qty_kg, 100).await;
    hold["batch_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn issuing_refreshes_the_hold() {
    let app = TestApp::new().await;
    let batch_id = batch_with(&app, "500").await;

    let issue = app.issue_from(&batch_id, "200").await;
    let issue_id = issue["issue_id"].as_str().unwrap();
    assert!(issue_id.starts_with("ISSUE-"), "{}", issue_id);
    assert_eq!(issue_id.len(), 14);
    assert_eq!(issue["batch_id"], batch_id.as_str());
    assert_eq!(issue["heatno"], "HT-901A");
    assert_eq!(issue["component"], "FL-100");

    let hold = app
        .get_expect(&format!("/api/v1/hold-materials/{}", batch_id), StatusCode::OK)
        .await;
    assert_eq!(hold["status"], "partial");
    assert_eq!(dec(&hold["issue_qty_kg"]), d("200"));
    assert_eq!(dec(&hold["remaining"]), d("300"));

    app.issue_from(&batch_id, "290").await;
    let hold = app
        .get_expect(&format!("/api/v1/hold-materials/{}", batch_id), StatusCode::OK)
        .await;
    assert_eq!(hold["status"], "complete");
    assert_eq!(dec(&hold["remaining"]), d("10"));

    let fetched = app
        .get_expect(&format!("/api/v1/batch-trackings/{}", issue_id), StatusCode::OK)
        .await;
    assert_eq!(fetched["issue_id"], issue_id);
    assert_eq!(fetched["batch_id"], batch_id.as_str());
}

#[tokio::test]
async fn over_issuance_is_rejected() {
    let app = TestApp::new().await;
    let batch_id = batch_with(&app, "100").await;
    app.issue_from(&batch_id, "60").await;

    let body = app
        .post_expect(
            "/api/v1/batch-trackings",
            json!({"batch_id": batch_id, "issue_qty_kg": "41"}),
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert_eq!(body["details"]["fields"][0]["field"], "issue_qty_kg");

    let hold = app
        .get_expect(&format!("/api/v1/hold-materials/{}", batch_id), StatusCode::OK)
        .await;
    assert_eq!(dec(&hold["remaining"]), d("40"));
}

#[tokio::test]
async fn issuing_from_an_unknown_batch_is_not_found() {
    let app = TestApp::new().await;
    let body = app
        .post_expect(
            "/api/v1/batch-trackings",
            json!({"batch_id": "PP-19990101-ZZ-01", "issue_qty_kg": "5"}),
            StatusCode::NOT_FOUND,
        )
        .await;
    assert_eq!(body["error"], "Not Found");

    app.get_expect("/api/v1/batch-trackings/ISSUE-00000000", StatusCode::NOT_FOUND)
        .await;
}

#[tokio::test]
async fn bulk_issuance_sees_earlier_entries() {
    let app = TestApp::new().await;
    let batch_id = batch_with(&app, "100").await;

    let body = app
        .post_expect(
            "/api/v1/batch-trackings/bulk",
            json!([
                {"batch_id": batch_id, "issue_qty_kg": "70"},
                {"batch_id": batch_id, "issue_qty_kg": "40"}
            ]),
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert_eq!(body["details"]["entries"][0]["index"], 1);

    let list = app
        .get_expect("/api/v1/batch-trackings", StatusCode::OK)
        .await;
    assert_eq!(list["pagination"]["total"], 0);

    let created = app
        .post_expect(
            "/api/v1/batch-trackings/bulk",
            json!([
                {"batch_id": batch_id, "issue_qty_kg": "70"},
                {"batch_id": batch_id, "issue_qty_kg": "30"}
            ]),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(created.as_array().unwrap().len(), 2);

    let hold = app
        .get_expect(&format!("/api/v1/hold-materials/{}", batch_id), StatusCode::OK)
        .await;
    assert_eq!(hold["status"], "complete");
    assert_eq!(dec(&hold["remaining"]), d("0"));
}

#[tokio::test]
async fn list_filters_by_parent_batch() {
    let app = TestApp::new().await;
    let first = batch_with(&app, "100").await;
    let second = batch_with(&app, "100").await;
    app.issue_from(&first, "10").await;
    app.issue_from(&second, "20").await;
    app.issue_from(&second, "20").await;

    let list = app
        .get_expect(
            &format!("/api/v1/batch-trackings?batch_id={}", second),
            StatusCode::OK,
        )
        .await;
    assert_eq!(list["pagination"]["total"], 2);
    assert!(list["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|row| row["batch_id"] == second.as_str()));
}
