mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::TestApp;

async fn batch_of(app: &TestApp, pieces: i32) -> String {
    let lot = app.receive_lot("1000").await;
    let hold = app.hold_from(lot["uid"].as_str().unwrap(), "400", pieces).await;
    hold["batch_id"].as_str().unwrap().to_string()
}

fn tag(batch_id: &str, from: &str, to: &str, qty: i32, status: Option<&str>) -> Value {
    let mut body = json!({
        "generated_by": "op-7",
        "current_process": from,
        "next_process": to,
        "qty": qty,
        "batch_id": batch_id
    });
    if let Some(status) = status {
        body["status"] = json!(status);
    }
    body
}

#[tokio::test]
async fn forging_remaining_is_pieces_minus_entries() {
    let app = TestApp::new().await;
    let batch_id = batch_of(&app, 400).await;

    let entry = app
        .post_expect(
            "/api/v1/stages/forging/entries",
            json!({"batch_number": batch_id, "production": 100, "rejections": 5}),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(entry["stage"], "forging");

    let remaining = app
        .get_expect(
            &format!("/api/v1/stages/forging/remaining?batch_id={}", batch_id),
            StatusCode::OK,
        )
        .await;
    assert_eq!(remaining["total_received"], 400);
    assert_eq!(remaining["total_entered"], 105);
    assert_eq!(remaining["remaining"], 295);
}

#[tokio::test]
async fn later_stages_receive_what_was_tagged_into_them() {
    let app = TestApp::new().await;
    let batch_id = batch_of(&app, 400).await;

    app.post_expect(
        "/api/v1/tags",
        tag(&batch_id, "Forging", "Heat Treatment", 150, None),
        StatusCode::CREATED,
    )
    .await;
    app.post_expect(
        "/api/v1/stages/heat-treatment/entries",
        json!({"batch_number": batch_id, "production": 40}),
        StatusCode::CREATED,
    )
    .await;

    let remaining = app
        .get_expect(
            &format!("/api/v1/stages/heat-treatment/remaining?batch_id={}", batch_id),
            StatusCode::OK,
        )
        .await;
    assert_eq!(remaining["stage"], "heat-treatment");
    assert_eq!(remaining["total_received"], 150);
    assert_eq!(remaining["remaining"], 110);

    let department = app
        .get_expect(
            &format!(
                "/api/v1/stages/department-remaining?batch_id={}&current_department=Heat%20Treatment",
                batch_id
            ),
            StatusCode::OK,
        )
        .await;
    assert_eq!(department["total_received"], 150);
    assert_eq!(department["total_generated"], 0);
    assert_eq!(department["remaining_qty"], 150);
}

#[tokio::test]
async fn machining_counts_only_second_setup_production() {
    let app = TestApp::new().await;
    let batch_id = batch_of(&app, 100).await;
    app.post_expect(
        "/api/v1/tags",
        tag(&batch_id, "Forging", "Machining", 80, None),
        StatusCode::CREATED,
    )
    .await;

    for (setup, production) in [("I", 30), ("II", 20)] {
        app.post_expect(
            "/api/v1/stages/machining/entries",
            json!({"batch_number": batch_id, "production": production, "setup": setup}),
            StatusCode::CREATED,
        )
        .await;
    }
    app.post_expect(
        "/api/v1/stages/machining/entries",
        json!({"batch_number": batch_id, "production": 1, "setup": "III"}),
        StatusCode::BAD_REQUEST,
    )
    .await;

    let remaining = app
        .get_expect(
            &format!("/api/v1/stages/machining/remaining?batch_id={}", batch_id),
            StatusCode::OK,
        )
        .await;
    assert_eq!(remaining["total_production"], 20);
    assert_eq!(remaining["remaining"], 60);
}

#[tokio::test]
async fn stage_queries_validate_their_inputs() {
    let app = TestApp::new().await;

    let body = app
        .get_expect("/api/v1/stages/forging/remaining", StatusCode::BAD_REQUEST)
        .await;
    assert_eq!(body["message"], "Batch ID is required");

    app.get_expect(
        "/api/v1/stages/painting/remaining?batch_id=PP-1",
        StatusCode::NOT_FOUND,
    )
    .await;

    app.get_expect(
        "/api/v1/stages/department-remaining?batch_id=PP-1",
        StatusCode::BAD_REQUEST,
    )
    .await;

    app.post_expect(
        "/api/v1/stages/forging/entries",
        json!({"batch_number": "PP-1", "production": -1}),
        StatusCode::BAD_REQUEST,
    )
    .await;
}

#[tokio::test]
async fn tags_get_monthly_uids_and_inherit_batch_details() {
    let app = TestApp::new().await;
    let batch_id = batch_of(&app, 400).await;

    let first = app
        .post_expect(
            "/api/v1/tags",
            tag(&batch_id, "Forging", "Heat Treatment", 100, None),
            StatusCode::CREATED,
        )
        .await;
    let second = app
        .post_expect(
            "/api/v1/tags",
            tag(&batch_id, "Forging", "Heat Treatment", 50, None),
            StatusCode::CREATED,
        )
        .await;

    let uid = first["tag_uid"].as_str().unwrap();
    assert_eq!(uid.len(), 8);
    assert!(uid.chars().all(|c| c.is_ascii_digit()));
    assert!(uid.ends_with("0001"), "{}", uid);
    assert!(second["tag_uid"].as_str().unwrap().ends_with("0002"));
    assert_eq!(first["heat_no"], "HT-901A");
    assert_eq!(first["component"], "FL-100");
    assert_eq!(first["status"], "ok");
    assert_eq!(first["is_printed"], false);

    let recent = app
        .get_expect("/api/v1/tags/recent?limit=1", StatusCode::OK)
        .await;
    assert_eq!(recent["data"].as_array().unwrap().len(), 1);

    let printed = app
        .post_expect(&format!("/api/v1/tags/{}/print", uid), json!({}), StatusCode::OK)
        .await;
    assert_eq!(printed["is_printed"], true);
    assert!(printed["printed_at"].is_string());

    let fetched = app
        .get_expect(&format!("/api/v1/tags/{}", uid), StatusCode::OK)
        .await;
    assert_eq!(fetched["qty"], 100);

    app.get_expect("/api/v1/tags/99999999", StatusCode::NOT_FOUND)
        .await;
}

#[tokio::test]
async fn forging_tags_cannot_exceed_batch_pieces() {
    let app = TestApp::new().await;
    let batch_id = batch_of(&app, 100).await;

    app.post_expect(
        "/api/v1/tags",
        tag(&batch_id, "Forging", "Heat Treatment", 70, None),
        StatusCode::CREATED,
    )
    .await;
    let body = app
        .post_expect(
            "/api/v1/tags",
            tag(&batch_id, "Forging", "Heat Treatment", 31, None),
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert_eq!(body["details"]["fields"][0]["field"], "qty");

    // Heat treatment has received 70 and passed none on yet.
    app.post_expect(
        "/api/v1/tags",
        tag(&batch_id, "Heat Treatment", "Pre MC", 71, None),
        StatusCode::BAD_REQUEST,
    )
    .await;
    app.post_expect(
        "/api/v1/tags",
        tag(&batch_id, "Heat Treatment", "Pre MC", 70, None),
        StatusCode::CREATED,
    )
    .await;
}

#[tokio::test]
async fn rejected_tags_cannot_proceed() {
    let app = TestApp::new().await;
    let batch_id = batch_of(&app, 100).await;

    let ok = app
        .post_expect(
            "/api/v1/tags",
            tag(&batch_id, "Forging", "Heat Treatment", 10, None),
            StatusCode::CREATED,
        )
        .await;
    let rejected = app
        .post_expect(
            "/api/v1/tags",
            tag(&batch_id, "Forging", "Heat Treatment", 5, Some("Reject")),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(rejected["status"], "reject");

    let check = app
        .get_expect(
            &format!("/api/v1/tags/{}/can-proceed", ok["tag_uid"].as_str().unwrap()),
            StatusCode::OK,
        )
        .await;
    assert_eq!(check["can_proceed"], true);

    let check = app
        .get_expect(
            &format!(
                "/api/v1/tags/{}/can-proceed",
                rejected["tag_uid"].as_str().unwrap()
            ),
            StatusCode::OK,
        )
        .await;
    assert_eq!(check["can_proceed"], false);
    assert_eq!(check["status"], "reject");

    app.post_expect(
        "/api/v1/tags",
        tag(&batch_id, "Forging", "Heat Treatment", 1, Some("scrap")),
        StatusCode::BAD_REQUEST,
    )
    .await;
}
