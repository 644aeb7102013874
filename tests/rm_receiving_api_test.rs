mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{d, dec, lot_payload, response_json, TestApp};

#[tokio::test]
async fn lot_intake_starts_open_with_full_remaining() {
    let app = TestApp::new().await;

    let lot = app.receive_lot("1000").await;
    assert_eq!(lot["status"], "open");
    assert_eq!(lot["approval_status"], "Under Inspection");
    assert_eq!(lot["standard"], "IS 2062");
    assert_eq!(dec(&lot["reciving_weight_kg"]), d("1000"));
    assert_eq!(dec(&lot["hold_weight_kg"]), d("0"));
    assert_eq!(dec(&lot["remaining"]), d("1000"));

    let uid = lot["uid"].as_str().expect("uid");
    let fetched = app
        .get_expect(&format!("/api/v1/rm-receivings/{}", uid), StatusCode::OK)
        .await;
    assert_eq!(fetched["heatno"], "HT-901A");
    assert_eq!(fetched["uid"], uid);
}

#[tokio::test]
async fn job_work_lots_are_approved_on_intake() {
    let app = TestApp::new().await;

    let mut payload = lot_payload("250");
    payload["type_of_material"] = json!("JOB WORK");
    let lot = app
        .post_expect("/api/v1/rm-receivings", payload, StatusCode::CREATED)
        .await;
    assert_eq!(lot["approval_status"], "Approved");
}

#[tokio::test]
async fn zero_weight_is_rejected_with_field_detail() {
    let app = TestApp::new().await;

    let body = app
        .post_expect("/api/v1/rm-receivings", lot_payload("0"), StatusCode::BAD_REQUEST)
        .await;
    assert_eq!(body["details"]["fields"][0]["field"], "reciving_weight_kg");

    let list = app
        .get_expect("/api/v1/rm-receivings", StatusCode::OK)
        .await;
    assert_eq!(list["pagination"]["total"], 0);
}

#[tokio::test]
async fn unknown_lot_is_not_found() {
    let app = TestApp::new().await;
    let body = app
        .get_expect(
            "/api/v1/rm-receivings/6f1c1d1e-8b4f-4b77-9a43-1b1f0c3d2e10",
            StatusCode::NOT_FOUND,
        )
        .await;
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn patch_updates_descriptive_fields_but_not_counters() {
    let app = TestApp::new().await;
    let lot = app.receive_lot("500").await;
    let uri = format!("/api/v1/rm-receivings/{}", lot["uid"].as_str().unwrap());

    let response = app
        .request(
            Method::PATCH,
            &uri,
            Some(json!({"approval_status": "Approved", "rack_no": "R9"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = response_json(response).await;
    assert_eq!(updated["approval_status"], "Approved");
    assert_eq!(updated["rack_no"], "R9");

    let response = app
        .request(Method::PATCH, &uri, Some(json!({"remaining": "1"})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["details"]["fields"][0]["field"], "remaining");

    let fetched = app.get_expect(&uri, StatusCode::OK).await;
    assert_eq!(dec(&fetched["remaining"]), d("500"));
}

#[tokio::test]
async fn list_filters_by_grade_and_approval() {
    let app = TestApp::new().await;

    app.receive_lot("100").await;
    let mut other = lot_payload("200");
    other["grade"] = json!("SAE 4140");
    other["type_of_material"] = json!("Job Work");
    app.post_expect("/api/v1/rm-receivings", other, StatusCode::CREATED)
        .await;

    let by_grade = app
        .get_expect("/api/v1/rm-receivings?grade=4140", StatusCode::OK)
        .await;
    assert_eq!(by_grade["pagination"]["total"], 1);
    assert_eq!(by_grade["data"][0]["grade"], "SAE 4140");

    let approved = app
        .get_expect("/api/v1/rm-receivings?approval_status=approved", StatusCode::OK)
        .await;
    assert_eq!(approved["pagination"]["total"], 1);

    let paged = app
        .get_expect("/api/v1/rm-receivings?page=1&per_page=1", StatusCode::OK)
        .await;
    assert_eq!(paged["data"].as_array().unwrap().len(), 1);
    assert_eq!(paged["pagination"]["total_pages"], 2);
}

#[tokio::test]
async fn bulk_intake_is_all_or_nothing() {
    let app = TestApp::new().await;

    let body = app
        .post_expect(
            "/api/v1/rm-receivings/bulk",
            json!([lot_payload("100"), lot_payload("-3"), lot_payload("50")]),
            StatusCode::BAD_REQUEST,
        )
        .await;
    let entries = body["details"]["entries"].as_array().expect("entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["index"], 1);

    let list = app
        .get_expect("/api/v1/rm-receivings", StatusCode::OK)
        .await;
    assert_eq!(list["pagination"]["total"], 0);

    let created = app
        .post_expect(
            "/api/v1/rm-receivings/bulk",
            json!([lot_payload("100"), lot_payload("50")]),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(created.as_array().unwrap().len(), 2);

    let empty = app
        .post_expect("/api/v1/rm-receivings/bulk", json!([]), StatusCode::BAD_REQUEST)
        .await;
    assert_eq!(empty["error"], "Bad Request");
}
