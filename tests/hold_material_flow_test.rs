mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{d, dec, TestApp};

fn lot_uri(lot: &serde_json::Value) -> String {
    format!("/api/v1/rm-receivings/{}", lot["uid"].as_str().expect("uid"))
}

#[tokio::test]
async fn full_allocation_completes_the_lot() {
    let app = TestApp::new().await;
    let lot = app.receive_lot("1000").await;
    let uid = lot["uid"].as_str().unwrap();

    let hold = app.hold_from(uid, "1000", 400).await;
    assert_eq!(hold["status"], "open");
    assert_eq!(dec(&hold["remaining"]), d("1000"));

    let lot = app.get_expect(&lot_uri(&lot), StatusCode::OK).await;
    assert_eq!(lot["status"], "complete");
    assert_eq!(dec(&lot["hold_weight_kg"]), d("1000"));
    assert_eq!(dec(&lot["remaining"]), d("0"));
}

#[tokio::test]
async fn partial_allocation_outside_tolerance_stays_partial() {
    let app = TestApp::new().await;
    let lot = app.receive_lot("1000").await;
    let uid = lot["uid"].as_str().unwrap();

    app.hold_from(uid, "600", 240).await;
    app.hold_from(uid, "350", 140).await;

    let lot = app.get_expect(&lot_uri(&lot), StatusCode::OK).await;
    assert_eq!(lot["status"], "partial");
    assert_eq!(dec(&lot["remaining"]), d("50"));
}

#[tokio::test]
async fn remainder_within_tolerance_counts_as_complete() {
    let app = TestApp::new().await;
    let lot = app.receive_lot("1000").await;
    let uid = lot["uid"].as_str().unwrap();

    app.hold_from(uid, "600", 240).await;
    app.hold_from(uid, "385", 154).await;

    let lot = app.get_expect(&lot_uri(&lot), StatusCode::OK).await;
    assert_eq!(lot["status"], "complete");
    assert_eq!(dec(&lot["remaining"]), d("15"));
}

#[tokio::test]
async fn over_allocation_is_rejected_and_lot_untouched() {
    let app = TestApp::new().await;
    let lot = app.receive_lot("500").await;
    let uid = lot["uid"].as_str().unwrap();
    app.hold_from(uid, "300", 120).await;

    let body = app
        .post_expect(
            "/api/v1/hold-materials",
            json!({
                "rm_receiving": uid,
                "component": "FL-100",
                "customer": "Acme",
                "hold_material_qty_kg": "250"
            }),
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert_eq!(body["details"]["fields"][0]["field"], "hold_material_qty_kg");
    let message = body["details"]["fields"][0]["message"].as_str().unwrap();
    assert!(message.contains("exceeds available remaining weight"), "{}", message);

    let lot = app.get_expect(&lot_uri(&lot), StatusCode::OK).await;
    assert_eq!(dec(&lot["remaining"]), d("200"));
    assert_eq!(lot["status"], "partial");
}

#[tokio::test]
async fn batch_ids_count_up_per_customer_and_day() {
    let app = TestApp::new().await;
    let lot = app.receive_lot("1000").await;
    let uid = lot["uid"].as_str().unwrap();

    let first = app.hold_from(uid, "100", 40).await;
    let second = app.hold_from(uid, "100", 40).await;

    let first_id = first["batch_id"].as_str().unwrap();
    let second_id = second["batch_id"].as_str().unwrap();
    assert!(first_id.starts_with("PP-"), "{}", first_id);
    assert!(first_id.ends_with("-AC-01"), "{}", first_id);
    assert!(second_id.ends_with("-AC-02"), "{}", second_id);
    assert_eq!(first_id.len(), "PP-20250314-AC-01".len());
}

#[tokio::test]
async fn hold_inherits_blank_fields_from_its_lot() {
    let app = TestApp::new().await;
    let lot = app.receive_lot("300").await;
    let uid = lot["uid"].as_str().unwrap();

    let hold = app.hold_from(uid, "120", 48).await;
    assert_eq!(hold["heatno"], "HT-901A");
    assert_eq!(hold["grade"], "EN8");
    assert_eq!(hold["supplier"], "Steelco");
    assert_eq!(hold["rm_receiving_uid"], uid);
}

#[tokio::test]
async fn bulk_hold_creation_rolls_back_on_any_rejection() {
    let app = TestApp::new().await;
    let lot = app.receive_lot("1000").await;
    let uid = lot["uid"].as_str().unwrap();

    let entry = |qty: &str| {
        json!({
            "rm_receiving": uid,
            "component": "FL-100",
            "customer": "Acme",
            "pieces": 10,
            "hold_material_qty_kg": qty
        })
    };

    let body = app
        .post_expect(
            "/api/v1/hold-materials/bulk",
            json!([entry("400"), entry("0"), entry("700")]),
            StatusCode::BAD_REQUEST,
        )
        .await;
    let indices: Vec<u64> = body["details"]["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["index"].as_u64().unwrap())
        .collect();
    assert_eq!(indices, vec![1, 2]);

    let holds = app
        .get_expect("/api/v1/hold-materials", StatusCode::OK)
        .await;
    assert_eq!(holds["pagination"]["total"], 0);
    let lot = app.get_expect(&lot_uri(&lot), StatusCode::OK).await;
    assert_eq!(lot["status"], "open");
    assert_eq!(dec(&lot["remaining"]), d("1000"));

    let created = app
        .post_expect(
            "/api/v1/hold-materials/bulk",
            json!([entry("400"), entry("590")]),
            StatusCode::CREATED,
        )
        .await;
    let created = created.as_array().unwrap();
    assert_eq!(created.len(), 2);
    assert!(created[0]["batch_id"].as_str().unwrap().ends_with("-01"));

    let lot = app.get_expect(&lot_uri(&lot), StatusCode::OK).await;
    assert_eq!(lot["status"], "complete");
    assert_eq!(dec(&lot["remaining"]), d("10"));
}

#[tokio::test]
async fn bulk_entry_for_unknown_lot_is_a_non_field_error() {
    let app = TestApp::new().await;

    let body = app
        .post_expect(
            "/api/v1/hold-materials/bulk",
            json!([{
                "rm_receiving": "6f1c1d1e-8b4f-4b77-9a43-1b1f0c3d2e10",
                "component": "FL-100",
                "customer": "Acme",
                "hold_material_qty_kg": "10"
            }]),
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert_eq!(
        body["details"]["entries"][0]["fields"][0]["field"],
        "non_field_errors"
    );
}

#[tokio::test]
async fn search_needs_two_characters() {
    let app = TestApp::new().await;
    let lot = app.receive_lot("400").await;
    let hold = app.hold_from(lot["uid"].as_str().unwrap(), "100", 40).await;
    let batch_id = hold["batch_id"].as_str().unwrap();

    let short = app
        .get_expect("/api/v1/hold-materials/search?q=P", StatusCode::OK)
        .await;
    assert!(short["data"].as_array().unwrap().is_empty());

    let found = app
        .get_expect("/api/v1/hold-materials/search?q=ac-0", StatusCode::OK)
        .await;
    assert_eq!(found["data"][0], batch_id);
}

#[tokio::test]
async fn list_filters_by_status() {
    let app = TestApp::new().await;
    let lot = app.receive_lot("1000").await;
    let uid = lot["uid"].as_str().unwrap();
    let hold = app.hold_from(uid, "200", 80).await;
    app.hold_from(uid, "200", 80).await;
    app.issue_from(hold["batch_id"].as_str().unwrap(), "50").await;

    let partial = app
        .get_expect("/api/v1/hold-materials?status=partial", StatusCode::OK)
        .await;
    assert_eq!(partial["pagination"]["total"], 1);
    assert_eq!(partial["data"][0]["batch_id"], hold["batch_id"]);

    let all = app
        .get_expect("/api/v1/hold-materials?status=all", StatusCode::OK)
        .await;
    assert_eq!(all["pagination"]["total"], 2);

    app.get_expect("/api/v1/hold-materials?status=done", StatusCode::BAD_REQUEST)
        .await;
}

#[tokio::test]
async fn packing_details_report_unstocked_pieces() {
    let app = TestApp::new().await;
    app.seed_component("FL-100", None, Some(120)).await;
    let lot = app.receive_lot("400").await;
    let hold = app.hold_from(lot["uid"].as_str().unwrap(), "100", 40).await;
    let batch_id = hold["batch_id"].as_str().unwrap();
    let location = app.create_location("A-01").await;

    app.post_expect(
        "/api/v1/packing/stock-in",
        json!({
            "material": hold["id"],
            "location": location["id"],
            "qty": 15,
            "slug_weight": "2.50"
        }),
        StatusCode::CREATED,
    )
    .await;

    let details = app
        .get_expect(
            &format!("/api/v1/hold-materials/{}/packing-details", batch_id),
            StatusCode::OK,
        )
        .await;
    assert_eq!(details["batch_id"], batch_id);
    assert_eq!(details["max_qty"], 25);
    assert_eq!(details["has_parent_child"], false);
    assert_eq!(details["component_options"], json!(["FL-100"]));
    assert_eq!(dec(&details["slug_weight"]), d("3"));
}

#[tokio::test]
async fn recompute_is_idempotent_on_a_consistent_hold() {
    let app = TestApp::new().await;
    let lot = app.receive_lot("400").await;
    let hold = app.hold_from(lot["uid"].as_str().unwrap(), "100", 40).await;
    let batch_id = hold["batch_id"].as_str().unwrap();

    let recomputed = app
        .post_expect(
            &format!("/api/v1/hold-materials/{}/recompute", batch_id),
            json!({}),
            StatusCode::OK,
        )
        .await;
    assert_eq!(recomputed["status"], "open");
    assert_eq!(dec(&recomputed["remaining"]), d("100"));

    app.get_expect("/api/v1/hold-materials/PP-19990101-ZZ-01", StatusCode::NOT_FOUND)
        .await;
}
