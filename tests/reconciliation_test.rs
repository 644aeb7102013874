mod common;

use axum::http::StatusCode;
use plant_ledger_api::entities::{hold_material, rm_receiving};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::json;
use uuid::Uuid;

use common::{d, dec, TestApp};

/// Overwrites the cached counters of a hold and its lot as if edited by hand.
async fn corrupt_counters(app: &TestApp, hold_id: i32, lot_uid: Uuid) {
    let db = app.state.db.as_ref();

    let hold = hold_material::Entity::find_by_id(hold_id)
        .one(db)
        .await
        .unwrap()
        .expect("hold row");
    let capacity = hold.hold_material_qty_kg;
    let mut hold: hold_material::ActiveModel = hold.into();
    hold.issue_qty_kg = Set(Decimal::ZERO);
    hold.remaining = Set(capacity);
    hold.status = Set("open".to_string());
    hold.update(db).await.unwrap();

    let lot = rm_receiving::Entity::find_by_id(lot_uid)
        .one(db)
        .await
        .unwrap()
        .expect("lot row");
    let weight = lot.reciving_weight_kg;
    let mut lot: rm_receiving::ActiveModel = lot.into();
    lot.hold_weight_kg = Set(Decimal::ZERO);
    lot.remaining = Set(weight);
    lot.status = Set("open".to_string());
    lot.update(db).await.unwrap();
}

#[tokio::test]
async fn sweep_repairs_drifted_counters_and_then_finds_nothing() {
    let app = TestApp::new().await;
    let lot = app.receive_lot("1000").await;
    let uid = lot["uid"].as_str().unwrap();
    let hold = app.hold_from(uid, "400", 160).await;
    let batch_id = hold["batch_id"].as_str().unwrap();
    app.issue_from(batch_id, "100").await;

    corrupt_counters(
        &app,
        hold["id"].as_i64().unwrap() as i32,
        Uuid::parse_str(uid).unwrap(),
    )
    .await;

    let report = app
        .post_expect("/api/v1/reconcile", json!({}), StatusCode::OK)
        .await;
    assert_eq!(report["hold_materials"]["sweep"], "hold_materials");
    assert_eq!(report["hold_materials"]["examined"], 1);
    assert_eq!(report["hold_materials"]["corrected"], 1);
    assert!(report["hold_materials"].get("heatnos_normalized").is_none());
    assert_eq!(report["rm_receivings"]["corrected"], 1);
    assert_eq!(report["rm_receivings"]["heatnos_normalized"], 2);

    let hold = app
        .get_expect(&format!("/api/v1/hold-materials/{}", batch_id), StatusCode::OK)
        .await;
    assert_eq!(hold["status"], "partial");
    assert_eq!(dec(&hold["issue_qty_kg"]), d("100"));
    assert_eq!(dec(&hold["remaining"]), d("300"));
    assert_eq!(hold["heatno"], "ht-901a");

    let lot = app
        .get_expect(&format!("/api/v1/rm-receivings/{}", uid), StatusCode::OK)
        .await;
    assert_eq!(lot["status"], "partial");
    assert_eq!(dec(&lot["hold_weight_kg"]), d("400"));
    assert_eq!(dec(&lot["remaining"]), d("600"));
    assert_eq!(lot["heatno"], "ht-901a");

    let again = app
        .post_expect("/api/v1/reconcile", json!({}), StatusCode::OK)
        .await;
    assert_eq!(again["hold_materials"]["corrected"], 0);
    assert_eq!(again["rm_receivings"]["corrected"], 0);
    assert_eq!(again["rm_receivings"]["heatnos_normalized"], 0);
}

#[tokio::test]
async fn single_sweeps_only_touch_their_entity() {
    let app = TestApp::new().await;
    let lot = app.receive_lot("500").await;
    let uid = lot["uid"].as_str().unwrap();
    let hold = app.hold_from(uid, "500", 200).await;

    corrupt_counters(
        &app,
        hold["id"].as_i64().unwrap() as i32,
        Uuid::parse_str(uid).unwrap(),
    )
    .await;

    let holds = app
        .post_expect("/api/v1/reconcile/hold-materials", json!({}), StatusCode::OK)
        .await;
    // The hold had no issuances, so its corrupted values were already right.
    assert_eq!(holds["corrected"], 0);

    let lot_before = app
        .get_expect(&format!("/api/v1/rm-receivings/{}", uid), StatusCode::OK)
        .await;
    assert_eq!(lot_before["status"], "open");

    let lots = app
        .post_expect("/api/v1/reconcile/rm-receivings", json!({}), StatusCode::OK)
        .await;
    assert_eq!(lots["sweep"], "rm_receivings");
    assert_eq!(lots["examined"], 1);
    assert_eq!(lots["corrected"], 1);

    let lot_after = app
        .get_expect(&format!("/api/v1/rm-receivings/{}", uid), StatusCode::OK)
        .await;
    assert_eq!(lot_after["status"], "complete");
    assert_eq!(dec(&lot_after["remaining"]), d("0"));
}

#[tokio::test]
async fn service_sweep_on_an_empty_ledger_reports_zero() {
    let app = TestApp::new().await;
    let report = app
        .state
        .services
        .reconciliation
        .reconcile_all()
        .await
        .expect("reconcile");
    assert_eq!(report.hold_materials.examined, 0);
    assert_eq!(report.rm_receivings.examined, 0);
    assert_eq!(report.rm_receivings.heatnos_normalized, Some(0));
}
