//! Repair sweeps for the cached ledger counters.
//!
//! Every create path already refreshes its parent inside the same
//! transaction, so on a healthy database these sweeps find nothing. They
//! exist for rows edited behind the service's back.

use chrono::Utc;
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Serialize;
use std::{sync::Arc, time::Instant};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{hold_material, rm_receiving};
use crate::db::{in_transaction, DbPool};
use crate::entities::{hold_material as hold_entity, rm_receiving as lot_entity};
use crate::errors::ServiceError;
use crate::events::{EventSender, LedgerEvent};

pub const HOLD_SWEEP: &str = "hold_materials";
pub const LOT_SWEEP: &str = "rm_receivings";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReconcileReport {
    pub sweep: String,
    pub examined: u64,
    pub corrected: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heatnos_normalized: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReconcileAllReport {
    pub hold_materials: ReconcileReport,
    pub rm_receivings: ReconcileReport,
}

/// Lower-cases `heatno` wherever it is not already lower case.
async fn lowercase_heatnos<C: ConnectionTrait>(conn: &C) -> Result<u64, ServiceError> {
    let lots = lot_entity::Entity::update_many()
        .col_expr(
            lot_entity::Column::Heatno,
            Func::lower(Expr::col(lot_entity::Column::Heatno)).into(),
        )
        .filter(
            Expr::col(lot_entity::Column::Heatno)
                .ne(Func::lower(Expr::col(lot_entity::Column::Heatno))),
        )
        .exec(conn)
        .await?;
    let holds = hold_entity::Entity::update_many()
        .col_expr(
            hold_entity::Column::Heatno,
            Func::lower(Expr::col(hold_entity::Column::Heatno)).into(),
        )
        .filter(
            Expr::col(hold_entity::Column::Heatno)
                .ne(Func::lower(Expr::col(hold_entity::Column::Heatno))),
        )
        .exec(conn)
        .await?;
    Ok(lots.rows_affected + holds.rows_affected)
}

#[derive(Clone)]
pub struct ReconciliationService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    tolerance: Decimal,
}

impl ReconciliationService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, tolerance: Decimal) -> Self {
        Self {
            db,
            event_sender,
            tolerance,
        }
    }

    /// Recomputes every hold from its issuances, one transaction per hold.
    #[instrument(skip(self))]
    pub async fn reconcile_hold_materials(&self) -> Result<ReconcileReport, ServiceError> {
        let start = Instant::now();
        let ids: Vec<i32> = hold_entity::Entity::find()
            .select_only()
            .column(hold_entity::Column::Id)
            .order_by_asc(hold_entity::Column::Id)
            .into_tuple()
            .all(&*self.db)
            .await?;

        let mut report = ReconcileReport {
            sweep: HOLD_SWEEP.to_string(),
            examined: 0,
            corrected: 0,
            heatnos_normalized: None,
        };
        for id in ids {
            let tolerance = self.tolerance;
            let outcome = in_transaction(&self.db, move |txn| {
                Box::pin(async move {
                    let hold = hold_material::lock_hold_by_id(txn, id).await?;
                    hold_material::refresh_hold(txn, hold, tolerance).await
                })
            })
            .await;
            let outcome = match outcome {
                Ok(outcome) => outcome,
                // Deleted between listing and locking.
                Err(ServiceError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            };

            report.examined += 1;
            if outcome.changed {
                report.corrected += 1;
                warn!(
                    batch_id = %outcome.model.batch_id,
                    issue_qty_kg = %outcome.model.issue_qty_kg,
                    status = %outcome.status,
                    "hold counters corrected"
                );
            }
            if let Some(event) = hold_material::status_event(&outcome) {
                self.event_sender.emit(event).await;
            }
        }

        self.finish(&report, start).await;
        Ok(report)
    }

    /// Normalises heat numbers, then recomputes every lot from its holds.
    #[instrument(skip(self))]
    pub async fn reconcile_rm_receivings(&self) -> Result<ReconcileReport, ServiceError> {
        let start = Instant::now();
        let normalized = lowercase_heatnos(&*self.db).await?;
        if normalized > 0 {
            info!(rows = normalized, "heat numbers lower-cased");
        }

        let uids: Vec<Uuid> = lot_entity::Entity::find()
            .select_only()
            .column(lot_entity::Column::Uid)
            .order_by_asc(lot_entity::Column::CreatedAt)
            .into_tuple()
            .all(&*self.db)
            .await?;

        let mut report = ReconcileReport {
            sweep: LOT_SWEEP.to_string(),
            examined: 0,
            corrected: 0,
            heatnos_normalized: Some(normalized),
        };
        for uid in uids {
            let tolerance = self.tolerance;
            let outcome = in_transaction(&self.db, move |txn| {
                Box::pin(async move {
                    let lot = rm_receiving::lock_lot(txn, uid).await?;
                    rm_receiving::refresh_lot(txn, lot, tolerance).await
                })
            })
            .await;
            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(ServiceError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            };

            report.examined += 1;
            if outcome.changed {
                report.corrected += 1;
                warn!(
                    uid = %outcome.model.uid,
                    hold_weight_kg = %outcome.model.hold_weight_kg,
                    status = %outcome.status,
                    "lot counters corrected"
                );
            }
            if let Some(event) = rm_receiving::status_event(&outcome) {
                self.event_sender.emit(event).await;
            }
        }

        self.finish(&report, start).await;
        Ok(report)
    }

    /// Holds first, so lot figures are computed from settled holds.
    pub async fn reconcile_all(&self) -> Result<ReconcileAllReport, ServiceError> {
        let hold_materials = self.reconcile_hold_materials().await?;
        let rm_receivings = self.reconcile_rm_receivings().await?;
        Ok(ReconcileAllReport {
            hold_materials,
            rm_receivings,
        })
    }

    async fn finish(&self, report: &ReconcileReport, start: Instant) {
        let sweep = report.sweep.clone();
        counter!("plant_ledger.reconcile.examined", report.examined, "sweep" => sweep.clone());
        counter!("plant_ledger.reconcile.corrected", report.corrected, "sweep" => sweep.clone());
        histogram!("plant_ledger.reconcile.duration", start.elapsed(), "sweep" => sweep);

        info!(
            sweep = %report.sweep,
            examined = report.examined,
            corrected = report.corrected,
            "reconciliation sweep finished"
        );
        self.event_sender
            .emit(LedgerEvent::ReconciliationCompleted {
                sweep: report.sweep.clone(),
                examined: report.examined,
                corrected: report.corrected,
                finished_at: Utc::now(),
            })
            .await;
    }
}
