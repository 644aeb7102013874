use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use std::{sync::Arc, time::Instant};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{
    bulk_entry_error, collect_field_errors, fields_result, filter_value, icontains,
    reject_empty_bulk, KgTotal, Page, Recomputed,
};
use crate::db::{in_transaction, DbPool};
use crate::entities::{
    hold_material,
    rm_receiving::{self, ApprovalStatus},
};
use crate::errors::{FieldError, ServiceError};
use crate::events::{EventSender, LedgerEntity, LedgerEvent};
use crate::ledger::{self, derive_status, LedgerStatus};
use crate::tracing::record_ledger_write;

/// Intake of a raw-material lot.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewRmReceiving {
    pub date: NaiveDate,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub supplier: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub grade: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub dia: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub customer: String,
    #[serde(alias = "standerd")]
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub standard: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub heatno: String,
    #[schema(value_type = String, example = "1000.00")]
    pub reciving_weight_kg: Decimal,
    #[serde(default)]
    pub rack_no: String,
    #[serde(default)]
    pub location: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub type_of_material: String,
    #[serde(default)]
    #[schema(value_type = String, example = "72.50")]
    pub cost_per_kg: Decimal,
    #[serde(default)]
    pub invoice_no: String,
    #[serde(default)]
    pub milltc: Option<String>,
    #[serde(default)]
    pub spectro: Option<String>,
    #[serde(default)]
    pub ssb_inspection_report: Option<String>,
    #[serde(default)]
    pub customer_approval: Option<String>,
    #[serde(default)]
    pub verified_by: String,
    /// Inferred from `type_of_material` when absent.
    #[serde(default)]
    pub approval_status: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
}

impl NewRmReceiving {
    /// Checks the entry and resolves its approval status.
    fn check(&self) -> Result<ApprovalStatus, ServiceError> {
        let mut fields = collect_field_errors(self);

        if self.reciving_weight_kg <= Decimal::ZERO {
            fields.push(FieldError::new(
                "reciving_weight_kg",
                "Receiving weight must be greater than zero.",
            ));
        }
        if self.cost_per_kg < Decimal::ZERO {
            fields.push(FieldError::new("cost_per_kg", "Ensure this value is not negative."));
        }

        let approval = match self.approval_status.as_deref().map(str::trim) {
            None | Some("") => Some(ApprovalStatus::infer(&self.type_of_material)),
            Some(raw) => {
                let parsed = ApprovalStatus::from_str(raw);
                if parsed.is_none() {
                    fields.push(FieldError::new(
                        "approval_status",
                        format!("\"{}\" is not a valid choice.", raw),
                    ));
                }
                parsed
            }
        };

        fields_result(fields)?;
        approval.ok_or_else(|| ServiceError::field("approval_status", "is not a valid choice."))
    }
}

/// Descriptive fields that may change after intake. Quantities and derived
/// state are rejected when present.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateRmReceiving {
    pub approval_status: Option<String>,
    pub comments: Option<String>,
    pub verified_by: Option<String>,
    pub rack_no: Option<String>,
    pub location: Option<String>,
    pub milltc: Option<String>,
    pub spectro: Option<String>,
    pub ssb_inspection_report: Option<String>,
    pub customer_approval: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub reciving_weight_kg: Option<serde_json::Value>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub hold_weight_kg: Option<serde_json::Value>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub remaining: Option<serde_json::Value>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub status: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct RmReceivingFilter {
    pub grade: Option<String>,
    pub dia: Option<String>,
    pub supplier: Option<String>,
    pub approval_status: Option<String>,
    pub customer: Option<String>,
    pub invoice_no: Option<String>,
    pub heatno: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

async fn insert_lot<C: ConnectionTrait>(
    conn: &C,
    input: NewRmReceiving,
    approval: ApprovalStatus,
) -> Result<rm_receiving::Model, ServiceError> {
    let weight = ledger::normalize_kg(input.reciving_weight_kg);
    let lot = rm_receiving::ActiveModel {
        uid: Set(Uuid::new_v4()),
        date: Set(input.date),
        supplier: Set(input.supplier.trim().to_string()),
        grade: Set(input.grade.trim().to_string()),
        dia: Set(input.dia.trim().to_string()),
        customer: Set(input.customer.trim().to_string()),
        standard: Set(input.standard.trim().to_string()),
        heatno: Set(input.heatno.trim().to_string()),
        reciving_weight_kg: Set(weight),
        hold_weight_kg: Set(Decimal::ZERO),
        remaining: Set(weight),
        rack_no: Set(input.rack_no),
        location: Set(input.location),
        type_of_material: Set(input.type_of_material.trim().to_string()),
        cost_per_kg: Set(ledger::normalize_kg(input.cost_per_kg)),
        invoice_no: Set(input.invoice_no),
        milltc: Set(input.milltc),
        spectro: Set(input.spectro),
        ssb_inspection_report: Set(input.ssb_inspection_report),
        customer_approval: Set(input.customer_approval),
        verified_by: Set(input.verified_by),
        approval_status: Set(approval.as_str().to_string()),
        comments: Set(input.comments),
        status: Set(LedgerStatus::Open.as_str().to_string()),
        ..Default::default()
    };
    Ok(lot.insert(conn).await?)
}

/// Reads a lot for update. On Postgres the row stays locked until the
/// surrounding transaction ends.
pub(crate) async fn lock_lot<C: ConnectionTrait>(
    conn: &C,
    uid: Uuid,
) -> Result<rm_receiving::Model, ServiceError> {
    rm_receiving::Entity::find_by_id(uid)
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("RM receiving {} not found", uid)))
}

/// Σ hold_material_qty_kg over the holds carved from `uid`.
pub(crate) async fn allocated_kg<C: ConnectionTrait>(
    conn: &C,
    uid: Uuid,
) -> Result<Decimal, ServiceError> {
    let row = hold_material::Entity::find()
        .select_only()
        .column_as(hold_material::Column::HoldMaterialQtyKg.sum(), "total")
        .filter(hold_material::Column::RmReceivingUid.eq(uid))
        .into_model::<KgTotal>()
        .one(conn)
        .await?;
    Ok(KgTotal::kg(row))
}

/// Re-derives `hold_weight_kg`, `remaining` and `status` of a lot from its
/// holds. Writes only when something differs.
pub(crate) async fn refresh_lot<C: ConnectionTrait>(
    conn: &C,
    lot: rm_receiving::Model,
    tolerance: Decimal,
) -> Result<Recomputed<rm_receiving::Model>, ServiceError> {
    let consumed = allocated_kg(conn, lot.uid).await?;
    let capacity = ledger::normalize_kg(lot.reciving_weight_kg);
    let remaining = ledger::remaining(capacity, consumed);
    let status = derive_status(capacity, consumed, tolerance);
    let previous_status = lot.ledger_status();

    let changed = ledger::normalize_kg(lot.hold_weight_kg) != consumed
        || ledger::normalize_kg(lot.remaining) != remaining
        || previous_status != Some(status);

    if !changed {
        return Ok(Recomputed {
            model: lot,
            previous_status,
            status,
            changed,
        });
    }

    let mut active: rm_receiving::ActiveModel = lot.into();
    active.hold_weight_kg = Set(consumed);
    active.remaining = Set(remaining);
    active.status = Set(status.as_str().to_string());
    let model = active.update(conn).await?;

    Ok(Recomputed {
        model,
        previous_status,
        status,
        changed,
    })
}

/// Event for a lot whose status moved.
pub(crate) fn status_event(outcome: &Recomputed<rm_receiving::Model>) -> Option<LedgerEvent> {
    if !outcome.status_changed() {
        return None;
    }
    Some(LedgerEvent::LedgerStatusChanged {
        entity: LedgerEntity::RmReceiving,
        key: outcome.model.uid.to_string(),
        old_status: outcome.previous_status.unwrap_or(LedgerStatus::Open),
        new_status: outcome.status,
        remaining: outcome.model.remaining,
    })
}

fn created_event(lot: &rm_receiving::Model) -> LedgerEvent {
    LedgerEvent::RmReceivingCreated {
        uid: lot.uid,
        heatno: lot.heatno.clone(),
        reciving_weight_kg: lot.reciving_weight_kg,
    }
}

/// Raw-material lot intake and its cached allocation counters.
#[derive(Clone)]
pub struct RmReceivingService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    tolerance: Decimal,
}

impl RmReceivingService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, tolerance: Decimal) -> Self {
        Self {
            db,
            event_sender,
            tolerance,
        }
    }

    #[instrument(skip(self, input), fields(heatno = %input.heatno))]
    pub async fn create(&self, input: NewRmReceiving) -> Result<rm_receiving::Model, ServiceError> {
        let start = Instant::now();
        let result = match input.check() {
            Ok(approval) => insert_lot(&*self.db, input, approval).await,
            Err(e) => Err(e),
        };
        record_ledger_write("rm_receiving.create", result.is_ok(), start.elapsed());

        let lot = result?;
        info!(
            uid = %lot.uid,
            weight_kg = %lot.reciving_weight_kg,
            approval_status = %lot.approval_status,
            "raw material lot received"
        );
        self.event_sender.emit(created_event(&lot)).await;
        Ok(lot)
    }

    /// Creates every lot or none. The error lists each rejected index.
    #[instrument(skip(self, inputs), fields(count = inputs.len()))]
    pub async fn create_bulk(
        &self,
        inputs: Vec<NewRmReceiving>,
    ) -> Result<Vec<rm_receiving::Model>, ServiceError> {
        reject_empty_bulk(inputs.len())?;
        let start = Instant::now();

        let result = in_transaction(&self.db, move |txn| {
            Box::pin(async move {
                let total = inputs.len();
                let mut created = Vec::with_capacity(total);
                let mut rejected = Vec::new();

                for (index, input) in inputs.into_iter().enumerate() {
                    let outcome = match input.check() {
                        Ok(approval) => insert_lot(txn, input, approval).await,
                        Err(e) => Err(e),
                    };
                    match outcome {
                        Ok(lot) => created.push(lot),
                        Err(e) => rejected.push(bulk_entry_error(index, e)?),
                    }
                }

                if !rejected.is_empty() {
                    return Err(ServiceError::BulkRejected {
                        total,
                        entries: rejected,
                    });
                }
                Ok(created)
            })
        })
        .await;
        record_ledger_write("rm_receiving.create_bulk", result.is_ok(), start.elapsed());

        let lots = result?;
        info!(created = lots.len(), "bulk raw material intake committed");
        self.event_sender
            .emit_all(lots.iter().map(created_event).collect())
            .await;
        Ok(lots)
    }

    pub async fn get(&self, uid: Uuid) -> Result<rm_receiving::Model, ServiceError> {
        rm_receiving::Entity::find_by_id(uid)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("RM receiving {} not found", uid)))
    }

    #[instrument(skip(self, filter))]
    pub async fn list(
        &self,
        filter: &RmReceivingFilter,
        page: u64,
        per_page: u64,
    ) -> Result<Page<rm_receiving::Model>, ServiceError> {
        let mut query = rm_receiving::Entity::find();

        let text_filters = [
            (rm_receiving::Column::Grade, &filter.grade),
            (rm_receiving::Column::Dia, &filter.dia),
            (rm_receiving::Column::Supplier, &filter.supplier),
            (rm_receiving::Column::ApprovalStatus, &filter.approval_status),
            (rm_receiving::Column::Customer, &filter.customer),
            (rm_receiving::Column::InvoiceNo, &filter.invoice_no),
            (rm_receiving::Column::Heatno, &filter.heatno),
        ];
        for (column, value) in text_filters {
            if let Some(v) = filter_value(value) {
                query = query.filter(icontains(column, v));
            }
        }
        if let Some(from) = filter.date_from {
            query = query.filter(rm_receiving::Column::Date.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(rm_receiving::Column::Date.lte(to));
        }

        let paginator = query
            .order_by_desc(rm_receiving::Column::Date)
            .order_by_desc(rm_receiving::Column::CreatedAt)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(Page {
            items,
            total,
            page,
            per_page,
        })
    }

    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        uid: Uuid,
        patch: UpdateRmReceiving,
    ) -> Result<rm_receiving::Model, ServiceError> {
        let mut fields = Vec::new();
        for (name, present) in [
            ("reciving_weight_kg", patch.reciving_weight_kg.is_some()),
            ("hold_weight_kg", patch.hold_weight_kg.is_some()),
            ("remaining", patch.remaining.is_some()),
            ("status", patch.status.is_some()),
        ] {
            if present {
                fields.push(FieldError::new(name, "This field is read-only."));
            }
        }
        let approval = match patch.approval_status.as_deref() {
            Some(raw) => match ApprovalStatus::from_str(raw) {
                Some(status) => Some(status),
                None => {
                    fields.push(FieldError::new(
                        "approval_status",
                        format!("\"{}\" is not a valid choice.", raw),
                    ));
                    None
                }
            },
            None => None,
        };
        fields_result(fields)?;

        let lot = self.get(uid).await?;
        let mut active: rm_receiving::ActiveModel = lot.into();
        if let Some(status) = approval {
            active.approval_status = Set(status.as_str().to_string());
        }
        if let Some(v) = patch.comments {
            active.comments = Set(Some(v));
        }
        if let Some(v) = patch.verified_by {
            active.verified_by = Set(v);
        }
        if let Some(v) = patch.rack_no {
            active.rack_no = Set(v);
        }
        if let Some(v) = patch.location {
            active.location = Set(v);
        }
        if let Some(v) = patch.milltc {
            active.milltc = Set(Some(v));
        }
        if let Some(v) = patch.spectro {
            active.spectro = Set(Some(v));
        }
        if let Some(v) = patch.ssb_inspection_report {
            active.ssb_inspection_report = Set(Some(v));
        }
        if let Some(v) = patch.customer_approval {
            active.customer_approval = Set(Some(v));
        }

        let updated = active.update(&*self.db).await?;
        info!(uid = %updated.uid, "raw material lot updated");
        Ok(updated)
    }

    /// Recomputes the lot's cached counters from its holds.
    #[instrument(skip(self))]
    pub async fn update_status(&self, uid: Uuid) -> Result<rm_receiving::Model, ServiceError> {
        let tolerance = self.tolerance;
        let outcome = in_transaction(&self.db, move |txn| {
            Box::pin(async move {
                let lot = lock_lot(txn, uid).await?;
                refresh_lot(txn, lot, tolerance).await
            })
        })
        .await?;

        if let Some(event) = status_event(&outcome) {
            self.event_sender.emit(event).await;
        }
        Ok(outcome.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn lot(weight: Decimal) -> NewRmReceiving {
        NewRmReceiving {
            date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            supplier: "Sunflag".into(),
            grade: "EN8".into(),
            dia: "32".into(),
            customer: "Acme".into(),
            standard: "IS".into(),
            heatno: "H123".into(),
            reciving_weight_kg: weight,
            rack_no: "R1".into(),
            location: "Yard".into(),
            type_of_material: "Purchased".into(),
            cost_per_kg: dec!(70),
            invoice_no: "INV-1".into(),
            milltc: None,
            spectro: None,
            ssb_inspection_report: None,
            customer_approval: None,
            verified_by: "qa".into(),
            approval_status: None,
            comments: None,
        }
    }

    #[test]
    fn non_positive_weight_is_a_field_error() {
        let err = lot(dec!(0)).check().unwrap_err();
        assert_matches!(err, ServiceError::InvalidFields(ref f) if f[0].field == "reciving_weight_kg");
    }

    #[test]
    fn approval_is_inferred_or_validated() {
        let mut input = lot(dec!(10));
        assert_eq!(input.check().unwrap(), ApprovalStatus::UnderInspection);

        input.type_of_material = "Job Work".into();
        assert_eq!(input.check().unwrap(), ApprovalStatus::Approved);

        input.approval_status = Some("Hold".into());
        assert_eq!(input.check().unwrap(), ApprovalStatus::Hold);

        input.approval_status = Some("Pending".into());
        assert_matches!(input.check(), Err(ServiceError::InvalidFields(_)));
    }

    #[test]
    fn blank_required_fields_are_reported_together() {
        let mut input = lot(dec!(-5));
        input.supplier = String::new();
        let fields = input.check().unwrap_err().field_errors().unwrap();
        let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
        assert!(names.contains(&"supplier"));
        assert!(names.contains(&"reciving_weight_kg"));
    }
}
