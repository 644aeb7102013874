use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Instant};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{
    bulk_entry_error, collect_field_errors, day_end_exclusive, day_start, fields_result,
    filter_value, icontains, masterlist, packing_area, reject_empty_bulk, rm_receiving, sequence,
    KgTotal, Page, Recomputed,
};
use crate::db::{in_transaction, DbPool};
use crate::entities::{batch_tracking, hold_material, rm_receiving as lot_entity};
use crate::errors::{FieldError, ServiceError};
use crate::events::{EventSender, LedgerEntity, LedgerEvent};
use crate::ledger::{self, derive_status, LedgerStatus};
use crate::tracing::record_ledger_write;

const SEARCH_MIN_LEN: usize = 2;
const SEARCH_LIMIT: u64 = 10;

/// A batch carved out of a lot. Descriptive fields left blank are copied
/// from the parent lot when one is given.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewHoldMaterial {
    #[serde(default)]
    pub rm_receiving: Option<Uuid>,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub component: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub customer: String,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub slug_weight: Option<Decimal>,
    #[serde(default)]
    pub supplier: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default, alias = "standerd")]
    pub standard: String,
    #[serde(default)]
    pub heatno: String,
    #[serde(default)]
    pub dia: String,
    #[serde(default)]
    pub rack_no: String,
    #[serde(default)]
    pub pieces: i32,
    #[schema(value_type = String, example = "600.00")]
    pub hold_material_qty_kg: Decimal,
    #[serde(default)]
    pub line: String,
    #[serde(default)]
    pub verified_by: String,
}

impl NewHoldMaterial {
    fn check(&self) -> Result<(), ServiceError> {
        let mut fields = collect_field_errors(self);
        if self.hold_material_qty_kg <= Decimal::ZERO {
            fields.push(FieldError::new(
                "hold_material_qty_kg",
                "Hold material weight must be greater than zero.",
            ));
        }
        if self.pieces < 0 {
            fields.push(FieldError::new("pieces", "Ensure this value is not negative."));
        }
        if matches!(self.slug_weight, Some(w) if w < Decimal::ZERO) {
            fields.push(FieldError::new("slug_weight", "Ensure this value is not negative."));
        }
        fields_result(fields)
    }

    fn inherit_from(&mut self, lot: &lot_entity::Model) {
        let pairs = [
            (&mut self.supplier, &lot.supplier),
            (&mut self.grade, &lot.grade),
            (&mut self.standard, &lot.standard),
            (&mut self.heatno, &lot.heatno),
            (&mut self.dia, &lot.dia),
            (&mut self.rack_no, &lot.rack_no),
        ];
        for (field, from_lot) in pairs {
            if field.trim().is_empty() {
                *field = from_lot.clone();
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct HoldMaterialFilter {
    pub component: Option<String>,
    pub grade: Option<String>,
    pub dia: Option<String>,
    pub supplier: Option<String>,
    pub customer: Option<String>,
    pub heatno: Option<String>,
    pub rack_no: Option<String>,
    pub batch_id: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// `open`, `partial`, `complete`, or `all`.
    pub status: Option<String>,
}

/// What the packing screen needs to book a batch into a bin.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HoldPackingDetails {
    pub batch_id: String,
    pub hold_material_id: i32,
    pub original_component: String,
    pub cleaned_component: String,
    pub component_options: Vec<String>,
    pub has_parent_child: bool,
    #[schema(value_type = Option<String>)]
    pub slug_weight: Option<Decimal>,
    /// Pieces not yet stocked into any location.
    pub max_qty: i64,
    pub customer: String,
    pub supplier: String,
    pub grade: String,
    #[schema(value_type = String)]
    pub remaining: Decimal,
    #[schema(value_type = String)]
    pub hold_material_qty_kg: Decimal,
}

/// What one committed hold creation changed.
struct HoldCreated {
    hold: hold_material::Model,
    lot: Option<Recomputed<lot_entity::Model>>,
}

async fn insert_hold<C: ConnectionTrait>(
    conn: &C,
    mut input: NewHoldMaterial,
    today: NaiveDate,
    tolerance: Decimal,
) -> Result<HoldCreated, ServiceError> {
    input.check()?;
    let qty = ledger::normalize_kg(input.hold_material_qty_kg);

    let lot = match input.rm_receiving {
        Some(uid) => Some(rm_receiving::lock_lot(conn, uid).await?),
        None => None,
    };
    if let Some(lot) = &lot {
        let allocated = rm_receiving::allocated_kg(conn, lot.uid).await?;
        let available = ledger::remaining(lot.reciving_weight_kg, allocated);
        if qty > available {
            return Err(ServiceError::field(
                "hold_material_qty_kg",
                format!(
                    "Hold weight ({}) exceeds available remaining weight ({})",
                    qty, available
                ),
            ));
        }
        input.inherit_from(lot);
    }

    let batch_id = sequence::next_batch_id(conn, today, &input.customer).await?;
    let hold = hold_material::ActiveModel {
        rm_receiving_uid: Set(input.rm_receiving),
        batch_id: Set(batch_id),
        component: Set(input.component.trim().to_string()),
        customer: Set(input.customer.trim().to_string()),
        slug_weight: Set(input.slug_weight.map(ledger::normalize_kg)),
        supplier: Set(input.supplier),
        grade: Set(input.grade),
        standard: Set(input.standard),
        heatno: Set(input.heatno),
        dia: Set(input.dia),
        rack_no: Set(input.rack_no),
        pieces: Set(input.pieces),
        hold_material_qty_kg: Set(qty),
        issue_qty_kg: Set(Decimal::ZERO),
        remaining: Set(qty),
        line: Set(input.line),
        verified_by: Set(input.verified_by),
        status: Set(LedgerStatus::Open.as_str().to_string()),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    let lot = match lot {
        Some(lot) => Some(rm_receiving::refresh_lot(conn, lot, tolerance).await?),
        None => None,
    };

    Ok(HoldCreated { hold, lot })
}

pub(crate) async fn lock_hold<C: ConnectionTrait>(
    conn: &C,
    batch_id: &str,
) -> Result<hold_material::Model, ServiceError> {
    hold_material::Entity::find()
        .filter(hold_material::Column::BatchId.eq(batch_id))
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Batch {} not found", batch_id)))
}

pub(crate) async fn lock_hold_by_id<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<hold_material::Model, ServiceError> {
    hold_material::Entity::find_by_id(id)
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Material {} not found", id)))
}

/// Σ issue_qty_kg over the issuances drawn from `hold_id`.
pub(crate) async fn issued_kg<C: ConnectionTrait>(
    conn: &C,
    hold_id: i32,
) -> Result<Decimal, ServiceError> {
    let row = batch_tracking::Entity::find()
        .select_only()
        .column_as(batch_tracking::Column::IssueQtyKg.sum(), "total")
        .filter(batch_tracking::Column::HoldMaterialId.eq(hold_id))
        .into_model::<KgTotal>()
        .one(conn)
        .await?;
    Ok(KgTotal::kg(row))
}

/// Re-derives `issue_qty_kg`, `remaining` and `status` of a hold from its
/// issuances. Writes only when something differs.
pub(crate) async fn refresh_hold<C: ConnectionTrait>(
    conn: &C,
    hold: hold_material::Model,
    tolerance: Decimal,
) -> Result<Recomputed<hold_material::Model>, ServiceError> {
    let consumed = issued_kg(conn, hold.id).await?;
    let capacity = ledger::normalize_kg(hold.hold_material_qty_kg);
    let remaining = ledger::remaining(capacity, consumed);
    let status = derive_status(capacity, consumed, tolerance);
    let previous_status = hold.ledger_status();

    let changed = ledger::normalize_kg(hold.issue_qty_kg) != consumed
        || ledger::normalize_kg(hold.remaining) != remaining
        || previous_status != Some(status);
    if !changed {
        return Ok(Recomputed {
            model: hold,
            previous_status,
            status,
            changed,
        });
    }

    let mut active: hold_material::ActiveModel = hold.into();
    active.issue_qty_kg = Set(consumed);
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

pub(crate) fn status_event(outcome: &Recomputed<hold_material::Model>) -> Option<LedgerEvent> {
    if !outcome.status_changed() {
        return None;
    }
    Some(LedgerEvent::LedgerStatusChanged {
        entity: LedgerEntity::HoldMaterial,
        key: outcome.model.batch_id.clone(),
        old_status: outcome.previous_status.unwrap_or(LedgerStatus::Open),
        new_status: outcome.status,
        remaining: outcome.model.remaining,
    })
}

fn events_for(created: &HoldCreated) -> Vec<LedgerEvent> {
    let mut events = vec![LedgerEvent::HoldMaterialCreated {
        batch_id: created.hold.batch_id.clone(),
        rm_receiving_uid: created.hold.rm_receiving_uid,
        hold_material_qty_kg: created.hold.hold_material_qty_kg,
    }];
    if let Some(event) = created.lot.as_ref().and_then(rm_receiving::status_event) {
        events.push(event);
    }
    events
}

#[derive(Clone)]
pub struct HoldMaterialService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    tolerance: Decimal,
}

impl HoldMaterialService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, tolerance: Decimal) -> Self {
        Self {
            db,
            event_sender,
            tolerance,
        }
    }

    /// Carves a batch out of its lot, allocating the batch id and refreshing
    /// the lot in the same transaction.
    #[instrument(skip(self, input), fields(customer = %input.customer, lot = ?input.rm_receiving))]
    pub async fn create(&self, input: NewHoldMaterial) -> Result<hold_material::Model, ServiceError> {
        let start = Instant::now();
        let tolerance = self.tolerance;
        let today = Utc::now().date_naive();

        let result = in_transaction(&self.db, move |txn| {
            Box::pin(async move { insert_hold(txn, input, today, tolerance).await })
        })
        .await;
        record_ledger_write("hold_material.create", result.is_ok(), start.elapsed());

        let created = result?;
        info!(
            batch_id = %created.hold.batch_id,
            qty_kg = %created.hold.hold_material_qty_kg,
            "hold material created"
        );
        self.event_sender.emit_all(events_for(&created)).await;
        Ok(created.hold)
    }

    /// All-or-nothing. Entries run in order inside one transaction, so each
    /// sees the allocations made by the entries before it.
    #[instrument(skip(self, inputs), fields(count = inputs.len()))]
    pub async fn create_bulk(
        &self,
        inputs: Vec<NewHoldMaterial>,
    ) -> Result<Vec<hold_material::Model>, ServiceError> {
        reject_empty_bulk(inputs.len())?;
        let start = Instant::now();
        let tolerance = self.tolerance;
        let today = Utc::now().date_naive();

        let result = in_transaction(&self.db, move |txn| {
            Box::pin(async move {
                let total = inputs.len();
                let mut created = Vec::with_capacity(total);
                let mut rejected = Vec::new();

                for (index, input) in inputs.into_iter().enumerate() {
                    match insert_hold(txn, input, today, tolerance).await {
                        Ok(row) => created.push(row),
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
        record_ledger_write("hold_material.create_bulk", result.is_ok(), start.elapsed());

        let created = result?;
        info!(created = created.len(), "bulk hold material committed");
        let events = created.iter().flat_map(events_for).collect();
        self.event_sender.emit_all(events).await;
        Ok(created.into_iter().map(|c| c.hold).collect())
    }

    pub async fn get(&self, batch_id: &str) -> Result<hold_material::Model, ServiceError> {
        hold_material::Entity::find()
            .filter(hold_material::Column::BatchId.eq(batch_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Batch {} not found", batch_id)))
    }

    #[instrument(skip(self, filter))]
    pub async fn list(
        &self,
        filter: &HoldMaterialFilter,
        page: u64,
        per_page: u64,
    ) -> Result<Page<hold_material::Model>, ServiceError> {
        let mut query = hold_material::Entity::find();

        let text_filters = [
            (hold_material::Column::Component, &filter.component),
            (hold_material::Column::Grade, &filter.grade),
            (hold_material::Column::Dia, &filter.dia),
            (hold_material::Column::Supplier, &filter.supplier),
            (hold_material::Column::Customer, &filter.customer),
            (hold_material::Column::Heatno, &filter.heatno),
            (hold_material::Column::RackNo, &filter.rack_no),
            (hold_material::Column::BatchId, &filter.batch_id),
        ];
        for (column, value) in text_filters {
            if let Some(v) = filter_value(value) {
                query = query.filter(icontains(column, v));
            }
        }
        if let Some(from) = filter.date_from {
            query = query.filter(hold_material::Column::CreatedAt.gte(day_start(from)));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(hold_material::Column::CreatedAt.lt(day_end_exclusive(to)));
        }
        match filter_value(&filter.status) {
            None => {}
            Some(s) if s.eq_ignore_ascii_case("all") => {}
            Some(s) => {
                let status = LedgerStatus::from_str(s).ok_or_else(|| {
                    ServiceError::field("status", format!("\"{}\" is not a valid choice.", s))
                })?;
                query = query.filter(hold_material::Column::Status.eq(status.as_str()));
            }
        }

        let paginator = query
            .order_by_desc(hold_material::Column::CreatedAt)
            .order_by_desc(hold_material::Column::Id)
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

    #[instrument(skip(self))]
    pub async fn update_status(&self, batch_id: &str) -> Result<hold_material::Model, ServiceError> {
        let tolerance = self.tolerance;
        let batch_id = batch_id.to_string();
        let outcome = in_transaction(&self.db, move |txn| {
            Box::pin(async move {
                let hold = lock_hold(txn, &batch_id).await?;
                refresh_hold(txn, hold, tolerance).await
            })
        })
        .await?;

        if let Some(event) = status_event(&outcome) {
            self.event_sender.emit(event).await;
        }
        Ok(outcome.model)
    }

    /// Batch ids containing `term`, for type-ahead. Short terms match nothing.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> Result<Vec<String>, ServiceError> {
        let term = term.trim();
        if term.chars().count() < SEARCH_MIN_LEN {
            return Ok(Vec::new());
        }
        Ok(hold_material::Entity::find()
            .select_only()
            .column(hold_material::Column::BatchId)
            .distinct()
            .filter(icontains(hold_material::Column::BatchId, term))
            .order_by_asc(hold_material::Column::BatchId)
            .limit(SEARCH_LIMIT)
            .into_tuple::<String>()
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn packing_details(&self, batch_id: &str) -> Result<HoldPackingDetails, ServiceError> {
        let hold = self.get(batch_id).await?;
        let stocked = packing_area::stocked_in_pieces(&*self.db, hold.id).await?;
        let options = masterlist::component_options(&*self.db, &hold.component).await?;

        Ok(HoldPackingDetails {
            max_qty: (i64::from(hold.pieces) - stocked).max(0),
            slug_weight: options.slug_weight.or(hold.slug_weight),
            has_parent_child: options.has_parent_child,
            component_options: options.options,
            cleaned_component: options.cleaned_component,
            original_component: hold.component,
            batch_id: hold.batch_id,
            hold_material_id: hold.id,
            customer: hold.customer,
            supplier: hold.supplier,
            grade: hold.grade,
            remaining: hold.remaining,
            hold_material_qty_kg: hold.hold_material_qty_kg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn batch(qty: Decimal) -> NewHoldMaterial {
        NewHoldMaterial {
            rm_receiving: None,
            component: "AB123".into(),
            customer: "Acme".into(),
            slug_weight: Some(dec!(2.5)),
            supplier: String::new(),
            grade: String::new(),
            standard: String::new(),
            heatno: String::new(),
            dia: String::new(),
            rack_no: String::new(),
            pieces: 240,
            hold_material_qty_kg: qty,
            line: "L1".into(),
            verified_by: "qa".into(),
        }
    }

    #[test]
    fn quantity_and_pieces_are_checked() {
        assert!(batch(dec!(10)).check().is_ok());

        let mut input = batch(dec!(0));
        input.pieces = -1;
        let fields = input.check().unwrap_err().field_errors().unwrap();
        let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
        assert!(names.contains(&"hold_material_qty_kg"));
        assert!(names.contains(&"pieces"));
    }

    #[test]
    fn blank_component_is_rejected() {
        let mut input = batch(dec!(10));
        input.component = String::new();
        assert_matches!(input.check(), Err(ServiceError::InvalidFields(ref f)) if f[0].field == "component");
    }
}
