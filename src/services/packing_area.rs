//! Packing-area stock ledger.
//!
//! Balances are never stored. Every figure here is `ΣIN − ΣOUT` over
//! `packing_transactions`, grouped by (material, location). Summaries report
//! the slug weight booked on the IN side; OUT rows carry their own weight and
//! never split a balance.

use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc, time::Instant};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{
    collect_field_errors, fields_result, filter_value, hold_material, icontains, masterlist,
    Page, QtyTotal, BLANK, POSITIVE,
};
use crate::db::{in_transaction, DbPool};
use crate::entities::{hold_material as hold_entity, packing_location, packing_transaction};
use crate::errors::{FieldError, ServiceError};
use crate::events::{EventSender, LedgerEvent};
use crate::ledger::{self, StockDirection};
use crate::tracing::record_ledger_write;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewLocation {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

/// One IN or OUT booking of pieces of a batch at a location.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct StockMovement {
    /// Id of the hold material being moved.
    pub material: i32,
    /// Id of the packing location.
    pub location: i32,
    pub qty: i32,
    #[schema(value_type = String, example = "2.50")]
    pub slug_weight: Decimal,
    #[serde(default)]
    pub verified_by: String,
}

impl StockMovement {
    fn check(&self) -> Result<(), ServiceError> {
        let mut fields = collect_field_errors(self);
        if self.qty <= 0 {
            fields.push(FieldError::new("qty", POSITIVE));
        }
        if self.slug_weight < Decimal::ZERO {
            fields.push(FieldError::new("slug_weight", "Ensure this value is not negative."));
        }
        fields_result(fields)
    }
}

/// A ledger entry with the batch and bin it refers to.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MovementView {
    #[serde(flatten)]
    pub transaction: packing_transaction::Model,
    pub batch_id: String,
    pub component: String,
    pub location_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AvailableMaterial {
    pub id: i32,
    pub component: String,
    pub batch_id: String,
    pub customer: String,
    #[schema(value_type = String)]
    pub slug_weight: Decimal,
    pub available_in_location: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LocationStock {
    pub material: i32,
    pub component: String,
    pub batch: String,
    #[schema(value_type = String)]
    pub slug_weight: Decimal,
    pub available_qty: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct InventoryRow {
    /// `<material>_<location>`.
    pub id: String,
    pub batch_id: String,
    pub component: String,
    pub customer: String,
    pub location: String,
    #[schema(value_type = String)]
    pub slug_weight: Decimal,
    pub available_qty: i64,
    #[schema(value_type = String)]
    pub weight_kg: Decimal,
    #[schema(value_type = String)]
    pub weight_ton: Decimal,
    pub material_id: i32,
    pub location_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct InventoryTotals {
    pub total_items: usize,
    pub total_quantity: i64,
    #[schema(value_type = String)]
    pub total_weight_kg: Decimal,
    #[schema(value_type = String)]
    pub total_weight_ton: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct InventorySummary {
    pub inventory: Vec<InventoryRow>,
    pub summary: InventoryTotals,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct InventoryFilter {
    /// Substring of the location code.
    pub location: Option<String>,
    /// Substring of the component name.
    pub component: Option<String>,
}

/// Aggregated balance of one (material, location) pair.
#[derive(Debug, Clone, FromQueryResult)]
struct Balance {
    material_id: i32,
    location_id: i32,
    slug_weight: Option<Decimal>,
    component: String,
    batch_id: String,
    customer: String,
    location_code: String,
    total_in: i64,
    total_out: i64,
}

impl Balance {
    fn available(&self) -> i64 {
        self.total_in - self.total_out
    }

    fn slug_weight(&self) -> Decimal {
        ledger::normalize_kg(self.slug_weight.unwrap_or_default())
    }
}

#[derive(Debug, FromQueryResult)]
struct InOut {
    total_in: i64,
    total_out: i64,
}

/// `COALESCE(SUM(CASE WHEN transaction_type = dir THEN qty ELSE 0 END), 0)`.
fn directed_qty(direction: StockDirection) -> SimpleExpr {
    let kind = Expr::col((
        packing_transaction::Entity,
        packing_transaction::Column::TransactionType,
    ));
    let qty = Expr::col((packing_transaction::Entity, packing_transaction::Column::Qty));
    let summed = Func::sum(Expr::case(kind.eq(direction.as_str()), qty).finally(0));
    Func::coalesce([SimpleExpr::from(summed), Expr::val(0).into()]).into()
}

/// `MAX(CASE WHEN transaction_type = 'IN' THEN slug_weight END)`.
fn stocked_slug_weight() -> SimpleExpr {
    let kind = Expr::col((
        packing_transaction::Entity,
        packing_transaction::Column::TransactionType,
    ));
    let weight = Expr::col((
        packing_transaction::Entity,
        packing_transaction::Column::SlugWeight,
    ));
    Func::max(Expr::case(kind.eq(StockDirection::In.as_str()), weight)).into()
}

/// Pieces available for `material` at `location`.
pub(crate) async fn available_at<C: ConnectionTrait>(
    conn: &C,
    material_id: i32,
    location_id: i32,
) -> Result<i64, ServiceError> {
    let row = packing_transaction::Entity::find()
        .select_only()
        .column_as(directed_qty(StockDirection::In), "total_in")
        .column_as(directed_qty(StockDirection::Out), "total_out")
        .filter(packing_transaction::Column::MaterialId.eq(material_id))
        .filter(packing_transaction::Column::LocationId.eq(location_id))
        .into_model::<InOut>()
        .one(conn)
        .await?;
    Ok(row.map(|r| r.total_in - r.total_out).unwrap_or(0))
}

/// Σ IN qty of `material` over every location.
pub(crate) async fn stocked_in_pieces<C: ConnectionTrait>(
    conn: &C,
    material_id: i32,
) -> Result<i64, ServiceError> {
    let row = packing_transaction::Entity::find()
        .select_only()
        .column_as(packing_transaction::Column::Qty.sum(), "total")
        .filter(packing_transaction::Column::MaterialId.eq(material_id))
        .filter(packing_transaction::Column::TransactionType.eq(StockDirection::In.as_str()))
        .into_model::<QtyTotal>()
        .one(conn)
        .await?;
    Ok(QtyTotal::qty(row))
}

fn balance_query() -> Select<packing_transaction::Entity> {
    packing_transaction::Entity::find()
        .select_only()
        .column(packing_transaction::Column::MaterialId)
        .column(packing_transaction::Column::LocationId)
        .column_as(stocked_slug_weight(), "slug_weight")
        .column_as(hold_entity::Column::Component, "component")
        .column_as(hold_entity::Column::BatchId, "batch_id")
        .column_as(hold_entity::Column::Customer, "customer")
        .column_as(packing_location::Column::Code, "location_code")
        .column_as(directed_qty(StockDirection::In), "total_in")
        .column_as(directed_qty(StockDirection::Out), "total_out")
        .join(
            JoinType::InnerJoin,
            packing_transaction::Relation::HoldMaterial.def(),
        )
        .join(
            JoinType::InnerJoin,
            packing_transaction::Relation::PackingLocation.def(),
        )
        .group_by(packing_transaction::Column::MaterialId)
        .group_by(packing_transaction::Column::LocationId)
        .group_by(hold_entity::Column::Component)
        .group_by(hold_entity::Column::BatchId)
        .group_by(hold_entity::Column::Customer)
        .group_by(packing_location::Column::Code)
}

/// Groups with stock on hand, ordered by component then location code.
async fn positive_balances<C: ConnectionTrait>(
    conn: &C,
    query: Select<packing_transaction::Entity>,
) -> Result<Vec<Balance>, ServiceError> {
    let mut rows: Vec<Balance> = query
        .into_model::<Balance>()
        .all(conn)
        .await?
        .into_iter()
        .filter(|b| b.available() > 0)
        .collect();
    rows.sort_by(|a, b| {
        a.component
            .cmp(&b.component)
            .then_with(|| a.location_code.cmp(&b.location_code))
            .then_with(|| a.material_id.cmp(&b.material_id))
    });
    Ok(rows)
}

async fn find_location<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<packing_location::Model, ServiceError> {
    packing_location::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Location {} not found", id)))
}

/// Locks the material, validates the move against the ledger and records it.
async fn record_movement<C: ConnectionTrait>(
    conn: &C,
    input: StockMovement,
    direction: StockDirection,
) -> Result<MovementView, ServiceError> {
    input.check()?;
    let hold = hold_material::lock_hold_by_id(conn, input.material).await?;
    let location = find_location(conn, input.location).await?;
    let qty = i64::from(input.qty);

    match direction {
        StockDirection::In => {
            let pieces = i64::from(hold.pieces);
            if qty > pieces {
                return Err(ServiceError::field(
                    "qty",
                    format!("Quantity exceeds available pieces. Maximum: {}", pieces),
                ));
            }
            let stocked = stocked_in_pieces(conn, hold.id).await?;
            if stocked + qty > pieces {
                return Err(ServiceError::field(
                    "qty",
                    format!(
                        "Quantity exceeds pieces not yet stocked. Maximum: {}",
                        (pieces - stocked).max(0)
                    ),
                ));
            }
        }
        StockDirection::Out => {
            let available = available_at(conn, hold.id, location.id).await?;
            if qty > available {
                return Err(ServiceError::field(
                    "qty",
                    format!(
                        "Not enough stock available. Available: {}, Requested: {}",
                        available, qty
                    ),
                ));
            }
        }
    }

    let transaction = packing_transaction::ActiveModel {
        material_id: Set(hold.id),
        location_id: Set(location.id),
        slug_weight: Set(ledger::normalize_kg(input.slug_weight)),
        qty: Set(input.qty),
        transaction_type: Set(direction.as_str().to_string()),
        verified_by: Set(input.verified_by),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    Ok(MovementView {
        transaction,
        batch_id: hold.batch_id,
        component: hold.component,
        location_code: location.code,
    })
}

#[derive(Clone)]
pub struct PackingAreaService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl PackingAreaService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_location(
        &self,
        input: NewLocation,
    ) -> Result<packing_location::Model, ServiceError> {
        let code = input.code.trim().to_string();
        if code.is_empty() {
            return Err(ServiceError::field("code", BLANK));
        }
        fields_result(collect_field_errors(&input))?;

        let existing = packing_location::Entity::find()
            .filter(packing_location::Column::Code.eq(code.as_str()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Location {} already exists",
                code
            )));
        }

        let inserted = packing_location::ActiveModel {
            code: Set(code.clone()),
            description: Set(input.description),
            ..Default::default()
        }
        .insert(&*self.db)
        .await;

        match inserted {
            Ok(location) => {
                info!(id = location.id, code = %location.code, "packing location created");
                Ok(location)
            }
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Err(
                ServiceError::Conflict(format!("Location {} already exists", code)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_locations(&self) -> Result<Vec<packing_location::Model>, ServiceError> {
        Ok(packing_location::Entity::find()
            .order_by_asc(packing_location::Column::Code)
            .all(&*self.db)
            .await?)
    }

    pub async fn stock_in(&self, input: StockMovement) -> Result<MovementView, ServiceError> {
        self.move_stock(input, StockDirection::In).await
    }

    pub async fn stock_out(&self, input: StockMovement) -> Result<MovementView, ServiceError> {
        self.move_stock(input, StockDirection::Out).await
    }

    #[instrument(skip(self, input), fields(material = input.material, location = input.location, qty = input.qty))]
    async fn move_stock(
        &self,
        input: StockMovement,
        direction: StockDirection,
    ) -> Result<MovementView, ServiceError> {
        let start = Instant::now();
        let result = in_transaction(&self.db, move |txn| {
            Box::pin(async move { record_movement(txn, input, direction).await })
        })
        .await;
        let operation = match direction {
            StockDirection::In => "packing.stock_in",
            StockDirection::Out => "packing.stock_out",
        };
        record_ledger_write(operation, result.is_ok(), start.elapsed());

        let view = result?;
        info!(
            transaction_id = view.transaction.id,
            batch_id = %view.batch_id,
            location = %view.location_code,
            %direction,
            "stock moved"
        );
        self.event_sender
            .emit(LedgerEvent::StockMoved {
                transaction_id: view.transaction.id,
                material_id: view.transaction.material_id,
                location_id: view.transaction.location_id,
                direction,
                qty: view.transaction.qty,
            })
            .await;
        Ok(view)
    }

    /// Materials with stock in the location, for picking an OUT.
    #[instrument(skip(self))]
    pub async fn available_for_location(
        &self,
        location_id: i32,
    ) -> Result<Vec<AvailableMaterial>, ServiceError> {
        find_location(&*self.db, location_id).await?;
        let query =
            balance_query().filter(packing_transaction::Column::LocationId.eq(location_id));
        Ok(positive_balances(&*self.db, query)
            .await?
            .into_iter()
            .map(|b| AvailableMaterial {
                available_in_location: b.available(),
                slug_weight: b.slug_weight(),
                id: b.material_id,
                component: b.component,
                batch_id: b.batch_id,
                customer: b.customer,
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn location_summary(&self, code: &str) -> Result<Vec<LocationStock>, ServiceError> {
        let location = packing_location::Entity::find()
            .filter(packing_location::Column::Code.eq(code))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Location {} not found", code)))?;
        let query =
            balance_query().filter(packing_transaction::Column::LocationId.eq(location.id));
        Ok(positive_balances(&*self.db, query)
            .await?
            .into_iter()
            .map(|b| LocationStock {
                available_qty: b.available(),
                slug_weight: b.slug_weight(),
                material: b.material_id,
                component: b.component,
                batch: b.batch_id,
            })
            .collect())
    }

    #[instrument(skip(self, filter))]
    pub async fn inventory_summary(
        &self,
        filter: &InventoryFilter,
    ) -> Result<InventorySummary, ServiceError> {
        let mut query = balance_query();
        if let Some(code) = filter_value(&filter.location) {
            query = query.filter(icontains(packing_location::Column::Code, code));
        }
        if let Some(component) = filter_value(&filter.component) {
            query = query.filter(icontains(hold_entity::Column::Component, component));
        }

        let inventory: Vec<InventoryRow> = positive_balances(&*self.db, query)
            .await?
            .into_iter()
            .map(|b| {
                let available = b.available();
                let slug_weight = b.slug_weight();
                let weight_kg = ledger::weight_kg(slug_weight, available);
                InventoryRow {
                    id: format!("{}_{}", b.material_id, b.location_id),
                    batch_id: b.batch_id,
                    component: b.component,
                    customer: b.customer,
                    location: b.location_code,
                    slug_weight,
                    available_qty: available,
                    weight_ton: ledger::weight_ton(weight_kg),
                    weight_kg,
                    material_id: b.material_id,
                    location_id: b.location_id,
                }
            })
            .collect();

        let total_weight_kg = ledger::sum_kg(inventory.iter().map(|row| row.weight_kg));
        let summary = InventoryTotals {
            total_items: inventory.len(),
            total_quantity: inventory.iter().map(|row| row.available_qty).sum(),
            total_weight_ton: ledger::weight_ton(total_weight_kg),
            total_weight_kg,
        };
        Ok(InventorySummary { inventory, summary })
    }

    /// Ledger entries of one direction, newest first.
    #[instrument(skip(self))]
    pub async fn history(
        &self,
        direction: StockDirection,
        page: u64,
        per_page: u64,
    ) -> Result<Page<MovementView>, ServiceError> {
        let paginator = packing_transaction::Entity::find()
            .filter(packing_transaction::Column::TransactionType.eq(direction.as_str()))
            .order_by_desc(packing_transaction::Column::Timestamp)
            .order_by_desc(packing_transaction::Column::Id)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        let material_ids: Vec<i32> = rows.iter().map(|r| r.material_id).collect();
        let location_ids: Vec<i32> = rows.iter().map(|r| r.location_id).collect();
        let holds: HashMap<i32, hold_entity::Model> = hold_entity::Entity::find()
            .filter(hold_entity::Column::Id.is_in(material_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|h| (h.id, h))
            .collect();
        let codes: HashMap<i32, String> = packing_location::Entity::find()
            .filter(packing_location::Column::Id.is_in(location_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|l| (l.id, l.code))
            .collect();

        let items = rows
            .into_iter()
            .map(|transaction| {
                let hold = holds.get(&transaction.material_id);
                MovementView {
                    batch_id: hold.map(|h| h.batch_id.clone()).unwrap_or_default(),
                    component: hold.map(|h| h.component.clone()).unwrap_or_default(),
                    location_code: codes
                        .get(&transaction.location_id)
                        .cloned()
                        .unwrap_or_default(),
                    transaction,
                }
            })
            .collect();

        Ok(Page {
            items,
            total,
            page,
            per_page,
        })
    }

    pub async fn component_filter_options(&self) -> Result<Vec<String>, ServiceError> {
        masterlist::component_names(&*self.db).await
    }
}
