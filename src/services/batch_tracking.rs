use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Instant};
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{
    bulk_entry_error, collect_field_errors, day_end_exclusive, day_start, fields_result,
    filter_value, hold_material, icontains, reject_empty_bulk, Page, Recomputed,
};
use crate::db::{in_transaction, DbPool};
use crate::entities::{batch_tracking, hold_material as hold_entity};
use crate::errors::{FieldError, ServiceError};
use crate::events::{EventSender, LedgerEvent};
use crate::ledger;
use crate::tracing::record_ledger_write;

/// An issuance of hold material onto a line. Descriptive fields left blank
/// are copied from the batch.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewBatchTracking {
    /// Batch id of the hold being issued from.
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub batch_id: String,
    #[serde(default)]
    pub customer: String,
    #[serde(default, alias = "standerd")]
    pub standard: String,
    #[serde(default)]
    pub component: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub dia: String,
    #[serde(default)]
    pub heatno: String,
    #[serde(default)]
    pub rack_no: String,
    #[serde(default)]
    pub issue_bar_qty: String,
    #[schema(value_type = String, example = "120.00")]
    pub issue_qty_kg: Decimal,
    #[serde(default)]
    pub line: String,
    #[serde(default)]
    pub supplier: String,
    #[serde(default)]
    pub verified_by: String,
}

impl NewBatchTracking {
    fn check(&self) -> Result<(), ServiceError> {
        let mut fields = collect_field_errors(self);
        if self.issue_qty_kg <= Decimal::ZERO {
            fields.push(FieldError::new(
                "issue_qty_kg",
                "Issue weight must be greater than zero.",
            ));
        }
        fields_result(fields)
    }

    fn inherit_from(&mut self, hold: &hold_entity::Model) {
        let pairs = [
            (&mut self.customer, &hold.customer),
            (&mut self.standard, &hold.standard),
            (&mut self.component, &hold.component),
            (&mut self.grade, &hold.grade),
            (&mut self.dia, &hold.dia),
            (&mut self.heatno, &hold.heatno),
            (&mut self.rack_no, &hold.rack_no),
            (&mut self.supplier, &hold.supplier),
            (&mut self.line, &hold.line),
        ];
        for (field, from_hold) in pairs {
            if field.trim().is_empty() {
                *field = from_hold.clone();
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BatchTrackingFilter {
    pub component: Option<String>,
    pub grade: Option<String>,
    pub dia: Option<String>,
    pub customer: Option<String>,
    pub heatno: Option<String>,
    pub rack_no: Option<String>,
    pub issue_id: Option<String>,
    /// Batch id of the parent hold.
    pub batch_id: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// An issuance together with the batch id it was drawn from.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchIssue {
    #[serde(flatten)]
    pub issue: batch_tracking::Model,
    pub batch_id: String,
}

/// `ISSUE-` followed by eight uppercase hex characters.
pub fn generate_issue_id() -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("ISSUE-{}", &hex[..8])
}

async fn allocate_issue_id<C: ConnectionTrait>(
    conn: &C,
    max_attempts: u32,
) -> Result<String, ServiceError> {
    for attempt in 1..=max_attempts {
        let candidate = generate_issue_id();
        let taken = batch_tracking::Entity::find()
            .filter(batch_tracking::Column::IssueId.eq(candidate.as_str()))
            .one(conn)
            .await?
            .is_some();
        if !taken {
            return Ok(candidate);
        }
        debug!(attempt, candidate = %candidate, "issue id collision");
    }
    Err(ServiceError::Conflict(format!(
        "Could not allocate a unique issue id after {} attempts",
        max_attempts
    )))
}

struct IssueCreated {
    issue: batch_tracking::Model,
    batch_id: String,
    hold: Recomputed<hold_entity::Model>,
}

async fn insert_issue<C: ConnectionTrait>(
    conn: &C,
    mut input: NewBatchTracking,
    tolerance: Decimal,
    max_attempts: u32,
) -> Result<IssueCreated, ServiceError> {
    input.check()?;
    let qty = ledger::normalize_kg(input.issue_qty_kg);

    let hold = hold_material::lock_hold(conn, input.batch_id.trim()).await?;
    let issued = hold_material::issued_kg(conn, hold.id).await?;
    let available = ledger::remaining(hold.hold_material_qty_kg, issued);
    if qty > available {
        return Err(ServiceError::field(
            "issue_qty_kg",
            format!(
                "Issue weight ({}) exceeds available remaining weight ({})",
                qty, available
            ),
        ));
    }
    input.inherit_from(&hold);

    let issue_id = allocate_issue_id(conn, max_attempts).await?;
    let issue = batch_tracking::ActiveModel {
        hold_material_id: Set(hold.id),
        issue_id: Set(issue_id),
        customer: Set(input.customer),
        standard: Set(input.standard),
        component: Set(input.component),
        grade: Set(input.grade),
        dia: Set(input.dia),
        heatno: Set(input.heatno),
        rack_no: Set(input.rack_no),
        issue_bar_qty: Set(input.issue_bar_qty),
        issue_qty_kg: Set(qty),
        line: Set(input.line),
        supplier: Set(input.supplier),
        verified_by: Set(input.verified_by),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    let batch_id = hold.batch_id.clone();
    let hold = hold_material::refresh_hold(conn, hold, tolerance).await?;
    Ok(IssueCreated {
        issue,
        batch_id,
        hold,
    })
}

fn events_for(created: &IssueCreated) -> Vec<LedgerEvent> {
    let mut events = vec![LedgerEvent::MaterialIssued {
        issue_id: created.issue.issue_id.clone(),
        batch_id: created.batch_id.clone(),
        issue_qty_kg: created.issue.issue_qty_kg,
    }];
    events.extend(hold_material::status_event(&created.hold));
    events
}

#[derive(Clone)]
pub struct BatchTrackingService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    tolerance: Decimal,
    max_attempts: u32,
}

impl BatchTrackingService {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        tolerance: Decimal,
        max_attempts: u32,
    ) -> Self {
        Self {
            db,
            event_sender,
            tolerance,
            max_attempts,
        }
    }

    #[instrument(skip(self, input), fields(batch_id = %input.batch_id))]
    pub async fn create(&self, input: NewBatchTracking) -> Result<BatchIssue, ServiceError> {
        let start = Instant::now();
        let (tolerance, max_attempts) = (self.tolerance, self.max_attempts);

        let result = in_transaction(&self.db, move |txn| {
            Box::pin(async move { insert_issue(txn, input, tolerance, max_attempts).await })
        })
        .await;
        record_ledger_write("batch_tracking.create", result.is_ok(), start.elapsed());

        let created = result?;
        info!(
            issue_id = %created.issue.issue_id,
            qty_kg = %created.issue.issue_qty_kg,
            hold_status = %created.hold.status,
            "material issued"
        );
        self.event_sender.emit_all(events_for(&created)).await;
        Ok(BatchIssue {
            issue: created.issue,
            batch_id: created.batch_id,
        })
    }

    #[instrument(skip(self, inputs), fields(count = inputs.len()))]
    pub async fn create_bulk(
        &self,
        inputs: Vec<NewBatchTracking>,
    ) -> Result<Vec<BatchIssue>, ServiceError> {
        reject_empty_bulk(inputs.len())?;
        let start = Instant::now();
        let (tolerance, max_attempts) = (self.tolerance, self.max_attempts);

        let result = in_transaction(&self.db, move |txn| {
            Box::pin(async move {
                let total = inputs.len();
                let mut created = Vec::with_capacity(total);
                let mut rejected = Vec::new();

                for (index, input) in inputs.into_iter().enumerate() {
                    match insert_issue(txn, input, tolerance, max_attempts).await {
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
        record_ledger_write("batch_tracking.create_bulk", result.is_ok(), start.elapsed());

        let created = result?;
        info!(created = created.len(), "bulk issuance committed");
        let events = created.iter().flat_map(events_for).collect();
        self.event_sender.emit_all(events).await;
        Ok(created
            .into_iter()
            .map(|c| BatchIssue {
                issue: c.issue,
                batch_id: c.batch_id,
            })
            .collect())
    }

    pub async fn get(&self, issue_id: &str) -> Result<BatchIssue, ServiceError> {
        let (issue, hold) = batch_tracking::Entity::find()
            .find_also_related(hold_entity::Entity)
            .filter(batch_tracking::Column::IssueId.eq(issue_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Issue {} not found", issue_id)))?;
        Ok(BatchIssue {
            issue,
            batch_id: hold.map(|h| h.batch_id).unwrap_or_default(),
        })
    }

    #[instrument(skip(self, filter))]
    pub async fn list(
        &self,
        filter: &BatchTrackingFilter,
        page: u64,
        per_page: u64,
    ) -> Result<Page<BatchIssue>, ServiceError> {
        let mut query = batch_tracking::Entity::find().find_also_related(hold_entity::Entity);

        let text_filters = [
            (batch_tracking::Column::Component, &filter.component),
            (batch_tracking::Column::Grade, &filter.grade),
            (batch_tracking::Column::Dia, &filter.dia),
            (batch_tracking::Column::Customer, &filter.customer),
            (batch_tracking::Column::Heatno, &filter.heatno),
            (batch_tracking::Column::RackNo, &filter.rack_no),
            (batch_tracking::Column::IssueId, &filter.issue_id),
        ];
        for (column, value) in text_filters {
            if let Some(v) = filter_value(value) {
                query = query.filter(icontains(column, v));
            }
        }
        if let Some(v) = filter_value(&filter.batch_id) {
            query = query.filter(icontains(hold_entity::Column::BatchId, v));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(batch_tracking::Column::CreatedAt.gte(day_start(from)));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(batch_tracking::Column::CreatedAt.lt(day_end_exclusive(to)));
        }

        let paginator = query
            .order_by_desc(batch_tracking::Column::CreatedAt)
            .order_by_desc(batch_tracking::Column::Id)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        let items = rows
            .into_iter()
            .map(|(issue, hold)| BatchIssue {
                issue,
                batch_id: hold.map(|h| h.batch_id).unwrap_or_default(),
            })
            .collect();
        Ok(Page {
            items,
            total,
            page,
            per_page,
        })
    }
}
