use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Instant};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use super::stage_progress::{self, ProcessStage, TagSide};
use super::{collect_field_errors, fields_result, sequence, POSITIVE};
use crate::db::{in_transaction, DbPool};
use crate::entities::{
    hold_material,
    process_tag::{self, TagStatus},
};
use crate::errors::{FieldError, ServiceError};
use crate::tracing::record_ledger_write;

pub const DEFAULT_RECENT_LIMIT: u64 = 20;
const MAX_RECENT_LIMIT: u64 = 200;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewProcessTag {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub generated_by: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub current_process: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub next_process: String,
    pub qty: i32,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub batch_id: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub heat_no: String,
    #[serde(default)]
    pub customer: String,
    #[serde(default)]
    pub component: String,
    /// `ok`, `reject` or `rework`. Defaults to `ok`.
    #[serde(default)]
    pub status: Option<String>,
}

impl NewProcessTag {
    fn check(&self) -> Result<TagStatus, ServiceError> {
        let mut fields = collect_field_errors(self);
        if self.qty <= 0 {
            fields.push(FieldError::new("qty", POSITIVE));
        }
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => Some(TagStatus::Ok),
            Some(raw) => {
                let parsed = TagStatus::from_str(raw);
                if parsed.is_none() {
                    fields.push(FieldError::new(
                        "status",
                        format!("\"{}\" is not a valid choice.", raw),
                    ));
                }
                parsed
            }
        };
        fields_result(fields)?;
        status.ok_or_else(|| ServiceError::field("status", "is not a valid choice."))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ProceedCheck {
    pub tag_uid: String,
    pub status: String,
    pub can_proceed: bool,
}

/// Pieces the current process can still tag forward.
async fn taggable_qty<C: ConnectionTrait>(
    conn: &C,
    batch_id: &str,
    current_process: &str,
) -> Result<i64, ServiceError> {
    let forging = ProcessStage::Forging.label();
    if current_process.trim().eq_ignore_ascii_case(forging) {
        let pieces = stage_progress::batch_pieces(conn, batch_id).await?;
        let tagged = stage_progress::tag_qty(conn, batch_id, TagSide::Current, forging).await?;
        return Ok((pieces - tagged).max(0));
    }
    let balance = stage_progress::department_balance(conn, batch_id, current_process.trim()).await?;
    Ok(balance.remaining_qty)
}

async fn insert_tag<C: ConnectionTrait>(
    conn: &C,
    mut input: NewProcessTag,
) -> Result<process_tag::Model, ServiceError> {
    let status = input.check()?;
    let batch_id = input.batch_id.trim().to_string();

    let available = taggable_qty(conn, &batch_id, &input.current_process).await?;
    if i64::from(input.qty) > available {
        return Err(ServiceError::field(
            "qty",
            format!(
                "Quantity ({}) exceeds the quantity available in {} ({})",
                input.qty,
                input.current_process.trim(),
                available
            ),
        ));
    }

    let hold = hold_material::Entity::find()
        .filter(hold_material::Column::BatchId.eq(batch_id.as_str()))
        .one(conn)
        .await?;
    if let Some(hold) = hold {
        for (field, from_hold) in [
            (&mut input.grade, hold.grade),
            (&mut input.heat_no, hold.heatno),
            (&mut input.customer, hold.customer),
            (&mut input.component, hold.component),
        ] {
            if field.trim().is_empty() {
                *field = from_hold;
            }
        }
    }

    let tag_uid = sequence::next_tag_uid(conn, Utc::now().date_naive()).await?;
    let tag = process_tag::ActiveModel {
        tag_uid: Set(tag_uid),
        generated_by: Set(input.generated_by),
        current_process: Set(input.current_process.trim().to_string()),
        next_process: Set(input.next_process.trim().to_string()),
        qty: Set(input.qty),
        grade: Set(input.grade),
        heat_no: Set(input.heat_no),
        customer: Set(input.customer),
        component: Set(input.component),
        batch_id: Set(batch_id),
        status: Set(status.as_str().to_string()),
        is_printed: Set(false),
        printed_at: Set(None),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(tag)
}

#[derive(Clone)]
pub struct TagService {
    db: Arc<DbPool>,
}

impl TagService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), fields(batch_id = %input.batch_id, from = %input.current_process, to = %input.next_process))]
    pub async fn create(&self, input: NewProcessTag) -> Result<process_tag::Model, ServiceError> {
        let start = Instant::now();
        let result = in_transaction(&self.db, move |txn| {
            Box::pin(async move { insert_tag(txn, input).await })
        })
        .await;
        record_ledger_write("tags.create", result.is_ok(), start.elapsed());

        let tag = result?;
        info!(tag_uid = %tag.tag_uid, qty = tag.qty, status = %tag.status, "process tag generated");
        Ok(tag)
    }

    pub async fn get(&self, tag_uid: &str) -> Result<process_tag::Model, ServiceError> {
        process_tag::Entity::find()
            .filter(process_tag::Column::TagUid.eq(tag_uid.trim()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound("Tag not found with the provided UID".to_string())
            })
    }

    #[instrument(skip(self))]
    pub async fn mark_printed(&self, tag_uid: &str) -> Result<process_tag::Model, ServiceError> {
        let tag = self.get(tag_uid).await?;
        let mut active: process_tag::ActiveModel = tag.into();
        active.is_printed = Set(true);
        active.printed_at = Set(Some(Utc::now()));
        let tag = active.update(&*self.db).await?;
        info!(tag_uid = %tag.tag_uid, "tag marked printed");
        Ok(tag)
    }

    /// Newest tags first.
    pub async fn recent(&self, limit: Option<u64>) -> Result<Vec<process_tag::Model>, ServiceError> {
        let limit = limit
            .unwrap_or(DEFAULT_RECENT_LIMIT)
            .clamp(1, MAX_RECENT_LIMIT);
        Ok(process_tag::Entity::find()
            .order_by_desc(process_tag::Column::GeneratedAt)
            .order_by_desc(process_tag::Column::Id)
            .limit(limit)
            .all(&*self.db)
            .await?)
    }

    pub async fn can_proceed(&self, tag_uid: &str) -> Result<ProceedCheck, ServiceError> {
        let tag = self.get(tag_uid).await?;
        Ok(ProceedCheck {
            can_proceed: tag.can_proceed(),
            tag_uid: tag.tag_uid,
            status: tag.status,
        })
    }
}
