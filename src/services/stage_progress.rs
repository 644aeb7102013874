//! Per-department progress of a batch through the shop floor.
//!
//! Departments move quantities forward with process tags; each one reports
//! production and rejections as [`production_entry`] rows. What a department
//! still has to work on is what reached it minus what it has entered.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use super::{collect_field_errors, fields_result, iequals, QtyTotal};
use crate::db::DbPool;
use crate::entities::{hold_material, process_tag, production_entry};
use crate::errors::{FieldError, ServiceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessStage {
    Forging,
    HeatTreatment,
    PreMc,
    Machining,
    FinalInspection,
    Marking,
    Visual,
    Dispatch,
}

impl ProcessStage {
    pub const ALL: [ProcessStage; 8] = [
        ProcessStage::Forging,
        ProcessStage::HeatTreatment,
        ProcessStage::PreMc,
        ProcessStage::Machining,
        ProcessStage::FinalInspection,
        ProcessStage::Marking,
        ProcessStage::Visual,
        ProcessStage::Dispatch,
    ];

    /// Path segment used by the HTTP routes and stored on production entries.
    pub fn slug(&self) -> &'static str {
        match self {
            ProcessStage::Forging => "forging",
            ProcessStage::HeatTreatment => "heat-treatment",
            ProcessStage::PreMc => "pre-mc",
            ProcessStage::Machining => "machining",
            ProcessStage::FinalInspection => "final-inspection",
            ProcessStage::Marking => "marking",
            ProcessStage::Visual => "visual",
            ProcessStage::Dispatch => "dispatch",
        }
    }

    /// Department name as written on process tags.
    pub fn label(&self) -> &'static str {
        match self {
            ProcessStage::Forging => "Forging",
            ProcessStage::HeatTreatment => "Heat Treatment",
            ProcessStage::PreMc => "Pre MC",
            ProcessStage::Machining => "Machining",
            ProcessStage::FinalInspection => "Final Inspection",
            ProcessStage::Marking => "Marking",
            ProcessStage::Visual => "Visual",
            ProcessStage::Dispatch => "Dispatch",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        let slug = slug.trim();
        Self::ALL
            .into_iter()
            .find(|stage| stage.slug().eq_ignore_ascii_case(slug))
    }
}

impl fmt::Display for ProcessStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewProductionEntry {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub batch_number: String,
    #[serde(default)]
    pub component: String,
    #[validate(range(min = 0, message = "Ensure this value is not negative."))]
    pub production: i32,
    #[serde(default)]
    #[validate(range(min = 0, message = "Ensure this value is not negative."))]
    pub rejections: i32,
    /// Machining setup, `I` or `II`.
    #[serde(default)]
    pub setup: Option<String>,
    #[serde(default)]
    pub recorded_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StageRemaining {
    pub stage: ProcessStage,
    pub batch_id: String,
    pub total_received: i64,
    pub total_production: i64,
    pub total_rejections: i64,
    pub total_entered: i64,
    pub remaining: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DepartmentRemaining {
    pub batch_id: String,
    pub department: String,
    pub total_received: i64,
    pub total_generated: i64,
    pub remaining_qty: i64,
}

/// Which end of a tag a department sits on.
#[derive(Debug, Clone, Copy)]
pub(crate) enum TagSide {
    Current,
    Next,
}

/// Σ tag qty for `batch_id` whose current or next process is `department`.
pub(crate) async fn tag_qty<C: ConnectionTrait>(
    conn: &C,
    batch_id: &str,
    side: TagSide,
    department: &str,
) -> Result<i64, ServiceError> {
    let column = match side {
        TagSide::Current => process_tag::Column::CurrentProcess,
        TagSide::Next => process_tag::Column::NextProcess,
    };
    let row = process_tag::Entity::find()
        .select_only()
        .column_as(process_tag::Column::Qty.sum(), "total")
        .filter(process_tag::Column::BatchId.eq(batch_id))
        .filter(iequals(column, department))
        .into_model::<QtyTotal>()
        .one(conn)
        .await?;
    Ok(QtyTotal::qty(row))
}

/// `Σnext − Σcurrent` for the department, floored at zero.
pub(crate) async fn department_balance<C: ConnectionTrait>(
    conn: &C,
    batch_id: &str,
    department: &str,
) -> Result<DepartmentRemaining, ServiceError> {
    let received = tag_qty(conn, batch_id, TagSide::Next, department).await?;
    let generated = tag_qty(conn, batch_id, TagSide::Current, department).await?;
    Ok(DepartmentRemaining {
        batch_id: batch_id.to_string(),
        department: department.to_string(),
        total_received: received,
        total_generated: generated,
        remaining_qty: (received - generated).max(0),
    })
}

pub(crate) async fn batch_pieces<C: ConnectionTrait>(
    conn: &C,
    batch_id: &str,
) -> Result<i64, ServiceError> {
    hold_material::Entity::find()
        .filter(hold_material::Column::BatchId.eq(batch_id))
        .one(conn)
        .await?
        .map(|hold| i64::from(hold.pieces))
        .ok_or_else(|| ServiceError::NotFound(format!("Batch {} not found", batch_id)))
}

#[derive(Clone)]
pub struct StageProgressService {
    db: Arc<DbPool>,
}

impl StageProgressService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), fields(stage = stage.slug(), batch = %input.batch_number))]
    pub async fn record_entry(
        &self,
        stage: ProcessStage,
        input: NewProductionEntry,
    ) -> Result<production_entry::Model, ServiceError> {
        let mut fields = collect_field_errors(&input);
        let setup = match input.setup.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.to_ascii_uppercase().as_str() {
                s @ ("I" | "II") => Some(s.to_string()),
                _ => {
                    fields.push(FieldError::new("setup", "Invalid setup value. Use I or II."));
                    None
                }
            },
        };
        fields_result(fields)?;

        let entry = production_entry::ActiveModel {
            stage: Set(stage.slug().to_string()),
            batch_number: Set(input.batch_number.trim().to_string()),
            component: Set(input.component),
            production: Set(input.production),
            rejections: Set(input.rejections),
            setup: Set(setup),
            recorded_by: Set(input.recorded_by),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(id = entry.id, "production entry recorded");
        Ok(entry)
    }

    #[instrument(skip(self))]
    pub async fn stage_remaining(
        &self,
        stage: ProcessStage,
        batch_id: &str,
    ) -> Result<StageRemaining, ServiceError> {
        let batch_id = batch_id.trim();
        if batch_id.is_empty() {
            return Err(ServiceError::InvalidInput("Batch ID is required".to_string()));
        }
        let conn = &*self.db;

        let total_received = match stage {
            ProcessStage::Forging => batch_pieces(conn, batch_id).await?,
            _ => tag_qty(conn, batch_id, TagSide::Next, stage.label()).await?,
        };

        let entries = production_entry::Entity::find()
            .filter(production_entry::Column::Stage.eq(stage.slug()))
            .filter(production_entry::Column::BatchNumber.eq(batch_id));

        let mut production = entries
            .clone()
            .select_only()
            .column_as(production_entry::Column::Production.sum(), "total");
        if stage == ProcessStage::Machining {
            production = production.filter(iequals(production_entry::Column::Setup, "II"));
        }
        let total_production = QtyTotal::qty(production.into_model::<QtyTotal>().one(conn).await?);

        let rejections = entries
            .select_only()
            .column_as(production_entry::Column::Rejections.sum(), "total")
            .into_model::<QtyTotal>()
            .one(conn)
            .await?;
        let total_rejections = QtyTotal::qty(rejections);

        let total_entered = total_production + total_rejections;
        Ok(StageRemaining {
            stage,
            batch_id: batch_id.to_string(),
            total_received,
            total_production,
            total_rejections,
            total_entered,
            remaining: (total_received - total_entered).max(0),
        })
    }

    #[instrument(skip(self))]
    pub async fn department_remaining(
        &self,
        batch_id: Option<&str>,
        department: Option<&str>,
    ) -> Result<DepartmentRemaining, ServiceError> {
        let batch_id = batch_id.map(str::trim).unwrap_or_default();
        let department = department.map(str::trim).unwrap_or_default();
        if batch_id.is_empty() || department.is_empty() {
            return Err(ServiceError::InvalidInput(
                "Batch ID and Current Department are required".to_string(),
            ));
        }
        department_balance(&*self.db, batch_id, department).await
    }
}
