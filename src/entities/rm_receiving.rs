use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ledger::LedgerStatus;

/// Inspection outcome of a raw-material lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ApprovalStatus {
    #[serde(rename = "Under Inspection")]
    UnderInspection,
    Hold,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::UnderInspection => "Under Inspection",
            ApprovalStatus::Hold => "Hold",
            ApprovalStatus::Approved => "Approved",
            ApprovalStatus::Rejected => "Rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "under inspection" => Some(ApprovalStatus::UnderInspection),
            "hold" => Some(ApprovalStatus::Hold),
            "approved" => Some(ApprovalStatus::Approved),
            "rejected" => Some(ApprovalStatus::Rejected),
            _ => None,
        }
    }

    /// Job-work material arrives pre-approved; everything else waits for inspection.
    pub fn infer(type_of_material: &str) -> Self {
        if type_of_material.trim().to_uppercase() == "JOB WORK" {
            ApprovalStatus::Approved
        } else {
            ApprovalStatus::UnderInspection
        }
    }
}

/// A raw-material lot as received from a supplier.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "rm_receivings")]
#[schema(as = RmReceiving)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uid: Uuid,
    pub date: NaiveDate,
    pub supplier: String,
    pub grade: String,
    pub dia: String,
    pub customer: String,
    pub standard: String,
    pub heatno: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub reciving_weight_kg: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub hold_weight_kg: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub remaining: Decimal,
    pub rack_no: String,
    pub location: String,
    pub type_of_material: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub cost_per_kg: Decimal,
    pub invoice_no: String,
    pub milltc: Option<String>,
    pub spectro: Option<String>,
    pub ssb_inspection_report: Option<String>,
    pub customer_approval: Option<String>,
    pub verified_by: String,
    pub approval_status: String,
    pub comments: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn ledger_status(&self) -> Option<LedgerStatus> {
        LedgerStatus::from_str(&self.status)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::hold_material::Entity")]
    HoldMaterials,
}

impl Related<super::hold_material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HoldMaterials.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();
        if insert {
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(now);
            }
        }
        active_model.updated_at = Set(now);
        Ok(active_model)
    }
}
