use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ledger::LedgerStatus;

/// A quarantine-released batch carved out of a raw-material lot.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "hold_materials")]
#[schema(as = HoldMaterial)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub rm_receiving_uid: Option<Uuid>,
    #[sea_orm(unique)]
    pub batch_id: String,
    pub component: String,
    pub customer: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub slug_weight: Option<Decimal>,
    pub supplier: String,
    pub grade: String,
    pub standard: String,
    pub heatno: String,
    pub dia: String,
    pub rack_no: String,
    pub pieces: i32,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub hold_material_qty_kg: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub issue_qty_kg: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub remaining: Decimal,
    pub line: String,
    pub verified_by: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn ledger_status(&self) -> Option<LedgerStatus> {
        LedgerStatus::from_str(&self.status)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::rm_receiving::Entity",
        from = "Column::RmReceivingUid",
        to = "super::rm_receiving::Column::Uid",
        on_delete = "Cascade"
    )]
    RmReceiving,
    #[sea_orm(has_many = "super::batch_tracking::Entity")]
    BatchTrackings,
    #[sea_orm(has_many = "super::packing_transaction::Entity")]
    PackingTransactions,
}

impl Related<super::rm_receiving::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RmReceiving.def()
    }
}

impl Related<super::batch_tracking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BatchTrackings.def()
    }
}

impl Related<super::packing_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PackingTransactions.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if insert {
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(Utc::now());
            }
        }
        Ok(active_model)
    }
}
