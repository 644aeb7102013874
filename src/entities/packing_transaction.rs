use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ledger::StockDirection;

/// Immutable IN/OUT entry of the packing-area ledger. Balances are always
/// derived from these rows; nothing caches them.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "packing_transactions")]
#[schema(as = PackingTransaction)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub material_id: i32,
    pub location_id: i32,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub slug_weight: Decimal,
    pub qty: i32,
    pub transaction_type: String,
    pub verified_by: String,
    pub timestamp: DateTime<Utc>,
}

impl Model {
    pub fn direction(&self) -> Option<StockDirection> {
        StockDirection::from_str(&self.transaction_type)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::hold_material::Entity",
        from = "Column::MaterialId",
        to = "super::hold_material::Column::Id",
        on_delete = "Cascade"
    )]
    HoldMaterial,
    #[sea_orm(
        belongs_to = "super::packing_location::Entity",
        from = "Column::LocationId",
        to = "super::packing_location::Column::Id",
        on_delete = "Cascade"
    )]
    PackingLocation,
}

impl Related<super::hold_material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HoldMaterial.def()
    }
}

impl Related<super::packing_location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PackingLocation.def()
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
            if let ActiveValue::NotSet = active_model.timestamp {
                active_model.timestamp = Set(Utc::now());
            }
        }
        Ok(active_model)
    }
}
