use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One issuance of hold material onto a production line. Append-only.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "batch_trackings")]
#[schema(as = BatchTracking)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub hold_material_id: i32,
    #[sea_orm(unique)]
    pub issue_id: String,
    pub customer: String,
    pub standard: String,
    pub component: String,
    pub grade: String,
    pub dia: String,
    pub heatno: String,
    pub rack_no: String,
    pub issue_bar_qty: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub issue_qty_kg: Decimal,
    pub line: String,
    pub supplier: String,
    pub verified_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::hold_material::Entity",
        from = "Column::HoldMaterialId",
        to = "super::hold_material::Column::Id",
        on_delete = "Cascade"
    )]
    HoldMaterial,
}

impl Related<super::hold_material::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HoldMaterial.def()
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
