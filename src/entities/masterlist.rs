use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Component catalog entry. Read-only from this service's point of view.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "masterlist_components")]
#[schema(as = MasterlistComponent)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub component: String,
    pub part_name: String,
    pub customer: String,
    pub supplier: String,
    pub drawing_sr_number: i32,
    pub standard: String,
    pub grade: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub slug_weight: Decimal,
    pub dia: String,
    pub ht_process: String,
    pub running_status: Option<String>,
    pub op_10_time: Option<i32>,
    pub op_10_target: Option<i32>,
    pub op_20_time: Option<i32>,
    pub op_20_target: Option<i32>,
    pub parent_component_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentComponentId",
        to = "Column::Id",
        on_delete = "SetNull"
    )]
    ParentComponent,
}

impl ActiveModelBehavior for ActiveModel {}
