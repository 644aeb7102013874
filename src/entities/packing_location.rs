use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A packing-area bin, addressed by its unique code.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "packing_locations")]
#[schema(as = PackingLocation)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub code: String,
    pub description: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::packing_transaction::Entity")]
    PackingTransactions,
}

impl Related<super::packing_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PackingTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
