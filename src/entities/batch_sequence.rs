use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Last value handed out for a sequence key such as `20250314_AC` or `TAG_2503`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "batch_sequences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub seq_key: String,
    pub last_value: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
