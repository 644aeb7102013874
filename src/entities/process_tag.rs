use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Quality outcome stamped on a process tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TagStatus {
    Ok,
    Reject,
    Rework,
}

impl TagStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagStatus::Ok => "ok",
            TagStatus::Reject => "reject",
            TagStatus::Rework => "rework",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ok" => Some(TagStatus::Ok),
            "reject" => Some(TagStatus::Reject),
            "rework" => Some(TagStatus::Rework),
            _ => None,
        }
    }
}

/// A movement tag printed when a quantity of a batch leaves one process for the next.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "process_tags")]
#[schema(as = ProcessTag)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub tag_uid: String,
    pub generated_at: DateTime<Utc>,
    pub generated_by: String,
    pub current_process: String,
    pub next_process: String,
    pub qty: i32,
    pub grade: String,
    pub heat_no: String,
    pub customer: String,
    pub component: String,
    pub batch_id: String,
    pub status: String,
    pub is_printed: bool,
    pub printed_at: Option<DateTime<Utc>>,
}

impl Model {
    /// Only tags marked ok release material to the next operation.
    pub fn can_proceed(&self) -> bool {
        TagStatus::from_str(&self.status) == Some(TagStatus::Ok)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if insert {
            if let ActiveValue::NotSet = active_model.generated_at {
                active_model.generated_at = Set(Utc::now());
            }
        }
        Ok(active_model)
    }
}
