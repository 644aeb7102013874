//! Read-only access to the component catalog.

use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

use super::{icontains, iequals, Page};
use crate::db::DbPool;
use crate::entities::masterlist;
use crate::errors::ServiceError;

const SUGGESTION_LIMIT: u64 = 10;

/// Machining setup whose target is being looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setup {
    First,
    Second,
}

impl Setup {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "I" => Some(Setup::First),
            "II" => Some(Setup::Second),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Setup::First => "I",
            Setup::Second => "II",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OperationTarget {
    pub component: String,
    pub customer: String,
    pub drawing_number: i32,
    pub setup: String,
    pub target: Option<i32>,
}

/// Components a packed batch may be booked under.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ComponentOptions {
    /// Component name after dropping a standalone `NPD` word.
    pub cleaned_component: String,
    pub options: Vec<String>,
    pub has_parent_child: bool,
    /// Slug weight from the catalog, when the component is catalogued.
    #[schema(value_type = Option<String>)]
    pub slug_weight: Option<Decimal>,
}

/// Drops every whitespace-separated `NPD` token.
pub fn strip_npd_word(component: &str) -> String {
    component
        .split_whitespace()
        .filter(|word| *word != "NPD")
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lower-cases and removes a trailing `-npd` suffix.
pub fn strip_npd_suffix(component: &str) -> String {
    let lowered = component.trim().to_lowercase();
    match lowered.strip_suffix("-npd") {
        Some(base) => base.to_string(),
        None => lowered,
    }
}

async fn find_component<C: ConnectionTrait>(
    conn: &C,
    component: &str,
) -> Result<Option<masterlist::Model>, ServiceError> {
    Ok(masterlist::Entity::find()
        .filter(iequals(masterlist::Column::Component, component))
        .order_by_asc(masterlist::Column::Id)
        .one(conn)
        .await?)
}

async fn children_of<C: ConnectionTrait>(
    conn: &C,
    parent_id: i32,
) -> Result<Vec<String>, ServiceError> {
    Ok(masterlist::Entity::find()
        .select_only()
        .column(masterlist::Column::Component)
        .filter(masterlist::Column::ParentComponentId.eq(parent_id))
        .order_by_asc(masterlist::Column::Component)
        .into_tuple::<String>()
        .all(conn)
        .await?)
}

/// Resolves the parent/child family of `component`.
///
/// A child yields its parent followed by the parent's children, a parent
/// yields itself followed by its children, and anything else (including an
/// uncatalogued name) yields just itself.
pub(crate) async fn component_options<C: ConnectionTrait>(
    conn: &C,
    component: &str,
) -> Result<ComponentOptions, ServiceError> {
    let cleaned = strip_npd_word(component);

    let Some(entry) = find_component(conn, &cleaned).await? else {
        return Ok(ComponentOptions {
            cleaned_component: cleaned,
            options: vec![component.to_string()],
            has_parent_child: false,
            slug_weight: None,
        });
    };

    let parent = match entry.parent_component_id {
        Some(parent_id) => masterlist::Entity::find_by_id(parent_id).one(conn).await?,
        None => None,
    };

    let options = match parent {
        Some(parent) => {
            let mut options = vec![parent.component.clone()];
            options.extend(children_of(conn, parent.id).await?);
            options
        }
        None => {
            let mut options = vec![entry.component.clone()];
            options.extend(children_of(conn, entry.id).await?);
            options
        }
    };

    Ok(ComponentOptions {
        cleaned_component: cleaned,
        has_parent_child: options.len() > 1,
        options,
        slug_weight: Some(entry.slug_weight),
    })
}

/// Distinct catalogued component names, sorted.
pub(crate) async fn component_names<C: ConnectionTrait>(
    conn: &C,
) -> Result<Vec<String>, ServiceError> {
    Ok(masterlist::Entity::find()
        .select_only()
        .column(masterlist::Column::Component)
        .distinct()
        .order_by_asc(masterlist::Column::Component)
        .into_tuple::<String>()
        .all(conn)
        .await?)
}

#[derive(Clone)]
pub struct MasterlistService {
    db: Arc<DbPool>,
}

impl MasterlistService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<Page<masterlist::Model>, ServiceError> {
        let paginator = masterlist::Entity::find()
            .order_by_asc(masterlist::Column::Component)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok(Page {
            items,
            total,
            page,
            per_page,
        })
    }

    /// Up to ten distinct component names containing `q`.
    #[instrument(skip(self))]
    pub async fn suggest(&self, q: &str) -> Result<Vec<String>, ServiceError> {
        if q.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(masterlist::Entity::find()
            .select_only()
            .column(masterlist::Column::Component)
            .distinct()
            .filter(icontains(masterlist::Column::Component, q))
            .order_by_asc(masterlist::Column::Component)
            .limit(SUGGESTION_LIMIT)
            .into_tuple::<String>()
            .all(&*self.db)
            .await?)
    }

    /// The parent followed by its children.
    #[instrument(skip(self))]
    pub async fn child_components(&self, parent: &str) -> Result<Vec<String>, ServiceError> {
        let entry = find_component(&*self.db, parent.trim())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Component {} not found", parent)))?;
        let mut components = vec![entry.component.clone()];
        components.extend(children_of(&*self.db, entry.id).await?);
        Ok(components)
    }

    #[instrument(skip(self))]
    pub async fn operation_target(
        &self,
        component: &str,
        setup: &str,
    ) -> Result<OperationTarget, ServiceError> {
        let setup = Setup::parse(setup).ok_or_else(|| {
            ServiceError::InvalidInput("Invalid setup value. Use I or II.".to_string())
        })?;
        let key = strip_npd_suffix(component);
        let entry = find_component(&*self.db, &key)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Component not found".to_string()))?;

        let target = match setup {
            Setup::First => entry.op_10_target,
            Setup::Second => entry.op_20_target,
        };
        Ok(OperationTarget {
            component: entry.component,
            customer: entry.customer,
            drawing_number: entry.drawing_sr_number,
            setup: setup.as_str().to_string(),
            target,
        })
    }

    pub async fn component_options(&self, component: &str) -> Result<ComponentOptions, ServiceError> {
        component_options(&*self.db, component).await
    }

    pub async fn component_names(&self) -> Result<Vec<String>, ServiceError> {
        component_names(&*self.db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("AB123 NPD", "AB123")]
    #[case("NPD AB123", "AB123")]
    #[case("AB123", "AB123")]
    #[case("AB123-NPD", "AB123-NPD")]
    #[case("SNPD 7", "SNPD 7")]
    fn npd_word_is_removed_only_when_standalone(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(strip_npd_word(raw), expected);
    }

    #[test]
    fn npd_suffix_is_stripped_case_insensitively() {
        assert_eq!(strip_npd_suffix(" AB123-NPD "), "ab123");
        assert_eq!(strip_npd_suffix("ab123"), "ab123");
    }

    #[test]
    fn setups_parse() {
        assert_eq!(Setup::parse("i"), Some(Setup::First));
        assert_eq!(Setup::parse(" II "), Some(Setup::Second));
        assert_eq!(Setup::parse("III"), None);
    }
}
