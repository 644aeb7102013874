//! Business logic. Every write that touches a cached counter runs inside
//! [`crate::db::in_transaction`].

pub mod batch_tracking;
pub mod hold_material;
pub mod masterlist;
pub mod packing_area;
pub mod reconciliation;
pub mod rm_receiving;
pub mod sequence;
pub mod stage_progress;
pub mod tags;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{ColumnTrait, FromQueryResult};
use serde::Serialize;
use validator::Validate;

use crate::errors::{EntryError, FieldError, ServiceError};
use crate::ledger::{self, LedgerStatus};

/// One page of a listing plus the total row count.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Result of re-deriving a cached-counter entity from its children.
#[derive(Debug, Clone)]
pub struct Recomputed<M> {
    pub model: M,
    pub previous_status: Option<LedgerStatus>,
    pub status: LedgerStatus,
    /// Whether any stored field had to be rewritten.
    pub changed: bool,
}

impl<M> Recomputed<M> {
    pub fn status_changed(&self) -> bool {
        self.previous_status != Some(self.status)
    }
}

#[derive(Debug, FromQueryResult)]
pub(crate) struct KgTotal {
    pub total: Option<Decimal>,
}

impl KgTotal {
    pub fn kg(row: Option<KgTotal>) -> Decimal {
        ledger::normalize_kg(row.and_then(|r| r.total).unwrap_or(Decimal::ZERO))
    }
}

#[derive(Debug, FromQueryResult)]
pub(crate) struct QtyTotal {
    pub total: Option<i64>,
}

impl QtyTotal {
    pub fn qty(row: Option<QtyTotal>) -> i64 {
        row.and_then(|r| r.total).unwrap_or(0)
    }
}

/// Derive-validation failures of `input` as field errors.
pub(crate) fn collect_field_errors<T: Validate>(input: &T) -> Vec<FieldError> {
    match input.validate() {
        Ok(()) => Vec::new(),
        Err(e) => match ServiceError::from(e) {
            ServiceError::InvalidFields(fields) => fields,
            _ => Vec::new(),
        },
    }
}

pub(crate) fn fields_result(fields: Vec<FieldError>) -> Result<(), ServiceError> {
    if fields.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::InvalidFields(fields))
    }
}

/// Case-insensitive `LIKE '%needle%'` on a column.
pub(crate) fn icontains<C: ColumnTrait>(col: C, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col((col.entity_name(), col))))
        .like(format!("%{}%", needle.trim().to_lowercase()))
}

/// Case-insensitive equality on a column.
pub(crate) fn iequals<C: ColumnTrait>(col: C, value: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col((col.entity_name(), col))))
        .eq(value.trim().to_lowercase())
}

/// Non-blank filter value, trimmed.
pub(crate) fn filter_value(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

pub(crate) fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// First instant of the day after `date`, for inclusive upper bounds.
pub(crate) fn day_end_exclusive(date: NaiveDate) -> DateTime<Utc> {
    day_start(date.succ_opt().unwrap_or(date))
}

/// Turns the failure of one bulk entry into its report line. Errors that are
/// not about the entry itself (database, internal) are passed through and
/// abort the whole request.
pub(crate) fn bulk_entry_error(index: usize, err: ServiceError) -> Result<EntryError, ServiceError> {
    match err {
        ServiceError::NotFound(msg) => Ok(EntryError {
            index,
            fields: vec![FieldError::new("non_field_errors", msg)],
        }),
        other => match other.field_errors() {
            Some(fields) => Ok(EntryError { index, fields }),
            None => Err(other),
        },
    }
}

/// Message shared by every "must be positive" quantity check.
pub(crate) const POSITIVE: &str = "Ensure this value is greater than 0.";
pub(crate) const BLANK: &str = "This field may not be blank.";

pub(crate) fn reject_empty_bulk(len: usize) -> Result<(), ServiceError> {
    if len == 0 {
        return Err(ServiceError::ValidationError(
            "Expected a non-empty list of entries".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn bulk_errors_keep_their_index() {
        let entry = bulk_entry_error(3, ServiceError::field("qty", "must be positive")).unwrap();
        assert_eq!(entry.index, 3);
        assert_eq!(entry.fields[0].field, "qty");

        let entry = bulk_entry_error(1, ServiceError::NotFound("Lot x".into())).unwrap();
        assert_eq!(entry.fields[0].field, "non_field_errors");

        assert_matches!(
            bulk_entry_error(0, ServiceError::db_error("disk full")),
            Err(ServiceError::DatabaseError(_))
        );
    }

    #[test]
    fn blank_filters_are_ignored() {
        assert_eq!(filter_value(&Some("  ".into())), None);
        assert_eq!(filter_value(&Some(" EN8 ".into())), Some("EN8"));
        assert_eq!(filter_value(&None), None);
    }

    #[test]
    fn date_bounds_cover_the_whole_day() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert_eq!(day_start(d).to_rfc3339(), "2025-03-14T00:00:00+00:00");
        assert_eq!(day_end_exclusive(d).to_rfc3339(), "2025-03-15T00:00:00+00:00");
    }
}
