//! Atomic counters for human-readable identifiers.
//!
//! Each key lives in `batch_sequences`; allocation is a single upsert that
//! increments `last_value`, so two writers can never receive the same number.

use chrono::NaiveDate;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ConnectionTrait, EntityTrait, Set};
use tracing::debug;

use crate::entities::batch_sequence;
use crate::errors::ServiceError;
use crate::ledger::customer_initials;

/// Returns the next value for `key`, starting at 1.
pub async fn allocate<C: ConnectionTrait>(conn: &C, key: &str) -> Result<i64, ServiceError> {
    let row = batch_sequence::ActiveModel {
        seq_key: Set(key.to_string()),
        last_value: Set(1),
    };

    batch_sequence::Entity::insert(row)
        .on_conflict(
            OnConflict::column(batch_sequence::Column::SeqKey)
                .value(
                    batch_sequence::Column::LastValue,
                    Expr::col((batch_sequence::Entity, batch_sequence::Column::LastValue)).add(1),
                )
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    let value = batch_sequence::Entity::find_by_id(key.to_string())
        .one(conn)
        .await?
        .map(|row| row.last_value)
        .ok_or_else(|| ServiceError::InternalError(format!("sequence {} vanished", key)))?;

    debug!(key, value, "allocated sequence value");
    Ok(value)
}

/// Sequence key for hold batches: `YYYYMMDD_<INITIALS>`.
pub fn batch_key(date: NaiveDate, customer: &str) -> String {
    format!("{}_{}", date.format("%Y%m%d"), customer_initials(customer))
}

/// `PP-YYYYMMDD-<INITIALS>-<NN>`.
pub fn format_batch_id(date: NaiveDate, customer: &str, seq: i64) -> String {
    format!(
        "PP-{}-{}-{:02}",
        date.format("%Y%m%d"),
        customer_initials(customer),
        seq
    )
}

pub async fn next_batch_id<C: ConnectionTrait>(
    conn: &C,
    date: NaiveDate,
    customer: &str,
) -> Result<String, ServiceError> {
    let seq = allocate(conn, &batch_key(date, customer)).await?;
    Ok(format_batch_id(date, customer, seq))
}

/// Sequence key for process tags: `TAG_YYMM`.
pub fn tag_key(date: NaiveDate) -> String {
    format!("TAG_{}", date.format("%y%m"))
}

/// `YYMM` followed by a four-digit counter, e.g. `25030001`.
pub fn format_tag_uid(date: NaiveDate, seq: i64) -> String {
    format!("{}{:04}", date.format("%y%m"), seq)
}

pub async fn next_tag_uid<C: ConnectionTrait>(
    conn: &C,
    date: NaiveDate,
) -> Result<String, ServiceError> {
    let seq = allocate(conn, &tag_key(date)).await?;
    Ok(format_tag_uid(date, seq))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use sea_orm::Database;

    fn march_14() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[rstest]
    #[case("Acme", 1, "PP-20250314-AC-01")]
    #[case("acme", 12, "PP-20250314-AC-12")]
    #[case("Bharat Forge", 105, "PP-20250314-BH-105")]
    #[case("", 3, "PP-20250314-XX-03")]
    fn batch_ids_are_formatted(#[case] customer: &str, #[case] seq: i64, #[case] expected: &str) {
        assert_eq!(format_batch_id(march_14(), customer, seq), expected);
    }

    #[test]
    fn keys_and_tag_uids() {
        assert_eq!(batch_key(march_14(), "acme"), "20250314_AC");
        assert_eq!(tag_key(march_14()), "TAG_2503");
        assert_eq!(format_tag_uid(march_14(), 7), "25030007");
    }

    #[tokio::test]
    async fn allocation_is_sequential_per_key() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        crate::db::run_migrations(&db).await.unwrap();

        assert_eq!(allocate(&db, "20250314_AC").await.unwrap(), 1);
        assert_eq!(allocate(&db, "20250314_AC").await.unwrap(), 2);
        assert_eq!(allocate(&db, "20250314_TA").await.unwrap(), 1);
        assert_eq!(
            next_batch_id(&db, march_14(), "Acme").await.unwrap(),
            "PP-20250314-AC-03"
        );
    }
}
