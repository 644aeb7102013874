/*!
 * Transaction helper
 *
 * Runs a closure inside a database transaction and hands the closure's own
 * `ServiceError` back to the caller unchanged.
 */

use metrics::{counter, histogram};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionError, TransactionTrait};
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, warn};

use crate::errors::ServiceError;

/// Type alias for boxed future used in transactions
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Execute a function within a database transaction.
///
/// Commits when the closure returns `Ok`, rolls back otherwise. Failures to
/// begin or commit surface as [`ServiceError::DatabaseError`].
///
/// ```rust,ignore
/// let hold = in_transaction(&db, move |txn| {
///     Box::pin(async move {
///         let lot = lock_lot(txn, uid).await?;
///         insert_hold(txn, &lot, input).await
///     })
/// })
/// .await?;
/// ```
pub async fn in_transaction<F, T>(db: &DatabaseConnection, f: F) -> Result<T, ServiceError>
where
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, ServiceError>> + Send,
    T: Send,
{
    let start = std::time::Instant::now();
    counter!("plant_ledger_db.transaction.started", 1);

    let result = db.transaction::<_, T, ServiceError>(f).await;

    let elapsed = start.elapsed();
    histogram!("plant_ledger_db.transaction.duration", elapsed);

    match &result {
        Ok(_) => {
            counter!("plant_ledger_db.transaction.committed", 1);
            debug!("Transaction committed in {:?}", elapsed);
        }
        Err(e) => {
            counter!("plant_ledger_db.transaction.rolled_back", 1);
            warn!("Transaction rolled back after {:?}: {}", elapsed, e);
        }
    }

    result.map_err(|e| match e {
        TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
        TransactionError::Transaction(service_err) => service_err,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::packing_location;
    use assert_matches::assert_matches;
    use sea_orm::{ActiveModelTrait, Database, EntityTrait, PaginatorTrait, Set};

    async fn migrated_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        crate::db::run_migrations(&db).await.unwrap();
        db
    }

    #[tokio::test]
    async fn commit_persists_writes() {
        let db = migrated_db().await;

        let id = in_transaction(&db, |txn| {
            Box::pin(async move {
                let loc = packing_location::ActiveModel {
                    code: Set("PK-01".into()),
                    description: Set("Packing bay 1".into()),
                    ..Default::default()
                }
                .insert(txn)
                .await?;
                Ok(loc.id)
            })
        })
        .await
        .unwrap();

        assert!(packing_location::Entity::find_by_id(id)
            .one(&db)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn service_error_rolls_back_and_is_preserved() {
        let db = migrated_db().await;

        let result: Result<(), ServiceError> = in_transaction(&db, |txn| {
            Box::pin(async move {
                packing_location::ActiveModel {
                    code: Set("PK-02".into()),
                    description: Set(String::new()),
                    ..Default::default()
                }
                .insert(txn)
                .await?;
                Err(ServiceError::field("qty", "exceeds available"))
            })
        })
        .await;

        assert_matches!(result, Err(ServiceError::InvalidFields(_)));
        assert_eq!(packing_location::Entity::find().count(&db).await.unwrap(), 0);
    }
}
