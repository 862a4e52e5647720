use std::future::Future;
use std::pin::Pin;

use sea_orm::{Database, DatabaseConnection, DatabaseTransaction, TransactionTrait};

use crate::config::Config;
use crate::error::{AppError, AppResult};

#[cfg(test)]
pub mod testing;

pub async fn connect(config: &Config) -> AppResult<DatabaseConnection> {
    Database::connect(&config.database_url)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to connect to database: {}", e)))
}

/// Future returned by a unit of work; borrows the open transaction.
pub type TxFuture<'c, T> = Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'c>>;

/// Run `work` as one atomic unit.
///
/// Commits when `work` succeeds. On failure the transaction is rolled back
/// before the error is returned; if the rollback itself fails it is logged and
/// the original error still wins. A failed commit consumes the transaction,
/// which rolls back when dropped.
pub async fn run_in_transaction<T, F>(
    db: &DatabaseConnection,
    operation: &'static str,
    work: F,
) -> AppResult<T>
where
    T: Send,
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> TxFuture<'c, T> + Send,
{
    let txn = db.begin().await?;

    match work(&txn).await {
        Ok(value) => {
            txn.commit().await.map_err(|e| {
                tracing::error!(operation, error = %e, "Commit failed");
                AppError::Database(e)
            })?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(
                    operation,
                    error = %rollback_err,
                    cause = %err,
                    "Rollback failed"
                );
            } else {
                tracing::debug!(operation, cause = %err, "Transaction rolled back");
            }
            Err(err)
        }
    }
}
