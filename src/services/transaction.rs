use sea_orm::DatabaseTransaction;

use crate::error::AppError;

/// Commits on success; rolls back and returns the original error otherwise.
pub async fn finish<T>(
    txn: DatabaseTransaction,
    outcome: Result<T, AppError>,
) -> Result<T, AppError> {
    match outcome {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(error = %rollback_err, "transaction rollback failed");
            }
            Err(err)
        }
    }
}
