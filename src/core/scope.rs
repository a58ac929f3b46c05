//! Transaction scopes for ledger operations.
//!
//! Ledger and composer functions never begin or end a transaction themselves; they take a
//! `&DatabaseTransaction` and participate in it. Whoever opens the scope with `begin` hands
//! the transaction and the operation's outcome to [`finish`], which commits on success and
//! rolls back on failure, so no partial write survives an error.

use crate::errors::Result;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::{debug, warn};

/// Opens a new transactional scope on the pool.
pub async fn begin(db: &DatabaseConnection) -> Result<DatabaseTransaction> {
    db.begin().await.map_err(Into::into)
}

/// Ends a scope: commits when `outcome` is `Ok`, rolls back when it is `Err`.
///
/// The outcome's error is returned untouched; a failing rollback is only logged since the
/// transaction is discarded either way.
pub async fn finish<T>(txn: DatabaseTransaction, outcome: Result<T>) -> Result<T> {
    match outcome {
        Ok(value) => {
            txn.commit().await?;
            debug!("Transaction committed");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                warn!("Rollback failed after error '{}': {}", err, rollback_err);
            } else {
                debug!("Transaction rolled back: {}", err);
            }
            Err(err)
        }
    }
}
