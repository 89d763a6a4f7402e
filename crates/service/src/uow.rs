//! Explicit unit of work over a sea-orm transaction.
//!
//! Callers own the whole lifecycle: `begin`, run queries against [`UnitOfWork::conn`],
//! then `commit` or `rollback` (or hand the result to [`UnitOfWork::finish`]).
//! Every query inside the unit must go through `conn()`; a single-connection
//! pool (in-memory SQLite) would otherwise wait on itself.

use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use tracing::warn;

pub struct UnitOfWork {
    txn: DatabaseTransaction,
}

impl UnitOfWork {
    pub async fn begin(db: &DatabaseConnection) -> Result<Self, DbErr> {
        Ok(Self { txn: db.begin().await? })
    }

    pub fn conn(&self) -> &DatabaseTransaction { &self.txn }

    pub async fn commit(self) -> Result<(), DbErr> { self.txn.commit().await }

    pub async fn rollback(self) -> Result<(), DbErr> { self.txn.rollback().await }

    /// Commit on `Ok`, roll back on `Err`.
    ///
    /// A failed rollback is logged; the original error is what the caller sees.
    pub async fn finish<T, E>(self, result: Result<T, E>) -> Result<T, E>
    where
        E: From<DbErr>,
    {
        match result {
            Ok(v) => {
                self.commit().await?;
                Ok(v)
            }
            Err(e) => {
                if let Err(rb) = self.rollback().await {
                    warn!(error = %rb, "rollback failed");
                }
                Err(e)
            }
        }
    }
}
