use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use actix_web::{HttpMessage, HttpRequest};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};

use super::{require_db, txn_policy};
use crate::error::AppError;
use crate::state::app_state::AppState;

/// Boxed future returned by transaction bodies; borrows the transaction.
pub type TxnFuture<'a, R> = Pin<Box<dyn Future<Output = Result<R, AppError>> + 'a>>;

/// A shared transaction that can be injected into request extensions.
///
/// When present, `with_txn` runs the body on it and leaves commit/rollback
/// to whoever opened it.
#[derive(Clone)]
pub struct SharedTxn(pub Arc<DatabaseTransaction>);

impl SharedTxn {
    pub async fn open(db: &DatabaseConnection) -> Result<Self, AppError> {
        let txn = db.begin().await?;
        Ok(Self(Arc::new(txn)))
    }

    pub fn transaction(&self) -> &DatabaseTransaction {
        &self.0
    }

    /// Roll back; fails if another clone (e.g. a live request) still holds it.
    pub async fn rollback(self) -> Result<(), AppError> {
        let txn = Arc::try_unwrap(self.0)
            .map_err(|_| AppError::internal("Cannot rollback: transaction is still shared"))?;
        txn.rollback().await?;
        Ok(())
    }

    pub async fn commit(self) -> Result<(), AppError> {
        let txn = Arc::try_unwrap(self.0)
            .map_err(|_| AppError::internal("Cannot commit: transaction is still shared"))?;
        txn.commit().await?;
        Ok(())
    }
}

/// Run `f` inside a fresh transaction on `db`.
///
/// Commits on `Ok` (or rolls back under `TxnPolicy::RollbackOnOk`) and
/// always rolls back on `Err`, so a failed claim never leaves a half-built
/// order or a moved counter behind.
pub async fn run_in_txn<R, F>(db: &DatabaseConnection, f: F) -> Result<R, AppError>
where
    F: for<'a> FnOnce(&'a DatabaseTransaction) -> TxnFuture<'a, R>,
{
    let txn = db.begin().await?;
    let out = f(&txn).await;

    match out {
        Ok(val) => {
            match txn_policy::current() {
                txn_policy::TxnPolicy::CommitOnOk => txn.commit().await?,
                txn_policy::TxnPolicy::RollbackOnOk => txn.rollback().await?,
            }
            Ok(val)
        }
        Err(err) => {
            // Best-effort rollback; preserve original error
            let _ = txn.rollback().await;
            Err(err)
        }
    }
}

/// Execute a request's work within a database transaction.
///
/// 1) A `SharedTxn` in request extensions is reused as-is (no commit/rollback here)
/// 2) Otherwise a transaction is opened on the state's pool via `run_in_txn`
pub async fn with_txn<R, F>(
    req: Option<&HttpRequest>,
    state: &AppState,
    f: F,
) -> Result<R, AppError>
where
    F: for<'a> FnOnce(&'a DatabaseTransaction) -> TxnFuture<'a, R>,
{
    // Clone out of extensions before awaiting to avoid holding the RefCell borrow.
    let shared_txn: Option<SharedTxn> = req.and_then(|r| r.extensions().get::<SharedTxn>().cloned());

    if let Some(shared) = shared_txn {
        return f(shared.transaction()).await;
    }

    let db = require_db(state)?;
    run_in_txn(db, f).await
}
