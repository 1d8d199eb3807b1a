use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMappedMutexGuard, OwnedMutexGuard};

use crate::{StoreError, StoreResult};

/// Exclusive access to the transaction held by an [`Executor`].
///
/// Dereferences to the `sqlx` transaction, so queries run with
/// `.execute(&mut **tx)`. Drop the guard before acquiring it again.
/// The guard holds its own handle to the lock instead of borrowing the
/// executor.
pub type TxGuard =
    OwnedMappedMutexGuard<Option<Transaction<'static, Postgres>>, Transaction<'static, Postgres>>;

/// Executor wraps a database transaction for use by repositories.
///
/// Every repository built from the same executor reads and writes through
/// the same PostgreSQL transaction, so their work commits or rolls back as
/// one unit.
#[derive(Clone, Debug)]
pub struct Executor {
    tx: Arc<Mutex<Option<Transaction<'static, Postgres>>>>,
}

impl Executor {
    /// Creates a new Executor from a PostgreSQL transaction.
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self {
            tx: Arc::new(Mutex::new(Some(tx))),
        }
    }

    /// Locks the transaction for one statement or a short run of statements.
    ///
    /// Fails with [`StoreError::SessionClosed`] once the owning session has
    /// committed or rolled back.
    pub async fn acquire(&self) -> StoreResult<TxGuard> {
        OwnedMutexGuard::try_map(self.tx.clone().lock_owned().await, |slot| slot.as_mut())
            .map_err(|_| StoreError::SessionClosed)
    }

    /// Takes ownership of the transaction, leaving None in its place.
    /// Only the session calls this, when committing or rolling back.
    pub(crate) async fn take_transaction(&self) -> StoreResult<Transaction<'static, Postgres>> {
        self.tx.lock().await.take().ok_or(StoreError::SessionClosed)
    }
}
