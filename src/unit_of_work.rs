use async_trait::async_trait;
use parking_lot::RwLock;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{Executor, StoreError, StoreResult, TransactionAware};

/// Source of transactional sessions.
///
/// Services hold one of these and open a session per business operation:
/// an order placement, a catalog edit, a dashboard read.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    type Session: UnitOfWorkSession;

    /// Begin a new transaction session.
    async fn begin(&self) -> StoreResult<Self::Session>;
}

/// One open PostgreSQL transaction plus the observers waiting on its outcome.
///
/// Dropping a session without committing rolls the transaction back.
#[async_trait]
pub trait UnitOfWorkSession: Send + Sync {
    /// Handle that repositories clone to run statements in this transaction.
    fn executor(&self) -> &Executor;

    /// Adds an observer that hears about the commit or rollback.
    fn register_transaction_aware(&self, observer: Arc<dyn TransactionAware>);

    /// Commits, then notifies observers. They never see uncommitted state.
    async fn commit(self) -> StoreResult<()>;

    /// Rolls back, then lets observers drop what they buffered.
    async fn rollback(self) -> StoreResult<()>;
}

/// Commits `session` when `result` is `Ok`, rolls it back otherwise.
///
/// The error in `result` is returned even if the rollback itself fails; the
/// rollback failure is only logged.
pub async fn complete<S, T>(session: S, result: StoreResult<T>) -> StoreResult<T>
where
    S: UnitOfWorkSession,
{
    match result {
        Ok(value) => {
            session.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = session.rollback().await {
                warn!(error = %rollback_err, cause = %err, "rollback failed");
            }
            Err(err)
        }
    }
}

/// Pool-backed [`UnitOfWork`].
#[derive(Clone, Debug)]
pub struct PostgresUnitOfWork {
    pool: PgPool,
}

impl PostgresUnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    type Session = PostgresUnitOfWorkSession;

    async fn begin(&self) -> StoreResult<Self::Session> {
        let tx = self.pool.begin().await?;
        debug!("transaction started");
        Ok(PostgresUnitOfWorkSession::new(tx))
    }
}

/// Session over a single `sqlx` transaction.
pub struct PostgresUnitOfWorkSession {
    executor: Executor,
    observers: Arc<RwLock<Vec<Arc<dyn TransactionAware>>>>,
}

impl PostgresUnitOfWorkSession {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self {
            executor: Executor::new(tx),
            observers: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

#[async_trait]
impl UnitOfWorkSession for PostgresUnitOfWorkSession {
    fn executor(&self) -> &Executor {
        &self.executor
    }

    fn register_transaction_aware(&self, observer: Arc<dyn TransactionAware>) {
        self.observers.write().push(observer);
    }

    async fn commit(self) -> StoreResult<()> {
        let tx = self.executor.take_transaction().await?;
        tx.commit()
            .await
            .map_err(|e| StoreError::CommitFailed(e.to_string()))?;
        debug!("transaction committed");

        let observers = self.observers.read().clone();
        for observer in observers.iter() {
            observer.on_commit().await?;
        }
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        let tx = self.executor.take_transaction().await?;
        tx.rollback()
            .await
            .map_err(|e| StoreError::RollbackFailed(e.to_string()))?;
        debug!("transaction rolled back");

        let observers = self.observers.read().clone();
        for observer in observers.iter() {
            observer.on_rollback().await?;
        }
        Ok(())
    }
}
