use async_trait::async_trait;

use crate::StoreResult;

/// Trait for components that need to be notified of transaction lifecycle events.
///
/// Repositories that keep in-memory state about the work they did inside a
/// transaction register themselves with the session, then publish that state
/// on commit or discard it on rollback.
#[async_trait]
pub trait TransactionAware: Send + Sync {
    /// Called after a successful transaction commit.
    async fn on_commit(&self) -> StoreResult<()>;

    /// Called after a transaction rollback.
    ///
    /// Implementations revert whatever they buffered while the transaction
    /// was open.
    async fn on_rollback(&self) -> StoreResult<()>;
}
