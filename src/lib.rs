//! Storefront backend.
//!
//! Catalog, accounts, order placement and payment intents over PostgreSQL.
//! Every business operation runs inside one unit-of-work session: the
//! repositories it uses share a single transaction that commits or rolls
//! back as a whole.

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod executor;
pub mod http;
pub mod models;
pub mod payments;
pub mod repository;
pub mod services;
pub mod transaction_aware;
pub mod unit_of_work;

pub use error::{StoreError, StoreResult};
pub use executor::{Executor, TxGuard};
pub use transaction_aware::TransactionAware;
pub use unit_of_work::{
    complete, PostgresUnitOfWork, PostgresUnitOfWorkSession, UnitOfWork, UnitOfWorkSession,
};
