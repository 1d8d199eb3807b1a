//! Repositories over a unit-of-work [`Executor`](crate::Executor).
//!
//! Each repository is built per session; all of them share that session's
//! transaction.

mod order;
mod product;
mod user;

pub use order::{MonthlySales, OrderRepository};
pub use product::{ProductRepository, StockMovement, LOW_STOCK_THRESHOLD};
pub use user::UserRepository;
