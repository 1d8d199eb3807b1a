//! Business operations. Each call runs in its own unit-of-work session.

mod accounts;
mod catalog;
mod dashboard;
mod ordering;

pub use accounts::{AccountService, SignedIn};
pub use catalog::CatalogService;
pub use dashboard::{Dashboard, DashboardService};
pub use ordering::OrderService;
