use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::AdminGrant;
use crate::models::StockLevel;
use crate::repository::{MonthlySales, OrderRepository, ProductRepository};
use crate::unit_of_work::complete;
use crate::{StoreResult, UnitOfWork, UnitOfWorkSession};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub year: i32,
    pub inventory: Vec<StockLevel>,
    pub monthly_sales: Vec<MonthlySales>,
}

/// Admin overview of stock and sales.
pub struct DashboardService<U> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> DashboardService<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    /// Stock per product and sales per month of `year` (current UTC year by default).
    pub async fn dashboard(&self, _grant: AdminGrant, year: Option<i32>) -> StoreResult<Dashboard> {
        let year = year.unwrap_or_else(|| Utc::now().year());

        let session = self.uow.begin().await?;
        let products = ProductRepository::new(session.executor().clone());
        let orders = OrderRepository::new(session.executor().clone());
        let result = collect(products, orders, year).await;
        complete(session, result).await
    }
}

async fn collect(
    products: Arc<ProductRepository>,
    orders: Arc<OrderRepository>,
    year: i32,
) -> StoreResult<Dashboard> {
    Ok(Dashboard {
        year,
        inventory: products.stock_levels().await?,
        monthly_sales: orders.monthly_sales(year).await?,
    })
}
