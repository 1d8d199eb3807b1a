use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::Row;
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{Order, OrderLine, OrderLineDetails, OrderStatus, ProductSummary};
use crate::{Executor, StoreResult};

const ORDER_COLUMNS: &str = "id, user_id, created_at, status";

/// Sales total for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MonthlySales {
    pub month: i32,
    pub total: Decimal,
}

pub struct OrderRepository {
    executor: Executor,
}

impl OrderRepository {
    pub fn new(executor: Executor) -> Arc<Self> {
        Arc::new(Self { executor })
    }

    /// Inserts a pending order header for `user_id`.
    pub async fn create_header(&self, user_id: i64) -> StoreResult<Order> {
        let mut tx = self.executor.acquire().await?;
        let row = sqlx::query(&format!(
            "INSERT INTO orders (user_id, status) VALUES ($1, $2) RETURNING {ORDER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(OrderStatus::Pending.as_str())
        .fetch_one(&mut **tx)
        .await?;
        order_from_row(&row)
    }

    pub async fn create_line(&self, line: &OrderLine) -> StoreResult<OrderLine> {
        let mut tx = self.executor.acquire().await?;
        let created = sqlx::query_as::<_, OrderLine>(
            "INSERT INTO order_lines (order_id, product_id, quantity, unit_price) \
             VALUES ($1, $2, $3, $4) RETURNING order_id, product_id, quantity, unit_price",
        )
        .bind(line.order_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price)
        .fetch_one(&mut **tx)
        .await?;
        Ok(created)
    }

    pub async fn find_by_id(&self, id: i64) -> StoreResult<Option<Order>> {
        let mut tx = self.executor.acquire().await?;
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        row.as_ref().map(order_from_row).transpose()
    }

    pub async fn lock_by_id(&self, id: i64) -> StoreResult<Option<Order>> {
        let mut tx = self.executor.acquire().await?;
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        row.as_ref().map(order_from_row).transpose()
    }

    /// Lists order headers, newest first. `None` lists every user's orders.
    pub async fn list(&self, user_id: Option<i64>) -> StoreResult<Vec<Order>> {
        let mut tx = self.executor.acquire().await?;
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE ($1::BIGINT IS NULL OR user_id = $1) \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&mut **tx)
        .await?;
        rows.iter().map(order_from_row).collect()
    }

    /// Lines of the given orders joined with their products, keyed by order id.
    pub async fn lines_for(
        &self,
        order_ids: &[i64],
    ) -> StoreResult<HashMap<i64, Vec<OrderLineDetails>>> {
        let mut tx = self.executor.acquire().await?;
        let rows = sqlx::query(
            r#"
            SELECT l.order_id, l.product_id, l.quantity, l.unit_price, p.name, p.image_url
            FROM order_lines l
            JOIN products p ON p.id = l.product_id
            WHERE l.order_id = ANY($1)
            ORDER BY l.order_id, l.product_id
            "#,
        )
        .bind(order_ids)
        .fetch_all(&mut **tx)
        .await?;

        let mut lines: HashMap<i64, Vec<OrderLineDetails>> = HashMap::new();
        for row in rows {
            let product_id: i64 = row.try_get("product_id")?;
            lines
                .entry(row.try_get("order_id")?)
                .or_default()
                .push(OrderLineDetails {
                    product_id,
                    quantity: row.try_get("quantity")?,
                    unit_price: row.try_get("unit_price")?,
                    product: ProductSummary {
                        id: product_id,
                        name: row.try_get("name")?,
                        image_url: row.try_get("image_url")?,
                    },
                });
        }
        Ok(lines)
    }

    pub async fn set_status(&self, id: i64, status: OrderStatus) -> StoreResult<Option<Order>> {
        let mut tx = self.executor.acquire().await?;
        let row = sqlx::query(&format!(
            "UPDATE orders SET status = $2 WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&mut **tx)
        .await?;
        row.as_ref().map(order_from_row).transpose()
    }

    /// Per-month sales for `year` (UTC), excluding cancelled orders.
    pub async fn monthly_sales(&self, year: i32) -> StoreResult<Vec<MonthlySales>> {
        let mut tx = self.executor.acquire().await?;
        let sales = sqlx::query_as::<_, MonthlySales>(
            r#"
            SELECT
                EXTRACT(MONTH FROM o.created_at AT TIME ZONE 'UTC')::INT AS month,
                SUM(l.quantity * l.unit_price)::NUMERIC(12, 2) AS total
            FROM order_lines l
            JOIN orders o ON o.id = l.order_id
            WHERE EXTRACT(YEAR FROM o.created_at AT TIME ZONE 'UTC')::INT = $1
              AND o.status <> 'cancelled'
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(year)
        .fetch_all(&mut **tx)
        .await?;
        Ok(sales)
    }
}

fn order_from_row(row: &PgRow) -> StoreResult<Order> {
    let status: String = row.try_get("status")?;
    Ok(Order {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        created_at: row.try_get("created_at")?,
        status: status.parse()?,
    })
}
