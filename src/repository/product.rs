use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::{NewProduct, Product, ProductPatch, StockLevel};
use crate::{Executor, StoreResult, TransactionAware};

/// Stock at or below this level is reported when a decrement commits.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

const PRODUCT_COLUMNS: &str = "id, name, description, price, stock, image_url";

/// A stock change made inside the current transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockMovement {
    pub product_id: i64,
    pub quantity: i32,
    pub remaining: i32,
}

/// Transaction-aware product inventory accessor.
///
/// Stock decrements are buffered as [`StockMovement`]s and only published
/// (logged, and exposed through [`ProductRepository::committed_movements`])
/// once the owning session commits.
pub struct ProductRepository {
    executor: Executor,
    pending: RwLock<Vec<StockMovement>>,
    committed: RwLock<Vec<StockMovement>>,
}

impl ProductRepository {
    pub fn new(executor: Executor) -> Arc<Self> {
        Arc::new(Self {
            executor,
            pending: RwLock::new(Vec::new()),
            committed: RwLock::new(Vec::new()),
        })
    }

    pub async fn list(&self) -> StoreResult<Vec<Product>> {
        let mut tx = self.executor.acquire().await?;
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"
        ))
        .fetch_all(&mut **tx)
        .await?;
        Ok(products)
    }

    pub async fn find_by_id(&self, id: i64) -> StoreResult<Option<Product>> {
        let mut tx = self.executor.acquire().await?;
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(product)
    }

    /// Reads a product and holds its row lock until the transaction ends.
    pub async fn lock_by_id(&self, id: i64) -> StoreResult<Option<Product>> {
        let mut tx = self.executor.acquire().await?;
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(product)
    }

    /// Locks every listed product in ascending id order and returns them by id.
    ///
    /// Missing ids are simply absent from the map.
    pub async fn lock_many(&self, ids: &[i64]) -> StoreResult<HashMap<i64, Product>> {
        let mut tx = self.executor.acquire().await?;
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE"
        ))
        .bind(ids)
        .fetch_all(&mut **tx)
        .await?;
        Ok(products.into_iter().map(|p| (p.id, p)).collect())
    }

    /// Removes `quantity` units if at least that many are in stock.
    ///
    /// Returns the remaining stock, or `None` when the product is missing or
    /// short; nothing is changed in that case.
    pub async fn decrement_stock(&self, id: i64, quantity: i32) -> StoreResult<Option<i32>> {
        let remaining = {
            let mut tx = self.executor.acquire().await?;
            sqlx::query_scalar::<_, i32>(
                "UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2 RETURNING stock",
            )
            .bind(id)
            .bind(quantity)
            .fetch_optional(&mut **tx)
            .await?
        };

        if let Some(remaining) = remaining {
            self.pending.write().push(StockMovement {
                product_id: id,
                quantity,
                remaining,
            });
        }
        Ok(remaining)
    }

    pub async fn create(&self, product: &NewProduct) -> StoreResult<Product> {
        let mut tx = self.executor.acquire().await?;
        let created = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products (name, description, price, stock, image_url) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(product.name.trim())
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.image_url)
        .fetch_one(&mut **tx)
        .await?;
        Ok(created)
    }

    pub async fn update(&self, id: i64, patch: &ProductPatch) -> StoreResult<Option<Product>> {
        let mut tx = self.executor.acquire().await?;
        let updated = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                stock = COALESCE($5, stock),
                image_url = COALESCE($6, image_url)
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.name.as_deref().map(str::trim))
        .bind(patch.description.as_deref())
        .bind(patch.price)
        .bind(patch.stock)
        .bind(patch.image_url.as_deref())
        .fetch_optional(&mut **tx)
        .await?;
        Ok(updated)
    }

    /// Deletes a product, returning the number of rows removed.
    pub async fn delete(&self, id: i64) -> StoreResult<u64> {
        let mut tx = self.executor.acquire().await?;
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected())
    }

    /// True when any order line references the product.
    pub async fn has_order_history(&self, id: i64) -> StoreResult<bool> {
        let mut tx = self.executor.acquire().await?;
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM order_lines WHERE product_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(exists)
    }

    pub async fn stock_levels(&self) -> StoreResult<Vec<StockLevel>> {
        let mut tx = self.executor.acquire().await?;
        let levels = sqlx::query_as::<_, StockLevel>(
            "SELECT id, name, stock FROM products ORDER BY name ASC, id ASC",
        )
        .fetch_all(&mut **tx)
        .await?;
        Ok(levels)
    }

    /// Movements published by the last commit of this repository's session.
    pub fn committed_movements(&self) -> Vec<StockMovement> {
        self.committed.read().clone()
    }

    /// Movements made in the still-open transaction.
    pub fn pending_movements(&self) -> Vec<StockMovement> {
        self.pending.read().clone()
    }
}

#[async_trait]
impl TransactionAware for ProductRepository {
    async fn on_commit(&self) -> StoreResult<()> {
        let movements = std::mem::take(&mut *self.pending.write());
        for movement in &movements {
            info!(
                product_id = movement.product_id,
                quantity = movement.quantity,
                remaining = movement.remaining,
                "stock decremented"
            );
            if movement.remaining <= LOW_STOCK_THRESHOLD {
                warn!(
                    product_id = movement.product_id,
                    remaining = movement.remaining,
                    "product stock is low"
                );
            }
        }
        self.committed.write().extend(movements);
        Ok(())
    }

    async fn on_rollback(&self) -> StoreResult<()> {
        let discarded = std::mem::take(&mut *self.pending.write());
        if !discarded.is_empty() {
            debug!(count = discarded.len(), "discarded uncommitted stock movements");
        }
        Ok(())
    }
}
