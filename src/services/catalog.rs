use std::sync::Arc;
use tracing::info;

use crate::auth::AdminGrant;
use crate::models::{NewProduct, Product, ProductPatch};
use crate::repository::ProductRepository;
use crate::unit_of_work::complete;
use crate::{StoreError, StoreResult, UnitOfWork, UnitOfWorkSession};

/// Product catalog. Reads are public, writes need an [`AdminGrant`].
pub struct CatalogService<U> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> CatalogService<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    pub async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let session = self.uow.begin().await?;
        let result = ProductRepository::new(session.executor().clone()).list().await;
        complete(session, result).await
    }

    pub async fn get_product(&self, id: i64) -> StoreResult<Product> {
        let session = self.uow.begin().await?;
        let result = ProductRepository::new(session.executor().clone())
            .find_by_id(id)
            .await
            .and_then(|found| found.ok_or_else(|| StoreError::not_found("product", id)));
        complete(session, result).await
    }

    #[tracing::instrument(skip(self, _grant, product), fields(name = %product.name))]
    pub async fn create_product(
        &self,
        _grant: AdminGrant,
        product: &NewProduct,
    ) -> StoreResult<Product> {
        product.validate()?;

        let session = self.uow.begin().await?;
        let result = ProductRepository::new(session.executor().clone())
            .create(product)
            .await;
        let created = complete(session, result).await?;

        info!(product_id = created.id, "product created");
        Ok(created)
    }

    #[tracing::instrument(skip(self, _grant, patch))]
    pub async fn update_product(
        &self,
        _grant: AdminGrant,
        id: i64,
        patch: &ProductPatch,
    ) -> StoreResult<Product> {
        patch.validate()?;

        let session = self.uow.begin().await?;
        let result = ProductRepository::new(session.executor().clone())
            .update(id, patch)
            .await
            .and_then(|found| found.ok_or_else(|| StoreError::not_found("product", id)));
        complete(session, result).await
    }

    /// Removes a product that no order line references.
    #[tracing::instrument(skip(self, _grant))]
    pub async fn delete_product(&self, _grant: AdminGrant, id: i64) -> StoreResult<()> {
        let session = self.uow.begin().await?;
        let products = ProductRepository::new(session.executor().clone());
        let result = delete_unreferenced(products, id).await;
        complete(session, result).await?;

        info!(product_id = id, "product deleted");
        Ok(())
    }
}

async fn delete_unreferenced(products: Arc<ProductRepository>, id: i64) -> StoreResult<()> {
    if products.lock_by_id(id).await?.is_none() {
        return Err(StoreError::not_found("product", id));
    }
    if products.has_order_history(id).await? {
        return Err(StoreError::validation(format!(
            "product {id} is referenced by existing orders"
        )));
    }
    products.delete(id).await?;
    Ok(())
}
