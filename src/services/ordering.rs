use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{AdminGrant, Principal};
use crate::models::{Order, OrderDetails, OrderLine, OrderStatus, PlaceOrder, PlacedOrder};
use crate::repository::{OrderRepository, ProductRepository};
use crate::unit_of_work::complete;
use crate::{StoreError, StoreResult, UnitOfWork, UnitOfWorkSession};

/// Order placement, listing, retrieval and status changes.
pub struct OrderService<U> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> OrderService<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    /// Creates an order for `user_id`, its lines, and the matching stock
    /// decrements in one transaction.
    ///
    /// Every requested product is locked up front in id order. Lines are then
    /// processed in the order submitted and the first failing line aborts the
    /// whole placement; nothing is persisted in that case.
    #[tracing::instrument(skip(self, request), fields(lines = request.lines.len()))]
    pub async fn place_order(&self, user_id: i64, request: &PlaceOrder) -> StoreResult<PlacedOrder> {
        request.validate()?;

        let session = self.uow.begin().await?;
        let orders = OrderRepository::new(session.executor().clone());
        let products = ProductRepository::new(session.executor().clone());
        session.register_transaction_aware(products.clone());

        let result = place(orders, products, user_id, request).await;
        if let Err(err) = &result {
            warn!(error = %err, "order placement aborted");
        }
        let placed = complete(session, result).await?;

        info!(order_id = placed.order.id, "order placed");
        Ok(placed)
    }

    /// Every order for admins; only the caller's own orders otherwise.
    pub async fn list_orders(&self, principal: &Principal) -> StoreResult<Vec<OrderDetails>> {
        let owner = if principal.is_admin() {
            None
        } else {
            Some(principal.user_id)
        };

        let session = self.uow.begin().await?;
        let orders = OrderRepository::new(session.executor().clone());
        let result = list(orders, owner).await;
        complete(session, result).await
    }

    /// One order with its lines. Non-admins may only read their own orders.
    pub async fn get_order(&self, principal: &Principal, order_id: i64) -> StoreResult<OrderDetails> {
        let session = self.uow.begin().await?;
        let orders = OrderRepository::new(session.executor().clone());
        let result = fetch(orders, *principal, order_id).await;
        complete(session, result).await
    }

    /// Moves an order to `status` if the transition is legal.
    #[tracing::instrument(skip(self, _grant))]
    pub async fn update_status(
        &self,
        _grant: AdminGrant,
        order_id: i64,
        status: &str,
    ) -> StoreResult<Order> {
        let next: OrderStatus = status.parse()?;

        let session = self.uow.begin().await?;
        let orders = OrderRepository::new(session.executor().clone());
        let result = change_status(orders, order_id, next).await;
        let order = complete(session, result).await?;

        info!(order_id, status = %order.status, "order status updated");
        Ok(order)
    }
}

async fn place(
    orders: Arc<OrderRepository>,
    products: Arc<ProductRepository>,
    user_id: i64,
    request: &PlaceOrder,
) -> StoreResult<PlacedOrder> {
    let ids: Vec<i64> = request.lines.iter().map(|line| line.product_id).collect();
    let locked = products.lock_many(&ids).await?;

    let order = orders.create_header(user_id).await?;
    let mut lines = Vec::with_capacity(request.lines.len());

    for requested in &request.lines {
        let product = locked
            .get(&requested.product_id)
            .ok_or_else(|| StoreError::not_found("product", requested.product_id))?;

        let short = || StoreError::InsufficientStock {
            product_id: product.id,
            product_name: product.name.clone(),
            requested: requested.quantity,
            available: product.stock,
        };
        if requested.quantity > product.stock {
            return Err(short());
        }

        let line = orders
            .create_line(&OrderLine {
                order_id: order.id,
                product_id: product.id,
                quantity: requested.quantity,
                unit_price: requested.unit_price,
            })
            .await?;

        if products
            .decrement_stock(product.id, requested.quantity)
            .await?
            .is_none()
        {
            return Err(short());
        }

        lines.push(line);
    }

    Ok(PlacedOrder { order, lines })
}

async fn list(orders: Arc<OrderRepository>, owner: Option<i64>) -> StoreResult<Vec<OrderDetails>> {
    let headers = orders.list(owner).await?;
    let ids: Vec<i64> = headers.iter().map(|order| order.id).collect();
    let mut lines = orders.lines_for(&ids).await?;

    Ok(headers
        .into_iter()
        .map(|order| OrderDetails {
            lines: lines.remove(&order.id).unwrap_or_default(),
            order,
        })
        .collect())
}

async fn fetch(
    orders: Arc<OrderRepository>,
    principal: Principal,
    order_id: i64,
) -> StoreResult<OrderDetails> {
    let order = orders
        .find_by_id(order_id)
        .await?
        .ok_or_else(|| StoreError::not_found("order", order_id))?;
    principal.ensure_can_access(order.user_id)?;

    let lines = orders
        .lines_for(&[order.id])
        .await?
        .remove(&order.id)
        .unwrap_or_default();
    Ok(OrderDetails { order, lines })
}

async fn change_status(
    orders: Arc<OrderRepository>,
    order_id: i64,
    next: OrderStatus,
) -> StoreResult<Order> {
    let current = orders
        .lock_by_id(order_id)
        .await?
        .ok_or_else(|| StoreError::not_found("order", order_id))?;
    let next = current.status.transition_to(next)?;
    orders
        .set_status(order_id, next)
        .await?
        .ok_or_else(|| StoreError::not_found("order", order_id))
}
