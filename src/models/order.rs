//! Orders, order lines and the order status lifecycle.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

use super::{validate_price, ProductSummary};
use crate::{StoreError, StoreResult};

/// Status of an order.
///
/// Legal transitions:
/// `pending -> confirmed | cancelled`, `confirmed -> shipped | cancelled`.
/// `shipped` and `cancelled` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Cancelled,
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::Cancelled => "cancelled",
        }
    }

    pub const fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed)
                | (Self::Pending, Self::Cancelled)
                | (Self::Confirmed, Self::Shipped)
                | (Self::Confirmed, Self::Cancelled)
        )
    }

    /// Returns `next` if the transition is legal.
    pub fn transition_to(&self, next: OrderStatus) -> StoreResult<OrderStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(StoreError::validation(format!(
                "cannot change order status from {self} to {next}"
            )))
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "shipped" => Ok(Self::Shipped),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(StoreError::validation(format!(
                "unknown order status '{other}'"
            ))),
        }
    }
}

/// Order header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// One requested line of a new order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRequest {
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Body of a create-order request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaceOrder {
    #[serde(default)]
    pub lines: Vec<LineRequest>,
}

impl PlaceOrder {
    /// Shape checks that need no database access.
    pub fn validate(&self) -> StoreResult<()> {
        if self.lines.is_empty() {
            return Err(StoreError::validation("order lines are required"));
        }

        let mut seen = HashSet::with_capacity(self.lines.len());
        for line in &self.lines {
            if line.quantity <= 0 {
                return Err(StoreError::validation(format!(
                    "quantity for product {} must be positive",
                    line.product_id
                )));
            }
            validate_price(
                line.unit_price,
                &format!("unit price for product {}", line.product_id),
            )?;
            if !seen.insert(line.product_id) {
                return Err(StoreError::validation(format!(
                    "product {} appears more than once",
                    line.product_id
                )));
            }
        }
        Ok(())
    }
}

/// Result of a successful placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// Order line with the referenced product, as returned by listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineDetails {
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub product: ProductSummary,
}

/// Order header with its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLineDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: Option<String>,
}
