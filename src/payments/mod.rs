//! Payment-intent creation against an external processor.

mod stripe;

pub use stripe::StripeGateway;

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::Principal;
use crate::config::PaymentsConfig;
use crate::{StoreError, StoreResult};

/// One cart entry priced by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub price: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateIntentRequest {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

/// What the processor is asked to charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentRequest {
    /// Amount in minor currency units.
    pub amount: i64,
    pub currency: String,
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// Payment processor boundary.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_intent(&self, request: &PaymentIntentRequest)
        -> StoreResult<PaymentIntent>;
}

/// Sums `price * quantity` and converts it to minor units.
///
/// Rounding (half away from zero) happens once, after scaling.
pub fn charge_amount(items: &[CartItem], minor_unit_exponent: u32) -> StoreResult<i64> {
    if items.is_empty() {
        return Err(StoreError::validation("cart is empty"));
    }

    let mut total = Decimal::ZERO;
    for item in items {
        if item.quantity <= 0 {
            return Err(StoreError::validation("cart quantities must be positive"));
        }
        if item.price < Decimal::ZERO {
            return Err(StoreError::validation("cart prices must not be negative"));
        }
        total = item
            .price
            .checked_mul(Decimal::from(item.quantity))
            .and_then(|line| total.checked_add(line))
            .ok_or_else(|| StoreError::validation("cart total is out of range"))?;
    }

    let scale = 10_i64
        .checked_pow(minor_unit_exponent)
        .ok_or_else(|| StoreError::Internal("unsupported currency exponent".to_string()))?;
    total
        .checked_mul(Decimal::from(scale))
        .map(|minor| minor.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|minor| minor.to_i64())
        .ok_or_else(|| StoreError::validation("cart total is out of range"))
}

/// Prices a cart and asks the gateway for a payment intent.
pub struct PaymentService {
    gateway: Arc<dyn PaymentGateway>,
    settings: PaymentsConfig,
}

impl PaymentService {
    pub fn new(gateway: Arc<dyn PaymentGateway>, settings: PaymentsConfig) -> Self {
        Self { gateway, settings }
    }

    #[tracing::instrument(skip(self, principal, items), fields(user_id = principal.user_id, items = items.len()))]
    pub async fn create_intent(
        &self,
        principal: &Principal,
        items: &[CartItem],
    ) -> StoreResult<PaymentIntent> {
        let amount = charge_amount(items, self.settings.minor_unit_exponent)?;
        if amount < self.settings.minimum_charge {
            return Err(StoreError::validation(format!(
                "the minimum amount to pay is {} {}",
                self.settings.minimum_charge,
                self.settings.currency.to_uppercase()
            )));
        }

        let intent = self
            .gateway
            .create_payment_intent(&PaymentIntentRequest {
                amount,
                currency: self.settings.currency.clone(),
                user_id: principal.user_id,
            })
            .await?;
        info!(intent_id = %intent.id, amount, "payment intent created");
        Ok(intent)
    }
}
