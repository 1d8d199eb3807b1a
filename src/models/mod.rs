//! Domain records and request payloads.

mod order;
mod product;
mod user;

pub use order::{
    LineRequest, Order, OrderDetails, OrderLine, OrderLineDetails, OrderStatus, PlaceOrder,
    PlacedOrder, StatusUpdate,
};
pub use product::{NewProduct, Product, ProductPatch, ProductSummary, StockLevel};
pub use user::{
    normalize_email, Credentials, NewAccount, NewUserRecord, ProfilePatch, Role, User,
    UserProfile,
};

use rust_decimal::Decimal;

use crate::{StoreError, StoreResult};

/// Largest exclusive amount a `NUMERIC(10,2)` column holds.
const PRICE_LIMIT: i64 = 100_000_000;

/// Checks that `amount` fits a price column exactly: non-negative, at most two
/// decimal places and below [`PRICE_LIMIT`].
pub(crate) fn validate_price(amount: Decimal, label: &str) -> StoreResult<()> {
    if amount < Decimal::ZERO {
        return Err(StoreError::validation(format!("{label} must not be negative")));
    }
    if amount.normalize().scale() > 2 {
        return Err(StoreError::validation(format!(
            "{label} must have at most 2 decimal places"
        )));
    }
    if amount >= Decimal::from(PRICE_LIMIT) {
        return Err(StoreError::validation(format!(
            "{label} must be below {PRICE_LIMIT}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn check(amount: &str) -> StoreResult<()> {
        validate_price(Decimal::from_str(amount).unwrap(), "price")
    }

    #[test]
    fn price_bounds_follow_the_column_type() {
        assert!(check("0").is_ok());
        assert!(check("12.99").is_ok());
        assert!(check("12.990").is_ok());
        assert!(check("99999999.99").is_ok());

        assert!(matches!(check("-0.01"), Err(StoreError::Validation(_))));
        assert!(matches!(check("12.999"), Err(StoreError::Validation(_))));
        assert!(matches!(check("100000000"), Err(StoreError::Validation(_))));
    }
}
