use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::Validate;

use crate::{
    errors::ServiceError,
    models::{CartItem, CartTotals, MAX_LINE_QUANTITY},
    services::pricing::PricingRules,
};

const INVALID_COUPON: &str = "The coupon code you entered is invalid or expired.";

/// The shopper's cart: product lines in the order they were added plus an
/// optional coupon.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
    coupon_code: Option<String>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn coupon_code(&self) -> Option<&str> {
        self.coupon_code.as_deref()
    }

    /// Adds a product line, merging quantities when the product is already
    /// in the cart. Returns the resulting quantity for that product.
    pub fn add_item(&mut self, item: CartItem) -> Result<u32, ServiceError> {
        item.validate()?;

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == item.product_id)
        {
            existing.quantity = raise_quantity(existing.quantity, item.quantity)?;
            debug!(product_id = %existing.product_id, quantity = existing.quantity, "Cart line merged");
            return Ok(existing.quantity);
        }

        let quantity = item.quantity;
        debug!(product_id = %item.product_id, quantity, "Cart line added");
        self.items.push(item);
        Ok(quantity)
    }

    pub fn increase(&mut self, product_id: &str) -> Result<u32, ServiceError> {
        let item = self.item_mut(product_id)?;
        item.quantity = raise_quantity(item.quantity, 1)?;
        Ok(item.quantity)
    }

    /// Decrements a line's quantity. A line never drops below one unit;
    /// use [`remove_item`](Self::remove_item) to drop it.
    pub fn decrease(&mut self, product_id: &str) -> Result<u32, ServiceError> {
        let item = self.item_mut(product_id)?;
        if item.quantity > 1 {
            item.quantity -= 1;
        }
        Ok(item.quantity)
    }

    pub fn remove_item(&mut self, product_id: &str) -> Result<CartItem, ServiceError> {
        let index = self
            .items
            .iter()
            .position(|i| i.product_id == product_id)
            .ok_or_else(|| ServiceError::not_found("Cart item", product_id))?;
        Ok(self.items.remove(index))
    }

    /// Empties the cart and drops any coupon.
    pub fn clear(&mut self) {
        self.items.clear();
        self.coupon_code = None;
    }

    /// Applies a coupon. An unknown code clears any previously applied one.
    pub fn apply_coupon(&mut self, code: &str, rules: &PricingRules) -> Result<(), ServiceError> {
        if rules.find_coupon(code).is_none() {
            self.coupon_code = None;
            return Err(ServiceError::ValidationError(INVALID_COUPON.to_string()));
        }

        let code = PricingRules::normalize_code(code);
        info!(coupon = %code, "Coupon applied");
        self.coupon_code = Some(code);
        Ok(())
    }

    pub fn remove_coupon(&mut self) {
        self.coupon_code = None;
    }

    pub fn totals(&self, rules: &PricingRules) -> CartTotals {
        rules.totals(&self.items, self.coupon_code())
    }

    fn item_mut(&mut self, product_id: &str) -> Result<&mut CartItem, ServiceError> {
        self.items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or_else(|| ServiceError::not_found("Cart item", product_id))
    }
}

/// Adds `extra` units to a line, refusing to go past the per-line cap.
fn raise_quantity(current: u32, extra: u32) -> Result<u32, ServiceError> {
    current
        .checked_add(extra)
        .filter(|q| *q <= MAX_LINE_QUANTITY)
        .ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "You can add at most {} units of a product",
                MAX_LINE_QUANTITY
            ))
        })
}
