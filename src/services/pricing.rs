use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;

use crate::{
    config::{CheckoutConfig, CouponDiscount},
    models::{CartItem, CartTotals},
};

/// Delivery fee and coupon rules applied to a cart.
#[derive(Clone, Debug)]
pub struct PricingRules {
    delivery_fee: Decimal,
    free_delivery_threshold: Decimal,
    coupons: HashMap<String, CouponDiscount>,
}

impl PricingRules {
    pub fn new(config: &CheckoutConfig) -> Self {
        let coupons = config
            .coupons
            .iter()
            .map(|c| (Self::normalize_code(&c.code), c.discount.clone()))
            .collect();

        Self {
            delivery_fee: config.delivery_fee,
            free_delivery_threshold: config.free_delivery_threshold,
            coupons,
        }
    }

    /// Coupon codes compare trimmed and case-insensitively.
    pub fn normalize_code(code: &str) -> String {
        code.trim().to_ascii_uppercase()
    }

    pub fn find_coupon(&self, code: &str) -> Option<&CouponDiscount> {
        self.coupons.get(&Self::normalize_code(code))
    }

    /// Nothing is charged for an empty cart or for orders above the free
    /// delivery threshold.
    pub fn delivery_fee_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal <= Decimal::ZERO || subtotal > self.free_delivery_threshold {
            Decimal::ZERO
        } else {
            self.delivery_fee
        }
    }

    /// Discount granted by `code` on `subtotal`, capped at the subtotal.
    /// Percentage discounts round to whole currency units.
    pub fn coupon_discount(&self, code: Option<&str>, subtotal: Decimal) -> Decimal {
        let discount = match code.and_then(|c| self.find_coupon(c)) {
            Some(CouponDiscount::Percent(pct)) => (subtotal * *pct / Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
            Some(CouponDiscount::Flat(amount)) => *amount,
            None => Decimal::ZERO,
        };
        discount.min(subtotal).max(Decimal::ZERO)
    }

    pub fn totals(&self, items: &[CartItem], coupon: Option<&str>) -> CartTotals {
        let subtotal: Decimal = items.iter().map(CartItem::line_total).sum();
        let savings: Decimal = items.iter().map(CartItem::line_savings).sum();
        let coupon_discount = self.coupon_discount(coupon, subtotal);
        let delivery_fee = self.delivery_fee_for(subtotal);
        let total = (subtotal - coupon_discount + delivery_fee).max(Decimal::ZERO);

        CartTotals {
            item_count: items.iter().map(|i| i.quantity).sum(),
            subtotal,
            savings,
            coupon_discount,
            delivery_fee,
            total,
        }
    }
}

impl Default for PricingRules {
    fn default() -> Self {
        Self::new(&CheckoutConfig::default())
    }
}
