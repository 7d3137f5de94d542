use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Most units of one product a single cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// One product line in the shopping cart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CartItem {
    #[validate(length(min = 1, message = "Product id is required"))]
    pub product_id: String,
    pub name: String,
    pub seller: String,
    #[validate(custom = "validate_price")]
    pub unit_price: Decimal,
    /// List price before the seller's markdown; equal to `unit_price` when
    /// the product is not on sale.
    #[validate(custom = "validate_price")]
    pub original_price: Decimal,
    #[validate(range(min = 1, max = 99, message = "Quantity must be between 1 and 99"))]
    pub quantity: u32,
}

impl CartItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Markdown saved on this line. Never negative, even if the list price
    /// is below the selling price.
    pub fn line_savings(&self) -> Decimal {
        ((self.original_price - self.unit_price) * Decimal::from(self.quantity)).max(Decimal::ZERO)
    }

    /// Markdown as a whole percentage of the list price.
    pub fn discount_percent(&self) -> u32 {
        if self.original_price <= Decimal::ZERO || self.original_price <= self.unit_price {
            return 0;
        }
        let pct = (self.original_price - self.unit_price) / self.original_price * Decimal::from(100);
        pct.floor().to_u32().unwrap_or(0)
    }
}

/// Computed price breakdown for a cart.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub item_count: u32,
    pub subtotal: Decimal,
    pub savings: Decimal,
    pub coupon_discount: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        let mut err = ValidationError::new("price");
        err.message = Some("Price must not be negative".into());
        return Err(err);
    }
    Ok(())
}
