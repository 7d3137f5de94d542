use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{errors::ServiceError, models::WishlistItem};

/// Saved-for-later products. A product appears at most once.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wishlist {
    items: Vec<WishlistItem>,
}

impl Wishlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.items.iter().any(|i| i.product_id == product_id)
    }

    /// Saves a product. Adding one that is already saved returns the
    /// existing entry.
    pub fn add(&mut self, product_id: &str) -> Result<WishlistItem, ServiceError> {
        if product_id.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Product id is required".to_string(),
            ));
        }
        if let Some(existing) = self.items.iter().find(|i| i.product_id == product_id) {
            return Ok(existing.clone());
        }

        let item = WishlistItem::new(product_id);
        debug!(product_id, wishlist_item_id = %item.id, "Added to wishlist");
        self.items.push(item.clone());
        Ok(item)
    }

    pub fn remove(&mut self, id: Uuid) -> Result<WishlistItem, ServiceError> {
        let index = self
            .items
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| ServiceError::not_found("Wishlist item", id))?;
        Ok(self.items.remove(index))
    }

    /// Drops the entry for `product_id`, if saved. Used when the product
    /// moves to the cart.
    pub fn remove_product(&mut self, product_id: &str) -> Option<WishlistItem> {
        let index = self.items.iter().position(|i| i.product_id == product_id)?;
        Some(self.items.remove(index))
    }
}
