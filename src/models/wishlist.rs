use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product the shopper saved for later.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub id: Uuid,
    pub product_id: String,
    pub added_at: DateTime<Utc>,
}

impl WishlistItem {
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id: product_id.into(),
            added_at: Utc::now(),
        }
    }
}
