use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

use super::{address::Address, cart::CartItem, cart::CartTotals, payment_card::SavedCard};

/// How the shopper pays for an order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Card,
    Upi,
    #[strum(serialize = "NETBANKING")]
    #[serde(rename = "NETBANKING")]
    NetBanking,
    #[strum(serialize = "COD")]
    #[serde(rename = "COD")]
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "Credit/Debit Card",
            PaymentMethod::Upi => "UPI",
            PaymentMethod::NetBanking => "Net Banking",
            PaymentMethod::CashOnDelivery => "Cash on Delivery",
        }
    }
}

/// A fully priced order, ready to be submitted to the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub order_id: Uuid,
    pub address: Address,
    pub payment: PaymentMethod,
    /// The card to charge when paying by card
    pub card: Option<SavedCard>,
    pub lines: Vec<CartItem>,
    pub coupon_code: Option<String>,
    pub currency: String,
    pub totals: CartTotals,
    pub created_at: DateTime<Utc>,
}
