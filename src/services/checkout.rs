use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    events::{Event, EventSender},
    models::{OrderDraft, PaymentMethod},
    services::{
        address_book::AddressBook, cart::Cart, payment_methods::CardWallet, pricing::PricingRules,
    },
};

/// Assembles an order from the shopper's cart, active address and payment choice.
#[derive(Clone, Debug)]
pub struct CheckoutService {
    pricing: PricingRules,
    currency: String,
    event_sender: Option<EventSender>,
}

impl CheckoutService {
    pub fn new(pricing: PricingRules, currency: impl Into<String>) -> Self {
        Self {
            pricing,
            currency: currency.into(),
            event_sender: None,
        }
    }

    pub fn from_config(config: &crate::config::AppConfig) -> Self {
        Self::new(PricingRules::new(&config.checkout), config.currency.clone())
    }

    pub fn with_events(mut self, event_sender: EventSender) -> Self {
        self.event_sender = Some(event_sender);
        self
    }

    pub fn pricing(&self) -> &PricingRules {
        &self.pricing
    }

    /// Builds a priced [`OrderDraft`].
    ///
    /// Delivers to the book's active address (selected, else default). Card
    /// payments charge the wallet's default card.
    ///
    /// # Errors
    ///
    /// * `InvalidOperation` - the cart is empty, there is no address, or card
    ///   payment was chosen with no saved card
    /// * `ValidationError` - no payment method was chosen
    #[instrument(skip_all)]
    pub async fn prepare(
        &self,
        addresses: &AddressBook,
        wallet: &CardWallet,
        cart: &Cart,
        payment: Option<PaymentMethod>,
    ) -> Result<OrderDraft, ServiceError> {
        if cart.is_empty() {
            return Err(ServiceError::InvalidOperation(
                "Your cart is empty".to_string(),
            ));
        }

        let payment = payment.ok_or_else(|| {
            ServiceError::ValidationError(
                "Please select a payment method to continue.".to_string(),
            )
        })?;

        let address = addresses.resolve_active().cloned().ok_or_else(|| {
            ServiceError::InvalidOperation("Add a delivery address to continue".to_string())
        })?;

        let card = match payment {
            PaymentMethod::Card => Some(wallet.default_card().cloned().ok_or_else(|| {
                ServiceError::InvalidOperation("Add a card to pay by card".to_string())
            })?),
            _ => None,
        };

        let totals = cart.totals(&self.pricing);
        let draft = OrderDraft {
            order_id: Uuid::new_v4(),
            address,
            payment,
            card,
            lines: cart.items().to_vec(),
            coupon_code: cart.coupon_code().map(str::to_string),
            currency: self.currency.clone(),
            totals,
            created_at: Utc::now(),
        };

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::OrderDrafted {
                    order_id: draft.order_id,
                    total: draft.totals.total,
                })
                .await;
        }

        info!(
            order_id = %draft.order_id,
            payment = %draft.payment,
            total = %draft.totals.total,
            "Order drafted"
        );
        Ok(draft)
    }
}
