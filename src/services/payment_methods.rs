use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

use crate::{
    errors::ServiceError,
    models::{CardId, CardPatch, NewCard, SavedCard},
    services::default_slot,
};

/// Saved payment cards, with the same single-default rule as the address book.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredWallet")]
pub struct CardWallet {
    cards: Vec<SavedCard>,
}

#[derive(Deserialize)]
struct StoredWallet {
    cards: Vec<SavedCard>,
}

impl From<StoredWallet> for CardWallet {
    fn from(stored: StoredWallet) -> Self {
        Self::from_cards(stored.cards)
    }
}

impl CardWallet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a wallet from previously saved cards, normalizing default flags.
    pub fn from_cards(mut cards: Vec<SavedCard>) -> Self {
        default_slot::repair(&mut cards);
        Self { cards }
    }

    pub fn cards(&self) -> &[SavedCard] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, id: &CardId) -> Option<&SavedCard> {
        self.cards.iter().find(|c| &c.id == id)
    }

    pub fn default_card(&self) -> Option<&SavedCard> {
        self.cards.iter().find(|c| c.is_default)
    }

    /// Saves a card. Only the masked number is stored.
    pub fn add(&mut self, input: NewCard) -> SavedCard {
        let becomes_default = input.is_default || self.cards.is_empty();
        let mut card = SavedCard::from_input(CardId::generate(), input);
        card.is_default = becomes_default;
        self.cards.push(card);

        let last = self.cards.len() - 1;
        if becomes_default {
            default_slot::promote(&mut self.cards, last);
        }

        let added = &self.cards[last];
        debug!(card_id = %added.id, brand = %added.brand, "Card saved");
        added.clone()
    }

    /// Deletes a card; deleting the default promotes the first remaining card.
    pub fn remove(&mut self, id: &CardId) -> Result<SavedCard, ServiceError> {
        let index = self.position(id)?;
        let removed = self.cards.remove(index);
        if removed.is_default && !self.cards.is_empty() {
            default_slot::promote(&mut self.cards, 0);
        }

        debug!(card_id = %id, "Card removed");
        Ok(removed)
    }

    /// Edits a saved card's holder name or expiry. `is_default: Some(true)`
    /// moves the default here; `Some(false)` is ignored, as for addresses.
    pub fn update(&mut self, id: &CardId, patch: CardPatch) -> Result<(), ServiceError> {
        patch.validate()?;
        let index = self.position(id)?;

        if patch.is_default == Some(true) {
            default_slot::promote(&mut self.cards, index);
        }
        self.cards[index].apply(patch);

        debug!(card_id = %id, "Card updated");
        Ok(())
    }

    pub fn set_default(&mut self, id: &CardId) -> Result<(), ServiceError> {
        let index = self.position(id)?;
        default_slot::promote(&mut self.cards, index);

        debug!(card_id = %id, "Default card changed");
        Ok(())
    }

    fn position(&self, id: &CardId) -> Result<usize, ServiceError> {
        self.cards
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| ServiceError::not_found("Card", id))
    }
}
